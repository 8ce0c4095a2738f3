//! Cursor style text scanning over borrowed bytes.
//!
//! Every function takes the remaining input as a [`Span`] and hands back the
//! span that remains after it, never reading past the end. Nothing here fails:
//! input that does not match yields an empty token (or `0`) and a cursor that
//! is unchanged or moved as little as possible. Callers detect a miss by
//! comparing the returned cursor with the one they passed in.

use std::fmt;

// ------------- Span -------------
/// A view into caller owned text. Equality compares content, not position.
#[derive(Clone, Copy, Default)]
pub struct Span<'a> {
    text: &'a [u8],
}

impl<'a> Span<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text: text.as_bytes() }
    }
    pub fn from_bytes(text: &'a [u8]) -> Self {
        Self { text }
    }
    pub fn as_bytes(&self) -> &'a [u8] {
        self.text
    }
    pub fn len(&self) -> usize {
        self.text.len()
    }
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
    pub fn first(&self) -> Option<u8> {
        self.text.first().copied()
    }
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.text).into_owned()
    }
    /// Byte offset of this cursor within `origin`, which it must be a suffix of.
    pub fn offset_in(&self, origin: &Span<'a>) -> usize {
        origin.len().saturating_sub(self.len())
    }
    fn advance(&self, n: usize) -> Span<'a> {
        Span { text: &self.text[n.min(self.text.len())..] }
    }
    fn head(&self, n: usize) -> Span<'a> {
        Span { text: &self.text[..n.min(self.text.len())] }
    }
}

impl PartialEq for Span<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}
impl Eq for Span<'_> {}

impl<'a> From<&'a str> for Span<'a> {
    fn from(text: &'a str) -> Self {
        Span::new(text)
    }
}
impl fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Span({:?})", String::from_utf8_lossy(self.text))
    }
}
impl fmt::Display for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.text))
    }
}

// ------------- Character classes -------------
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b'\t' | b' ' | b'\r' | b'\n')
}
pub fn is_numeric(c: u8) -> bool {
    c.is_ascii_digit()
}
pub fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

// ------------- Scanning -------------
/// Stops on `delim`. With `recognize_escapes` the byte after a backslash is
/// skipped; multi character escapes such as `\u23AB` are not understood.
pub fn scan_for_quote(s: Span<'_>, delim: u8, recognize_escapes: bool) -> Span<'_> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && recognize_escapes {
            i += 1;
        } else if bytes[i] == delim {
            break;
        }
        i += 1;
    }
    s.advance(i)
}

/// Stops on the first whitespace byte, or the end.
pub fn scan_for_whitespace(s: Span<'_>) -> Span<'_> {
    let n = s.as_bytes().iter().take_while(|c| !is_whitespace(**c)).count();
    s.advance(n)
}

pub fn scan_for_non_whitespace(s: Span<'_>) -> Span<'_> {
    let n = s.as_bytes().iter().take_while(|c| is_whitespace(**c)).count();
    s.advance(n)
}

pub fn scan_for_character(s: Span<'_>, delim: u8) -> Span<'_> {
    let n = s.as_bytes().iter().take_while(|c| **c != delim).count();
    s.advance(n)
}

/// Moves past the next line break, treating `\r\n` and `\n\r` as one.
pub fn scan_for_end_of_line(s: Span<'_>) -> Span<'_> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                break;
            }
            b'\n' => {
                i += 1;
                if bytes.get(i) == Some(&b'\r') {
                    i += 1;
                }
                break;
            }
            _ => i += 1,
        }
    }
    s.advance(i)
}

pub fn scan_for_beginning_of_next_line(s: Span<'_>) -> Span<'_> {
    scan_for_non_whitespace(scan_for_end_of_line(s))
}

/// Skips one `// line` or `/* block */` comment starting exactly at the cursor.
/// An unterminated block comment runs to the end of the input.
pub fn scan_past_cpp_comments(s: Span<'_>) -> Span<'_> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'/') {
        return s;
    }
    match bytes.get(1) {
        Some(b'/') => scan_for_end_of_line(s),
        Some(b'*') => {
            let mut i = 2;
            while i < bytes.len() {
                if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    return s.advance(i + 2);
                }
                i += 1;
            }
            s.advance(bytes.len())
        }
        _ => s,
    }
}

/// Alternates whitespace and comment skipping until neither moves the cursor.
pub fn skip_comments_and_whitespace(s: Span<'_>) -> Span<'_> {
    let mut curr = s;
    loop {
        curr = scan_for_non_whitespace(curr);
        let past = scan_past_cpp_comments(curr);
        if past.len() == curr.len() {
            return curr;
        }
        curr = past;
    }
}

/// Literal prefix match. On a miss the cursor comes back unchanged.
pub fn expect<'a>(s: Span<'a>, literal: &str) -> Span<'a> {
    if s.as_bytes().starts_with(literal.as_bytes()) {
        s.advance(literal.len())
    } else {
        s
    }
}

/// Trims whitespace from both ends.
pub fn strip(s: Span<'_>) -> Span<'_> {
    let s = scan_for_non_whitespace(s);
    let trailing = s.as_bytes().iter().rev().take_while(|c| is_whitespace(**c)).count();
    s.head(s.len() - trailing)
}

/// Splits on `splitter`. Empty pieces between adjacent splitters are kept,
/// an empty trailing piece is not.
pub fn split(s: Span<'_>, splitter: u8) -> Vec<Span<'_>> {
    let mut pieces = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let at = scan_for_character(rest, splitter);
        pieces.push(rest.head(rest.len() - at.len()));
        rest = at.advance(1);
        if at.is_empty() {
            break;
        }
    }
    pieces
}

// ------------- Tokens -------------
// All token getters return (rest, token).
fn token_while<'a>(s: Span<'a>, accept: impl Fn(u8) -> bool) -> (Span<'a>, Span<'a>) {
    let start = scan_for_non_whitespace(s);
    let n = start.as_bytes().iter().take_while(|c| accept(**c)).count();
    (start.advance(n), start.head(n))
}

pub fn get_token(s: Span<'_>, delim: u8) -> (Span<'_>, Span<'_>) {
    token_while(s, |c| c != delim)
}

pub fn get_token_ws_delimited(s: Span<'_>) -> (Span<'_>, Span<'_>) {
    token_while(s, |c| !is_whitespace(c))
}

/// Letters, digits and underscore.
pub fn get_token_alphanumeric(s: Span<'_>) -> (Span<'_>, Span<'_>) {
    token_while(s, |c| c == b'_' || is_numeric(c) || is_alpha(c))
}

/// Letters and digits, plus any byte found in `ext`.
pub fn get_token_alphanumeric_ext<'a>(s: Span<'a>, ext: &str) -> (Span<'a>, Span<'a>) {
    let ext = ext.as_bytes();
    token_while(s, |c| !is_whitespace(c) && (is_numeric(c) || is_alpha(c) || ext.contains(&c)))
}

pub fn get_namespaced_token_alphanumeric(s: Span<'_>, namespace: u8) -> (Span<'_>, Span<'_>) {
    token_while(s, |c| {
        c == namespace || matches!(c, b'$' | b'^' | b'_') || is_numeric(c) || is_alpha(c)
    })
}

/// A double quoted string. The token holds the interior and the cursor moves
/// past the closing quote.
pub fn get_string(s: Span<'_>, recognize_escapes: bool) -> (Span<'_>, Span<'_>) {
    get_string_delimited(s, b'"', recognize_escapes)
}

pub fn get_string_delimited(s: Span<'_>, delim: u8, recognize_escapes: bool) -> (Span<'_>, Span<'_>) {
    let open = scan_for_quote(s, delim, recognize_escapes);
    if open.is_empty() {
        return (open, Span::default());
    }
    let interior = open.advance(1);
    let close = scan_for_quote(interior, delim, recognize_escapes);
    let token = interior.head(interior.len() - close.len());
    (close.advance(1), token)
}

// ------------- Numbers -------------
// Digits accumulate left to right with wrapping arithmetic; overflow is not detected.
fn sign(s: Span<'_>) -> (Span<'_>, bool) {
    match s.first() {
        Some(b'+') => (s.advance(1), false),
        Some(b'-') => (s.advance(1), true),
        _ => (s, false),
    }
}

fn digits(s: Span<'_>) -> Span<'_> {
    let n = s.as_bytes().iter().take_while(|c| is_numeric(**c)).count();
    s.head(n)
}

pub fn get_int32(s: Span<'_>) -> (Span<'_>, i32) {
    let (curr, negative) = sign(scan_for_non_whitespace(s));
    let run = digits(curr);
    let value = run
        .as_bytes()
        .iter()
        .fold(0i32, |acc, c| acc.wrapping_mul(10).wrapping_add(i32::from(c - b'0')));
    let value = if negative { value.wrapping_neg() } else { value };
    (curr.advance(run.len()), value)
}

pub fn get_int16(s: Span<'_>) -> (Span<'_>, i16) {
    let (rest, value) = get_int32(s);
    (rest, value as i16)
}

pub fn get_uint32(s: Span<'_>) -> (Span<'_>, u32) {
    let curr = scan_for_non_whitespace(s);
    let run = digits(curr);
    let value = run
        .as_bytes()
        .iter()
        .fold(0u32, |acc, c| acc.wrapping_mul(10).wrapping_add(u32::from(c - b'0')));
    (curr.advance(run.len()), value)
}

/// Bare hexadecimal digits, no `0x` prefix and no sign.
pub fn get_hex(s: Span<'_>) -> (Span<'_>, u32) {
    let curr = scan_for_non_whitespace(s);
    let n = curr.as_bytes().iter().take_while(|c| c.is_ascii_hexdigit()).count();
    let value = curr.head(n).as_bytes().iter().fold(0u32, |acc, c| {
        let nibble = (*c as char).to_digit(16).unwrap_or(0);
        acc.wrapping_mul(16).wrapping_add(nibble)
    });
    (curr.advance(n), value)
}

/// Sign, integer part, optional fraction and optional `e`/`E` exponent,
/// combined as `value * 10^exponent`.
pub fn get_float(s: Span<'_>) -> (Span<'_>, f32) {
    let (curr, negative) = sign(scan_for_non_whitespace(s));
    let (mut curr, integer) = get_int32(curr);
    let mut value = integer as f32;
    if curr.first() == Some(b'.') {
        curr = curr.advance(1);
        let run = digits(curr);
        let mut scaler = 0.1f32;
        for c in run.as_bytes() {
            value += f32::from(c - b'0') * scaler;
            scaler *= 0.1;
        }
        curr = curr.advance(run.len());
    }
    if matches!(curr.first(), Some(b'e' | b'E')) {
        let (rest, exponent) = get_int32(curr.advance(1));
        curr = rest;
        value *= 10f32.powi(exponent);
    }
    (curr, if negative { -value } else { value })
}
