//! Process records and the script parser that produces them.
//!
//! The grammar is deliberately small:
//!
//! ```text
//! Script     := { Definition }
//! Definition := NAME "=" "(" Process
//! Process    := EVENT "->" ( NAME | "(" Process ")" ) [ STRING ] ")"
//! ```
//!
//! `//` and `/* */` comments may appear between tokens. A parenthesized
//! successor is lifted into its own anonymous record, named with
//! [`ANONYMOUS_PREFIX`], which starts out inactive. Chained prefixes such as
//! `a -> b -> c` are rejected.

use std::fmt;

use tracing::debug;

use crate::error::{CspError, Result};
use crate::scan::{self, Span};

/// Names starting with this are reserved for synthesized processes.
pub const ANONYMOUS_PREFIX: &str = "__";

// ------------- Process -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    name: String,
    event: String,
    behavior: String,
    out: String,
    anonymous: bool,
}

impl Process {
    fn named(name: String, anonymous: bool) -> Self {
        Self {
            name,
            event: String::new(),
            behavior: String::new(),
            out: String::new(),
            anonymous,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The event this process waits for.
    pub fn event(&self) -> &str {
        &self.event
    }
    /// The process that takes over after this one fires.
    pub fn behavior(&self) -> &str {
        &self.behavior
    }
    /// Output label looked up among the bound callbacks, empty if none.
    pub fn out(&self) -> &str {
        &self.out
    }
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
    pub fn is_recursive(&self) -> bool {
        self.behavior == self.name
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = ({} -> {}", self.name, self.event, self.behavior)?;
        if !self.out.is_empty() {
            write!(f, " \"{}\"", self.out)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Inactive,
    Active,
    // reached during the current event, active once it has been fully dispatched
    Pending,
}

// ------------- ProcessTable -------------
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    processes: Vec<Process>,
    states: Vec<ProcessState>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn parse(source: &str) -> Result<Self> {
        let mut table = Self::new();
        table.merge(source)?;
        Ok(table)
    }
    /// Parses `source` and appends its definitions, returning how many records
    /// were added. Nothing is appended if any part of `source` fails to parse.
    /// Records already in the table keep their states.
    pub fn merge(&mut self, source: &str) -> Result<usize> {
        let parser = Parser {
            origin: Span::new(source),
            records: Vec::new(),
            anonymous: 0,
        };
        let records = parser.parse(self)?;
        let added = records.len();
        for record in records {
            self.states.push(if record.anonymous {
                ProcessState::Inactive
            } else {
                ProcessState::Active
            });
            self.processes.push(record);
        }
        debug!(added, total = self.processes.len(), "merged process definitions");
        Ok(added)
    }
    pub fn len(&self) -> usize {
        self.processes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }
    pub fn get(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }
    pub fn state(&self, name: &str) -> Option<ProcessState> {
        let index = self.processes.iter().position(|p| p.name == name)?;
        Some(self.states[index])
    }
    pub fn states(&self) -> &[ProcessState] {
        &self.states
    }
    /// Names of the processes currently able to fire.
    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.processes
            .iter()
            .zip(&self.states)
            .filter(|(_, state)| **state == ProcessState::Active)
            .map(|(p, _)| p.name.as_str())
    }

    /// Fires every active process waiting on `event`, calling `fire` for each,
    /// and moves the non recursive ones on to their successors. Successors are
    /// held pending until all processes have seen the event, so a process that
    /// was just reached cannot fire on the same event. Returns how many fired.
    pub fn dispatch(&mut self, event: &str, mut fire: impl FnMut(&Process)) -> usize {
        let mut fired = 0;
        for i in 0..self.processes.len() {
            if self.states[i] != ProcessState::Active || self.processes[i].event != event {
                continue;
            }
            fired += 1;
            let process = &self.processes[i];
            fire(process);
            if process.is_recursive() {
                continue;
            }
            self.states[i] = ProcessState::Inactive;
            for (j, successor) in self.processes.iter().enumerate() {
                if successor.name == process.behavior {
                    self.states[j] = ProcessState::Pending;
                }
            }
        }
        for state in self.states.iter_mut() {
            if *state == ProcessState::Pending {
                *state = ProcessState::Active;
            }
        }
        fired
    }
}

// ------------- Parser -------------
struct Parser<'a> {
    origin: Span<'a>,
    records: Vec<Process>,
    // numbers anonymous processes, local to one parse
    anonymous: usize,
}

impl<'a> Parser<'a> {
    fn parse(mut self, existing: &ProcessTable) -> Result<Vec<Process>> {
        let mut curr = scan::skip_comments_and_whitespace(self.origin);
        while !curr.is_empty() {
            let (rest, name) = scan::get_token_alphanumeric(curr);
            if name.is_empty() {
                return Err(self.error(curr, "expected a process name"));
            }
            let name = name.to_string_lossy();
            if name.starts_with(ANONYMOUS_PREFIX) {
                return Err(self.error(curr, format!("`{name}` uses the reserved prefix `{ANONYMOUS_PREFIX}`")));
            }
            if existing.get(&name).is_some() || self.records.iter().any(|p| p.name == name) {
                return Err(self.error(curr, format!("process `{name}` is already defined")));
            }
            curr = self.require(rest, "=")?;
            curr = self.require(curr, "(")?;
            self.records.push(Process::named(name, false));
            let index = self.records.len() - 1;
            curr = self.parse_process(curr, index)?;
            curr = scan::skip_comments_and_whitespace(curr);
        }
        Ok(self.records)
    }

    // the opening parenthesis has been consumed; fills in records[index]
    fn parse_process(&mut self, curr: Span<'a>, index: usize) -> Result<Span<'a>> {
        let curr = scan::skip_comments_and_whitespace(curr);
        let (rest, event) = scan::get_token_alphanumeric(curr);
        if event.is_empty() {
            return Err(self.error(curr, "expected an event name"));
        }
        self.records[index].event = event.to_string_lossy();

        let curr = scan::skip_comments_and_whitespace(self.require(rest, "->")?);
        let nested = scan::expect(curr, "(");
        let mut curr = if nested.len() != curr.len() {
            let name = format!("{ANONYMOUS_PREFIX}{}_{}", self.records[index].name, self.anonymous);
            self.anonymous += 1;
            self.records[index].behavior = name.clone();
            self.records.push(Process::named(name, true));
            let child = self.records.len() - 1;
            self.parse_process(nested, child)?
        } else {
            let (rest, behavior) = scan::get_token_alphanumeric(curr);
            if behavior.is_empty() {
                return Err(self.error(curr, "expected a behavior name or `(`"));
            }
            self.records[index].behavior = behavior.to_string_lossy();
            let rest = scan::skip_comments_and_whitespace(rest);
            if scan::expect(rest, "->").len() != rest.len() {
                return Err(self.error(rest, "chained events are not supported, nest the successor in parentheses"));
            }
            rest
        };

        curr = scan::skip_comments_and_whitespace(curr);
        if curr.first() == Some(b'"') {
            let (rest, out) = scan::get_string(curr, false);
            self.records[index].out = out.to_string_lossy();
            curr = rest;
        }
        self.require(curr, ")")
    }

    fn require(&self, curr: Span<'a>, literal: &str) -> Result<Span<'a>> {
        let curr = scan::skip_comments_and_whitespace(curr);
        let next = scan::expect(curr, literal);
        if next.len() == curr.len() {
            return Err(self.error(curr, format!("expected `{literal}`")));
        }
        Ok(next)
    }

    fn error(&self, at: Span<'a>, message: impl Into<String>) -> CspError {
        CspError::parse(self.origin.as_bytes(), at.offset_in(&self.origin), message)
    }
}
