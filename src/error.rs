use thiserror::Error;

#[derive(Error, Debug)]
pub enum CspError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Parse error at line {line}, column {col}: {message}")]
    Parse { message: String, offset: usize, line: usize, col: usize },
    #[error("Malformed journal at line {line}: {message}")]
    Journal { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, CspError>;

impl CspError {
    /// Builds a parse error for a failing cursor `offset` bytes into `source`.
    pub fn parse(source: &[u8], offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let consumed = &source[..offset];
        let line = consumed.iter().filter(|b| **b == b'\n').count() + 1;
        let col = match consumed.iter().rposition(|b| *b == b'\n') {
            Some(newline) => offset - newline,
            None => offset + 1,
        };
        Self::Parse { message: message.into(), offset, line, col }
    }
}

// Helper conversions
impl From<config::ConfigError> for CspError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<std::io::Error> for CspError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
