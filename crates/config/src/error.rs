use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    /// Settings file could not be read or written.
    Io(String),
    /// Settings JSON is malformed or has wrongly typed values.
    Parse(String),
    /// Settings parsed but a value is out of range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Parse(msg) => write!(f, "settings parse error: {msg}"),
            Self::Invalid(msg) => write!(f, "invalid setting: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
