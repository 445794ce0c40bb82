use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Sort direction word is not one of asc/ascending/desc/descending.
    InvalidDirection(String),
    /// Sort criterion has an empty key.
    EmptySortKey,
    /// Record id outside the snapshot the index or view was built from.
    UnknownRecord(usize),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDirection(word) => {
                write!(f, "invalid sort direction '{word}' (expected asc or desc)")
            }
            Self::EmptySortKey => write!(f, "sort criterion has an empty key"),
            Self::UnknownRecord(id) => write!(f, "unknown record id {id}"),
        }
    }
}

impl std::error::Error for EngineError {}
