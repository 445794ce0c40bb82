//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `dgrid` exit codes.
//! Scripts rely on them, so existing values never change meaning.
//!
//! | Code | Meaning                                                |
//! |------|--------------------------------------------------------|
//! | 0    | Success                                                |
//! | 1    | Reserved (not emitted)                                 |
//! | 2    | Usage error (bad args, unknown format, bad sort key)   |
//! | 3    | I/O error (missing input, unreadable settings)         |
//! | 4    | Parse error (malformed JSON/CSV, invalid settings)     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant here
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Input file or settings file could not be read, or output not written.
pub const EXIT_IO: u8 = 3;

/// Input or settings could not be parsed, or settings failed validation.
pub const EXIT_PARSE: u8 = 4;
