//! Error taxonomy for the parser's single fatal `SYNTAX_ERROR` category.
//!
//! Grounded on `lua_vm/lua_error.rs`'s manual-impl error enum for the hot
//! VM path, but expressed with `thiserror` here: this type sits on the
//! parser's cold error path, where the pack's language-tooling crates
//! (e.g. `maravilla-labs/luat`) reach for `thiserror` rather than hand-roll.

use thiserror::Error;

/// A single parse-time failure, always fatal (no recovery is attempted).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} (line {line})")]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        SyntaxError {
            message: message.into(),
            line,
        }
    }

    pub fn expected(tok: &str, line: u32) -> Self {
        SyntaxError::new(format!("'{tok}' expected"), line)
    }

    pub fn expected_match(close: &str, open: &str, open_line: u32, line: u32) -> Self {
        if open_line == line {
            SyntaxError::expected(close, line)
        } else {
            SyntaxError::new(
                format!("'{close}' expected (to close '{open}' at line {open_line})"),
                line,
            )
        }
    }

    pub fn unexpected_symbol(line: u32) -> Self {
        SyntaxError::new("unexpected symbol", line)
    }

    pub fn bad_parameter_list(line: u32) -> Self {
        SyntaxError::new("<name> or '...' expected", line)
    }

    pub fn too_many_locals(line: u32) -> Self {
        SyntaxError::new("too many local variables", line)
    }

    pub fn user_type_too_long(line: u32) -> Self {
        SyntaxError::new("User defined type name is too long", line)
    }

    pub fn break_outside_loop(line: u32) -> Self {
        SyntaxError::new("break outside a loop", line)
    }
}

/// Failure modes of the host-facing [`crate::parse_with_mode`] entry point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("attempt to load a text chunk (mode is '{0}')")]
    ModeMismatch(String),

    /// Unreachable from the string-only entry points; kept so the error
    /// taxonomy from the host surface contract is complete.
    #[error("reader function must return a string")]
    ReaderError,
}
