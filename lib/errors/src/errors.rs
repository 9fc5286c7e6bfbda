use std::{
    fmt::{self, Display, Formatter},
    ops::{Deref, DerefMut},
};

use cursor::Line;
use itertools::Itertools;

/// Which part of the source a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum At {
    /// Lexical errors only know their line.
    Nowhere,
    End,
    Lexeme(String),
}

impl Display for At {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            At::Nowhere => Ok(()),
            At::End => write!(f, " at end"),
            At::Lexeme(lexeme) => write!(f, " at '{lexeme}'"),
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("[line {line}] Error{at}: {message}")]
pub struct LoxError {
    pub line: Line,
    pub at: At,
    pub message: String,
}

impl LoxError {
    pub fn new(line: Line, at: At, message: impl ToString) -> Self {
        Self { line, at, message: message.to_string() }
    }
}

#[derive(thiserror::Error, Clone, Debug, Default, PartialEq)]
pub struct LoxErrors(pub Vec<LoxError>);

impl Deref for LoxErrors {
    type Target = Vec<LoxError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for LoxErrors {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Display for LoxErrors {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("\n"))
    }
}

/// Sink for every diagnostic produced while running a program.
///
/// The two flags are sticky until [`Reporter::reset`] so that a driver can decide
/// after the fact whether anything went wrong, and how.
pub trait Reporter {
    fn lexical_error(&mut self, line: Line, message: &str) {
        self.error(LoxError::new(line, At::Nowhere, message));
    }

    /// Records a compile-time (lexical or syntax) error.
    fn error(&mut self, error: LoxError);

    fn runtime_error(&mut self, error: LoxError);

    fn had_error(&self) -> bool;

    fn had_runtime_error(&self) -> bool;

    fn reset(&mut self);
}

/// Keeps every reported error around, in the order they were reported.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: LoxErrors,
    runtime_errors: LoxErrors,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &LoxErrors {
        &self.errors
    }

    pub fn runtime_errors(&self) -> &LoxErrors {
        &self.runtime_errors
    }
}

impl Reporter for Diagnostics {
    fn error(&mut self, error: LoxError) {
        log::debug!("Reported error: {error}");
        self.had_error = true;
        self.errors.push(error);
    }

    fn runtime_error(&mut self, error: LoxError) {
        log::debug!("Reported runtime error: {error}");
        self.had_runtime_error = true;
        self.runtime_errors.push(error);
    }

    fn had_error(&self) -> bool {
        self.had_error
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
