//! Compile and render errors.

use std::fmt;

use spug_diagnostic::{Diagnostic, Phase};
use spug_lexer::LexError;
use thiserror::Error;

/// Compilation failure. `Display` is the caret-formatted diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    /// A well-formed line in a place it cannot appear, such as an `else`
    /// without an `if`.
    #[error("{diagnostic}")]
    Structure { offset: usize, diagnostic: Diagnostic },
}

impl CompileError {
    pub(crate) fn structure(source: &str, offset: usize, message: impl Into<String>) -> Self {
        CompileError::Structure {
            offset,
            diagnostic: Diagnostic::at(Phase::Compiler, source, offset, message),
        }
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            CompileError::Lex(error) => &error.diagnostic,
            CompileError::Structure { diagnostic, .. } => diagnostic,
        }
    }

    pub fn message(&self) -> &str {
        &self.diagnostic().message
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// An evaluation error with `stop_on_error` set.
    #[error("{0}")]
    Stopped(String),
    #[error("failed to write template output")]
    Output(#[from] fmt::Error),
}
