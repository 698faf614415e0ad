//! Diagnostics for the spug template engine.
//!
//! Every problem the engine reports, from a bad indentation step to an
//! undefined variable at render time, becomes a [`Diagnostic`] and finally a
//! single human-readable message handed to the host's error callback.
//! Syntax diagnostics carry the offending line and a caret:
//!
//! ```text
//! -> 3: div(class=
//!                 ^
//! Lexer error: Invalid attribute list
//! ```

mod diagnostic;
pub mod span_utils;

pub use diagnostic::{Diagnostic, Location, Phase};
pub use span_utils::LineOffsetTable;

/// Host callback receiving formatted diagnostic messages.
pub type ErrorCallback<'a> = dyn FnMut(&str) + 'a;
