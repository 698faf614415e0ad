//! spug IR - shared data structures of the spug template engine.
//!
//! - [`Value`]: host data tree read and written by templates
//! - [`Span`] and [`Cursor`]: source positions and byte scanning
//! - [`chars`]: character classes of the markup and expression syntax
//! - [`ExprArena`]: flat expression trees with the operator table
//! - [`TokenTree`]: markup lexer output
//! - [`ChunkTree`]: compiled template
//!
//! # Design
//!
//! All trees are arenas addressed by `u32` ids. Chunks refer to expressions
//! by [`ExprId`] into the arena owned by the same [`ChunkTree`], so a
//! compiled template is a single immutable value that can be shared across
//! threads.

pub mod chars;
mod chunk;
mod cursor;
mod expr;
mod span;
mod stack;
mod token;
mod value;

pub use chunk::{Chunk, ChunkId, ChunkKind, ChunkTree};
pub use cursor::Cursor;
pub use expr::{Block, Expr, ExprArena, ExprId, Op};
pub use span::Span;
pub use stack::ensure_sufficient_stack;
pub use token::{Siblings, Token, TokenId, TokenKind, TokenTree};
pub use value::{format_float, Dict, Value, NULL};
