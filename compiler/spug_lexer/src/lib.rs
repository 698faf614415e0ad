//! spug markup lexer.
//!
//! Reads template source line by line and builds a [`TokenTree`]: every
//! source line becomes a token under the line it is indented into, and the
//! expressions embedded in lines are parsed on the spot into the tree's
//! expression arena.
//!
//! # Token tree shape
//!
//! - Markup lines are `Line` tokens. The first child is the line's data
//!   token (`LineData` for tags, `LineOut`, `LineCode`, `LinePiped`, ...);
//!   the remaining children are the lines nested under it.
//! - Keyword lines (`if`, `each`, `mixin`, `include`, `doctype`, ...) are
//!   stored directly as their control token. `each` keeps its loop variables
//!   as leading `ControlEachVariable` children; nested lines follow.
//! - `a: b` puts line `b` under line `a`, exactly as if it had been written
//!   on the next line one level deeper.
//!
//! ```
//! use spug_ir::{TokenId, TokenKind};
//!
//! let tree = spug_lexer::lex("ul\n  li= item\n").unwrap();
//! let ul = tree.children(TokenId::ROOT).next().unwrap();
//! assert_eq!(tree.kind(ul), TokenKind::Line);
//! assert_eq!(tree.children(ul).count(), 2);
//! ```

mod error;
mod lexer;

pub use error::LexError;

use spug_diagnostic::ErrorCallback;
use spug_ir::TokenTree;
use tracing::debug;

use lexer::Lexer;

/// Lex a whole template.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn lex(source: &str) -> Result<TokenTree<'_>, LexError> {
    let tree = Lexer::new(source).run()?;
    debug!(tokens = tree.len(), exprs = tree.exprs.len(), "lexed template");
    Ok(tree)
}

/// Like [`lex`], also handing the formatted error to `on_error`.
pub fn lex_with<'src>(
    source: &'src str,
    on_error: &mut ErrorCallback<'_>,
) -> Result<TokenTree<'src>, LexError> {
    lex(source).inspect_err(|error| on_error(&error.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
