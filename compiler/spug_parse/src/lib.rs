//! spug expression parser.
//!
//! Parses the JavaScript-like expression language embedded in templates
//! into an [`ExprArena`]. Parsing starts at a byte offset into a larger
//! source (the markup line that embeds the expression) and reports where
//! the expression ended, so the caller can continue scanning markup from
//! there.
//!
//! ```
//! use spug_ir::ExprArena;
//! use spug_parse::{parse, Options};
//!
//! let mut arena = ExprArena::new();
//! let mut pos = 0;
//! let root = parse(&mut arena, "a + b * 2", &mut pos, &Options::inline()).unwrap();
//! assert_eq!(arena.dump(root), "(+ a (* b 2))");
//! assert_eq!(pos, 9);
//! ```

mod error;
mod options;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use options::{OperatorSet, Options, ParseFlags};

use spug_ir::{Cursor, ExprArena, ExprId};

use parser::Parser;

/// Parse one expression from `source` starting at `*pos`.
///
/// On success `*pos` is the offset of the first byte after the expression
/// (trailing spacing included). On failure `*pos` is where the parser gave
/// up, and every node allocated by this call is removed from `arena`.
pub fn parse(
    arena: &mut ExprArena,
    source: &str,
    pos: &mut usize,
    options: &Options,
) -> Result<ExprId, ParseError> {
    let mark = arena.len();
    let mut parser = Parser::new(arena, Cursor::at(source, *pos), options);
    let result = parser.parse_root();
    *pos = parser.pos();
    if result.is_err() {
        arena.truncate(mark);
    }
    result
}

/// Parse all of `source` as one expression.
///
/// Input left over after the expression is reported as
/// [`ParseErrorKind::TrailingInput`].
pub fn parse_all(arena: &mut ExprArena, source: &str, options: &Options) -> Result<ExprId, ParseError> {
    let mut pos = 0;
    let root = parse(arena, source, &mut pos, options)?;
    if source.get(pos..).unwrap_or_default().trim().is_empty() {
        Ok(root)
    } else {
        Err(ParseError::new(ParseErrorKind::TrailingInput, pos))
    }
}
