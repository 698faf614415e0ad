//! spug: an indentation-sensitive HTML template engine.
//!
//! A template is compiled once into a [`Template`] and rendered any number
//! of times, each render with its own [`Context`] holding the data:
//!
//! ```
//! use spug::{Context, Template, TemplateOptions, Value};
//!
//! let template = Template::compile(
//!     "ul\n  each item in items\n    li= item\n",
//!     &TemplateOptions::default(),
//! )
//! .unwrap();
//!
//! let items = Value::from(vec![Value::from("a"), Value::from("b")]);
//! let mut ctx = Context::new();
//! ctx.set_ref("items", &items);
//! assert_eq!(template.render(&mut ctx).unwrap(), "<ul><li>a</li><li>b</li></ul>");
//! ```
//!
//! # Pipeline
//!
//! 1. `spug_lexer` turns the source into a token tree, parsing embedded
//!    expressions with `spug_parse`.
//! 2. The compiler walks the token tree into a chunk tree, folding constant
//!    expressions and merging literal markup into text chunks.
//! 3. The renderer walks the chunk tree, evaluating expressions with
//!    `spug_eval`.

mod compile;
mod error;
mod render;
mod template;

pub use error::{CompileError, RenderError};
pub use template::{Template, TemplateOptions};

pub use spug_diagnostic::{Diagnostic, Phase};
pub use spug_eval::{Call, Context, VarClass};
pub use spug_ir::{ChunkTree, Value};
