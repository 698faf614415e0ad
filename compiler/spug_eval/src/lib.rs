//! spug runtime: variables, scopes and expression evaluation.
//!
//! A [`Context`] is created per render. The host binds data into its bottom
//! scope (by value, or by reference with [`Context::set_ref`] and
//! [`Context::set_mut`]), native functions and classes, and optionally the
//! include and error callbacks. The interpreter then evaluates the compiled
//! template's expressions against it:
//!
//! ```
//! use spug_eval::Context;
//! use spug_ir::{ExprArena, Value};
//! use spug_parse::{parse_all, Options};
//!
//! let mut exprs = ExprArena::new();
//! let root = parse_all(&mut exprs, "user.name + '!'", &Options::inline()).unwrap();
//!
//! let user: Value = [("name", Value::from("Ann"))].into_iter().collect();
//! let mut ctx = Context::new();
//! ctx.set_ref("user", &user);
//! let result = ctx.exec(&exprs, root);
//! assert_eq!(ctx.value_of(&result), &Value::from("Ann!"));
//! ```
//!
//! # Errors
//!
//! Evaluation never aborts a render. A failing expression reports a
//! `Context error: ...` message and evaluates to undefined. Reports go to
//! the error callback when one is set; otherwise they are queued and the
//! interpreter writes them into the output as HTML comments.

mod context;
mod defaults;
mod error;
mod eval;
mod mixin;
mod operators;
mod print;
mod var;

pub use context::{Context, EachSource, IncludeCallback};
pub use error::{EvalError, EvalResult};
pub use eval::sequence_items;
pub use mixin::{Mixin, MixinParam};
pub use print::{escape_html, printed, write_attribute, write_attribute_list, write_value};
pub use var::{Call, NativeFn, Place, PlaceRoot, Segment, Var, VarClass, VarData, VarStorage};
