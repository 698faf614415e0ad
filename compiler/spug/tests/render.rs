// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end rendering tests: source text in, HTML out.
//!
//! # Organization
//!
//! - `markup/` - tags, attributes, text and escaping
//! - `control/` - conditionals, `case` and loops
//! - `mixins/` - definitions, calls and parameters
//! - `context/` - host data, callbacks and error reporting
//! - `concurrency/` - one compiled template shared by many threads
//! - `properties/` - property-based checks

#[path = "render/common.rs"]
mod common;

#[path = "render/markup.rs"]
mod markup;

#[path = "render/control.rs"]
mod control;

#[path = "render/mixins.rs"]
mod mixins;

#[path = "render/context.rs"]
mod context;

#[path = "render/concurrency.rs"]
mod concurrency;

#[path = "render/properties.rs"]
mod properties;
