//! Compiled templates.

use std::fmt;
use std::sync::Arc;

use spug_diagnostic::ErrorCallback;
use spug_eval::Context;
use spug_ir::ChunkTree;

use crate::error::{CompileError, RenderError};
use crate::{compile, render};

/// Compile-time and render-time switches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Break block tags and text lines onto their own lines, indented with
    /// tabs.
    pub pretty: bool,
    /// Abort the render at the first evaluation error.
    pub stop_on_error: bool,
}

impl TemplateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }
}

/// A compiled template.
///
/// Compilation is done once; the chunk tree is immutable afterwards and
/// shared, so a template can be cloned cheaply and rendered from several
/// threads at once, each with its own [`Context`].
#[derive(Clone, Debug)]
pub struct Template {
    tree: Arc<ChunkTree>,
    options: TemplateOptions,
}

impl Template {
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn compile(source: &str, options: &TemplateOptions) -> Result<Self, CompileError> {
        let tokens = spug_lexer::lex(source)?;
        let tree = compile::compile(tokens, options)?;
        Ok(Template {
            tree: Arc::new(tree),
            options: *options,
        })
    }

    /// [`Template::compile`], also passing the formatted error to `on_error`.
    pub fn compile_with(
        source: &str,
        options: &TemplateOptions,
        on_error: &mut ErrorCallback<'_>,
    ) -> Result<Self, CompileError> {
        Self::compile(source, options).inspect_err(|error| on_error(&error.to_string()))
    }

    /// Render into `out`.
    ///
    /// Evaluation errors do not stop the render unless `stop_on_error` is
    /// set. Without an error callback on `ctx` they are written into the
    /// output as `<!-- Context error: ... -->` comments.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&self, ctx: &mut Context<'_>, out: &mut dyn fmt::Write) -> Result<(), RenderError> {
        render::run(&self.tree, &self.options, ctx, out)
    }

    pub fn render(&self, ctx: &mut Context<'_>) -> Result<String, RenderError> {
        let mut out = String::new();
        self.run(ctx, &mut out)?;
        Ok(out)
    }

    /// Include targets in order of first appearance.
    pub fn includes(&self) -> &[String] {
        &self.tree.includes
    }

    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    pub fn tree(&self) -> &Arc<ChunkTree> {
        &self.tree
    }

    /// Indented dump of the compiled chunks.
    pub fn describe(&self) -> String {
        self.tree.describe(true)
    }
}
