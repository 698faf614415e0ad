//! Shared helpers for rendering tests.

use spug::{Context, Template, TemplateOptions};

pub fn compile(source: &str) -> Template {
    Template::compile(source, &TemplateOptions::default()).unwrap()
}

/// Render with an empty context.
pub fn render(source: &str) -> String {
    render_with(source, &mut Context::new())
}

pub fn render_with(source: &str, ctx: &mut Context<'_>) -> String {
    compile(source).render(ctx).unwrap()
}

pub fn render_pretty(source: &str) -> String {
    Template::compile(source, &TemplateOptions::new().pretty(true))
        .unwrap()
        .render(&mut Context::new())
        .unwrap()
}

/// Expected HTML comment for an evaluation error.
pub fn error_comment(message: &str) -> String {
    format!("<!-- Context error: {message} -->")
}
