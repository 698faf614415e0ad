//! Chunk tree interpreter.

use std::fmt;
use std::sync::Arc;

use spug_eval::{
    escape_html, write_attribute, write_attribute_list, write_value, Context, EachSource,
    EvalError, Mixin, Segment,
};
use spug_ir::{ensure_sufficient_stack, Chunk, ChunkId, ChunkKind, ChunkTree, Value};
use tracing::trace;

use crate::error::RenderError;
use crate::template::TemplateOptions;

pub(crate) fn run(
    tree: &Arc<ChunkTree>,
    options: &TemplateOptions,
    ctx: &mut Context<'_>,
    out: &mut dyn fmt::Write,
) -> Result<(), RenderError> {
    ctx.take_last_error();
    let mut renderer = Renderer {
        ctx,
        out,
        pretty: options.pretty,
        stop_on_error: options.stop_on_error,
    };
    renderer.children(tree, ChunkId::ROOT)
}

struct Renderer<'r, 'a> {
    ctx: &'r mut Context<'a>,
    out: &'r mut dyn fmt::Write,
    pretty: bool,
    stop_on_error: bool,
}

impl Renderer<'_, '_> {
    fn children(&mut self, tree: &Arc<ChunkTree>, parent: ChunkId) -> Result<(), RenderError> {
        ensure_sufficient_stack(|| {
            let children = &tree.get(parent).children;
            let mut index = 0;
            while index < children.len() {
                index = self.chunk(tree, children, index)?;
                self.flush_errors()?;
            }
            Ok(())
        })
    }

    /// Write queued error reports; stop if asked to.
    fn flush_errors(&mut self) -> Result<(), RenderError> {
        for message in self.ctx.take_pending_errors() {
            write!(self.out, "<!-- {message} -->")?;
        }
        if self.stop_on_error {
            if let Some(message) = self.ctx.take_last_error() {
                return Err(RenderError::Stopped(message));
            }
        }
        Ok(())
    }

    /// Run `siblings[index]` and return the index of the next chunk to run.
    /// Conditionals and loops consume their `elseif`/`else` siblings.
    fn chunk(
        &mut self,
        tree: &Arc<ChunkTree>,
        siblings: &[ChunkId],
        index: usize,
    ) -> Result<usize, RenderError> {
        let id = siblings[index];
        let chunk = tree.get(id);
        trace!(kind = ?chunk.kind, "chunk");
        match chunk.kind {
            ChunkKind::Block => self.children(tree, id)?,
            ChunkKind::Text => self.out.write_str(&chunk.value)?,
            ChunkKind::OutputEscaped | ChunkKind::OutputUnescaped => {
                let escape = chunk.kind == ChunkKind::OutputEscaped && self.ctx.escape_output();
                match chunk.expr {
                    Some(expr) => {
                        let var = self.ctx.exec(&tree.exprs, expr);
                        if let Some(value) = self.ctx.read(&var) {
                            write_value(&mut *self.out, value, escape)?;
                        }
                    }
                    None if escape => self.out.write_str(&escape_html(&chunk.value))?,
                    None => self.out.write_str(&chunk.value)?,
                }
            }
            ChunkKind::AttributeEscaped | ChunkKind::AttributeUnescaped => {
                if let Some(expr) = chunk.expr {
                    let var = self.ctx.exec(&tree.exprs, expr);
                    if let Some(value) = self.ctx.read(&var) {
                        let escape = chunk.kind == ChunkKind::AttributeEscaped;
                        write_attribute(&mut *self.out, &chunk.value, value, escape)?;
                    }
                }
            }
            ChunkKind::AttributeList => {
                if let Some(expr) = chunk.expr {
                    let var = self.ctx.exec(&tree.exprs, expr);
                    if let Some(value) = self.ctx.read(&var) {
                        write_attribute_list(&mut *self.out, value)?;
                    }
                }
            }
            ChunkKind::Code => {
                if let Some(expr) = chunk.expr {
                    self.ctx.exec(&tree.exprs, expr);
                }
            }
            ChunkKind::ControlIf | ChunkKind::ControlUnless => {
                return self.conditional(tree, siblings, index)
            }
            ChunkKind::ControlEach | ChunkKind::ControlEachPair => {
                return self.each(tree, siblings, index)
            }
            ChunkKind::ControlWhile => self.while_loop(tree, id)?,
            ChunkKind::ControlCase => self.case(tree, chunk)?,
            ChunkKind::Include => self.include(tree, chunk)?,
            ChunkKind::Mixin => {
                let defined = Mixin::from_definition(tree, id)
                    .and_then(|mixin| self.ctx.define_mixin(mixin));
                if let Err(error) = defined {
                    self.ctx.report_error(&error);
                }
            }
            ChunkKind::MixinCall => self.call_mixin(tree, chunk)?,
            // Run by the chunk they follow; a stray one does nothing.
            ChunkKind::ControlElseIf
            | ChunkKind::ControlElse
            | ChunkKind::ControlWhen
            | ChunkKind::ControlDefault => {}
        }
        Ok(index + 1)
    }

    /// Children of `id` in a scope of their own.
    fn scoped(&mut self, tree: &Arc<ChunkTree>, id: ChunkId) -> Result<(), RenderError> {
        self.ctx.push_scope();
        let result = self.children(tree, id);
        self.ctx.pop_scope();
        result
    }

    fn conditional(
        &mut self,
        tree: &Arc<ChunkTree>,
        siblings: &[ChunkId],
        index: usize,
    ) -> Result<usize, RenderError> {
        let id = siblings[index];
        let kind = tree.get(id).kind;
        let mut done = self.branch(tree, id, kind == ChunkKind::ControlUnless)?;
        let mut next = index + 1;
        if kind == ChunkKind::ControlIf {
            while let Some(&branch) = siblings.get(next) {
                if tree.get(branch).kind != ChunkKind::ControlElseIf {
                    break;
                }
                if !done {
                    done = self.branch(tree, branch, false)?;
                }
                next += 1;
            }
        }
        if let Some(&otherwise) = siblings.get(next) {
            if tree.get(otherwise).kind == ChunkKind::ControlElse {
                if !done {
                    self.scoped(tree, otherwise)?;
                }
                next += 1;
            }
        }
        Ok(next)
    }

    /// Run a guarded body if its guard holds (does not hold, with `negate`).
    /// The guard is evaluated in the body's scope; a failing guard is false.
    fn branch(
        &mut self,
        tree: &Arc<ChunkTree>,
        id: ChunkId,
        negate: bool,
    ) -> Result<bool, RenderError> {
        self.ctx.push_scope();
        let holds = tree.get(id).expr.is_some_and(|expr| {
            let guard = self.ctx.probe(&tree.exprs, expr);
            self.ctx.truthy(&guard)
        }) != negate;
        let result = if holds { self.children(tree, id) } else { Ok(()) };
        self.ctx.pop_scope();
        result.map(|()| holds)
    }

    fn each(
        &mut self,
        tree: &Arc<ChunkTree>,
        siblings: &[ChunkId],
        index: usize,
    ) -> Result<usize, RenderError> {
        let id = siblings[index];
        let otherwise = siblings
            .get(index + 1)
            .copied()
            .filter(|&next| tree.get(next).kind == ChunkKind::ControlElse);

        self.ctx.push_scope();
        let result = self.iterate(tree, id, otherwise.is_some());
        self.ctx.pop_scope();
        let iterated = result?;

        match otherwise {
            Some(otherwise) => {
                if !iterated {
                    self.scoped(tree, otherwise)?;
                }
                Ok(index + 2)
            }
            None => Ok(index + 1),
        }
    }

    /// Loop body over the `each` source. Returns `false` when there was
    /// nothing to iterate. A scalar source runs the body once, bound to the
    /// scalar, unless an `else` follows.
    fn iterate(
        &mut self,
        tree: &Arc<ChunkTree>,
        id: ChunkId,
        has_else: bool,
    ) -> Result<bool, RenderError> {
        let chunk = tree.get(id);
        let mut names = chunk.value.split_whitespace();
        let value_name = names.next().unwrap_or_default();
        let key_name = names.next();
        let Some(expr) = chunk.expr else {
            return Ok(false);
        };
        let source = self.ctx.exec(&tree.exprs, expr);

        match self.ctx.each_source(source) {
            EachSource::Empty => Ok(false),
            EachSource::Scalar(_) if has_else => Ok(false),
            EachSource::Scalar(value) => {
                if self.ctx.step() {
                    self.ctx.push_scope();
                    self.ctx.set(value_name, value);
                    if let Some(key_name) = key_name {
                        self.ctx.set(key_name, 0);
                    }
                    let result = self.children(tree, id);
                    self.ctx.pop_scope();
                    result?;
                }
                Ok(true)
            }
            EachSource::Array {
                place,
                len,
                mutable,
            } => {
                for position in 0..len {
                    if !self.ctx.step() {
                        break;
                    }
                    self.ctx.push_scope();
                    self.ctx
                        .bind_ref(value_name, place.child(Segment::Index(position)), mutable);
                    if let Some(key_name) = key_name {
                        self.ctx.set(key_name, position);
                    }
                    let result = self.children(tree, id);
                    self.ctx.pop_scope();
                    result?;
                }
                Ok(true)
            }
            EachSource::Dict {
                place,
                keys,
                mutable,
            } => {
                for key in keys {
                    if !self.ctx.step() {
                        break;
                    }
                    self.ctx.push_scope();
                    if let Some(key_name) = key_name {
                        self.ctx.set(key_name, Value::from(key.as_str()));
                    }
                    self.ctx
                        .bind_ref(value_name, place.child(Segment::Key(key)), mutable);
                    let result = self.children(tree, id);
                    self.ctx.pop_scope();
                    result?;
                }
                Ok(true)
            }
        }
    }

    fn while_loop(&mut self, tree: &Arc<ChunkTree>, id: ChunkId) -> Result<(), RenderError> {
        let Some(expr) = tree.get(id).expr else {
            return Ok(());
        };
        loop {
            self.ctx.push_scope();
            let guard = self.ctx.probe(&tree.exprs, expr);
            let holds = self.ctx.truthy(&guard) && self.ctx.step();
            let result = if holds { self.children(tree, id) } else { Ok(()) };
            self.ctx.pop_scope();
            result?;
            if !holds {
                return Ok(());
            }
        }
    }

    /// The subject is evaluated once. A `when` without a body falls through
    /// to the next `when` that has one; `default` runs if nothing matched.
    fn case(&mut self, tree: &Arc<ChunkTree>, chunk: &Chunk) -> Result<(), RenderError> {
        self.ctx.push_scope();
        let result = self.case_branches(tree, chunk);
        self.ctx.pop_scope();
        result
    }

    fn case_branches(&mut self, tree: &Arc<ChunkTree>, chunk: &Chunk) -> Result<(), RenderError> {
        let subject = match chunk.expr {
            Some(expr) => {
                let var = self.ctx.exec(&tree.exprs, expr);
                self.ctx.value_of(&var).clone()
            }
            None => Value::Null,
        };
        let mut matched = false;
        for &id in &chunk.children {
            let branch = tree.get(id);
            match branch.kind {
                ChunkKind::ControlWhen => {
                    if !matched {
                        matched = branch.expr.is_some_and(|expr| {
                            let var = self.ctx.exec(&tree.exprs, expr);
                            *self.ctx.value_of(&var) == subject
                        });
                    }
                    if matched && !branch.children.is_empty() {
                        return self.children(tree, id);
                    }
                }
                ChunkKind::ControlDefault if !matched => return self.children(tree, id),
                _ => {}
            }
        }
        Ok(())
    }

    fn include(&mut self, tree: &Arc<ChunkTree>, chunk: &Chunk) -> Result<(), RenderError> {
        let name = chunk.value.as_str();
        let included = if self.pretty && chunk.indent > 0 {
            let mut buffer = String::new();
            let included = self.ctx.include(name, &mut buffer, tree);
            let indent = "\t".repeat(chunk.indent as usize);
            self.out
                .write_str(&buffer.replace('\n', &format!("\n{indent}")))?;
            included
        } else {
            self.ctx.include(name, &mut *self.out, tree)
        };
        if !included {
            write!(self.out, "<!-- fail to include {name} -->")?;
        }
        Ok(())
    }

    fn call_mixin(&mut self, tree: &Arc<ChunkTree>, chunk: &Chunk) -> Result<(), RenderError> {
        let Some(mixin) = self.ctx.mixin(&chunk.value) else {
            self.ctx
                .report_error(&EvalError::MixinNotFound(chunk.value.clone()));
            return Ok(());
        };
        let args = match chunk.expr {
            Some(expr) => match self.ctx.exec_args(&tree.exprs, expr) {
                Some(args) => args,
                None => return Ok(()),
            },
            None => Vec::new(),
        };
        if !self.ctx.step() || !self.ctx.enter_mixin(&mixin, args) {
            return Ok(());
        }
        let result = self.children(&mixin.tree, mixin.body);
        self.ctx.pop_scope();
        result
    }
}
