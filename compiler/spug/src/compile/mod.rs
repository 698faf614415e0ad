//! Compilation of a token tree into a chunk tree.
//!
//! The walk keeps a pending text buffer. Literal markup, and every output or
//! attribute whose expression folds to a constant, is appended to it; the
//! buffer becomes a `Text` chunk only when a dynamic chunk or a control
//! construct needs a place of its own. Expressions move from the token tree
//! into the chunk tree unchanged, so chunk `ExprId`s are the lexer's.

mod markup;

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;

use spug_eval::{escape_html, printed, sequence_items, write_attribute, Context};
use spug_ir::{
    ensure_sufficient_stack, Chunk, ChunkId, ChunkKind, ChunkTree, ExprId, Op, TokenId, TokenKind,
    TokenTree, Value,
};
use tracing::{debug, trace};

use crate::error::CompileError;
use crate::template::TemplateOptions;

#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn compile(
    mut tokens: TokenTree<'_>,
    options: &TemplateOptions,
) -> Result<ChunkTree, CompileError> {
    let exprs = std::mem::take(&mut tokens.exprs);
    let mut compiler = Compiler {
        tokens: &tokens,
        tree: ChunkTree::new(exprs),
        text: String::new(),
        current: ChunkId::ROOT,
        depth: 0,
        breaks: 0,
        at_start: true,
        pretty: options.pretty,
        scratch: Context::new(),
    };
    compiler.block(tokens.get(TokenId::ROOT).child, false)?;
    compiler.flush();
    let tree = compiler.tree;
    debug!(chunks = tree.len(), includes = ?tree.includes, "compiled template");
    Ok(tree)
}

struct Compiler<'t, 'src> {
    tokens: &'t TokenTree<'src>,
    tree: ChunkTree,
    /// Literal output not yet placed in a chunk.
    text: String,
    /// Chunk receiving new children.
    current: ChunkId,
    /// Tag nesting depth.
    depth: u32,
    /// Pretty line breaks emitted so far.
    breaks: usize,
    /// Nothing has been emitted yet.
    at_start: bool,
    pretty: bool,
    /// Evaluates constant expressions.
    scratch: Context<'static>,
}

impl Compiler<'_, '_> {
    /// Compile `first` and its following sibling lines.
    ///
    /// `after_text` tells whether the line before `first` was text, so that
    /// consecutive text lines are joined with a newline.
    fn block(&mut self, first: Option<TokenId>, after_text: bool) -> Result<(), CompileError> {
        let tokens = self.tokens;
        ensure_sufficient_stack(|| {
            let mut previous: Option<TokenKind> = None;
            let mut after_text = after_text;
            for id in tokens.siblings(first) {
                let kind = tokens.kind(id);
                self.check_placement(id, kind, previous)?;
                let is_text = kind == TokenKind::Line && self.is_text_line(id);
                if is_text {
                    if self.pretty {
                        self.newline();
                    } else if after_text {
                        self.push("\n");
                    }
                }
                self.statement(id, kind)?;
                after_text = is_text;
                previous = Some(kind);
            }
            Ok(())
        })
    }

    fn statement(&mut self, id: TokenId, kind: TokenKind) -> Result<(), CompileError> {
        match kind {
            TokenKind::Line => self.line(id),
            TokenKind::ControlIf => self.control(id, ChunkKind::ControlIf),
            TokenKind::ControlUnless => self.control(id, ChunkKind::ControlUnless),
            TokenKind::ControlElseIf => self.control(id, ChunkKind::ControlElseIf),
            TokenKind::ControlElse => self.control(id, ChunkKind::ControlElse),
            TokenKind::ControlCase => self.control(id, ChunkKind::ControlCase),
            TokenKind::ControlEach => self.control(id, ChunkKind::ControlEach),
            TokenKind::ControlEachPair => self.control(id, ChunkKind::ControlEachPair),
            TokenKind::ControlWhile => self.control(id, ChunkKind::ControlWhile),
            TokenKind::ControlMixin => self.control(id, ChunkKind::Mixin),
            TokenKind::Include => {
                self.include(id);
                Ok(())
            }
            TokenKind::Doctype => {
                let doctype = markup::doctype(self.tokens.text(id).trim());
                self.push(&doctype);
                Ok(())
            }
            // Rejected by `check_placement`.
            _ => Ok(()),
        }
    }

    /// Reject lines that are well formed but out of place.
    fn check_placement(
        &self,
        id: TokenId,
        kind: TokenKind,
        previous: Option<TokenKind>,
    ) -> Result<(), CompileError> {
        let message = match kind {
            TokenKind::ControlElseIf
                if !matches!(previous, Some(TokenKind::ControlIf | TokenKind::ControlElseIf)) =>
            {
                "'elseif' without 'if'"
            }
            TokenKind::ControlElse
                if !matches!(
                    previous,
                    Some(
                        TokenKind::ControlIf
                            | TokenKind::ControlUnless
                            | TokenKind::ControlElseIf
                            | TokenKind::ControlEach
                            | TokenKind::ControlEachPair
                    )
                ) =>
            {
                "'else' without 'if' or 'each'"
            }
            TokenKind::ControlWhen => "'when' outside of 'case'",
            TokenKind::ControlDefault => "'default' outside of 'case'",
            _ => return Ok(()),
        };
        Err(self.error(id, message))
    }

    fn error(&self, id: TokenId, message: &str) -> CompileError {
        let offset = self.tokens.get(id).span.start as usize;
        CompileError::structure(self.tokens.source(), offset, message)
    }

    fn is_text_line(&self, line: TokenId) -> bool {
        self.tokens.get(line).child.is_some_and(|data| {
            matches!(
                self.tokens.kind(data),
                TokenKind::LinePlainText | TokenKind::LinePiped
            )
        })
    }

    // Output buffer

    fn push(&mut self, text: &str) {
        if !text.is_empty() {
            self.text.push_str(text);
            self.at_start = false;
        }
    }

    /// Pretty mode: start a new line at the current depth.
    fn newline(&mut self) {
        if !self.pretty {
            return;
        }
        if !self.at_start {
            self.text.push('\n');
            for _ in 0..self.depth {
                self.text.push('\t');
            }
        }
        self.at_start = false;
        self.breaks += 1;
    }

    /// Move the pending text into a `Text` chunk.
    fn flush(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let mut chunk = Chunk::new(ChunkKind::Text);
        chunk.value = std::mem::take(&mut self.text);
        let id = self.tree.alloc(chunk);
        self.tree.push_child(self.current, id);
    }

    /// Append a dynamic chunk after the pending text.
    fn emit(&mut self, chunk: Chunk) -> ChunkId {
        self.flush();
        self.at_start = false;
        trace!(kind = ?chunk.kind, value = %chunk.value, "chunk");
        let id = self.tree.alloc(chunk);
        self.tree.push_child(self.current, id);
        id
    }

    // Constant folding

    /// Value of a constant expression, or `None` when it must be evaluated
    /// at render time. Failing constants are left to the renderer, which
    /// reports them.
    fn fold(&mut self, expr: ExprId) -> Option<Value> {
        if !self.tree.exprs.is_const(expr) {
            return None;
        }
        let var = self.scratch.exec(&self.tree.exprs, expr);
        let value = self.scratch.read(&var).cloned();
        self.scratch.take_pending_errors();
        if self.scratch.take_last_error().is_some() {
            return None;
        }
        value
    }

    fn output(&mut self, expr: ExprId, escape: bool) {
        for item in sequence_items(&self.tree.exprs, expr) {
            let Some(value) = self.fold(item) else {
                let mut chunk = Chunk::new(if escape {
                    ChunkKind::OutputEscaped
                } else {
                    ChunkKind::OutputUnescaped
                });
                chunk.expr = Some(item);
                self.emit(chunk);
                continue;
            };
            let text = printed(&value).into_owned();
            if escape && escape_html(&text) != text {
                // Escaping depends on the render context.
                let mut chunk = Chunk::new(ChunkKind::OutputEscaped);
                chunk.value = text;
                self.emit(chunk);
            } else {
                self.push(&text);
            }
        }
    }

    fn code(&mut self, expr: ExprId) {
        if self.fold(expr).is_none() {
            let mut chunk = Chunk::new(ChunkKind::Code);
            chunk.expr = Some(expr);
            self.emit(chunk);
        }
    }

    // Lines

    fn line(&mut self, line: TokenId) -> Result<(), CompileError> {
        let tokens = self.tokens;
        let Some(data) = tokens.get(line).child else {
            return Ok(());
        };
        let nested = tokens.get(data).next;
        match tokens.kind(data) {
            TokenKind::LineData => self.tag(data, nested, true),
            TokenKind::LinePlainText => {
                if tokens.get(data).child.is_none() {
                    let raw = tokens.text(data);
                    self.push(raw);
                } else {
                    self.pieces(tokens.get(data).child)?;
                }
                self.block(nested, true)
            }
            TokenKind::LinePiped => {
                self.pieces(tokens.get(data).child)?;
                self.block(nested, true)
            }
            TokenKind::LineComment => self.comment(data, nested),
            TokenKind::LineDot => self.block(nested, false),
            TokenKind::LineOut => {
                for output in tokens.children(data) {
                    let token = tokens.get(output);
                    if let Some(expr) = token.expr {
                        self.output(expr, token.kind == TokenKind::OutputEscaped);
                    }
                }
                self.block(nested, false)
            }
            TokenKind::LineCode | TokenKind::LineCodeBlock => {
                for code in tokens.children(data) {
                    if let Some(expr) = tokens.get(code).expr {
                        self.code(expr);
                    }
                }
                self.block(nested, false)
            }
            TokenKind::MixinCall => {
                let mut chunk = Chunk::new(ChunkKind::MixinCall);
                chunk.value = tokens.text(data).to_owned();
                chunk.expr = self
                    .tokens
                    .children(data)
                    .find_map(|args| tokens.get(args).expr);
                chunk.indent = self.depth;
                self.emit(chunk);
                self.block(nested, false)
            }
            _ => Ok(()),
        }
    }

    /// Inline text: plain pieces, interpolations and `#[tag]`s.
    fn pieces(&mut self, first: Option<TokenId>) -> Result<(), CompileError> {
        let tokens = self.tokens;
        for id in tokens.siblings(first) {
            let token = tokens.get(id);
            match token.kind {
                TokenKind::PlainText => {
                    let text = tokens.text(id);
                    self.push(text);
                }
                TokenKind::OutputEscaped | TokenKind::OutputUnescaped => {
                    if let Some(expr) = token.expr {
                        self.output(expr, token.kind == TokenKind::OutputEscaped);
                    }
                }
                TokenKind::LineData => self.tag(id, None, false)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn comment(&mut self, data: TokenId, nested: Option<TokenId>) -> Result<(), CompileError> {
        let tokens = self.tokens;
        let mut parts = tokens.children(data);
        if parts
            .next()
            .is_some_and(|marker| tokens.kind(marker) == TokenKind::CommentTemplate)
        {
            return Ok(());
        }
        self.newline();
        self.push("<!--");
        self.pieces(parts.next())?;
        let pretty = std::mem::replace(&mut self.pretty, false);
        let result = self.block(nested, true);
        self.pretty = pretty;
        result?;
        self.push("-->");
        Ok(())
    }

    // Tags

    /// Compile a tag. `block` is false for `#[tag]` interpolations, which
    /// never break the line.
    fn tag(
        &mut self,
        data: TokenId,
        nested: Option<TokenId>,
        block: bool,
    ) -> Result<(), CompileError> {
        let tokens = self.tokens;
        let tag = tokens.get(data).child;
        let name = match tag.map(|tag| tokens.text(tag)) {
            Some(name) if !name.is_empty() => name,
            _ => "div",
        };
        let breaks = block && self.pretty && !markup::is_inline(name);
        if breaks {
            self.newline();
        }

        self.push("<");
        self.push(name);
        self.shorthand(data);
        let mut self_closing = markup::is_void(name);
        for id in tokens.children(data) {
            let token = tokens.get(id);
            match token.kind {
                TokenKind::TagAttrList => self.attributes(id),
                TokenKind::TagAttrExpr => {
                    let mut chunk = Chunk::new(ChunkKind::AttributeList);
                    chunk.expr = token.expr;
                    self.emit(chunk);
                }
                TokenKind::TagTrailingSlash => self_closing = true,
                _ => {}
            }
        }
        if self_closing {
            self.push("/>");
            if nested.is_some() {
                return Err(self.error(data, "Self-closing tag cannot have nested lines"));
            }
            return Ok(());
        }
        self.push(">");

        let mut content = tag.and_then(|tag| tokens.get(tag).next);
        while let Some(id) = content {
            let token = tokens.get(id);
            match token.kind {
                TokenKind::PlainText | TokenKind::LineData => self.pieces(Some(id))?,
                TokenKind::OutputEscaped | TokenKind::OutputUnescaped => {
                    if let Some(expr) = token.expr {
                        self.output(expr, token.kind == TokenKind::OutputEscaped);
                    }
                }
                _ => {}
            }
            // `pieces` already walked the rest of the inline text.
            if matches!(token.kind, TokenKind::PlainText | TokenKind::LineData) {
                break;
            }
            content = token.next;
        }

        let before = self.breaks;
        self.depth += 1;
        let result = self.block(nested, false);
        self.depth -= 1;
        result?;
        if breaks && self.breaks > before {
            self.newline();
        }
        self.push("</");
        self.push(name);
        self.push(">");
        Ok(())
    }

    /// `#id` and `.class` notes: the last id wins, classes are joined.
    fn shorthand(&mut self, data: TokenId) {
        let tokens = self.tokens;
        let mut id = None;
        let mut classes: Vec<&str> = Vec::new();
        for note in tokens.children(data) {
            match tokens.kind(note) {
                TokenKind::TagIdNote => id = Some(tokens.text(note)),
                TokenKind::TagClassNote => classes.push(tokens.text(note)),
                _ => {}
            }
        }
        if let Some(id) = id {
            let id = format!(" id=\"{}\"", escape_html(id));
            self.push(&id);
        }
        if !classes.is_empty() {
            let class = format!(" class=\"{}\"", escape_html(&classes.join(" ")));
            self.push(&class);
        }
    }

    fn attributes(&mut self, list: TokenId) {
        let tokens = self.tokens;
        for pair in tokens.children(list) {
            let escape = tokens.kind(pair) == TokenKind::AttrPairEscaped;
            let mut parts = tokens.children(pair);
            let name: String = parts
                .next()
                .map(|name| tokens.children(name).map(|piece| tokens.text(piece)).collect())
                .unwrap_or_default();
            match parts.next().and_then(|value| tokens.get(value).expr) {
                None => {
                    self.push(" ");
                    self.push(&name);
                }
                Some(expr) => self.attribute(name, expr, escape),
            }
        }
    }

    fn attribute(&mut self, name: String, expr: ExprId, escape: bool) {
        match self.fold(expr) {
            Some(value) => {
                let mut text = String::new();
                // Writing into a `String` cannot fail.
                let _ = write_attribute(&mut text, &name, &value, escape);
                self.push(&text);
            }
            None => {
                let mut chunk = Chunk::new(if escape {
                    ChunkKind::AttributeEscaped
                } else {
                    ChunkKind::AttributeUnescaped
                });
                chunk.value = name;
                chunk.expr = Some(expr);
                self.emit(chunk);
            }
        }
    }

    // Control constructs

    fn control(&mut self, id: TokenId, kind: ChunkKind) -> Result<(), CompileError> {
        let tokens = self.tokens;
        let token = tokens.get(id);
        let mut chunk = Chunk::new(kind);
        chunk.expr = token.expr;
        chunk.indent = self.depth;
        let mut body = token.child;
        match kind {
            ChunkKind::ControlEach | ChunkKind::ControlEachPair => {
                let mut names = Vec::new();
                while let Some(variable) = body {
                    if tokens.kind(variable) != TokenKind::ControlEachVariable {
                        break;
                    }
                    names.push(tokens.text(variable));
                    body = tokens.get(variable).next;
                }
                chunk.value = names.join(" ");
            }
            ChunkKind::Mixin => {
                chunk.value = token
                    .expr
                    .and_then(|expr| self.mixin_name(expr))
                    .ok_or_else(|| self.error(id, "Invalid mixin name"))?;
            }
            _ => {}
        }

        let chunk = self.emit(chunk);
        let parent = std::mem::replace(&mut self.current, chunk);
        let result = if kind == ChunkKind::ControlCase {
            self.case(body)
        } else {
            self.block(body, false)
        };
        self.flush();
        self.current = parent;
        result
    }

    fn mixin_name(&self, expr: ExprId) -> Option<String> {
        let exprs = &self.tree.exprs;
        let expr = exprs.get(expr);
        let name = match (expr.op, expr.left) {
            (Op::Call, Some(callee)) => exprs.get(callee).name(),
            _ => expr.name(),
        };
        name.map(str::to_owned)
    }

    /// Branches of a `case`: only `when` and `default` lines.
    fn case(&mut self, first: Option<TokenId>) -> Result<(), CompileError> {
        let tokens = self.tokens;
        for id in tokens.siblings(first) {
            match tokens.kind(id) {
                TokenKind::ControlWhen => self.control(id, ChunkKind::ControlWhen)?,
                TokenKind::ControlDefault => self.control(id, ChunkKind::ControlDefault)?,
                _ => {
                    return Err(self.error(id, "Only 'when' and 'default' can be nested in 'case'"))
                }
            }
        }
        Ok(())
    }

    fn include(&mut self, id: TokenId) {
        let tokens = self.tokens;
        let target = tokens.text(id).trim().to_owned();
        if !self.tree.includes.contains(&target) {
            self.tree.includes.push(target.clone());
        }
        self.newline();
        let mut chunk = Chunk::new(ChunkKind::Include);
        chunk.value = target;
        chunk.indent = self.depth;
        self.emit(chunk);
    }
}
