//! Token tree produced by the markup lexer.
//!
//! Tokens live in a [`TokenTree`] arena and are linked to their parent,
//! siblings and first/last child, so the lexer can append children in O(1)
//! and the compiler can walk forward and look back at the previous sibling.
//! A token's text is a [`Span`] into the template source.

use std::fmt::Write;

use crate::{ExprArena, ExprId, Span};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct TokenId(u32);

impl TokenId {
    pub const ROOT: TokenId = TokenId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Root,

    /// One source line; first child is its data token, later children are
    /// nested lines.
    Line,
    /// Tag line: `Tag` first, then tag info and content.
    LineData,
    LinePlainText,
    LinePiped,
    LineComment,
    /// Lone `.`: nested lines are text.
    LineDot,
    LineOut,
    LineCode,
    LineCodeBlock,

    PlainText,

    Tag,
    TagClassNote,
    TagIdNote,
    TagAttrList,
    TagAttrExpr,
    TagTrailingSlash,
    TagTrailingDot,
    TagTrailingEq,
    TagTrailingNEq,

    AttrPairEscaped,
    AttrPairUnescaped,
    AttrName,
    AttrValue,

    CommentHtml,
    CommentTemplate,

    PipeMark,

    OutputEscaped,
    OutputUnescaped,
    Code,

    ControlIf,
    ControlUnless,
    ControlElseIf,
    ControlElse,
    ControlCase,
    ControlWhen,
    ControlDefault,
    ControlEach,
    ControlEachPair,
    ControlEachVariable,
    ControlWhile,
    ControlMixin,

    MixinCall,
    MixinArgs,

    Include,
    Doctype,
}

impl TokenKind {
    /// Line kinds whose nested lines are literal text.
    pub fn nests_plain_text(self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::LineDot | TokenKind::LinePlainText
        )
    }
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub expr: Option<ExprId>,
    pub parent: Option<TokenId>,
    pub prev: Option<TokenId>,
    pub next: Option<TokenId>,
    pub child: Option<TokenId>,
    pub tail: Option<TokenId>,
}

/// Token arena plus the expressions the lexer parsed along the way.
#[derive(Clone, Debug)]
pub struct TokenTree<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pub exprs: ExprArena,
}

impl<'src> TokenTree<'src> {
    /// Tree holding only the root token.
    pub fn new(source: &'src str) -> Self {
        let mut tree = TokenTree {
            source,
            tokens: Vec::new(),
            exprs: ExprArena::new(),
        };
        tree.alloc(TokenKind::Root, Span::from_range(0..source.len()), None);
        tree
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    /// Allocate a detached token.
    pub fn alloc(&mut self, kind: TokenKind, span: Span, expr: Option<ExprId>) -> TokenId {
        let id = TokenId(u32::try_from(self.tokens.len()).unwrap_or(u32::MAX));
        self.tokens.push(Token {
            kind,
            span,
            expr,
            parent: None,
            prev: None,
            next: None,
            child: None,
            tail: None,
        });
        id
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: TokenId, child: TokenId) {
        let tail = self.tokens[parent.index()].tail;
        {
            let token = &mut self.tokens[child.index()];
            token.parent = Some(parent);
            token.prev = tail;
            token.next = None;
        }
        match tail {
            Some(tail) => self.tokens[tail.index()].next = Some(child),
            None => self.tokens[parent.index()].child = Some(child),
        }
        self.tokens[parent.index()].tail = Some(child);
    }

    /// Allocate a token and append it to `parent`.
    pub fn add(
        &mut self,
        parent: TokenId,
        kind: TokenKind,
        span: Span,
        expr: Option<ExprId>,
    ) -> TokenId {
        let id = self.alloc(kind, span, expr);
        self.append(parent, id);
        id
    }

    #[inline]
    pub fn get(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }

    /// Close a token's span once the lexer knows where it ends.
    pub fn set_span(&mut self, id: TokenId, span: Span) {
        self.tokens[id.index()].span = span;
    }

    #[inline]
    pub fn kind(&self, id: TokenId) -> TokenKind {
        self.get(id).kind
    }

    /// Source text of a token.
    pub fn text(&self, id: TokenId) -> &'src str {
        self.get(id).span.slice(self.source)
    }

    /// Iterate `first` and its following siblings.
    pub fn siblings(&self, first: Option<TokenId>) -> Siblings<'_, 'src> {
        Siblings { tree: self, next: first }
    }

    /// Iterate the children of `parent`.
    pub fn children(&self, parent: TokenId) -> Siblings<'_, 'src> {
        self.siblings(self.get(parent).child)
    }

    /// Indented dump, one token per line: `Kind "text" expr`.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(TokenId::ROOT, 0, &mut out);
        out
    }

    fn describe_into(&self, id: TokenId, depth: usize, out: &mut String) {
        crate::ensure_sufficient_stack(|| {
            let token = self.get(id);
            for _ in 0..depth {
                out.push_str("  ");
            }
            let _ = write!(out, "{:?}", token.kind);
            if token.kind != TokenKind::Root && !token.span.is_empty() {
                let _ = write!(out, " {:?}", self.text(id));
            }
            if let Some(expr) = token.expr {
                let _ = write!(out, " {}", self.exprs.dump(expr));
            }
            out.push('\n');
            for child in self.children(id) {
                self.describe_into(child, depth + 1, out);
            }
        });
    }
}

pub struct Siblings<'t, 'src> {
    tree: &'t TokenTree<'src>,
    next: Option<TokenId>,
}

impl Iterator for Siblings<'_, '_> {
    type Item = TokenId;

    fn next(&mut self) -> Option<TokenId> {
        let current = self.next?;
        self.next = self.tree.get(current).next;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_links_siblings() {
        let source = "p one two";
        let mut tree = TokenTree::new(source);
        let line = tree.add(TokenId::ROOT, TokenKind::Line, Span::DUMMY, None);
        let a = tree.add(line, TokenKind::Tag, Span::new(0, 1), None);
        let b = tree.add(line, TokenKind::PlainText, Span::new(2, 9), None);

        assert_eq!(tree.children(line).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.get(b).prev, Some(a));
        assert_eq!(tree.get(a).next, Some(b));
        assert_eq!(tree.get(line).tail, Some(b));
        assert_eq!(tree.get(b).parent, Some(line));
        assert_eq!(tree.text(b), "one two");
    }

    #[test]
    fn test_describe() {
        let mut tree = TokenTree::new("div");
        let line = tree.add(TokenId::ROOT, TokenKind::Line, Span::DUMMY, None);
        tree.add(line, TokenKind::Tag, Span::new(0, 3), None);
        assert_eq!(tree.describe(), "Root\n  Line\n    Tag \"div\"\n");
    }
}
