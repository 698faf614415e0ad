//! Compiled chunk trees.
//!
//! A [`ChunkTree`] is what compilation produces and what the interpreter
//! walks. It owns both the chunks and the expressions they evaluate, is
//! immutable once built, and is shared between renders (and threads) behind
//! an `Arc`.

use std::fmt::Write;

use crate::{ExprArena, ExprId};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ChunkId(u32);

impl ChunkId {
    pub const ROOT: ChunkId = ChunkId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    /// Container for the template body.
    Block,
    Text,
    OutputEscaped,
    OutputUnescaped,
    AttributeEscaped,
    AttributeUnescaped,
    AttributeList,
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
    ControlWhile,
    Include,
    Mixin,
    MixinCall,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub kind: ChunkKind,
    /// Literal text, attribute name, loop variables, include target or
    /// mixin name, depending on `kind`.
    pub value: String,
    pub expr: Option<ExprId>,
    /// Tab depth at the chunk's position; used to re-indent includes.
    pub indent: u32,
    pub children: Vec<ChunkId>,
}

impl Chunk {
    pub fn new(kind: ChunkKind) -> Self {
        Chunk {
            kind,
            value: String::new(),
            expr: None,
            indent: 0,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChunkTree {
    chunks: Vec<Chunk>,
    pub exprs: ExprArena,
    /// Include targets in order of first appearance.
    pub includes: Vec<String>,
}

impl ChunkTree {
    /// Tree with an empty root block.
    pub fn new(exprs: ExprArena) -> Self {
        ChunkTree {
            chunks: vec![Chunk::new(ChunkKind::Block)],
            exprs,
            includes: Vec::new(),
        }
    }

    pub fn alloc(&mut self, chunk: Chunk) -> ChunkId {
        let id = ChunkId(u32::try_from(self.chunks.len()).unwrap_or(u32::MAX));
        self.chunks.push(chunk);
        id
    }

    pub fn push_child(&mut self, parent: ChunkId, child: ChunkId) {
        self.chunks[parent.index()].children.push(child);
    }

    #[inline]
    pub fn get(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ChunkId) -> &mut Chunk {
        &mut self.chunks[id.index()]
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.get(ChunkId::ROOT).children.is_empty()
    }

    /// Indented dump of the tree. With `with_text == false` literal text is
    /// left out, which gives the shape of the template independent of
    /// whitespace and markup.
    pub fn describe(&self, with_text: bool) -> String {
        let mut out = String::new();
        self.describe_into(ChunkId::ROOT, 0, with_text, &mut out);
        out
    }

    fn describe_into(&self, id: ChunkId, depth: usize, with_text: bool, out: &mut String) {
        crate::ensure_sufficient_stack(|| {
            let chunk = self.get(id);
            for _ in 0..depth {
                out.push_str("  ");
            }
            let _ = write!(out, "{:?}", chunk.kind);
            if !chunk.value.is_empty() && (with_text || chunk.kind != ChunkKind::Text) {
                let _ = write!(out, " {:?}", chunk.value);
            }
            if let Some(expr) = chunk.expr {
                let _ = write!(out, " {}", self.exprs.dump(expr));
            }
            out.push('\n');
            for child in &chunk.children {
                self.describe_into(*child, depth + 1, with_text, out);
            }
        });
    }
}
