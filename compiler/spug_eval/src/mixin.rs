//! Mixins: named, parameterized chunk subtrees.

use std::sync::Arc;

use spug_ir::{ChunkId, ChunkTree, ExprArena, ExprId, Op, Value};

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::eval::literal_items;

#[derive(Clone, Debug, PartialEq)]
pub struct MixinParam {
    pub name: String,
    /// Default value expression, evaluated in the mixin's scope.
    pub default: Option<ExprId>,
}

/// A mixin definition bound to the template that owns its body.
#[derive(Clone, Debug)]
pub struct Mixin {
    pub name: String,
    pub tree: Arc<ChunkTree>,
    pub body: ChunkId,
    pub params: Vec<MixinParam>,
}

impl Mixin {
    /// Build a mixin from its definition chunk. The chunk's expression is
    /// `name` or `name(required.., name = default..)`.
    pub fn from_definition(tree: &Arc<ChunkTree>, body: ChunkId) -> EvalResult<Self> {
        let chunk = tree.get(body);
        let params = match chunk.expr {
            Some(expr) => parse_params(&tree.exprs, expr)?,
            None => Vec::new(),
        };
        Ok(Mixin {
            name: chunk.value.clone(),
            tree: Arc::clone(tree),
            body,
            params,
        })
    }
}

fn parse_params(exprs: &ExprArena, id: ExprId) -> EvalResult<Vec<MixinParam>> {
    let expr = exprs.get(id);
    if expr.is_token {
        return Ok(Vec::new());
    }
    let (Op::Call, Some(args)) = (expr.op, expr.right) else {
        return Err(EvalError::InvalidMixin);
    };
    let mut params: Vec<MixinParam> = Vec::new();
    for (item, _) in literal_items(exprs, args) {
        let item = exprs.get(item);
        let param = match (item.op, item.name(), item.left, item.right) {
            (Op::NoOp, Some(name), None, None) => {
                // Required parameters come first.
                if params.iter().any(|param| param.default.is_some()) {
                    return Err(EvalError::InvalidMixin);
                }
                MixinParam {
                    name: name.to_owned(),
                    default: None,
                }
            }
            (Op::Assignment, _, Some(name), Some(default)) => MixinParam {
                name: exprs
                    .get(name)
                    .name()
                    .ok_or(EvalError::InvalidMixin)?
                    .to_owned(),
                default: Some(default),
            },
            _ => return Err(EvalError::InvalidMixin),
        };
        params.push(param);
    }
    Ok(params)
}

impl Context<'_> {
    /// Open the scope of a mixin call and bind its parameters: positional
    /// arguments first, then defaults. Returns `false` (scope closed again)
    /// if a required argument is missing.
    pub fn enter_mixin(&mut self, mixin: &Mixin, args: Vec<Value>) -> bool {
        self.push_scope();
        let mut args = args.into_iter();
        for param in &mixin.params {
            let value = match (args.next(), param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => {
                    let var = self.exec(&mixin.tree.exprs, default);
                    self.value_of(&var).clone()
                }
                (None, None) => {
                    self.report_error(&EvalError::MissingArgument {
                        mixin: mixin.name.clone(),
                        param: param.name.clone(),
                    });
                    self.pop_scope();
                    return false;
                }
            };
            self.set(&param.name, value);
        }
        true
    }
}
