//! Expression evaluation over the scope stack.
//!
//! Evaluation walks the expression tree recursively and produces a [`Var`].
//! Errors propagate with `?` to [`Context::exec`], which reports them and
//! yields `Undefined`.

use smallvec::SmallVec;
use spug_ir::{ensure_sufficient_stack, Block, Dict, ExprArena, ExprId, Op, Value};

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::operators::{apply_assignment, binary, step, unary};
use crate::var::{Call, NativeFn, Place, PlaceRoot, Segment, Var, VarData, VarStorage};

/// How a subexpression is evaluated.
#[derive(Copy, Clone, Debug, Default)]
struct Mode {
    /// Unknown names and failed lookups are `SoftUndefined`, not errors.
    soft: bool,
    /// The result is assigned to: a missing dictionary key becomes
    /// `Writable`.
    target: bool,
}

impl Mode {
    const SOFT: Mode = Mode {
        soft: true,
        target: false,
    };

    const TARGET: Mode = Mode {
        soft: false,
        target: true,
    };

    fn operand(self) -> Mode {
        Mode {
            soft: self.soft,
            target: false,
        }
    }
}

/// Member key of `.name` and `[key]`.
enum Member {
    Name(String),
    Index(i64),
}

impl Member {
    fn from_value(value: &Value) -> Member {
        match value {
            Value::Int(index) => Member::Index(*index),
            #[allow(clippy::cast_possible_truncation, reason = "integral floats index arrays")]
            Value::Float(index) if index.fract() == 0.0 => Member::Index(*index as i64),
            _ => Member::Name(value.to_text().into_owned()),
        }
    }

    fn text(&self) -> String {
        match self {
            Member::Name(name) => name.clone(),
            Member::Index(index) => index.to_string(),
        }
    }
}

enum Lookup {
    Found(Segment),
    Size(usize),
    Missing,
}

fn lookup(container: &Value, member: &Member) -> Lookup {
    match (container, member) {
        (Value::Dict(entries), _) => {
            let key = member.text();
            if entries.contains_key(&key) {
                Lookup::Found(Segment::Key(key))
            } else if key == "length" {
                Lookup::Size(entries.len())
            } else {
                Lookup::Missing
            }
        }
        (Value::Array(items), Member::Index(index)) => match usize::try_from(*index) {
            Ok(index) if index < items.len() => Lookup::Found(Segment::Index(index)),
            _ => Lookup::Missing,
        },
        (Value::Array(items), Member::Name(name)) if name == "length" => Lookup::Size(items.len()),
        (Value::Str(text), Member::Name(name)) if name == "length" => {
            Lookup::Size(text.chars().count())
        }
        _ => Lookup::Missing,
    }
}

/// Elements of a bracket group: `[a, b]`, `{k: v}` and call arguments.
///
/// Each item comes with a flag telling whether its own bracket kind has
/// already been consumed by the group (the single-element case, where the
/// item is the group node itself).
pub(crate) fn literal_items(exprs: &ExprArena, id: ExprId) -> SmallVec<[(ExprId, bool); 8]> {
    let expr = exprs.get(id);
    let mut items = SmallVec::new();
    if expr.is_empty_token() || (expr.is_leaf() && matches!(expr.op, Op::Subscript | Op::Construct)) {
        return items;
    }
    match (expr.op, expr.left, expr.right) {
        (Op::Comma, Some(left), Some(right)) => {
            comma_items(exprs, left, &mut items);
            comma_items(exprs, right, &mut items);
        }
        (Op::NoOp, Some(inner), None) => items.push((inner, false)),
        _ => items.push((id, true)),
    }
    items
}

fn comma_items(exprs: &ExprArena, id: ExprId, items: &mut SmallVec<[(ExprId, bool); 8]>) {
    let expr = exprs.get(id);
    match (expr.op, expr.block, expr.left, expr.right) {
        (Op::Comma, Block::None, Some(left), Some(right)) => {
            comma_items(exprs, left, items);
            comma_items(exprs, right, items);
        }
        _ => items.push((id, false)),
    }
}

/// Elements of an unbracketed top-level `a, b, c`; a single element for
/// any other expression.
pub fn sequence_items(exprs: &ExprArena, id: ExprId) -> Vec<ExprId> {
    let mut items = SmallVec::new();
    comma_items(exprs, id, &mut items);
    items.into_iter().map(|(item, _)| item).collect()
}

impl<'a> Context<'a> {
    /// Evaluate an expression. Errors are reported and yield `Undefined`.
    pub fn exec(&mut self, exprs: &ExprArena, id: ExprId) -> Var {
        self.exec_in(exprs, id, Mode::default())
    }

    /// Evaluate a guard: unknown names are undefined instead of errors.
    pub fn probe(&mut self, exprs: &ExprArena, id: ExprId) -> Var {
        self.exec_in(exprs, id, Mode::SOFT)
    }

    /// Evaluate call arguments, `(a, b)` or `()`, to values.
    pub fn exec_args(&mut self, exprs: &ExprArena, id: ExprId) -> Option<Vec<Value>> {
        match self.eval_items(exprs, id, Mode::default()) {
            Ok(values) => Some(values),
            Err(error) => {
                self.report_error(&error);
                None
            }
        }
    }

    /// Boolean coercion of a variable; undefined is false.
    pub fn truthy(&self, var: &Var) -> bool {
        self.value_of(var).as_bool()
    }

    fn exec_in(&mut self, exprs: &ExprArena, id: ExprId, mode: Mode) -> Var {
        match self.eval(exprs, id, mode) {
            Ok(var) => var,
            Err(error) => {
                self.report_error(&error);
                Var::Undefined
            }
        }
    }

    fn eval(&mut self, exprs: &ExprArena, id: ExprId, mode: Mode) -> EvalResult<Var> {
        ensure_sufficient_stack(|| self.eval_node(exprs, id, mode, false))
    }

    fn eval_value(&mut self, exprs: &ExprArena, id: ExprId, mode: Mode) -> EvalResult<Value> {
        let var = self.eval(exprs, id, mode.operand())?;
        Ok(self.take_value(var))
    }

    /// Owned value of a variable.
    fn take_value(&self, var: Var) -> Value {
        match var {
            Var::Owned(value) => value,
            other => self.value_of(&other).clone(),
        }
    }

    fn eval_items(&mut self, exprs: &ExprArena, id: ExprId, mode: Mode) -> EvalResult<Vec<Value>> {
        literal_items(exprs, id)
            .into_iter()
            .map(|(item, raw)| {
                let var = ensure_sufficient_stack(|| self.eval_node(exprs, item, mode.operand(), raw))?;
                Ok(self.take_value(var))
            })
            .collect()
    }

    /// `raw` skips the node's bracket kind (already consumed by a parent).
    fn eval_node(&mut self, exprs: &ExprArena, id: ExprId, mode: Mode, raw: bool) -> EvalResult<Var> {
        let expr = exprs.get(id);
        if !raw {
            match expr.block {
                Block::Composition => {
                    return Ok(Var::Owned(Value::Array(self.eval_items(exprs, id, mode)?)));
                }
                Block::Operator => return self.dict_literal(exprs, id, mode).map(Var::Owned),
                Block::None | Block::Parenthesis => {}
            }
        }
        let (left, right) = (expr.left, expr.right);
        match (expr.op, left, right) {
            (Op::NoOp, Some(inner), _) => self.eval(exprs, inner, mode),
            (Op::NoOp, None, _) => Ok(match expr.name() {
                Some(name) => self.lookup_name(name, mode)?,
                None if expr.is_token => Var::Owned(Value::Null),
                None => Var::Owned(expr.value.clone()),
            }),
            (Op::Subscript, None, None) => Ok(Var::Owned(Value::empty_array())),
            (Op::Construct, None, None) => Ok(Var::Owned(Value::empty_dict())),
            (Op::Var, Some(name), _) => match exprs.get(name).name() {
                Some(name) => self.declare(name),
                None => Err(EvalError::NotAssignable),
            },
            (Op::Dot, Some(base), Some(member)) => {
                let base = self.eval(exprs, base, mode.operand())?;
                let member = match exprs.get(member).name() {
                    Some(name) => Member::Name(name.to_owned()),
                    None => Member::from_value(&exprs.get(member).value),
                };
                Ok(self.member(base, &member, mode.target))
            }
            (Op::Subscript, Some(base), Some(key)) => {
                let base = self.eval(exprs, base, mode.operand())?;
                let key = ensure_sufficient_stack(|| self.eval_node(exprs, key, mode.operand(), true))?;
                let member = Member::from_value(self.value_of(&key));
                Ok(self.member(base, &member, mode.target))
            }
            (Op::Call, Some(callee), args) => {
                let callee = self.eval(exprs, callee, mode.operand())?;
                let args = match args {
                    Some(args) => self.eval_items(exprs, args, mode)?,
                    None => Vec::new(),
                };
                self.call(callee, &args)
            }
            (Op::PrefixIncr | Op::PrefixDecr, Some(operand), _) => {
                let target = self.eval(exprs, operand, Mode::TARGET)?;
                step(self.target_mut(&target)?, expr.op == Op::PrefixIncr)?;
                Ok(settle(target))
            }
            (Op::SuffixIncr | Op::SuffixDecr, Some(operand), _) => {
                let target = self.eval(exprs, operand, Mode::TARGET)?;
                let old = self.value_of(&target).clone();
                step(self.target_mut(&target)?, expr.op == Op::SuffixIncr)?;
                Ok(Var::Owned(old))
            }
            (Op::Minus | Op::Neg | Op::BitNot, Some(operand), _) => {
                let operand = self.eval(exprs, operand, mode.operand())?;
                unary(expr.op, self.value_of(&operand)).map(Var::Owned)
            }
            (Op::And | Op::Or, Some(left), Some(right)) => {
                let left = self.eval(exprs, left, mode.operand())?;
                let truth = self.truthy(&left);
                if (expr.op == Op::And) != truth {
                    return Ok(self.deciding(left));
                }
                let right = self.eval(exprs, right, mode.operand())?;
                Ok(self.deciding(right))
            }
            (Op::ConditionalSwitch, Some(branch), Some(otherwise)) => {
                let branch = exprs.get(branch);
                let (Op::Conditional, Some(condition), Some(then)) =
                    (branch.op, branch.left, branch.right)
                else {
                    return Err(EvalError::Unsupported(Op::ConditionalSwitch.symbol()));
                };
                let condition = self.eval(exprs, condition, Mode::SOFT)?;
                let chosen = if self.truthy(&condition) { then } else { otherwise };
                self.eval(exprs, chosen, mode)
            }
            (Op::Sequence, Some(first), Some(second)) => {
                self.eval(exprs, first, mode.operand())?;
                self.eval(exprs, second, mode)
            }
            (Op::Assignment, Some(target), Some(value)) => {
                let value = self.eval(exprs, value, mode.operand())?;
                let target = self.eval(exprs, target, Mode::TARGET)?;
                self.assign(target, &value)
            }
            (op, Some(target), Some(value)) if op.is_assignment() => {
                let value = self.eval_value(exprs, value, mode)?;
                let target = self.eval(exprs, target, Mode::TARGET)?;
                apply_assignment(op, self.target_mut(&target)?, value)?;
                Ok(settle(target))
            }
            (
                Op::Mult
                | Op::Div
                | Op::Rem
                | Op::Sum
                | Op::Sub
                | Op::ShiftLeft
                | Op::ShiftRight
                | Op::Lt
                | Op::LtEq
                | Op::Gt
                | Op::GtEq
                | Op::Eq
                | Op::NotEq
                | Op::BitAnd
                | Op::BitXor
                | Op::BitOr
                | Op::Comma,
                Some(left),
                Some(right),
            ) => {
                let left = self.eval(exprs, left, mode.operand())?;
                let right = self.eval(exprs, right, mode.operand())?;
                binary(expr.op, self.value_of(&left), self.value_of(&right)).map(Var::Owned)
            }
            (op, _, _) => Err(EvalError::Unsupported(op.symbol())),
        }
    }

    fn lookup_name(&self, name: &str, mode: Mode) -> EvalResult<Var> {
        let Some(frame) = self.find(name) else {
            return if mode.soft {
                Ok(Var::SoftUndefined)
            } else {
                Err(EvalError::InvalidVariable(name.to_owned()))
            };
        };
        Ok(match self.storage(frame, name) {
            Some(VarStorage::Function(func)) => Var::Method {
                func: func.clone(),
                this: None,
            },
            Some(VarStorage::Class(class)) => Var::Class(class.clone()),
            _ => Var::Slot {
                frame,
                name: name.to_owned(),
            },
        })
    }

    /// Result of `&&` / `||`: the deciding operand, with undefined and null
    /// read as `false`.
    fn deciding(&self, var: Var) -> Var {
        if self.value_of(&var).is_null() {
            Var::Owned(Value::Bool(false))
        } else {
            var
        }
    }

    fn dict_literal(&mut self, exprs: &ExprArena, id: ExprId, mode: Mode) -> EvalResult<Value> {
        let mut dict = Dict::new();
        for (item, _) in literal_items(exprs, id) {
            let entry = exprs.get(item);
            let (Op::Colon, Some(key), Some(value)) = (entry.op, entry.left, entry.right) else {
                return Err(EvalError::InvalidDictionary);
            };
            let key = match exprs.get(key).name() {
                Some(name) => name.to_owned(),
                None => self.eval_value(exprs, key, mode)?.to_text().into_owned(),
            };
            let value = self.eval_value(exprs, value, mode)?;
            dict.insert(key, value);
        }
        Ok(Value::Dict(dict))
    }

    fn member(&self, base: Var, member: &Member, target: bool) -> Var {
        match base {
            Var::Class(class) => match member {
                Member::Name(name) => class
                    .static_fn(name)
                    .map_or(Var::SoftUndefined, |func| Var::Method {
                        func: func.clone(),
                        this: None,
                    }),
                Member::Index(_) => Var::SoftUndefined,
            },
            Var::Owned(value) => match lookup(&value, member) {
                Lookup::Found(Segment::Key(key)) => {
                    Var::Owned(value.get(&key).cloned().unwrap_or_default())
                }
                Lookup::Found(Segment::Index(index)) => {
                    Var::Owned(value.get_index(index).cloned().unwrap_or_default())
                }
                Lookup::Size(size) => Var::Owned(Value::from(size)),
                Lookup::Missing => Var::SoftUndefined,
            },
            base => {
                let Some(place) = base.place() else {
                    return Var::SoftUndefined;
                };
                if let Member::Name(name) = member {
                    if let Some(func) = self.member_fn(&place, name) {
                        return Var::Method {
                            func,
                            this: self.resolve(&place).cloned(),
                        };
                    }
                }
                let Some(container) = self.resolve(&place) else {
                    return Var::SoftUndefined;
                };
                match lookup(container, member) {
                    Lookup::Found(segment) => {
                        let child = place.child(segment);
                        if self.is_mutable(&place) {
                            Var::MutRef(child)
                        } else {
                            Var::ConstRef(child)
                        }
                    }
                    Lookup::Size(size) => Var::Owned(Value::from(size)),
                    Lookup::Missing if target && container.is_dict() => Var::Writable {
                        container: place,
                        key: member.text(),
                    },
                    Lookup::Missing => Var::SoftUndefined,
                }
            }
        }
    }

    /// Member function of the class a slot's value was registered with.
    fn member_fn(&self, place: &Place, name: &str) -> Option<NativeFn> {
        if !place.path.is_empty() {
            return None;
        }
        let PlaceRoot::Slot { frame, name: slot } = &place.root else {
            return None;
        };
        match self.storage(*frame, slot)? {
            VarStorage::Value {
                class: Some(class), ..
            } => class.member_fn(name).cloned(),
            VarStorage::Alias { place, .. } => self.member_fn(place, name),
            _ => None,
        }
    }

    fn call(&self, callee: Var, args: &[Value]) -> EvalResult<Var> {
        let Var::Method { func, this } = callee else {
            return Err(EvalError::NotCallable);
        };
        let call = Call {
            this: this.as_ref(),
            args,
        };
        func(&call).map(Var::Owned).map_err(EvalError::Native)
    }

    /// `target = value`.
    fn assign(&mut self, target: Var, value: &Var) -> EvalResult<Var> {
        match target {
            Var::Slot { frame, name } => {
                if let Some(VarStorage::Value {
                    data: VarData::Mut(_),
                    ..
                }) = self.storage(frame, &name)
                {
                    // Host data bound with `set_mut` is written in place.
                    let value = self.value_of(value).clone();
                    if let Some(slot) = self.resolve_mut(&Place::slot(frame, name.as_str())) {
                        *slot = value;
                    }
                    return Ok(Var::Slot { frame, name });
                }
                let storage = self.storage_for(value, frame, &name);
                self.store(frame, &name, storage);
                Ok(Var::Slot { frame, name })
            }
            Var::MutRef(place) => {
                let value = self.value_of(value).clone();
                *self.resolve_mut(&place).ok_or(EvalError::ReadOnly)? = value;
                Ok(Var::MutRef(place))
            }
            Var::Writable { container, key } => {
                let value = self.value_of(value).clone();
                let inserted = self
                    .resolve_mut(&container)
                    .ok_or(EvalError::ReadOnly)?
                    .insert(key.clone(), value);
                if !inserted {
                    return Err(EvalError::NotAssignable);
                }
                Ok(Var::MutRef(container.child(Segment::Key(key))))
            }
            Var::ConstRef(_) => Err(EvalError::ReadOnly),
            _ => Err(EvalError::NotAssignable),
        }
    }

    /// Storage a slot gets when `value` is assigned to it. Containers are
    /// shared by alias when the aliased root lives at least as long as the
    /// slot; everything else is copied.
    fn storage_for(&self, value: &Var, frame: usize, name: &str) -> VarStorage<'a> {
        match value {
            Var::Method { func, this: None } => return VarStorage::Function(func.clone()),
            Var::Class(class) => return VarStorage::Class(class.clone()),
            _ => {}
        }
        if let Some(place) = value.place() {
            if self.resolve(&place).is_some_and(Value::is_container) {
                let mutable = self.is_mutable(&place);
                let place = self.canonical(place);
                let is_self = matches!(
                    &place.root,
                    PlaceRoot::Slot { frame: f, name: n } if *f == frame && n == name
                );
                if !is_self && place.root.frame() <= frame {
                    return VarStorage::Alias { place, mutable };
                }
            }
        }
        VarStorage::value(self.value_of(value).clone())
    }

    /// Mutable value behind an assignable variable. A declared but unset
    /// slot becomes null; a missing dictionary key is inserted as null.
    fn target_mut(&mut self, target: &Var) -> EvalResult<&mut Value> {
        match target {
            Var::Slot { frame, name } => {
                if matches!(self.storage(*frame, name), Some(VarStorage::Undefined)) {
                    self.store(*frame, name, VarStorage::value(Value::Null));
                }
                self.resolve_mut(&Place::slot(*frame, name.as_str()))
                    .ok_or(EvalError::ReadOnly)
            }
            Var::MutRef(place) => self.resolve_mut(place).ok_or(EvalError::ReadOnly),
            Var::Writable { container, key } => match self.resolve_mut(container) {
                Some(Value::Dict(entries)) => Ok(entries.entry(key.clone()).or_default()),
                Some(_) => Err(EvalError::NotAssignable),
                None => Err(EvalError::ReadOnly),
            },
            Var::ConstRef(_) => Err(EvalError::ReadOnly),
            _ => Err(EvalError::NotAssignable),
        }
    }
}

/// A written `Writable` is a reference to the inserted key.
fn settle(target: Var) -> Var {
    match target {
        Var::Writable { container, key } => Var::MutRef(container.child(Segment::Key(key))),
        other => other,
    }
}
