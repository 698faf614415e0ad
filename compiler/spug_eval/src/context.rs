//! Evaluation context: the scope stack, host bindings and callbacks.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use spug_diagnostic::{Diagnostic, ErrorCallback, Phase};
use spug_ir::{ensure_sufficient_stack, ChunkTree, Value, NULL};
use tracing::warn;

use crate::error::{EvalError, EvalResult};
use crate::mixin::Mixin;
use crate::var::{Call, Place, PlaceRoot, Segment, Var, VarClass, VarData, VarStorage};

/// Include hook: render template `name` into the sink with the given
/// context. The last argument is the chunk tree of the including template.
/// Returns `false` if the template cannot be included.
pub type IncludeCallback<'a> =
    dyn Fn(&str, &mut Context<'a>, &mut dyn fmt::Write, &ChunkTree) -> bool + 'a;

/// One scope.
#[derive(Default)]
struct Frame<'a> {
    vars: FxHashMap<String, VarStorage<'a>>,
    mixins: FxHashMap<String, Rc<Mixin>>,
    /// Owned values that loop variables alias.
    temps: Vec<Value>,
}

/// Iteration plan for `each`.
#[derive(Debug)]
pub enum EachSource {
    /// Nothing to iterate: null, undefined or an empty container.
    Empty,
    Scalar(Value),
    Array {
        place: Place,
        len: usize,
        mutable: bool,
    },
    Dict {
        place: Place,
        keys: Vec<String>,
        mutable: bool,
    },
}

/// Evaluation context of one render.
///
/// Holds a stack of scopes; the bottom one receives host bindings. Values
/// set with [`Context::set_ref`] and [`Context::set_mut`] are borrowed from
/// the caller for `'a`.
pub struct Context<'a> {
    frames: Vec<Frame<'a>>,
    include: Option<Rc<IncludeCallback<'a>>>,
    on_error: Option<Box<ErrorCallback<'a>>>,
    escape_output: bool,
    step_limit: Option<u64>,
    steps: u64,
    /// Reports waiting to be written into the output.
    pending: Vec<String>,
    last_error: Option<String>,
}

impl Default for Context<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Context<'a> {
    pub fn new() -> Self {
        Context {
            frames: vec![Frame::default()],
            include: None,
            on_error: None,
            escape_output: true,
            step_limit: None,
            steps: 0,
            pending: Vec::new(),
            last_error: None,
        }
    }

    fn bind(&mut self, name: &str, storage: VarStorage<'a>) {
        let frame = self.current_frame_mut();
        frame.vars.insert(name.to_owned(), storage);
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.bind(name, VarStorage::value(value.into()));
    }

    /// Bind a read-only view of caller data.
    pub fn set_ref(&mut self, name: &str, value: &'a Value) {
        self.bind(
            name,
            VarStorage::Value {
                data: VarData::Const(value),
                class: None,
            },
        );
    }

    /// Bind caller data that templates may modify.
    pub fn set_mut(&mut self, name: &str, value: &'a mut Value) {
        self.bind(
            name,
            VarStorage::Value {
                data: VarData::Mut(value),
                class: None,
            },
        );
    }

    /// Bind a value whose member calls dispatch to `class`.
    pub fn set_object(&mut self, name: &str, value: impl Into<Value>, class: Rc<VarClass>) {
        self.bind(
            name,
            VarStorage::Value {
                data: VarData::Inline(value.into()),
                class: Some(class),
            },
        );
    }

    pub fn set_fn<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Call<'_>) -> Result<Value, String> + 'static,
    {
        self.bind(name, VarStorage::Function(Rc::new(f)));
    }

    pub fn set_class(&mut self, name: &str, class: VarClass) -> Rc<VarClass> {
        let class = Rc::new(class);
        self.bind(name, VarStorage::Class(Rc::clone(&class)));
        class
    }

    pub fn set_include_callback<F>(&mut self, callback: F)
    where
        F: Fn(&str, &mut Context<'a>, &mut dyn fmt::Write, &ChunkTree) -> bool + 'a,
    {
        self.include = Some(Rc::new(callback));
    }

    /// Route evaluation errors to `callback` instead of the output.
    pub fn set_error_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + 'a,
    {
        self.on_error = Some(Box::new(callback));
    }

    pub fn set_escape_output(&mut self, escape: bool) {
        self.escape_output = escape;
    }

    pub fn escape_output(&self) -> bool {
        self.escape_output
    }

    /// Bound the total number of loop iterations and mixin calls.
    pub fn set_step_limit(&mut self, limit: Option<u64>) {
        self.step_limit = limit;
        self.steps = 0;
    }

    /// Register the default native functions.
    pub fn load_defaults(&mut self) {
        crate::defaults::load(self);
    }

    /// Value bound to `name`, searching outward from the current scope.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let frame = self.find(name)?;
        self.resolve_slot(frame, name)
    }

    pub fn push_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Leave the current scope. The bottom scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn current(&self) -> usize {
        self.frames.len() - 1
    }

    fn current_frame_mut(&mut self) -> &mut Frame<'a> {
        let index = self.current();
        &mut self.frames[index]
    }

    /// Innermost scope binding `name`.
    pub(crate) fn find(&self, name: &str) -> Option<usize> {
        self.frames
            .iter()
            .rposition(|frame| frame.vars.contains_key(name))
    }

    pub(crate) fn storage(&self, frame: usize, name: &str) -> Option<&VarStorage<'a>> {
        self.frames.get(frame)?.vars.get(name)
    }

    /// Declare `name` in the current scope without a value.
    pub(crate) fn declare(&mut self, name: &str) -> EvalResult<Var> {
        let frame = self.current();
        if self.frames[frame].vars.contains_key(name) {
            return Err(EvalError::AlreadyDefined(name.to_owned()));
        }
        self.frames[frame]
            .vars
            .insert(name.to_owned(), VarStorage::Undefined);
        Ok(Var::Slot {
            frame,
            name: name.to_owned(),
        })
    }

    pub(crate) fn store(&mut self, frame: usize, name: &str, storage: VarStorage<'a>) {
        if let Some(frame) = self.frames.get_mut(frame) {
            frame.vars.insert(name.to_owned(), storage);
        }
    }

    // Places

    /// Read the value a variable refers to. `None` for undefined values and
    /// callables.
    pub fn read<'s>(&'s self, var: &'s Var) -> Option<&'s Value> {
        match var {
            Var::Owned(value) => Some(value),
            Var::ConstRef(place) | Var::MutRef(place) => self.resolve(place),
            Var::Slot { frame, name } => self.resolve_slot(*frame, name),
            _ => None,
        }
    }

    /// [`Context::read`] with undefined read as null.
    pub fn value_of<'s>(&'s self, var: &'s Var) -> &'s Value {
        self.read(var).unwrap_or(&NULL)
    }

    pub(crate) fn resolve(&self, place: &Place) -> Option<&Value> {
        let mut value = match &place.root {
            PlaceRoot::Slot { frame, name } => self.resolve_slot(*frame, name)?,
            PlaceRoot::Temp { frame, index } => self.frames.get(*frame)?.temps.get(*index)?,
        };
        for segment in &place.path {
            value = match segment {
                Segment::Key(key) => value.get(key)?,
                Segment::Index(index) => value.get_index(*index)?,
            };
        }
        Some(value)
    }

    fn resolve_slot(&self, frame: usize, name: &str) -> Option<&Value> {
        match self.storage(frame, name)? {
            VarStorage::Value { data, .. } => Some(data.get()),
            VarStorage::Alias { place, .. } => ensure_sufficient_stack(|| self.resolve(place)),
            _ => None,
        }
    }

    pub(crate) fn resolve_mut(&mut self, place: &Place) -> Option<&mut Value> {
        let mut value = match &place.root {
            PlaceRoot::Slot { frame, name } => self.resolve_slot_mut(*frame, name)?,
            PlaceRoot::Temp { frame, index } => {
                self.frames.get_mut(*frame)?.temps.get_mut(*index)?
            }
        };
        for segment in &place.path {
            value = match segment {
                Segment::Key(key) => value.get_mut(key)?,
                Segment::Index(index) => value.get_index_mut(*index)?,
            };
        }
        Some(value)
    }

    fn resolve_slot_mut(&mut self, frame: usize, name: &str) -> Option<&mut Value> {
        if let VarStorage::Alias { place, mutable } = self.storage(frame, name)? {
            if !*mutable {
                return None;
            }
            let place = place.clone();
            return self.resolve_mut(&place);
        }
        match self.frames.get_mut(frame)?.vars.get_mut(name)? {
            VarStorage::Value { data, .. } => data.get_mut(),
            _ => None,
        }
    }

    /// True if writes through `place` are allowed.
    pub(crate) fn is_mutable(&self, place: &Place) -> bool {
        match &place.root {
            PlaceRoot::Temp { .. } => true,
            PlaceRoot::Slot { frame, name } => match self.storage(*frame, name) {
                Some(VarStorage::Value { data, .. }) => data.is_mutable(),
                Some(VarStorage::Alias { place, mutable }) => *mutable && self.is_mutable(place),
                _ => false,
            },
        }
    }

    /// Follow aliases until the root is a slot that holds a value or a
    /// temporary. Aliases always point at such roots, so the chain is
    /// acyclic.
    pub(crate) fn canonical(&self, mut place: Place) -> Place {
        loop {
            let PlaceRoot::Slot { frame, name } = &place.root else {
                return place;
            };
            match self.storage(*frame, name) {
                Some(VarStorage::Alias { place: target, .. }) => {
                    let mut next = target.clone();
                    next.path.extend(place.path.drain(..));
                    place = next;
                }
                _ => return place,
            }
        }
    }

    /// Bind `name` in the current scope as an alias of `place`.
    pub fn bind_ref(&mut self, name: &str, place: Place, mutable: bool) {
        let place = self.canonical(place);
        self.bind(name, VarStorage::Alias { place, mutable });
    }

    /// Keep `value` alive for the current scope and return its place.
    pub fn push_temp(&mut self, value: Value) -> Place {
        let frame = self.current();
        let temps = &mut self.frames[frame].temps;
        temps.push(value);
        Place::temp(frame, temps.len() - 1)
    }

    /// Evaluate-once iteration plan for `each` over `var`.
    pub fn each_source(&mut self, var: Var) -> EachSource {
        let (place, mutable) = match var {
            Var::Owned(value) if value.is_container() => (self.push_temp(value), true),
            Var::Owned(value) if value.is_null() => return EachSource::Empty,
            Var::Owned(value) => return EachSource::Scalar(value),
            other => match other.place() {
                Some(place) => {
                    let mutable = self.is_mutable(&place);
                    (self.canonical(place), mutable)
                }
                None => return EachSource::Empty,
            },
        };
        match self.resolve(&place) {
            Some(Value::Array(items)) if !items.is_empty() => EachSource::Array {
                len: items.len(),
                place,
                mutable,
            },
            Some(Value::Dict(entries)) if !entries.is_empty() => EachSource::Dict {
                keys: entries.keys().cloned().collect(),
                place,
                mutable,
            },
            Some(value) if !value.is_container() && !value.is_null() => {
                EachSource::Scalar(value.clone())
            }
            _ => EachSource::Empty,
        }
    }

    // Mixins

    /// Register a mixin in the current scope.
    pub fn define_mixin(&mut self, mixin: Mixin) -> EvalResult<()> {
        let frame = self.current_frame_mut();
        if frame.mixins.contains_key(&mixin.name) {
            return Err(EvalError::MixinRedefined(mixin.name));
        }
        frame.mixins.insert(mixin.name.clone(), Rc::new(mixin));
        Ok(())
    }

    pub fn mixin(&self, name: &str) -> Option<Rc<Mixin>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.mixins.get(name))
            .cloned()
    }

    // Host hooks

    /// Run the include callback. `false` without a callback.
    pub fn include(&mut self, name: &str, out: &mut dyn fmt::Write, tree: &ChunkTree) -> bool {
        match self.include.clone() {
            Some(callback) => callback(name, self, out, tree),
            None => false,
        }
    }

    /// Count one loop iteration or mixin call against the step limit.
    /// Returns `false` once the limit is exceeded.
    pub fn step(&mut self) -> bool {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => {
                if self.steps == limit + 1 {
                    self.report_error(&EvalError::StepLimit);
                }
                false
            }
            _ => true,
        }
    }

    pub fn report_error(&mut self, error: &EvalError) {
        self.report(&error.to_string());
    }

    /// Report an evaluation error: to the error callback when one is set,
    /// otherwise queued for the output.
    pub fn report(&mut self, message: &str) {
        let message = Diagnostic::new(Phase::Context, message).to_string();
        warn!(%message, "evaluation error");
        match self.on_error.as_mut() {
            Some(callback) => callback(&message),
            None => self.pending.push(message.clone()),
        }
        self.last_error = Some(message);
    }

    /// Reports queued since the last call.
    pub fn take_pending_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    /// Most recent report since the last call.
    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }
}
