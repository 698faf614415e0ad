//! Runtime variable model.
//!
//! A [`Var`] is the result of evaluating an expression. It either owns a
//! value or names a [`Place`]: a scope slot or scope-owned temporary plus a
//! key/index path into it. Places are plain indices, so a `Var` never
//! borrows from the context and can be held across further evaluation;
//! reading it goes back through [`Context::read`](crate::Context::read).
//!
//! A [`VarStorage`] is what a scope slot holds.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use spug_ir::Value;

/// Arguments of a native call. `this` is the receiver of a member call.
pub struct Call<'c> {
    pub this: Option<&'c Value>,
    pub args: &'c [Value],
}

impl Call<'_> {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

/// Host callable. An `Err` message is reported as an evaluation error.
pub type NativeFn = Rc<dyn Fn(&Call<'_>) -> Result<Value, String>>;

/// Class object: static functions (`Class.fn()`) and member functions
/// (`obj.fn()` on values registered with the class).
#[derive(Default)]
pub struct VarClass {
    pub name: String,
    statics: FxHashMap<String, NativeFn>,
    members: FxHashMap<String, NativeFn>,
}

impl VarClass {
    pub fn new(name: impl Into<String>) -> Self {
        VarClass {
            name: name.into(),
            ..VarClass::default()
        }
    }

    #[must_use]
    pub fn with_static<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Call<'_>) -> Result<Value, String> + 'static,
    {
        self.statics.insert(name.into(), Rc::new(f));
        self
    }

    #[must_use]
    pub fn with_member<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Call<'_>) -> Result<Value, String> + 'static,
    {
        self.members.insert(name.into(), Rc::new(f));
        self
    }

    pub fn static_fn(&self, name: &str) -> Option<&NativeFn> {
        self.statics.get(name)
    }

    pub fn member_fn(&self, name: &str) -> Option<&NativeFn> {
        self.members.get(name)
    }
}

impl fmt::Debug for VarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VarClass")
            .field("name", &self.name)
            .field("statics", &self.statics.len())
            .field("members", &self.members.len())
            .finish()
    }
}

/// Value held by a slot: owned by the scope, or borrowed from the caller.
pub enum VarData<'a> {
    Inline(Value),
    Const(&'a Value),
    Mut(&'a mut Value),
}

impl VarData<'_> {
    pub fn get(&self) -> &Value {
        match self {
            VarData::Inline(value) => value,
            VarData::Const(value) => value,
            VarData::Mut(value) => &**value,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut Value> {
        match self {
            VarData::Inline(value) => Some(value),
            VarData::Mut(value) => Some(&mut **value),
            VarData::Const(_) => None,
        }
    }

    pub fn is_mutable(&self) -> bool {
        !matches!(self, VarData::Const(_))
    }
}

/// Contents of a scope slot.
pub enum VarStorage<'a> {
    /// Declared with `var`, not assigned yet.
    Undefined,
    Value {
        data: VarData<'a>,
        class: Option<Rc<VarClass>>,
    },
    /// Another place, seen through this name. Loop variables and container
    /// assignment use aliases.
    Alias { place: Place, mutable: bool },
    Function(NativeFn),
    Class(Rc<VarClass>),
}

impl VarStorage<'_> {
    pub fn value(value: Value) -> Self {
        VarStorage::Value {
            data: VarData::Inline(value),
            class: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaceRoot {
    /// Named slot in scope `frame`.
    Slot { frame: usize, name: String },
    /// Temporary owned by scope `frame`.
    Temp { frame: usize, index: usize },
}

impl PlaceRoot {
    pub fn frame(&self) -> usize {
        match self {
            PlaceRoot::Slot { frame, .. } | PlaceRoot::Temp { frame, .. } => *frame,
        }
    }
}

/// Location of a value inside the context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Place {
    pub root: PlaceRoot,
    pub path: SmallVec<[Segment; 4]>,
}

impl Place {
    pub fn slot(frame: usize, name: impl Into<String>) -> Self {
        Place {
            root: PlaceRoot::Slot {
                frame,
                name: name.into(),
            },
            path: SmallVec::new(),
        }
    }

    pub fn temp(frame: usize, index: usize) -> Self {
        Place {
            root: PlaceRoot::Temp { frame, index },
            path: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        let mut place = self.clone();
        place.path.push(segment);
        place
    }
}

/// Evaluation result.
#[derive(Clone)]
pub enum Var {
    /// Evaluation failed or the slot is declared but unset.
    Undefined,
    /// Absent value that does not report an error: missing members and
    /// names probed by guards.
    SoftUndefined,
    Owned(Value),
    ConstRef(Place),
    MutRef(Place),
    /// Named slot; assignment rebinds the name.
    Slot { frame: usize, name: String },
    /// Missing dictionary key that assignment inserts.
    Writable { container: Place, key: String },
    /// Callable with an optional bound receiver.
    Method {
        func: NativeFn,
        this: Option<Value>,
    },
    Class(Rc<VarClass>),
}

impl Var {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Var::Undefined | Var::SoftUndefined)
    }

    /// Place a reference or slot names.
    pub fn place(&self) -> Option<Place> {
        match self {
            Var::ConstRef(place) | Var::MutRef(place) => Some(place.clone()),
            Var::Slot { frame, name } => Some(Place::slot(*frame, name.as_str())),
            _ => None,
        }
    }
}

impl From<Value> for Var {
    fn from(value: Value) -> Self {
        Var::Owned(value)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Var::Undefined => f.write_str("Undefined"),
            Var::SoftUndefined => f.write_str("SoftUndefined"),
            Var::Owned(value) => f.debug_tuple("Owned").field(value).finish(),
            Var::ConstRef(place) => f.debug_tuple("ConstRef").field(place).finish(),
            Var::MutRef(place) => f.debug_tuple("MutRef").field(place).finish(),
            Var::Slot { frame, name } => f
                .debug_struct("Slot")
                .field("frame", frame)
                .field("name", name)
                .finish(),
            Var::Writable { container, key } => f
                .debug_struct("Writable")
                .field("container", container)
                .field("key", key)
                .finish(),
            Var::Method { this, .. } => f.debug_struct("Method").field("this", this).finish(),
            Var::Class(class) => f.debug_tuple("Class").field(&class.name).finish(),
        }
    }
}
