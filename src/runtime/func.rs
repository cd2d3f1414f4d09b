use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use crate::{
    bytecode::{
        instruction::{Literal, VarSlot},
        program::{Expression, FunctionDef},
    },
    runtime::{
        engine::Engine,
        error::RuntimeError,
        object::ObjRef,
        value::Value,
        var::Var,
    },
};

pub type NativeFn = fn(&Engine, &[Value]) -> Result<Value, RuntimeError>;

/// A native function. Methods receive the receiver as `args[0]`.
pub struct Builtin {
    pub name: &'static str,
    pub min_params: usize,
    pub max_params: usize,
    pub variadic: bool,
    /// Receives variable references after the receiver unresolved, so it
    /// can forward them to by-reference parameters.
    pub forwards_refs: bool,
    pub func: NativeFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Rc<str>,
    pub byref: bool,
    pub default: Option<Value>,
}

/// A user-defined function and its local storage.
///
/// `locals` holds the cells of the innermost active invocation. A nested
/// invocation swaps in fresh cells and puts the suspended ones back when it
/// finishes; see `LocalsGuard` in the call path.
pub struct UserFunc {
    pub name: Rc<str>,
    pub params: Vec<Param>,
    pub variadic: bool,
    pub local_names: Vec<Rc<str>>,
    pub captures: Vec<VarSlot>,
    pub body: Rc<[Expression]>,
    pub(crate) locals: RefCell<Vec<Rc<Var>>>,
    pub(crate) instances: Cell<u32>,
}

impl UserFunc {
    pub fn from_def(def: &FunctionDef) -> Self {
        let params = def
            .params
            .iter()
            .map(|p| Param {
                name: Rc::from(p.name.as_str()),
                byref: p.byref,
                default: p.default.as_ref().map(literal_value),
            })
            .collect::<Vec<_>>();
        let mut local_names: Vec<Rc<str>> = params.iter().map(|p| p.name.clone()).collect();
        if def.variadic {
            local_names.push(Rc::from("args"));
        }
        local_names.extend(def.locals.iter().map(|n| Rc::from(n.as_str())));
        let func = Self {
            name: Rc::from(def.name.as_str()),
            params,
            variadic: def.variadic,
            local_names,
            captures: def.captures.clone(),
            body: Rc::from(def.body.clone()),
            locals: RefCell::new(Vec::new()),
            instances: Cell::new(0),
        };
        *func.locals.borrow_mut() = func.fresh_locals();
        func
    }

    pub fn fresh_locals(&self) -> Vec<Rc<Var>> {
        self.local_names
            .iter()
            .map(|name| Rc::new(Var::new(name)))
            .collect()
    }

    pub fn local(&self, index: usize) -> Option<Rc<Var>> {
        self.locals.borrow().get(index).cloned()
    }

    /// Number of invocations currently on the call stack.
    pub fn instances(&self) -> u32 {
        self.instances.get()
    }

    pub fn min_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }

    pub fn max_params(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for UserFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<func {}>", self.name)
    }
}

pub fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Integer(i) => Value::Integer(*i),
        Literal::Float(f) => Value::Float(*f),
        Literal::String(s) => Value::from(s.as_str()),
    }
}

#[derive(Debug, Clone)]
pub enum Callable {
    Builtin(&'static Builtin),
    User(Rc<UserFunc>),
    Closure {
        func: Rc<UserFunc>,
        captures: Rc<[Rc<Var>]>,
    },
    /// Positional arguments fixed by `Bind`. `Missing` slots are filled from
    /// the eventual call's arguments.
    Bound { target: ObjRef, args: Vec<Value> },
}

impl Callable {
    pub fn name(&self) -> Rc<str> {
        match self {
            Callable::Builtin(b) => Rc::from(b.name),
            Callable::User(func) | Callable::Closure { func, .. } => func.name.clone(),
            Callable::Bound { target, .. } => target
                .callable()
                .map_or_else(|| Rc::from(""), Callable::name),
        }
    }

    fn bound_count(args: &[Value]) -> usize {
        args.iter().filter(|a| !a.is_missing()).count()
    }

    pub fn min_params(&self) -> usize {
        match self {
            Callable::Builtin(b) => b.min_params,
            Callable::User(func) | Callable::Closure { func, .. } => func.min_params(),
            Callable::Bound { target, args } => target
                .callable()
                .map_or(0, |c| c.min_params().saturating_sub(Self::bound_count(args))),
        }
    }

    pub fn max_params(&self) -> usize {
        match self {
            Callable::Builtin(b) => b.max_params,
            Callable::User(func) | Callable::Closure { func, .. } => func.max_params(),
            Callable::Bound { target, args } => target
                .callable()
                .map_or(0, |c| c.max_params().saturating_sub(Self::bound_count(args))),
        }
    }

    pub fn is_variadic(&self) -> bool {
        match self {
            Callable::Builtin(b) => b.variadic,
            Callable::User(func) | Callable::Closure { func, .. } => func.variadic,
            Callable::Bound { target, .. } => {
                target.callable().is_some_and(Callable::is_variadic)
            }
        }
    }

    pub fn is_builtin(&self) -> bool {
        match self {
            Callable::Builtin(_) => true,
            Callable::User(_) | Callable::Closure { .. } => false,
            Callable::Bound { target, .. } => target.callable().is_some_and(Callable::is_builtin),
        }
    }

    /// Whether the 1-based parameter `n` is declared by-reference.
    pub fn is_byref(&self, n: usize) -> bool {
        match self {
            Callable::Builtin(_) | Callable::Bound { .. } => false,
            Callable::User(func) | Callable::Closure { func, .. } => n
                .checked_sub(1)
                .and_then(|i| func.params.get(i))
                .is_some_and(|p| p.byref),
        }
    }
}

/// Merges bound arguments with call-time arguments: unspecified bound slots
/// take call arguments in order, and leftover call arguments are appended.
pub fn merge_bound_args(bound: &[Value], call_args: Vec<Value>) -> Vec<Value> {
    let mut incoming = call_args.into_iter();
    let mut merged = Vec::with_capacity(bound.len() + incoming.len());
    for slot in bound {
        if slot.is_missing() {
            merged.push(incoming.next().unwrap_or(Value::Missing));
        } else {
            merged.push(slot.clone());
        }
    }
    merged.extend(incoming);
    merged
}
