use std::rc::Rc;

use crate::{
    bytecode::instruction::VarSlot,
    runtime::{func::UserFunc, var::Var},
};

enum Locals {
    /// Reads the function's current local cells.
    Function(Rc<UserFunc>),
    /// Cells created for a top-level evaluation's argument bindings.
    Bindings(Vec<Rc<Var>>),
}

/// Variable scope of the code being executed.
pub struct Frame {
    pub name: Rc<str>,
    locals: Locals,
    captures: Rc<[Rc<Var>]>,
}

impl Frame {
    pub fn function(func: Rc<UserFunc>, captures: Rc<[Rc<Var>]>) -> Self {
        Self {
            name: func.name.clone(),
            locals: Locals::Function(func),
            captures,
        }
    }

    pub fn top_level(bindings: Vec<Rc<Var>>) -> Self {
        Self {
            name: Rc::from("<main>"),
            locals: Locals::Bindings(bindings),
            captures: Rc::from(Vec::new()),
        }
    }

    pub fn user_func(&self) -> Option<&Rc<UserFunc>> {
        match &self.locals {
            Locals::Function(func) => Some(func),
            Locals::Bindings(_) => None,
        }
    }

    /// Local or captured cell for `slot`. Globals are resolved by the engine.
    pub fn cell(&self, slot: VarSlot) -> Option<Rc<Var>> {
        match slot {
            VarSlot::Local(i) => match &self.locals {
                Locals::Function(func) => func.local(i as usize),
                Locals::Bindings(cells) => cells.get(i as usize).cloned(),
            },
            VarSlot::Free(i) => self.captures.get(i as usize).cloned(),
            VarSlot::Global(_) => None,
        }
    }
}
