use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use rustc_hash::FxHashMap;

use crate::{
    bytecode::{
        instruction::Instruction,
        program::{Expression, Program, ProgramError},
    },
    runtime::{
        array::Array,
        buffer::{OutputBuffer, TextHandle},
        builtins,
        config::RuntimeConfig,
        context::{EngineScope, FinalizerScope},
        error::{ErrorSink, Exception, RuntimeError, StackEntry, TracingSink},
        frame::Frame,
        func::{Builtin, Callable, UserFunc},
        leak_detector,
        map::Map,
        object::{Native, ObjRef, Object, RootKind},
        value::Value,
        var::Var,
        vm::{Outcome, VM},
    },
};

/// The built-in prototype objects every new object derives from.
pub struct Prototypes {
    pub object: ObjRef,
    pub array: ObjRef,
    pub map: ObjRef,
    pub func: ObjRef,
    pub error: ObjRef,
}

impl Prototypes {
    fn new() -> Self {
        let object = ObjRef::new(Object::prototype(None, RootKind::Object));
        let derived = |root| ObjRef::new(Object::prototype(Some(object.clone()), root));
        let array = derived(RootKind::Array);
        let map = derived(RootKind::Map);
        let func = derived(RootKind::Func);
        let error = derived(RootKind::Error);
        Self {
            object,
            array,
            map,
            func,
            error,
        }
    }

    fn all(&self) -> [&ObjRef; 5] {
        [&self.object, &self.array, &self.map, &self.func, &self.error]
    }
}

/// Evaluation context: globals, the function table, prototypes, the active
/// call stack and the sink for unhandled errors.
pub struct Engine {
    this: Weak<Engine>,
    config: RuntimeConfig,
    globals: RefCell<Vec<Rc<Var>>>,
    global_names: RefCell<FxHashMap<Box<str>, u32>>,
    functions: RefCell<FxHashMap<Box<str>, ObjRef>>,
    user_functions: RefCell<FxHashMap<Box<str>, Rc<UserFunc>>>,
    protos: Prototypes,
    call_stack: RefCell<Vec<StackEntry>>,
    in_flight: RefCell<Option<Exception>>,
    last_error: RefCell<Option<RuntimeError>>,
    main: RefCell<Vec<Expression>>,
    sink: Box<dyn ErrorSink>,
}

impl Engine {
    pub fn new(config: RuntimeConfig) -> Rc<Self> {
        Self::with_sink(config, Box::new(TracingSink))
    }

    pub fn with_sink(config: RuntimeConfig, sink: Box<dyn ErrorSink>) -> Rc<Self> {
        let protos = Prototypes::new();
        builtins::install_prototypes(&protos);
        Rc::new_cyclic(|this| {
            let engine = Self {
                this: this.clone(),
                config,
                globals: RefCell::new(Vec::new()),
                global_names: RefCell::new(FxHashMap::default()),
                functions: RefCell::new(FxHashMap::default()),
                user_functions: RefCell::new(FxHashMap::default()),
                protos,
                call_stack: RefCell::new(Vec::new()),
                in_flight: RefCell::new(None),
                last_error: RefCell::new(None),
                main: RefCell::new(Vec::new()),
                sink,
            };
            for builtin in builtins::BUILTINS {
                engine.register_builtin(builtin);
            }
            engine
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn protos(&self) -> &Prototypes {
        &self.protos
    }

    // ---- factories ----

    fn alloc(&self, base: &ObjRef, native: Native) -> ObjRef {
        ObjRef::new(Object::new(Some(base.clone()), native).owned_by(self.this.clone()))
    }

    pub fn new_object(&self) -> ObjRef {
        self.alloc(&self.protos.object, Native::None)
    }

    pub fn new_array(&self, values: Vec<Value>) -> Result<ObjRef, RuntimeError> {
        let values = values.into_iter().map(Value::into_resolved).collect();
        let array = Array::from_values(values)?;
        Ok(self.alloc(&self.protos.array, Native::Array(RefCell::new(array))))
    }

    pub fn new_map(&self) -> ObjRef {
        self.alloc(&self.protos.map, Native::Map(RefCell::new(Map::new())))
    }

    pub fn new_func(&self, callable: Callable) -> ObjRef {
        self.alloc(&self.protos.func, Native::Func(callable))
    }

    pub fn new_builtin(&self, builtin: &'static Builtin) -> ObjRef {
        self.new_func(Callable::Builtin(builtin))
    }

    pub fn new_error(&self, message: &str, what: &str, extra: &str) -> ObjRef {
        let error = self.alloc(&self.protos.error, Native::None);
        error.set_own_value("Message", Value::from(message));
        error.set_own_value("What", Value::from(what));
        error.set_own_value("Extra", Value::from(extra));
        error.set_own_value("Stack", Value::from(self.stack_trace()));
        error
    }

    // ---- globals and functions ----

    /// Index of the global `name`, creating it if needed.
    pub fn define_global(&self, name: &str) -> u32 {
        let key = name.to_lowercase().into_boxed_str();
        if let Some(&index) = self.global_names.borrow().get(&key) {
            return index;
        }
        let mut globals = self.globals.borrow_mut();
        let index = globals.len() as u32;
        globals.push(Rc::new(Var::new(name)));
        self.global_names.borrow_mut().insert(key, index);
        index
    }

    pub fn global_slot(&self, index: u32) -> Option<Rc<Var>> {
        self.globals.borrow().get(index as usize).cloned()
    }

    pub fn global(&self, name: &str) -> Option<Rc<Var>> {
        let index = *self.global_names.borrow().get(name.to_lowercase().as_str())?;
        self.global_slot(index)
    }

    pub fn register_builtin(&self, builtin: &'static Builtin) {
        let func = self.new_builtin(builtin);
        let old = self
            .functions
            .borrow_mut()
            .insert(builtin.name.to_lowercase().into_boxed_str(), func);
        drop(old);
    }

    pub fn define_function(&self, func: UserFunc) -> ObjRef {
        let func = Rc::new(func);
        let key = func.name.to_lowercase().into_boxed_str();
        let object = self.new_func(Callable::User(func.clone()));
        let old_user = self.user_functions.borrow_mut().insert(key.clone(), func);
        let old_object = self.functions.borrow_mut().insert(key, object.clone());
        drop(old_user);
        drop(old_object);
        object
    }

    /// Function object named `name`, user-defined or built-in.
    pub fn function(&self, name: &str) -> Option<ObjRef> {
        self.functions
            .borrow()
            .get(name.to_lowercase().as_str())
            .cloned()
    }

    pub fn user_function(&self, name: &str) -> Option<Rc<UserFunc>> {
        self.user_functions
            .borrow()
            .get(name.to_lowercase().as_str())
            .cloned()
    }

    pub fn load(&self, program: &Program) -> Result<(), ProgramError> {
        program.validate()?;
        for name in &program.globals {
            self.define_global(name);
        }
        for def in &program.functions {
            self.define_function(UserFunc::from_def(def));
        }
        let old = std::mem::replace(&mut *self.main.borrow_mut(), program.main.clone());
        drop(old);
        tracing::debug!(
            globals = program.globals.len(),
            functions = program.functions.len(),
            expressions = program.main.len(),
            "program loaded"
        );
        Ok(())
    }

    // ---- evaluation ----

    /// Evaluates one postfix expression. `bindings` populate the `Local`
    /// slots of a top-level frame. A variable-reference result is read
    /// through before returning.
    pub fn evaluate(
        self: &Rc<Self>,
        code: &[Instruction],
        bindings: &[Value],
    ) -> Result<Value, RuntimeError> {
        self.evaluate_at(code, bindings, 0)
    }

    fn evaluate_at(
        self: &Rc<Self>,
        code: &[Instruction],
        bindings: &[Value],
        line: u32,
    ) -> Result<Value, RuntimeError> {
        let _scope = EngineScope::enter(self);
        let cells = bindings
            .iter()
            .enumerate()
            .map(|(i, value)| Rc::new(Var::with_value(&format!("A_Args{}", i + 1), value.clone())))
            .collect();
        let frame = Frame::top_level(cells);
        let entry = CallStackGuard::enter(self, frame.name.clone(), line);
        let outcome = VM::new(self, &frame).run(code, line);
        match outcome {
            Ok(Outcome::Done(value)) | Ok(Outcome::Returned(value)) => Ok(value.into_resolved()),
            Err(RuntimeError::Thrown(mut exception)) => {
                exception.push_frame(frame.name.clone(), entry.line());
                Err(RuntimeError::Thrown(exception))
            }
            Err(err) => Err(err),
        }
    }

    /// Evaluates and copies the string form of the result into `buffer`.
    pub fn evaluate_into(
        self: &Rc<Self>,
        code: &[Instruction],
        bindings: &[Value],
        buffer: &mut OutputBuffer,
    ) -> Result<TextHandle, RuntimeError> {
        let value = self.evaluate(code, bindings)?;
        buffer.push_str(&value.to_str())
    }

    /// Runs the loaded program's main expressions in order. The first
    /// failure is reported to the error sink and returned.
    pub fn run_main(self: &Rc<Self>) -> Result<Value, RuntimeError> {
        let main = self.main.borrow().clone();
        let mut last = Value::empty();
        for expression in &main {
            match self.evaluate_at(&expression.code, &[], expression.line) {
                Ok(value) => last = value,
                Err(err) => {
                    self.report(&err);
                    return Err(err);
                }
            }
        }
        Ok(last)
    }

    /// Releases globals and functions while this engine is current, so
    /// finalizers of objects they hold still run.
    pub fn shutdown(self: &Rc<Self>) {
        let _scope = EngineScope::enter(self);
        let globals = self.globals.borrow().clone();
        for global in &globals {
            global.clear();
        }
        drop(globals);
        let user_functions = std::mem::take(&mut *self.user_functions.borrow_mut());
        for func in user_functions.values() {
            let cells = func.locals.borrow().clone();
            for cell in &cells {
                cell.clear();
            }
        }
        drop(user_functions);
    }

    // ---- call stack and error state ----

    pub fn call_depth(&self) -> usize {
        self.call_stack.borrow().len()
    }

    pub fn stack_trace(&self) -> String {
        self.call_stack
            .borrow()
            .iter()
            .rev()
            .map(|entry| format!("at {} (line {})", entry.name, entry.line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn set_line(&self, line: u32) {
        if let Some(top) = self.call_stack.borrow_mut().last_mut() {
            top.line = line;
        }
    }

    pub(crate) fn swap_call_stack(&self, stack: Vec<StackEntry>) -> Vec<StackEntry> {
        std::mem::replace(&mut *self.call_stack.borrow_mut(), stack)
    }

    pub(crate) fn set_in_flight(&self, exception: Option<Exception>) {
        let old = self.in_flight.replace(exception);
        drop(old);
    }

    pub(crate) fn take_in_flight(&self) -> Option<Exception> {
        self.in_flight.borrow_mut().take()
    }

    pub(crate) fn restore_in_flight(&self, exception: Option<Exception>) -> Option<Exception> {
        self.in_flight.replace(exception)
    }

    /// The exception currently unwinding through a user function, if any.
    pub fn in_flight(&self) -> Option<Exception> {
        self.in_flight.borrow().clone()
    }

    pub fn last_error(&self) -> Option<RuntimeError> {
        self.last_error.borrow().clone()
    }

    pub fn report(&self, error: &RuntimeError) {
        self.sink.report(error);
        let old = self.last_error.replace(Some(error.clone()));
        drop(old);
    }

    pub(crate) fn run_finalizer(&self, this: ObjRef, finalizer: ObjRef) {
        leak_detector::record_finalizer();
        tracing::debug!(object = this.addr(), "running __Delete");
        let _scope = FinalizerScope::enter(self);
        if let Err(err) = self.call_object(&finalizer, vec![Value::Object(this)]) {
            self.report(&err);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        for proto in self.protos.all() {
            proto.clear_members();
        }
    }
}

/// Pushes a call-stack entry for the lifetime of the guard.
pub(crate) struct CallStackGuard<'a> {
    engine: &'a Engine,
}

impl<'a> CallStackGuard<'a> {
    pub(crate) fn enter(engine: &'a Engine, name: Rc<str>, line: u32) -> Self {
        engine.call_stack.borrow_mut().push(StackEntry { name, line });
        Self { engine }
    }

    pub(crate) fn line(&self) -> u32 {
        self.engine
            .call_stack
            .borrow()
            .last()
            .map_or(0, |entry| entry.line)
    }
}

impl Drop for CallStackGuard<'_> {
    fn drop(&mut self) {
        let popped = self.engine.call_stack.borrow_mut().pop();
        drop(popped);
    }
}
