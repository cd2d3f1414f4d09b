//! The engine active on this thread, for code that runs without an explicit
//! engine handle (object finalizers).

use std::{cell::RefCell, marker::PhantomData, rc::Rc};

use crate::runtime::{
    engine::Engine,
    error::{Exception, StackEntry},
};

thread_local! {
    static CURRENT: RefCell<Vec<Rc<Engine>>> = const { RefCell::new(Vec::new()) };
}

pub fn current() -> Option<Rc<Engine>> {
    CURRENT.with(|stack| stack.borrow().last().cloned())
}

/// Makes an engine current until dropped. Scopes nest.
pub struct EngineScope {
    _not_send: PhantomData<*const ()>,
}

impl EngineScope {
    pub fn enter(engine: &Rc<Engine>) -> Self {
        CURRENT.with(|stack| stack.borrow_mut().push(engine.clone()));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for EngineScope {
    fn drop(&mut self) {
        let popped = CURRENT.with(|stack| stack.borrow_mut().pop());
        drop(popped);
    }
}

/// Isolates a finalizer from the code whose release triggered it: the call
/// stack starts empty and the in-flight exception slot is cleared, and both
/// are put back on drop.
pub struct FinalizerScope<'a> {
    engine: &'a Engine,
    saved_stack: Vec<StackEntry>,
    saved_exception: Option<Exception>,
}

impl<'a> FinalizerScope<'a> {
    pub fn enter(engine: &'a Engine) -> Self {
        let saved_stack = engine.swap_call_stack(Vec::new());
        let saved_exception = engine.take_in_flight();
        Self {
            engine,
            saved_stack,
            saved_exception,
        }
    }
}

impl Drop for FinalizerScope<'_> {
    fn drop(&mut self) {
        let finalizer_stack = self
            .engine
            .swap_call_stack(std::mem::take(&mut self.saved_stack));
        drop(finalizer_stack);
        let stray = self.engine.restore_in_flight(self.saved_exception.take());
        drop(stray);
    }
}
