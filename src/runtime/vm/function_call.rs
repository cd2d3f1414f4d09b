use std::rc::Rc;

use smallvec::SmallVec;

use crate::runtime::{
    dispatch::{self, InvokeMode},
    engine::{CallStackGuard, Engine},
    error::{
        EvalError, Exception, MISSING_PARAMETER, NOT_A_FUNCTION, RECURSION_LIMIT, RuntimeError,
        WRONG_NUMBER_OF_ARGUMENTS,
    },
    frame::Frame,
    func::{Builtin, Callable, UserFunc, merge_bound_args},
    object::ObjRef,
    value::Value,
    var::Var,
};

use super::{Outcome, VM};

impl VM<'_> {
    /// Stack: callee, `argc` arguments.
    pub(super) fn execute_call(&mut self, argc: usize) -> Result<(), RuntimeError> {
        let args = self.pop_n(argc)?;
        let callee = self.pop()?;
        let result = self.engine.call(&callee, args)?;
        self.push(result);
        Ok(())
    }

    /// Pushes a closure over the current frame's cells listed in the
    /// function's `captures`.
    pub(super) fn execute_make_closure(&mut self, name: &str) -> Result<(), RuntimeError> {
        let func = self
            .engine
            .user_function(name)
            .ok_or_else(|| EvalError::UnknownDefinition(name.to_string()))?;
        let captures = func
            .captures
            .iter()
            .map(|slot| self.resolve_slot(*slot))
            .collect::<Result<Vec<_>, _>>()?;
        let closure = self.engine.new_func(Callable::Closure {
            func,
            captures: Rc::from(captures),
        });
        self.push(Value::Object(closure));
        Ok(())
    }
}

/// How one actual argument reaches its formal parameter.
enum Binding {
    Alias(Rc<Var>),
    Value(Value),
    Omitted,
}

/// Swaps in fresh local cells for one invocation of a user function. When
/// the function is already active further up the stack, the suspended
/// invocation's cells are kept and put back on drop, including when the
/// nested call fails.
struct LocalsGuard<'a> {
    func: &'a UserFunc,
    backup: Option<Vec<Rc<Var>>>,
}

impl<'a> LocalsGuard<'a> {
    fn enter(func: &'a UserFunc) -> Self {
        let recursive = func.instances.get() > 0;
        let previous = func.locals.replace(func.fresh_locals());
        func.instances.set(func.instances.get() + 1);
        let backup = if recursive {
            tracing::trace!(function = %func.name, depth = func.instances.get(), "locals backed up");
            Some(previous)
        } else {
            drop(previous);
            None
        };
        Self { func, backup }
    }
}

impl Drop for LocalsGuard<'_> {
    fn drop(&mut self) {
        self.func.instances.set(self.func.instances.get() - 1);
        let restored = self.backup.take().unwrap_or_else(|| self.func.fresh_locals());
        let finished = self.func.locals.replace(restored);
        // Values owned by the finished invocation are released here, after
        // the suspended cells are back in place.
        drop(finished);
    }
}

/// Counts arguments up to the last one actually supplied.
fn supplied(args: &[Value]) -> usize {
    args.iter().rposition(|a| !a.is_missing()).map_or(0, |i| i + 1)
}

fn wrong_arity(name: &str, expected: String, got: usize) -> RuntimeError {
    Exception::new(&WRONG_NUMBER_OF_ARGUMENTS, &[name, &expected, &got.to_string()]).into()
}

impl Engine {
    /// Calls any callable value: a function object, or an object with a
    /// `Call` method.
    pub fn call(&self, callee: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee.resolved() {
            Value::Object(func) => self.call_object(&func, args),
            other => Err(Exception::new(&NOT_A_FUNCTION, &[other.type_name()]).into()),
        }
    }

    pub fn call_object(&self, func: &ObjRef, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match func.callable() {
            Some(callable) => self.call_callable(callable, args),
            None => dispatch::invoke(
                self,
                InvokeMode::Call,
                &Value::Object(func.clone()),
                Some("Call"),
                args,
            ),
        }
    }

    fn call_callable(&self, callable: &Callable, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callable {
            Callable::Builtin(builtin) => self.call_builtin(builtin, args),
            Callable::User(func) => self.call_user(func, Rc::from(Vec::new()), args),
            Callable::Closure { func, captures } => self.call_user(func, captures.clone(), args),
            Callable::Bound { target, args: bound } => {
                self.call_object(target, merge_bound_args(bound, args))
            }
        }
    }

    fn call_builtin(&self, builtin: &Builtin, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let count = supplied(&args);
        if count < builtin.min_params || (count > builtin.max_params && !builtin.variadic) {
            let expected = if builtin.min_params == builtin.max_params {
                builtin.min_params.to_string()
            } else if builtin.variadic {
                format!("at least {}", builtin.min_params)
            } else {
                format!("{} to {}", builtin.min_params, builtin.max_params)
            };
            return Err(wrong_arity(builtin.name, expected, count));
        }
        let args: SmallVec<[Value; 8]> = args
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(i, arg)| {
                if builtin.forwards_refs && i > 0 {
                    arg
                } else {
                    arg.into_resolved()
                }
            })
            .collect();
        (builtin.func)(self, &args)
    }

    fn call_user(
        &self,
        func: &Rc<UserFunc>,
        captures: Rc<[Rc<Var>]>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let depth = self.call_depth();
        if depth >= self.config().max_call_depth {
            return Err(Exception::new(&RECURSION_LIMIT, &[&depth.to_string(), &*func.name]).into());
        }
        let count = supplied(&args);
        if count > func.params.len() && !func.variadic {
            let expected = if func.min_params() == func.max_params() {
                func.max_params().to_string()
            } else {
                format!("{} to {}", func.min_params(), func.max_params())
            };
            return Err(wrong_arity(&func.name, expected, count));
        }
        // By-value arguments are read before the callee's cells are swapped
        // in, so an argument naming the caller's own local sees its value.
        let bindings: Vec<Binding> = args
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(i, arg)| match arg {
                Value::Var(r) if func.params.get(i).is_some_and(|p| p.byref) => {
                    Binding::Alias(r.var.target())
                }
                Value::Missing => Binding::Omitted,
                other => Binding::Value(other.into_resolved()),
            })
            .collect();

        tracing::debug!(function = %func.name, depth, args = count, "call");
        let locals = LocalsGuard::enter(func);
        let entry = CallStackGuard::enter(self, func.name.clone(), 0);
        let outcome = self
            .bind_params(func, bindings)
            .and_then(|()| self.run_body(func, captures));
        let outcome = match outcome {
            Err(RuntimeError::Thrown(mut exception)) => {
                exception.push_frame(func.name.clone(), entry.line());
                self.set_in_flight(Some((*exception).clone()));
                Err(RuntimeError::Thrown(exception))
            }
            other => other,
        };
        drop(entry);
        drop(locals);
        if outcome.is_err() {
            self.take_in_flight();
        }
        outcome
    }

    fn bind_params(&self, func: &UserFunc, bindings: Vec<Binding>) -> Result<(), RuntimeError> {
        let cells = func.locals.borrow().clone();
        let mut bindings = bindings.into_iter();
        for (param, cell) in func.params.iter().zip(&cells) {
            match bindings.next() {
                Some(Binding::Alias(target)) => cell.alias_to(target),
                Some(Binding::Value(value)) => cell.set(value),
                Some(Binding::Omitted) | None => match &param.default {
                    Some(default) => cell.set(default.clone()),
                    None => {
                        return Err(
                            Exception::new(&MISSING_PARAMETER, &[&*param.name, &*func.name]).into(),
                        );
                    }
                },
            }
        }
        if func.variadic {
            let extra = bindings
                .map(|binding| match binding {
                    Binding::Alias(var) => var.get(),
                    Binding::Value(value) => value,
                    Binding::Omitted => Value::Missing,
                })
                .collect();
            let packed = self.new_array(extra)?;
            if let Some(cell) = cells.get(func.params.len()) {
                cell.set(Value::Object(packed));
            }
        }
        Ok(())
    }

    fn run_body(&self, func: &Rc<UserFunc>, captures: Rc<[Rc<Var>]>) -> Result<Value, RuntimeError> {
        let frame = Frame::function(func.clone(), captures);
        for expression in func.body.iter() {
            self.set_line(expression.line);
            match VM::new(self, &frame).run(&expression.code, expression.line)? {
                Outcome::Returned(value) => return Ok(value),
                Outcome::Done(value) => drop(value),
            }
        }
        Ok(Value::empty())
    }
}
