use crate::{
    bytecode::instruction::{Instruction, VarSlot},
    runtime::{
        engine::Engine,
        error::{EvalError, RuntimeError},
        frame::Frame,
        value::Value,
        var::Var,
    },
};
use std::rc::Rc;

mod assign_ops;
mod binary_ops;
mod comparison_ops;
mod dispatch;
mod function_call;
mod member_ops;
mod trace;
mod unary_ops;

pub(crate) use binary_ops::apply_binary;

const INITIAL_STACK_SIZE: usize = 16;

/// How an expression finished.
#[derive(Debug)]
pub enum Outcome {
    /// Ran to the end; holds the single remaining stack value.
    Done(Value),
    /// Left through a `Return` instruction with an already resolved value.
    Returned(Value),
}

/// What the dispatcher wants the run loop to do next.
pub(crate) enum Step {
    Next,
    Jump(usize),
    Return(Value),
}

/// Postfix evaluator for one expression. Each call of a user function gets
/// its own `VM`; they share the engine.
pub struct VM<'a> {
    engine: &'a Engine,
    frame: &'a Frame,
    stack: Vec<Value>,
    ip: usize,
    trace: bool,
}

impl<'a> VM<'a> {
    pub fn new(engine: &'a Engine, frame: &'a Frame) -> Self {
        Self {
            engine,
            frame,
            stack: Vec::with_capacity(INITIAL_STACK_SIZE),
            ip: 0,
            trace: engine.config().trace,
        }
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn run(&mut self, code: &[Instruction], line: u32) -> Result<Outcome, RuntimeError> {
        self.run_inner(code).map_err(|err| {
            if self.trace {
                tracing::trace!(target: "keyscript::vm", stack = %self.render_stack(), "evaluation failed");
            }
            err.at_line(line)
        })
    }

    fn run_inner(&mut self, code: &[Instruction]) -> Result<Outcome, RuntimeError> {
        self.ip = 0;
        while self.ip < code.len() {
            let ip = self.ip;
            if self.trace {
                self.trace_instruction(ip, &code[ip]);
            }
            match self.dispatch_instruction(code, ip)? {
                Step::Next => self.ip = ip + 1,
                Step::Jump(target) => {
                    if target > code.len() {
                        return Err(EvalError::BadJump { ip, target }.into());
                    }
                    self.ip = target;
                }
                Step::Return(value) => {
                    self.stack.clear();
                    return Ok(Outcome::Returned(value));
                }
            }
        }
        match self.stack.len() {
            0 => Err(EvalError::NoResult.into()),
            1 => Ok(Outcome::Done(self.pop()?)),
            n => Err(EvalError::LeftoverValues(n).into()),
        }
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or_else(|| EvalError::StackUnderflow(self.ip).into())
    }

    /// Pops the top `n` values, returned in push order.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, RuntimeError> {
        if n > self.stack.len() {
            return Err(EvalError::StackUnderflow(self.ip).into());
        }
        let start = self.stack.len() - n;
        Ok(self.stack.split_off(start))
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    fn peek(&self, depth: usize) -> Option<&Value> {
        self.stack.len().checked_sub(depth + 1).map(|i| &self.stack[i])
    }

    fn resolve_slot(&self, slot: VarSlot) -> Result<Rc<Var>, RuntimeError> {
        let cell = match slot {
            VarSlot::Global(index) => self.engine.global_slot(index),
            other => self.frame.cell(other),
        };
        cell.ok_or_else(|| EvalError::UnresolvedSlot(slot.to_string()).into())
    }
}

#[cfg(test)]
mod assign_ops_test;
#[cfg(test)]
mod comparison_ops_test;
#[cfg(test)]
mod function_call_test;
