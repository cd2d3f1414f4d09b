use crate::{
    bytecode::{
        instruction::Intent,
        op_code::{AssignOp, BinaryOp},
    },
    runtime::{
        error::{Exception, NOT_ASSIGNABLE, RuntimeError, out_of_memory},
        value::{Value, VarRef},
    },
};

use super::{VM, apply_binary};

/// Unwraps a write-intent variable reference.
pub(super) fn writable(value: Value, op: &str) -> Result<VarRef, RuntimeError> {
    match value {
        Value::Var(r) if r.intent == Intent::Write => Ok(r),
        _ => Err(Exception::new(&NOT_ASSIGNABLE, &[op]).into()),
    }
}

impl VM<'_> {
    /// Pops value and target, updates the target and pushes a reference to
    /// it, so assignments chain and can be passed by reference.
    pub(super) fn execute_assignment(&mut self, op: AssignOp) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let target = writable(self.pop()?, &op.to_string())?;
        match op.binary() {
            None => target.var.set(value),
            Some(BinaryOp::Concat) => {
                let suffix = value.to_str();
                target
                    .var
                    .append(&suffix)
                    .map_err(|_| out_of_memory(suffix.len()))?;
            }
            Some(binary) => {
                let current = target.var.get();
                let updated =
                    apply_binary(binary, &current, &value, self.engine.config().case_sense)?;
                drop(current);
                target.var.set(updated);
            }
        }
        self.push(Value::Var(target));
        Ok(())
    }
}
