use crate::{
    bytecode::op_code::UnaryOp,
    runtime::{error::RuntimeError, number::Number, value::Value},
};

use super::{VM, assign_ops::writable};

impl VM<'_> {
    pub(super) fn execute_unary_operation(&mut self, op: UnaryOp) -> Result<(), RuntimeError> {
        let operand = self.pop()?;
        let result = match op {
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                return self.execute_increment(op, operand);
            }
            UnaryOp::Neg => match operand.to_number() {
                Some(Number::Integer(i)) => Value::Integer(i.wrapping_neg()),
                Some(Number::Float(f)) => Value::Float(-f),
                None => Value::nan(),
            },
            UnaryOp::Not => Value::from_bool(!operand.to_bool()),
            UnaryOp::BitNot => match operand.to_number() {
                Some(n) => Value::Integer(!n.as_i64()),
                None => Value::nan(),
            },
        };
        self.push(result);
        Ok(())
    }

    /// `++`/`--`. Blank contents count as 0; other non-numeric contents turn
    /// into the sentinel, which is also written back.
    fn execute_increment(&mut self, op: UnaryOp, operand: Value) -> Result<(), RuntimeError> {
        let target = writable(operand, &op.to_string())?;
        let current = match target.var.get() {
            Value::String(s) if s.trim().is_empty() => Some(Number::Integer(0)),
            other => other.to_number(),
        };
        let delta: i64 = match op {
            UnaryOp::PreInc | UnaryOp::PostInc => 1,
            _ => -1,
        };
        let updated = match current {
            Some(Number::Integer(i)) => Value::Integer(i.wrapping_add(delta)),
            Some(Number::Float(f)) => Value::Float(f + delta as f64),
            None => Value::nan(),
        };
        target.var.set(updated);
        match op {
            UnaryOp::PreInc | UnaryOp::PreDec => self.push(Value::Var(target)),
            _ => self.push(current.map_or_else(Value::nan, Value::from_number)),
        }
        Ok(())
    }
}
