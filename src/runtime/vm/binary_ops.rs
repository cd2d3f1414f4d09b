use crate::{
    bytecode::op_code::BinaryOp,
    runtime::{
        collation::CaseSense,
        error::{RuntimeError, out_of_memory},
        number::Number,
        value::Value,
    },
};

use super::{VM, comparison_ops};

impl VM<'_> {
    pub(super) fn execute_binary_operation(&mut self, op: BinaryOp) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = apply_binary(op, &left, &right, self.engine.config().case_sense)?;
        self.push(result);
        Ok(())
    }
}

/// Applies a binary operator. Operands may be unresolved variable
/// references; only `is` looks at the reference itself.
pub(crate) fn apply_binary(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    case_sense: CaseSense,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Concat => concat(left, right),
        BinaryOp::Is => comparison_ops::is_test(left, right),
        op if op.is_comparison() => Ok(comparison_ops::compare(op, left, right, case_sense)),
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
            Ok(bitwise(op, left, right))
        }
        _ => Ok(arithmetic(op, left, right)),
    }
}

fn concat(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let left = left.to_str();
    let right = right.to_str();
    let mut joined = String::new();
    joined
        .try_reserve_exact(left.len() + right.len())
        .map_err(|_| out_of_memory(left.len() + right.len()))?;
    joined.push_str(&left);
    joined.push_str(&right);
    Ok(Value::from(joined))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let (Some(l), Some(r)) = (left.to_number(), right.to_number()) else {
        return Value::nan();
    };
    match (l, r) {
        (Number::Integer(a), Number::Integer(b)) => integer_arithmetic(op, a, b),
        (l, r) => float_arithmetic(op, l.as_f64(), r.as_f64()),
    }
}

fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> Value {
    match op {
        BinaryOp::Add => Value::Integer(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Integer(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Integer(a.wrapping_mul(b)),
        BinaryOp::Div => float_arithmetic(op, a as f64, b as f64),
        BinaryOp::FloorDiv if b == 0 => Value::nan(),
        BinaryOp::FloorDiv => Value::Integer(a.wrapping_div(b)),
        BinaryOp::Pow => integer_power(a, b),
        _ => Value::nan(),
    }
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div | BinaryOp::FloorDiv if b == 0.0 => Value::nan(),
        BinaryOp::Div => Value::Float(a / b),
        BinaryOp::FloorDiv => Value::Float((a / b).floor()),
        BinaryOp::Pow => float_power(a, b),
        _ => Value::nan(),
    }
}

fn integer_power(base: i64, exponent: i64) -> Value {
    if exponent < 0 {
        return float_power(base as f64, exponent as f64);
    }
    let mut result: i64 = 1;
    let mut square = base.wrapping_abs();
    let mut remaining = exponent;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result.wrapping_mul(square);
        }
        square = square.wrapping_mul(square);
        remaining >>= 1;
    }
    if base < 0 && exponent & 1 == 1 {
        result = result.wrapping_neg();
    }
    Value::Integer(result)
}

fn float_power(base: f64, exponent: f64) -> Value {
    if base == 0.0 && exponent < 0.0 {
        return Value::nan();
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Value::nan();
    }
    Value::Float(base.powf(exponent))
}

fn bitwise(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let (Some(l), Some(r)) = (left.to_number(), right.to_number()) else {
        return Value::nan();
    };
    let (a, b) = (l.as_i64(), r.as_i64());
    match op {
        BinaryOp::BitAnd => Value::Integer(a & b),
        BinaryOp::BitOr => Value::Integer(a | b),
        BinaryOp::BitXor => Value::Integer(a ^ b),
        BinaryOp::Shl | BinaryOp::Shr if !(0..=63).contains(&b) => Value::nan(),
        BinaryOp::Shl => Value::Integer(a << b),
        BinaryOp::Shr => Value::Integer(a >> b),
        _ => Value::nan(),
    }
}
