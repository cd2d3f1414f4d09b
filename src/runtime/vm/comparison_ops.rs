use std::cmp::Ordering;

use crate::{
    bytecode::op_code::BinaryOp,
    runtime::{
        builtins::type_check,
        collation::CaseSense,
        error::{Exception, INVALID_TYPE_NAME, RuntimeError},
        number::Number,
        value::Value,
    },
};

/// Equality and ordering. Two numeric operands (numbers or numeric strings)
/// compare numerically; anything else compares as text.
pub(crate) fn compare(op: BinaryOp, left: &Value, right: &Value, case_sense: CaseSense) -> Value {
    if matches!(op, BinaryOp::CaseEq | BinaryOp::CaseNe) {
        if let Some(same) = identity(left, right) {
            return Value::from_bool(same == (op == BinaryOp::CaseEq));
        }
    }
    let ordering = match (left.to_number(), right.to_number()) {
        (Some(l), Some(r)) => numeric_ordering(l, r),
        _ => {
            let mode = match op {
                BinaryOp::CaseEq | BinaryOp::CaseNe => CaseSense::Sensitive,
                _ => case_sense,
            };
            Some(mode.compare(&left.to_str(), &right.to_str()))
        }
    };
    let result = match (op, ordering) {
        (BinaryOp::Ne | BinaryOp::CaseNe, ordering) => ordering != Some(Ordering::Equal),
        (_, None) => false,
        (BinaryOp::Eq | BinaryOp::CaseEq, Some(o)) => o == Ordering::Equal,
        (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
        (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
        (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
        (BinaryOp::Ge, Some(o)) => o != Ordering::Less,
        _ => false,
    };
    Value::from_bool(result)
}

/// `Some` when at least one side is an object: objects are equal only to
/// themselves.
fn identity(left: &Value, right: &Value) -> Option<bool> {
    match (left.as_object(), right.as_object()) {
        (Some(l), Some(r)) => Some(l.ptr_eq(&r)),
        (Some(_), None) | (None, Some(_)) => Some(false),
        (None, None) => None,
    }
}

fn numeric_ordering(left: Number, right: Number) -> Option<Ordering> {
    match (left, right) {
        (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
        (l, r) => l.as_f64().partial_cmp(&r.as_f64()),
    }
}

/// The `is` operator. The right operand is either a prototype object or a
/// category name; `"byref"` asks whether the left operand is a variable
/// aliasing another one.
pub(crate) fn is_test(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let Some(proto) = right.as_object() {
        let derived = left.as_object().is_some_and(|object| object.has_base(&proto));
        return Ok(Value::from_bool(derived));
    }
    let category = right.to_str();
    if category.eq_ignore_ascii_case("byref") {
        let aliased = left.as_var().is_some_and(|r| r.var.is_alias());
        return Ok(Value::from_bool(aliased));
    }
    match type_check::matches_category(&left.resolved(), &category) {
        Some(matched) => Ok(Value::from_bool(matched)),
        None => Err(Exception::new(&INVALID_TYPE_NAME, &[&category]).into()),
    }
}
