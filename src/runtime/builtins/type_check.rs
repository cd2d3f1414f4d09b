use crate::runtime::{
    engine::Engine,
    error::RuntimeError,
    value::{NumberKind, Value},
};

use super::helpers::arg;

/// Tests `value` against a category name of the `is` operator. `None` for
/// an unknown category. Text-shape categories hold for the empty string.
pub(crate) fn matches_category(value: &Value, category: &str) -> Option<bool> {
    let text_shape = |test: fn(char) -> bool| match value {
        Value::Object(_) | Value::Missing => false,
        other => other.to_str().chars().all(test),
    };
    let matched = match category.to_ascii_lowercase().as_str() {
        "number" => value.number_kind() != NumberKind::NotNumeric,
        "integer" => value.number_kind() == NumberKind::Integer,
        "float" => value.number_kind() == NumberKind::Float,
        "string" => matches!(value, Value::String(_)),
        "object" => matches!(value, Value::Object(_)),
        "alpha" => text_shape(char::is_alphabetic),
        "alnum" => text_shape(char::is_alphanumeric),
        "digit" => text_shape(|c| c.is_ascii_digit()),
        "xdigit" => match value {
            Value::Object(_) | Value::Missing => false,
            other => {
                let text = other.to_str();
                let digits = text
                    .strip_prefix("0x")
                    .or_else(|| text.strip_prefix("0X"))
                    .unwrap_or(&text);
                digits.chars().all(|c| c.is_ascii_hexdigit())
            }
        },
        "upper" => text_shape(|c| !c.is_alphabetic() || c.is_uppercase()),
        "lower" => text_shape(|c| !c.is_alphabetic() || c.is_lowercase()),
        "space" => text_shape(char::is_whitespace),
        _ => return None,
    };
    Some(matched)
}

fn first(args: &[Value]) -> &Value {
    arg(args, 0).unwrap_or(&Value::Missing)
}

pub(super) fn builtin_type(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(first(args).type_name()))
}

pub(super) fn builtin_is_number(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from_bool(
        first(args).number_kind() != NumberKind::NotNumeric,
    ))
}

pub(super) fn builtin_is_integer(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from_bool(
        first(args).number_kind() == NumberKind::Integer,
    ))
}

pub(super) fn builtin_is_float(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from_bool(first(args).number_kind() == NumberKind::Float))
}

pub(super) fn builtin_is_object(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from_bool(matches!(first(args), Value::Object(_))))
}

pub(super) fn builtin_is_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from_bool(!first(args).is_missing()))
}
