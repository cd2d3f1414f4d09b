use crate::runtime::{
    engine::Engine,
    error::{RuntimeError, type_mismatch},
    number::Number,
    value::Value,
};

use super::helpers::{arg, arg_number, opt_int};

pub(super) fn builtin_integer(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let n = arg_number(args, 0, "Integer", "value")?;
    Ok(Value::Integer(n.as_i64()))
}

pub(super) fn builtin_float(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let n = arg_number(args, 0, "Float", "value")?;
    Ok(Value::Float(n.as_f64()))
}

pub(super) fn builtin_number(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from_number(arg_number(args, 0, "Number", "value")?))
}

pub(super) fn builtin_string(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let value = arg(args, 0).unwrap_or(&Value::Missing);
    if let Value::Object(object) = value {
        return Err(type_mismatch("String", "value", "a string or number", object.type_name()));
    }
    Ok(Value::from(value.to_str().into_owned()))
}

pub(super) fn builtin_abs(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match arg_number(args, 0, "Abs", "value")? {
        Number::Integer(i) => Value::Integer(i.wrapping_abs()),
        Number::Float(f) => Value::Float(f.abs()),
    })
}

pub(super) fn builtin_floor(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match arg_number(args, 0, "Floor", "value")? {
        Number::Integer(i) => Value::Integer(i),
        Number::Float(f) => Value::Integer(f.floor() as i64),
    })
}

pub(super) fn builtin_ceil(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match arg_number(args, 0, "Ceil", "value")? {
        Number::Integer(i) => Value::Integer(i),
        Number::Float(f) => Value::Integer(f.ceil() as i64),
    })
}

/// `Round(n, digits?)`: an integer without digits, a float with positive
/// digits; negative digits round to tens, hundreds and so on.
pub(super) fn builtin_round(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let n = arg_number(args, 0, "Round", "value")?.as_f64();
    let digits = opt_int(args, 1, "Round", "digits", 0)?.clamp(-18, 18) as i32;
    let scale = 10f64.powi(digits);
    let rounded = (n * scale).round() / scale;
    if digits > 0 {
        Ok(Value::Float(rounded))
    } else {
        Ok(Value::Integer(rounded as i64))
    }
}

fn extreme(args: &[Value], name: &str, pick_left: fn(f64, f64) -> bool) -> Result<Value, RuntimeError> {
    let mut best: Option<Number> = None;
    for index in 0..args.len() {
        let n = arg_number(args, index, name, "value")?;
        best = match best {
            Some(current) if !pick_left(n.as_f64(), current.as_f64()) => Some(current),
            _ => Some(n),
        };
    }
    Ok(best.map_or_else(Value::empty, Value::from_number))
}

pub(super) fn builtin_min(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    extreme(args, "Min", |candidate, best| candidate < best)
}

pub(super) fn builtin_max(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    extreme(args, "Max", |candidate, best| candidate > best)
}

/// Remainder with the sign of the dividend; a zero divisor gives the
/// sentinel.
pub(super) fn builtin_mod(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let dividend = arg_number(args, 0, "Mod", "dividend")?;
    let divisor = arg_number(args, 1, "Mod", "divisor")?;
    Ok(match (dividend, divisor) {
        (_, d) if d.is_zero() => Value::nan(),
        (Number::Integer(a), Number::Integer(b)) => Value::Integer(a.wrapping_rem(b)),
        (a, b) => Value::Float(a.as_f64() % b.as_f64()),
    })
}
