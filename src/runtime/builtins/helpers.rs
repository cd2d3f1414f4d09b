use std::borrow::Cow;

use crate::runtime::{
    array::Array,
    error::{RuntimeError, type_mismatch},
    map::Map,
    number::Number,
    object::ObjRef,
    value::Value,
};

/// The argument at `index`, unless it was omitted.
pub(super) fn arg(args: &[Value], index: usize) -> Option<&Value> {
    args.get(index).filter(|value| !value.is_missing())
}

pub(super) fn arg_str(args: &[Value], index: usize) -> Cow<'_, str> {
    arg(args, index).map_or(Cow::Borrowed(""), Value::to_str)
}

pub(super) fn arg_number(
    args: &[Value],
    index: usize,
    name: &str,
    label: &str,
) -> Result<Number, RuntimeError> {
    let value = arg(args, index).unwrap_or(&Value::Missing);
    value
        .to_number()
        .ok_or_else(|| type_mismatch(name, label, "a number", value.type_name()))
}

pub(super) fn arg_int(
    args: &[Value],
    index: usize,
    name: &str,
    label: &str,
) -> Result<i64, RuntimeError> {
    arg_number(args, index, name, label).map(Number::as_i64)
}

pub(super) fn opt_int(
    args: &[Value],
    index: usize,
    name: &str,
    label: &str,
    default: i64,
) -> Result<i64, RuntimeError> {
    match arg(args, index) {
        Some(_) => arg_int(args, index, name, label),
        None => Ok(default),
    }
}

pub(super) fn arg_object(
    args: &[Value],
    index: usize,
    name: &str,
    label: &str,
) -> Result<ObjRef, RuntimeError> {
    let value = arg(args, index).unwrap_or(&Value::Missing);
    value
        .as_object()
        .ok_or_else(|| type_mismatch(name, label, "an object", value.type_name()))
}

/// The receiver of a built-in method.
pub(super) fn this_object(args: &[Value], name: &str) -> Result<ObjRef, RuntimeError> {
    arg_object(args, 0, name, "this")
}

/// Runs `f` on the receiver's array. Values `f` returns are dropped by the
/// caller, after the array borrow ends.
pub(super) fn with_array<R>(
    args: &[Value],
    name: &str,
    f: impl FnOnce(&mut Array) -> Result<R, RuntimeError>,
) -> Result<R, RuntimeError> {
    let this = this_object(args, name)?;
    let mut array = this
        .array_mut()
        .ok_or_else(|| type_mismatch(name, "this", "an Array", this.type_name()))?;
    f(&mut array)
}

pub(super) fn with_map<R>(
    args: &[Value],
    name: &str,
    f: impl FnOnce(&mut Map) -> Result<R, RuntimeError>,
) -> Result<R, RuntimeError> {
    let this = this_object(args, name)?;
    let mut map = this
        .map_mut()
        .ok_or_else(|| type_mismatch(name, "this", "a Map", this.type_name()))?;
    f(&mut map)
}

/// Non-negative size argument, as taken by `Length` and `Capacity`.
pub(super) fn arg_size(
    args: &[Value],
    index: usize,
    name: &str,
) -> Result<usize, RuntimeError> {
    let size = arg_int(args, index, name, "value")?;
    usize::try_from(size)
        .map_err(|_| type_mismatch(name, "value", "a non-negative integer", &size.to_string()))
}
