use crate::runtime::{
    collation::CaseSense,
    engine::Engine,
    error::{Exception, INVALID_VALUE, KEY_NOT_FOUND, RuntimeError},
    map::MapKey,
    value::Value,
};

use super::helpers::{arg, arg_size, this_object, with_map};

fn key_arg(args: &[Value], index: usize) -> Result<MapKey, RuntimeError> {
    MapKey::from_value(arg(args, index).unwrap_or(&Value::Missing))
}

fn key_not_found(key: &MapKey) -> RuntimeError {
    Exception::new(&KEY_NOT_FOUND, &[&key.to_value().to_str()]).into()
}

pub(super) fn builtin_count(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    with_map(args, "Count", |map| Ok(Value::Integer(map.len() as i64)))
}

pub(super) fn builtin_capacity_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    with_map(args, "Capacity", |map| Ok(Value::Integer(map.capacity() as i64)))
}

pub(super) fn builtin_capacity_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let capacity = arg_size(args, 1, "Capacity")?;
    with_map(args, "Capacity", |map| map.set_capacity(capacity))?;
    Ok(Value::Integer(capacity as i64))
}

pub(super) fn builtin_case_sense_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    with_map(args, "CaseSense", |map| Ok(Value::from(map.case_sense().name())))
}

pub(super) fn builtin_case_sense_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let requested = arg(args, 1).map(Value::to_str).unwrap_or_default();
    let mode = CaseSense::parse(&requested).ok_or_else(|| {
        Exception::new(
            &INVALID_VALUE,
            &[&format!("`{}` is not a CaseSense mode.", requested)],
        )
    })?;
    with_map(args, "CaseSense", |map| map.set_case_sense(mode))?;
    Ok(Value::from(mode.name()))
}

/// `map[k]`
pub(super) fn builtin_item_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let key = key_arg(args, 1)?;
    with_map(args, "__Item", |map| map.get(&key).ok_or_else(|| key_not_found(&key)))
}

/// `map[k] := v`; the value comes before the key.
pub(super) fn builtin_item_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let value = arg(args, 1).cloned().unwrap_or_else(Value::empty);
    let key = key_arg(args, 2)?;
    let replaced = with_map(args, "__Item", |map| map.set(key, value.clone()))?;
    drop(replaced);
    Ok(value)
}

pub(super) fn builtin_has(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let key = key_arg(args, 1)?;
    with_map(args, "Has", |map| Ok(Value::from_bool(map.has(&key))))
}

pub(super) fn builtin_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let key = key_arg(args, 1)?;
    let default = arg(args, 2).cloned();
    with_map(args, "Get", |map| {
        map.get(&key)
            .or(default)
            .ok_or_else(|| key_not_found(&key))
    })
}

/// `Set(k1, v1, k2, v2, ...)`; returns the map.
pub(super) fn builtin_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let pairs = &args[1.min(args.len())..];
    if pairs.len() % 2 != 0 {
        return Err(Exception::new(&INVALID_VALUE, &["Set expects key/value pairs."]).into());
    }
    for pair in pairs.chunks(2) {
        let key = MapKey::from_value(&pair[0])?;
        let replaced = with_map(args, "Set", |map| map.set(key, pair[1].clone()))?;
        drop(replaced);
    }
    Ok(Value::Object(this_object(args, "Set")?))
}

/// Removes a key and returns its value.
pub(super) fn builtin_delete(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let key = key_arg(args, 1)?;
    let removed = with_map(args, "Delete", |map| {
        map.remove(&key).ok_or_else(|| key_not_found(&key))
    })?;
    let (old_key, value) = removed;
    drop(old_key);
    Ok(value)
}

pub(super) fn builtin_clear(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = with_map(args, "Clear", |map| Ok(map.clear()))?;
    drop(entries);
    Ok(Value::empty())
}
