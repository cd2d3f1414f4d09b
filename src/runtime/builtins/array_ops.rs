use crate::runtime::{
    engine::Engine,
    error::{Exception, INDEX_OUT_OF_RANGE, INVALID_VALUE, RuntimeError},
    value::Value,
};

use super::helpers::{arg, arg_int, arg_size, opt_int, with_array};

fn unset_item(index: i64) -> RuntimeError {
    Exception::new(&INVALID_VALUE, &[&format!("Item {} has no value.", index)]).into()
}

pub(super) fn builtin_length_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    with_array(args, "Length", |array| Ok(Value::Integer(array.len() as i64)))
}

pub(super) fn builtin_length_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let len = arg_size(args, 1, "Length")?;
    let truncated = with_array(args, "Length", |array| array.set_len(len))?;
    drop(truncated);
    Ok(Value::Integer(len as i64))
}

pub(super) fn builtin_capacity_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    with_array(args, "Capacity", |array| {
        Ok(Value::Integer(array.capacity() as i64))
    })
}

pub(super) fn builtin_capacity_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let capacity = arg_size(args, 1, "Capacity")?;
    with_array(args, "Capacity", |array| array.set_capacity(capacity))?;
    Ok(Value::Integer(capacity as i64))
}

/// `arr[i]`
pub(super) fn builtin_item_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let index = arg_int(args, 1, "__Item", "index")?;
    with_array(args, "__Item", |array| {
        let offset = array.checked_index(index, false)?;
        match array.get(offset) {
            Some(Value::Missing) | None => Err(unset_item(index)),
            Some(value) => Ok(value.clone()),
        }
    })
}

/// `arr[i] := v`; the value comes before the index.
pub(super) fn builtin_item_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let value = arg(args, 1).cloned().unwrap_or(Value::Missing);
    let index = arg_int(args, 2, "__Item", "index")?;
    let replaced = with_array(args, "__Item", |array| {
        let offset = array.checked_index(index, false)?;
        Ok(array.set(offset, value.clone()))
    })?;
    drop(replaced);
    Ok(value)
}

pub(super) fn builtin_push(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let values = args.iter().skip(1).cloned().collect();
    with_array(args, "Push", |array| array.push_all(values))?;
    Ok(Value::empty())
}

pub(super) fn builtin_pop(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    with_array(args, "Pop", |array| {
        array
            .pop()
            .ok_or_else(|| Exception::new(&INDEX_OUT_OF_RANGE, &["-1", "0"]).into())
    })
}

pub(super) fn builtin_insert_at(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let index = arg_int(args, 1, "InsertAt", "index")?;
    let values = args.iter().skip(2).cloned().collect();
    with_array(args, "InsertAt", |array| {
        let offset = array.checked_index(index, true)?;
        array.insert_at(offset, values)
    })?;
    Ok(Value::empty())
}

/// `RemoveAt(i)` returns the removed item; `RemoveAt(i, n)` returns nothing.
pub(super) fn builtin_remove_at(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let index = arg_int(args, 1, "RemoveAt", "index")?;
    let count = opt_int(args, 2, "RemoveAt", "length", 1)?;
    let single = arg(args, 2).is_none();
    let removed = with_array(args, "RemoveAt", |array| {
        let offset = array.checked_index(index, false)?;
        let available = array.len() - offset;
        if count < 0 || count as usize > available {
            return Err(Exception::new(
                &INDEX_OUT_OF_RANGE,
                &[&index.to_string(), &array.len().to_string()],
            )
            .into());
        }
        Ok(array.remove_at(offset, count as usize))
    })?;
    if single {
        Ok(removed.into_iter().next().unwrap_or_else(Value::empty))
    } else {
        drop(removed);
        Ok(Value::empty())
    }
}

pub(super) fn builtin_has(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let index = arg_int(args, 1, "Has", "index")?;
    with_array(args, "Has", |array| {
        let present = array
            .resolve_index(index, false)
            .and_then(|offset| array.get(offset))
            .is_some_and(|value| !value.is_missing());
        Ok(Value::from_bool(present))
    })
}

pub(super) fn builtin_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let index = arg_int(args, 1, "Get", "index")?;
    let default = arg(args, 2).cloned();
    with_array(args, "Get", |array| {
        let found = array
            .resolve_index(index, false)
            .and_then(|offset| array.get(offset))
            .filter(|value| !value.is_missing())
            .cloned();
        match (found, default) {
            (Some(value), _) | (None, Some(value)) => Ok(value),
            (None, None) => {
                array.checked_index(index, false)?;
                Err(unset_item(index))
            }
        }
    })
}
