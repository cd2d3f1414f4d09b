use crate::runtime::{
    engine::Engine,
    error::{RuntimeError, type_mismatch},
    func::Callable,
    object::ObjRef,
    value::Value,
};

use super::helpers::{opt_int, this_object};

fn this_func(args: &[Value], name: &str) -> Result<(ObjRef, Callable), RuntimeError> {
    let this = this_object(args, name)?;
    let callable = this
        .callable()
        .cloned()
        .ok_or_else(|| type_mismatch(name, "this", "a Func", this.type_name()))?;
    Ok((this, callable))
}

pub(super) fn builtin_call(engine: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let (this, _) = this_func(args, "Call")?;
    engine.call_object(&this, args[1..].to_vec())
}

/// Fixes leading arguments. Omitted arguments stay open and are filled by
/// the eventual call. A variable reference bound to a by-reference
/// parameter stays an alias; any other argument is bound by value.
pub(super) fn builtin_bind(engine: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let (this, callable) = this_func(args, "Bind")?;
    let bound = args[1..]
        .iter()
        .enumerate()
        .map(|(i, arg)| match arg {
            Value::Var(_) if callable.is_byref(i + 1) => arg.clone(),
            other => other.resolved(),
        })
        .collect();
    let bound = engine.new_func(Callable::Bound {
        target: this,
        args: bound,
    });
    Ok(Value::Object(bound))
}

pub(super) fn builtin_name(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let (_, callable) = this_func(args, "Name")?;
    Ok(Value::String(callable.name()))
}

pub(super) fn builtin_min_params(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let (_, callable) = this_func(args, "MinParams")?;
    Ok(Value::Integer(callable.min_params() as i64))
}

pub(super) fn builtin_max_params(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let (_, callable) = this_func(args, "MaxParams")?;
    Ok(Value::Integer(callable.max_params() as i64))
}

pub(super) fn builtin_is_variadic(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let (_, callable) = this_func(args, "IsVariadic")?;
    Ok(Value::from_bool(callable.is_variadic()))
}

pub(super) fn builtin_is_builtin(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let (_, callable) = this_func(args, "IsBuiltIn")?;
    Ok(Value::from_bool(callable.is_builtin()))
}

/// `IsByRef(n)` tests parameter `n`; without `n`, whether any parameter is
/// by-reference.
pub(super) fn builtin_is_byref(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let (_, callable) = this_func(args, "IsByRef")?;
    let n = opt_int(args, 1, "IsByRef", "index", 0)?;
    let byref = if n <= 0 {
        (1..=callable.max_params()).any(|i| callable.is_byref(i))
    } else {
        callable.is_byref(n as usize)
    };
    Ok(Value::from_bool(byref))
}
