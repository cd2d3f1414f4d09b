use crate::runtime::{
    dispatch::{self, InvokeMode},
    engine::Engine,
    error::{Exception, INVALID_VALUE, RuntimeError},
    object::ObjRef,
    value::Value,
};

use super::helpers::{arg, arg_object, arg_str, this_object};

pub(super) fn builtin_base_get(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let this = this_object(args, "Base")?;
    Ok(this.base().map_or_else(Value::empty, Value::Object))
}

pub(super) fn builtin_base_set(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let this = this_object(args, "Base")?;
    let base = arg_object(args, 1, "Base", "value")?;
    this.set_base(base.clone())?;
    Ok(Value::Object(base))
}

pub(super) fn builtin_clone(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let this = this_object(args, "Clone")?;
    Ok(Value::Object(ObjRef::new(this.clone_object())))
}

/// `DefineProp(name, desc)`: `desc` may carry `Get`, `Set`, `Call` and
/// `Value`. Returns the object.
pub(super) fn builtin_define_prop(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let this = this_object(args, "DefineProp")?;
    let name = arg_str(args, 1);
    let descriptor = arg_object(args, 2, "DefineProp", "descriptor")?;
    let accessor = |field: &str| -> Result<Option<ObjRef>, RuntimeError> {
        match descriptor.own_value(field) {
            None => Ok(None),
            Some(Value::Object(func)) => Ok(Some(func)),
            Some(other) => Err(Exception::new(
                &INVALID_VALUE,
                &[&format!("Descriptor field `{}` must be a function, got {}.", field, other.type_name())],
            )
            .into()),
        }
    };
    let getter = accessor("Get")?;
    let setter = accessor("Set")?;
    let method = accessor("Call")?;
    if let Some(value) = descriptor.own_value("Value") {
        this.set_own_value(&name, value);
    } else if getter.is_some() || setter.is_some() {
        this.define_property(&name, getter, setter);
    }
    if let Some(method) = method {
        this.define_method(&name, method);
    }
    Ok(Value::Object(this))
}

pub(super) fn builtin_delete_prop(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let this = this_object(args, "DeleteProp")?;
    let name = arg_str(args, 1);
    Ok(this.delete_own(&name).unwrap_or_else(Value::empty))
}

pub(super) fn builtin_has_own_prop(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let this = this_object(args, "HasOwnProp")?;
    let name = arg_str(args, 1);
    Ok(Value::from_bool(
        this.has_own_field(&name) || this.own_method(&name).is_some(),
    ))
}

pub(super) fn builtin_own_prop_count(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let this = this_object(args, "OwnPropCount")?;
    Ok(Value::Integer(this.field_count() as i64))
}

fn pairs<'a>(args: &'a [Value], name: &str) -> Result<std::slice::Chunks<'a, Value>, RuntimeError> {
    if args.len() % 2 != 0 {
        return Err(Exception::new(
            &INVALID_VALUE,
            &[&format!("{} expects key/value pairs.", name)],
        )
        .into());
    }
    Ok(args.chunks(2))
}

/// `Object(name1, value1, ...)`
pub(super) fn builtin_object(engine: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let object = Value::Object(engine.new_object());
    for pair in pairs(args, "Object")? {
        let name = pair[0].to_str();
        dispatch::invoke(engine, InvokeMode::Set, &object, Some(&name), vec![pair[1].clone()])?;
    }
    Ok(object)
}

pub(super) fn builtin_array(engine: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Object(engine.new_array(args.to_vec())?))
}

/// `Map(key1, value1, ...)`
pub(super) fn builtin_map(engine: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let map = Value::Object(engine.new_map());
    for pair in pairs(args, "Map")? {
        dispatch::invoke(engine, InvokeMode::Set, &map, None, pair.to_vec())?;
    }
    Ok(map)
}

/// `Error(message?, what?, extra?)`
pub(super) fn builtin_error(engine: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let message = arg(args, 0).map(Value::to_str).unwrap_or_default();
    let error = engine.new_error(&message, &arg_str(args, 1), &arg_str(args, 2));
    Ok(Value::Object(error))
}
