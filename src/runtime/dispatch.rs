//! Member access on objects: the `Invoke(mode, name, receiver, args)` entry
//! point shared by the evaluator, the built-ins and embedders.
//!
//! Get and set walk the prototype chain and stop at the first link that
//! defines the name at all. A property found there whose requested half is
//! missing is completed from deeper links defining the same half; value
//! fields further down stay shadowed. Calls look up methods separately and
//! never fall back to fields.

use crate::runtime::{
    engine::Engine,
    error::{
        Exception, NOT_AN_OBJECT, READ_ONLY_PROPERTY, RuntimeError, UNKNOWN_METHOD,
        UNKNOWN_PROPERTY, WRITE_ONLY_PROPERTY,
    },
    object::{ObjRef, Property, Slot},
    value::Value,
};

/// Member name used for `[]` access.
pub const ITEM: &str = "__Item";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeMode {
    Get,
    /// The assigned value is the last argument.
    Set,
    Call,
}

#[derive(Clone, Copy)]
enum Half {
    Getter,
    Setter,
}

/// Reads, writes or calls `name` on `receiver`. `name` of `None` means
/// `__Item`. Returns the member's value, the assigned value or the call's
/// result.
pub fn invoke(
    engine: &Engine,
    mode: InvokeMode,
    receiver: &Value,
    name: Option<&str>,
    mut args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let name = name.unwrap_or(ITEM);
    let Some(target) = receiver.as_object() else {
        return Err(Exception::new(&NOT_AN_OBJECT, &[receiver.type_name()])
            .with_extra(name)
            .into());
    };
    match mode {
        InvokeMode::Get => get_member(engine, &target, name, args),
        InvokeMode::Set => {
            let value = args.pop().unwrap_or(Value::Missing).into_resolved();
            set_member(engine, &target, name, args, value.clone())?;
            Ok(value)
        }
        InvokeMode::Call => call_method(engine, &target, name, args),
    }
}

/// First link defining `name`, with its depth in the chain.
fn lookup(target: &ObjRef, name: &str) -> Option<(usize, Slot)> {
    target
        .chain()
        .enumerate()
        .find_map(|(depth, link)| link.own_field(name).map(|slot| (depth, slot)))
}

/// The requested accessor half, taken from the property itself or from a
/// deeper link defining the same half.
fn accessor(
    target: &ObjRef,
    name: &str,
    depth: usize,
    property: &Property,
    half: Half,
) -> Option<ObjRef> {
    let pick = |p: &Property| match half {
        Half::Getter => p.getter.clone(),
        Half::Setter => p.setter.clone(),
    };
    pick(property).or_else(|| {
        target
            .chain()
            .skip(depth + 1)
            .find_map(|link| match link.own_field(name) {
                Some(Slot::Property(deeper)) => pick(&deeper),
                _ => None,
            })
    })
}

/// Whether `func` accepts parameters beyond its fixed leading arguments.
fn takes_params(func: &ObjRef, fixed: usize) -> bool {
    func.callable()
        .is_some_and(|c| c.is_variadic() || c.max_params() > fixed)
}

fn with_receiver(target: &ObjRef, leading: Option<Value>, params: Vec<Value>) -> Vec<Value> {
    let mut args = Vec::with_capacity(params.len() + 2);
    args.push(Value::Object(target.clone()));
    args.extend(leading);
    args.extend(params);
    args
}

/// Applies leftover parameters to a value as `[]` access.
fn forward_item(engine: &Engine, value: Value, params: Vec<Value>) -> Result<Value, RuntimeError> {
    if params.is_empty() {
        Ok(value)
    } else {
        invoke(engine, InvokeMode::Get, &value, None, params)
    }
}

fn get_member(
    engine: &Engine,
    target: &ObjRef,
    name: &str,
    params: Vec<Value>,
) -> Result<Value, RuntimeError> {
    match lookup(target, name) {
        Some((_, Slot::Value(value))) => forward_item(engine, value, params),
        Some((depth, Slot::Property(property))) => {
            let getter = accessor(target, name, depth, &property, Half::Getter)
                .ok_or_else(|| Exception::new(&WRITE_ONLY_PROPERTY, &[name]))?;
            if params.is_empty() || takes_params(&getter, 1) {
                engine.call_object(&getter, with_receiver(target, None, params))
            } else {
                let value = engine.call_object(&getter, with_receiver(target, None, Vec::new()))?;
                forward_item(engine, value, params)
            }
        }
        None => match target.find_method("__Get") {
            Some(meta) => {
                let params = engine.new_array(params)?;
                engine.call_object(
                    &meta,
                    vec![
                        Value::Object(target.clone()),
                        Value::from(name),
                        Value::Object(params),
                    ],
                )
            }
            None => Err(Exception::new(&UNKNOWN_PROPERTY, &[target.type_name(), name]).into()),
        },
    }
}

fn set_member(
    engine: &Engine,
    target: &ObjRef,
    name: &str,
    params: Vec<Value>,
    value: Value,
) -> Result<(), RuntimeError> {
    match lookup(target, name) {
        Some((_, Slot::Value(current))) => {
            if params.is_empty() {
                target.set_own_value(name, value);
                Ok(())
            } else {
                write_through(engine, current, params, value)
            }
        }
        Some((depth, Slot::Property(property))) => {
            let setter = accessor(target, name, depth, &property, Half::Setter);
            match setter {
                Some(setter) if params.is_empty() || takes_params(&setter, 2) => {
                    engine.call_object(&setter, with_receiver(target, Some(value), params))?;
                    Ok(())
                }
                None if params.is_empty() => {
                    Err(Exception::new(&READ_ONLY_PROPERTY, &[name]).into())
                }
                _ => {
                    let getter = accessor(target, name, depth, &property, Half::Getter)
                        .ok_or_else(|| Exception::new(&READ_ONLY_PROPERTY, &[name]))?;
                    let current =
                        engine.call_object(&getter, with_receiver(target, None, Vec::new()))?;
                    write_through(engine, current, params, value)
                }
            }
        }
        None => match target.find_method("__Set") {
            Some(meta) => {
                let params = engine.new_array(params)?;
                engine.call_object(
                    &meta,
                    vec![
                        Value::Object(target.clone()),
                        Value::from(name),
                        Value::Object(params),
                        value,
                    ],
                )?;
                Ok(())
            }
            None if params.is_empty() => {
                target.set_own_value(name, value);
                Ok(())
            }
            None => Err(Exception::new(&UNKNOWN_PROPERTY, &[target.type_name(), name]).into()),
        },
    }
}

/// `obj.prop[i] := v` where `prop` is not itself indexed: assigns into the
/// object `prop` holds.
fn write_through(
    engine: &Engine,
    current: Value,
    mut params: Vec<Value>,
    value: Value,
) -> Result<(), RuntimeError> {
    if current.as_object().is_none() {
        return Err(Exception::new(&NOT_AN_OBJECT, &[current.type_name()])
            .with_extra(ITEM)
            .into());
    }
    params.push(value);
    invoke(engine, InvokeMode::Set, &current, None, params)?;
    Ok(())
}

fn call_method(
    engine: &Engine,
    target: &ObjRef,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    if let Some(method) = target.find_method(name) {
        return engine.call_object(&method, with_receiver(target, None, args));
    }
    match target.find_method("__Call") {
        Some(meta) => {
            let args = engine.new_array(args)?;
            engine.call_object(
                &meta,
                vec![
                    Value::Object(target.clone()),
                    Value::from(name),
                    Value::Object(args),
                ],
            )
        }
        None => Err(Exception::new(&UNKNOWN_METHOD, &[target.type_name(), name]).into()),
    }
}
