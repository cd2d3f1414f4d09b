use std::rc::Rc;

use crate::{
    bytecode::{builder::ExprBuilder, op_code::AssignOp},
    runtime::{
        config::RuntimeConfig,
        engine::Engine,
        error::{NOT_ASSIGNABLE, RuntimeError},
        value::Value,
    },
};

fn setup() -> (Rc<Engine>, u32, u32) {
    let engine = Engine::new(RuntimeConfig::default());
    let x = engine.define_global("x");
    let y = engine.define_global("y");
    (engine, x, y)
}

fn run(engine: &Rc<Engine>, build: impl FnOnce(&mut ExprBuilder)) -> Result<Value, RuntimeError> {
    let mut builder = ExprBuilder::new();
    build(&mut builder);
    engine.evaluate(&builder.build(), &[])
}

fn global(engine: &Engine, name: &str) -> Value {
    engine.global(name).unwrap().get()
}

#[test]
fn plain_assignment_yields_the_value() {
    let (engine, x, _) = setup();
    let result = run(&engine, |b| {
        b.global_mut(x).int(5).assign(AssignOp::Set);
    });
    assert_eq!(result.unwrap(), Value::Integer(5));
    assert_eq!(global(&engine, "x"), Value::Integer(5));
}

#[test]
fn compound_assignment_applies_the_operator() {
    let (engine, x, _) = setup();
    engine.global("x").unwrap().set(Value::Integer(10));
    run(&engine, |b| {
        b.global_mut(x).int(3).assign(AssignOp::Sub);
    })
    .unwrap();
    assert_eq!(global(&engine, "x"), Value::Integer(7));

    run(&engine, |b| {
        b.global_mut(x).int(2).assign(AssignOp::Div);
    })
    .unwrap();
    assert_eq!(global(&engine, "x"), Value::Float(3.5));
}

#[test]
fn concat_assignment_appends() {
    let (engine, x, _) = setup();
    engine.global("x").unwrap().set(Value::from("ab"));
    run(&engine, |b| {
        b.global_mut(x).int(1).assign(AssignOp::Concat);
    })
    .unwrap();
    assert_eq!(global(&engine, "x").to_str(), "ab1");
}

#[test]
fn floor_division_by_zero_stores_sentinel() {
    let (engine, x, _) = setup();
    engine.global("x").unwrap().set(Value::Integer(4));
    run(&engine, |b| {
        b.global_mut(x).int(0).assign(AssignOp::FloorDiv);
    })
    .unwrap();
    assert!(global(&engine, "x").is_nan_sentinel());
}

#[test]
fn assignments_chain_right_to_left() {
    let (engine, x, y) = setup();
    run(&engine, |b| {
        b.global_mut(y)
            .global_mut(x)
            .int(3)
            .assign(AssignOp::Set)
            .assign(AssignOp::Set);
    })
    .unwrap();
    assert_eq!(global(&engine, "x"), Value::Integer(3));
    assert_eq!(global(&engine, "y"), Value::Integer(3));
}

#[test]
fn read_reference_is_not_assignable() {
    let (engine, x, _) = setup();
    let err = run(&engine, |b| {
        b.global(x).int(1).assign(AssignOp::Set);
    })
    .unwrap_err();
    assert!(err.is(&NOT_ASSIGNABLE));
}
