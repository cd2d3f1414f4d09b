mod common;

use common::{engine, engine_with_sink, eval};
use keyscript::{
    bytecode::{AssignOp, BinaryOp, Program, UnaryOp, VarSlot},
    runtime::{
        buffer::OutputBuffer,
        error::{EvalError, RuntimeError, THROWN},
        value::Value,
    },
};
use pretty_assertions::assert_eq;

#[test]
fn test_integer_arithmetic() {
    let engine = engine();
    let value = eval(&engine, |b| {
        b.int(5).int(2).binary(BinaryOp::Mul).int(10).binary(BinaryOp::Add);
    });
    assert_eq!(value.unwrap(), Value::Integer(20));
    let value = eval(&engine, |b| {
        b.int(5).unary(UnaryOp::Neg);
    });
    assert_eq!(value.unwrap(), Value::Integer(-5));
}

#[test]
fn numeric_strings_take_part_in_arithmetic() {
    let engine = engine();
    let value = eval(&engine, |b| {
        b.str("40").str("2").binary(BinaryOp::Add);
    });
    assert_eq!(value.unwrap(), Value::Integer(42));
}

#[test]
fn division_by_zero_yields_the_sentinel() {
    let engine = engine();
    let value = eval(&engine, |b| {
        b.int(1).int(0).binary(BinaryOp::Div);
    })
    .unwrap();
    assert!(value.is_nan_sentinel());
}

#[test]
fn bindings_are_visible_as_locals() {
    let engine = engine();
    let code = common::code(|b| {
        b.local(0).str("-").binary(BinaryOp::Concat).local(1).binary(BinaryOp::Concat);
    });
    let value = engine
        .evaluate(&code, &[Value::from("left"), Value::Integer(7)])
        .unwrap();
    assert_eq!(value, Value::from("left-7"));
}

#[test]
fn globals_persist_between_evaluations() {
    let engine = engine();
    let total = engine.define_global("Total");
    for _ in 0..3 {
        eval(&engine, |b| {
            b.global_mut(total).int(5).assign(AssignOp::Add);
        })
        .unwrap();
    }
    assert_eq!(engine.global("total").unwrap().get(), Value::Integer(15));
}

#[test]
fn evaluate_into_appends_to_the_callers_buffer() {
    let engine = engine();
    let mut buffer = OutputBuffer::with_capacity(2);
    let first = engine
        .evaluate_into(
            &common::code(|b| {
                b.str("hello");
            }),
            &[],
            &mut buffer,
        )
        .unwrap();
    let second = engine
        .evaluate_into(
            &common::code(|b| {
                b.int(6).int(7).binary(BinaryOp::Mul);
            }),
            &[],
            &mut buffer,
        )
        .unwrap();
    assert_eq!(buffer.get(first), "hello");
    assert_eq!(buffer.get(second), "42");
    assert!(buffer.growths() >= 1);
}

#[test]
fn result_references_are_read_through() {
    let engine = engine();
    let x = engine.define_global("x");
    let value = eval(&engine, |b| {
        b.global_mut(x).int(3).assign(AssignOp::Set);
    })
    .unwrap();
    assert_eq!(value, Value::Integer(3));
    assert!(!matches!(value, Value::Var(_)));
}

#[test]
fn malformed_streams_are_evaluation_errors() {
    let engine = engine();
    let err = eval(&engine, |b| {
        b.binary(BinaryOp::Add);
    })
    .unwrap_err();
    assert!(matches!(err, RuntimeError::Eval(EvalError::StackUnderflow(_))));

    let err = eval(&engine, |b| {
        b.int(1).int(2);
    })
    .unwrap_err();
    assert!(matches!(err, RuntimeError::Eval(EvalError::LeftoverValues(2))));

    let err = eval(&engine, |b| {
        b.var(VarSlot::Free(3));
    })
    .unwrap_err();
    assert!(matches!(err, RuntimeError::Eval(EvalError::UnresolvedSlot(_))));
}

#[test]
fn failures_of_main_reach_the_error_sink() {
    let (engine, reports) = engine_with_sink();
    let program: Program = serde_json::from_str(
        r#"{
            "main": [
                { "code": [{ "push": 1 }], "line": 1 },
                { "code": [{ "push": "boom" }, "throw"], "line": 2 },
                { "code": [{ "push": 3 }], "line": 3 }
            ]
        }"#,
    )
    .unwrap();
    engine.load(&program).unwrap();
    let err = engine.run_main().unwrap_err();
    assert!(err.is(&THROWN));

    let reports = reports.borrow();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].contains("boom"));
    assert!(reports[0].contains("--> line 2"));
    assert!(engine.last_error().is_some());
}

#[test]
fn thrown_values_keep_their_payload() {
    let engine = engine();
    let err = eval(&engine, |b| {
        b.func("Error").str("bad input").str("Parse").call(2).throw();
    })
    .unwrap_err();
    let exception = err.exception().unwrap();
    assert_eq!(exception.message, "bad input");
    assert_eq!(exception.what.as_deref(), Some("Parse"));
    match exception.payload.as_ref() {
        Some(Value::Object(error)) => assert_eq!(error.type_name(), "Error"),
        other => panic!("expected an Error payload, got {:?}", other),
    }
}

#[test]
fn call_stack_is_empty_after_each_evaluation() {
    let engine = engine();
    eval(&engine, |b| {
        b.int(1);
    })
    .unwrap();
    let _ = eval(&engine, |b| {
        b.str("x").throw();
    });
    assert_eq!(engine.call_depth(), 0);
}
