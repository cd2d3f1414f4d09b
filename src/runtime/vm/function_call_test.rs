use std::rc::Rc;

use crate::{
    bytecode::{
        builder::ExprBuilder,
        instruction::{Literal, VarSlot},
        op_code::{AssignOp, BinaryOp},
        program::{Expression, FunctionDef, ParamDef},
    },
    runtime::{
        config::RuntimeConfig,
        engine::Engine,
        error::{
            MISSING_PARAMETER, NOT_A_FUNCTION, RECURSION_LIMIT, RuntimeError,
            WRONG_NUMBER_OF_ARGUMENTS,
        },
        func::UserFunc,
        value::Value,
    },
};

fn body(build: impl FnOnce(&mut ExprBuilder)) -> Vec<Expression> {
    let mut builder = ExprBuilder::new();
    build(&mut builder);
    vec![Expression::new(builder.build(), 1)]
}

fn define(engine: &Engine, def: FunctionDef) {
    engine.define_function(UserFunc::from_def(&def));
}

fn run(engine: &Rc<Engine>, build: impl FnOnce(&mut ExprBuilder)) -> Result<Value, RuntimeError> {
    let mut builder = ExprBuilder::new();
    build(&mut builder);
    engine.evaluate(&builder.build(), &[])
}

/// `Add(a, b := 10) { return a + b }`
fn engine_with_add() -> Rc<Engine> {
    let engine = Engine::new(RuntimeConfig::default());
    let mut def = FunctionDef::new("Add");
    def.params.push(ParamDef::new("a"));
    def.params
        .push(ParamDef::new("b").with_default(Literal::Integer(10)));
    def.body = body(|b| {
        b.local(0).local(1).binary(BinaryOp::Add).ret();
    });
    define(&engine, def);
    engine
}

#[test]
fn calls_user_function_with_defaults() {
    let engine = engine_with_add();
    let result = run(&engine, |b| {
        b.func("add").int(1).int(2).call(2);
    });
    assert_eq!(result.unwrap(), Value::Integer(3));
    let result = run(&engine, |b| {
        b.func("Add").int(1).call(1);
    });
    assert_eq!(result.unwrap(), Value::Integer(11));
}

#[test]
fn omitted_argument_takes_default() {
    let engine = engine_with_add();
    let result = run(&engine, |b| {
        b.func("Add").int(5).missing().call(2);
    });
    assert_eq!(result.unwrap(), Value::Integer(15));
}

#[test]
fn missing_required_parameter_raises() {
    let engine = engine_with_add();
    let err = run(&engine, |b| {
        b.func("Add").call(0);
    })
    .unwrap_err();
    assert!(err.is(&MISSING_PARAMETER));
}

#[test]
fn too_many_arguments_raises() {
    let engine = engine_with_add();
    let err = run(&engine, |b| {
        b.func("Add").int(1).int(2).int(3).call(3);
    })
    .unwrap_err();
    assert!(err.is(&WRONG_NUMBER_OF_ARGUMENTS));
}

#[test]
fn builtin_arity_is_checked() {
    let engine = Engine::new(RuntimeConfig::default());
    let err = run(&engine, |b| {
        b.func("StrLen").call(0);
    })
    .unwrap_err();
    assert!(err.is(&WRONG_NUMBER_OF_ARGUMENTS));
}

#[test]
fn calling_a_non_function_raises() {
    let engine = Engine::new(RuntimeConfig::default());
    let err = run(&engine, |b| {
        b.int(5).call(0);
    })
    .unwrap_err();
    assert!(err.is(&NOT_A_FUNCTION));
}

#[test]
fn byref_parameter_writes_callers_variable() {
    let engine = Engine::new(RuntimeConfig::default());
    let x = engine.define_global("x");
    engine.global("x").unwrap().set(Value::Integer(1));
    let mut def = FunctionDef::new("Bump");
    def.params.push(ParamDef::new("n").byref());
    def.body = body(|b| {
        b.local_mut(0).int(41).assign(AssignOp::Add);
    });
    define(&engine, def);

    run(&engine, |b| {
        b.func("Bump").global_mut(x).call(1);
    })
    .unwrap();
    assert_eq!(engine.global("x").unwrap().get(), Value::Integer(42));
}

#[test]
fn by_value_parameter_leaves_caller_alone() {
    let engine = Engine::new(RuntimeConfig::default());
    let x = engine.define_global("x");
    engine.global("x").unwrap().set(Value::Integer(1));
    let mut def = FunctionDef::new("Bump");
    def.params.push(ParamDef::new("n"));
    def.body = body(|b| {
        b.local_mut(0).int(41).assign(AssignOp::Add);
    });
    define(&engine, def);

    run(&engine, |b| {
        b.func("Bump").global_mut(x).call(1);
    })
    .unwrap();
    assert_eq!(engine.global("x").unwrap().get(), Value::Integer(1));
}

#[test]
fn variadic_extras_are_packed_into_an_array() {
    let engine = Engine::new(RuntimeConfig::default());
    let mut def = FunctionDef::new("Count");
    def.params.push(ParamDef::new("first"));
    def.variadic = true;
    def.body = body(|b| {
        b.local(1).get_member("Length", 0).ret();
    });
    define(&engine, def);

    let result = run(&engine, |b| {
        b.func("Count").int(1).int(2).int(3).call(3);
    });
    assert_eq!(result.unwrap(), Value::Integer(2));
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let engine = Engine::new(RuntimeConfig::default().with_max_call_depth(16));
    let mut def = FunctionDef::new("Forever");
    def.body = body(|b| {
        b.func("Forever").call(0).ret();
    });
    define(&engine, def);

    let err = run(&engine, |b| {
        b.func("Forever").call(0);
    })
    .unwrap_err();
    assert!(err.is(&RECURSION_LIMIT));
    assert_eq!(engine.call_depth(), 0);
}

#[test]
fn recursion_keeps_each_invocations_locals() {
    // Sum(n) { local := n; if n > 0 { Sum(n - 1) }; return local }
    let engine = Engine::new(RuntimeConfig::default());
    let mut def = FunctionDef::new("Keep");
    def.params.push(ParamDef::new("n"));
    def.locals.push("local".to_string());
    let mut first = ExprBuilder::new();
    first.local_mut(1).local(0).assign(AssignOp::Set);
    let mut second = ExprBuilder::new();
    second.local(0).int(0).binary(BinaryOp::Gt).ternary(
        |b| {
            b.func("Keep").local(0).int(1).binary(BinaryOp::Sub).call(1);
        },
        |b| {
            b.int(0);
        },
    );
    let mut third = ExprBuilder::new();
    third.local(1).ret();
    def.body = vec![
        Expression::new(first.build(), 1),
        Expression::new(second.build(), 2),
        Expression::new(third.build(), 3),
    ];
    define(&engine, def);

    let result = run(&engine, |b| {
        b.func("Keep").int(3).call(1);
    });
    assert_eq!(result.unwrap(), Value::Integer(3));
}

#[test]
fn closures_share_captured_cells() {
    let engine = Engine::new(RuntimeConfig::default());
    let counter = engine.define_global("counter");
    engine.global("counter").unwrap().set(Value::Integer(0));

    let mut inner = FunctionDef::new("Tick");
    inner.captures.push(VarSlot::Global(counter));
    inner.body = body(|b| {
        b.var_mut(VarSlot::Free(0)).unary(crate::bytecode::op_code::UnaryOp::PreInc).ret();
    });
    define(&engine, inner);

    let result = run(&engine, |b| {
        b.closure("Tick").call(0).pop().closure("Tick").call(0);
    });
    assert_eq!(result.unwrap(), Value::Integer(2));
    assert_eq!(engine.global("counter").unwrap().get(), Value::Integer(2));
}

#[test]
fn bound_arguments_fill_leading_slots() {
    let engine = engine_with_add();
    let result = run(&engine, |b| {
        b.func("Add")
            .int(100)
            .call_method("Bind", 1)
            .int(5)
            .call(1);
    });
    assert_eq!(result.unwrap(), Value::Integer(105));
}

/// `Store(&out, v) { out := v }`
fn engine_with_store() -> Rc<Engine> {
    let engine = Engine::new(RuntimeConfig::default());
    let mut def = FunctionDef::new("Store");
    def.params.push(ParamDef::new("out").byref());
    def.params.push(ParamDef::new("v"));
    def.body = body(|b| {
        b.local_mut(0).local(1).assign(AssignOp::Set);
    });
    define(&engine, def);
    engine
}

#[test]
fn call_method_passes_references_through() {
    let engine = engine_with_store();
    let x = engine.define_global("x");
    run(&engine, |b| {
        b.func("Store")
            .global_mut(x)
            .int(42)
            .call_method("Call", 2);
    })
    .unwrap();
    assert_eq!(engine.global("x").unwrap().get(), Value::Integer(42));
}

#[test]
fn bind_keeps_references_for_byref_parameters() {
    let engine = engine_with_store();
    let x = engine.define_global("x");
    let setter = engine.define_global("setter");
    run(&engine, |b| {
        b.global_mut(setter)
            .func("Store")
            .global_mut(x)
            .call_method("Bind", 1)
            .assign(AssignOp::Set);
    })
    .unwrap();
    run(&engine, |b| {
        b.global(setter).int(7).call(1);
    })
    .unwrap();
    assert_eq!(engine.global("x").unwrap().get(), Value::Integer(7));
}

#[test]
fn bind_copies_by_value_arguments_when_binding() {
    let engine = engine_with_add();
    let y = engine.define_global("y");
    let add_y = engine.define_global("addY");
    engine.global("y").unwrap().set(Value::Integer(1));
    run(&engine, |b| {
        b.global_mut(add_y)
            .func("Add")
            .global(y)
            .call_method("Bind", 1)
            .assign(AssignOp::Set);
    })
    .unwrap();
    engine.global("y").unwrap().set(Value::Integer(50));
    let result = run(&engine, |b| {
        b.global(add_y).int(5).call(1);
    });
    assert_eq!(result.unwrap(), Value::Integer(6));
}

#[test]
fn thrown_errors_record_the_function_frame() {
    let engine = Engine::new(RuntimeConfig::default());
    let mut def = FunctionDef::new("Fail");
    def.body = body(|b| {
        b.str("nope").throw();
    });
    define(&engine, def);

    let err = run(&engine, |b| {
        b.func("Fail").call(0);
    })
    .unwrap_err();
    let exception = err.exception().unwrap();
    let frames: Vec<&str> = exception.stack.iter().map(|e| &*e.name).collect();
    assert_eq!(frames, vec!["Fail", "<main>"]);
    assert!(engine.in_flight().is_none());
}
