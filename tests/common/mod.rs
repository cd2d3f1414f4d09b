#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use keyscript::{
    bytecode::{ExprBuilder, Expression, FunctionDef},
    runtime::{
        config::RuntimeConfig,
        engine::Engine,
        error::{ErrorSink, RuntimeError},
        func::UserFunc,
        value::Value,
    },
};

/// Keeps every reported error's rendered text.
#[derive(Clone, Default)]
pub struct CollectingSink {
    pub reports: Rc<RefCell<Vec<String>>>,
}

impl ErrorSink for CollectingSink {
    fn report(&self, error: &RuntimeError) {
        self.reports.borrow_mut().push(error.render());
    }
}

pub fn engine() -> Rc<Engine> {
    Engine::new(RuntimeConfig::default())
}

pub fn engine_with_sink() -> (Rc<Engine>, Rc<RefCell<Vec<String>>>) {
    let sink = CollectingSink::default();
    let reports = sink.reports.clone();
    (
        Engine::with_sink(RuntimeConfig::default(), Box::new(sink)),
        reports,
    )
}

pub fn code(build: impl FnOnce(&mut ExprBuilder)) -> Vec<keyscript::bytecode::Instruction> {
    let mut builder = ExprBuilder::new();
    build(&mut builder);
    builder.build()
}

pub fn eval(engine: &Rc<Engine>, build: impl FnOnce(&mut ExprBuilder)) -> Result<Value, RuntimeError> {
    engine.evaluate(&code(build), &[])
}

pub fn expr(line: u32, build: impl FnOnce(&mut ExprBuilder)) -> Expression {
    Expression::new(code(build), line)
}

pub fn define(engine: &Engine, def: FunctionDef) {
    engine.define_function(UserFunc::from_def(&def));
}

/// A function with plain by-value parameters and a single-expression body.
pub fn define_simple(
    engine: &Engine,
    name: &str,
    params: &[&str],
    build: impl FnOnce(&mut ExprBuilder),
) {
    let mut def = FunctionDef::new(name);
    def.params = params
        .iter()
        .map(|p| keyscript::bytecode::ParamDef::new(*p))
        .collect();
    def.body = vec![expr(1, build)];
    define(engine, def);
}

pub fn int(value: &Value) -> i64 {
    match value {
        Value::Integer(i) => *i,
        other => panic!("expected an integer, got {:?}", other),
    }
}
