use crate::{
    bytecode::op_code::BinaryOp,
    runtime::{
        collation::CaseSense,
        config::RuntimeConfig,
        engine::Engine,
        error::INVALID_TYPE_NAME,
        value::Value,
        var::Var,
    },
};

use super::comparison_ops::{compare, is_test};

fn check(op: BinaryOp, left: impl Into<Value>, right: impl Into<Value>) -> bool {
    compare(op, &left.into(), &right.into(), CaseSense::Insensitive).to_bool()
}

#[test]
fn numeric_strings_compare_numerically() {
    assert!(check(BinaryOp::Gt, "10", "9"));
    assert!(check(BinaryOp::Eq, "1.0", 1_i64));
    assert!(check(BinaryOp::Lt, -1_i64, "0x1"));
}

#[test]
fn text_compares_under_configured_mode() {
    assert!(check(BinaryOp::Eq, "abc", "ABC"));
    assert!(!check(BinaryOp::Ne, "abc", "ABC"));
    assert!(check(BinaryOp::Lt, "apple", "Banana"));
}

#[test]
fn case_equality_is_always_sensitive() {
    assert!(!check(BinaryOp::CaseEq, "abc", "ABC"));
    assert!(check(BinaryOp::CaseNe, "abc", "ABC"));
}

#[test]
fn mixed_number_and_text_compare_as_text() {
    assert!(check(BinaryOp::Gt, "abc", 5_i64));
    assert!(!check(BinaryOp::Eq, "5a", 5_i64));
}

#[test]
fn results_are_integer_flags() {
    let result = compare(BinaryOp::Eq, &Value::Integer(1), &Value::Integer(1), CaseSense::Sensitive);
    assert_eq!(result, Value::Integer(1));
    let result = compare(BinaryOp::Eq, &Value::Integer(1), &Value::Integer(2), CaseSense::Sensitive);
    assert_eq!(result, Value::Integer(0));
}

#[test]
fn case_equality_with_objects_uses_identity() {
    let engine = Engine::new(RuntimeConfig::default());
    let a = Value::Object(engine.new_object());
    let b = Value::Object(engine.new_object());
    assert!(check(BinaryOp::CaseEq, a.clone(), a.clone()));
    assert!(!check(BinaryOp::CaseEq, a.clone(), b));
    assert!(!check(BinaryOp::CaseEq, a.clone(), ""));
    assert!(check(BinaryOp::CaseNe, a, ""));
}

#[test]
fn is_checks_prototype_chain() {
    let engine = Engine::new(RuntimeConfig::default());
    let array = Value::Object(engine.new_array(Vec::new()).unwrap());
    let array_proto = Value::Object(engine.protos().array.clone());
    let object_proto = Value::Object(engine.protos().object.clone());
    let map_proto = Value::Object(engine.protos().map.clone());
    assert!(is_test(&array, &array_proto).unwrap().to_bool());
    assert!(is_test(&array, &object_proto).unwrap().to_bool());
    assert!(!is_test(&array, &map_proto).unwrap().to_bool());
    assert!(!is_test(&Value::Integer(1), &object_proto).unwrap().to_bool());
}

#[test]
fn is_checks_type_categories() {
    assert!(is_test(&Value::from("12"), &Value::from("integer")).unwrap().to_bool());
    assert!(!is_test(&Value::from("1x"), &Value::from("number")).unwrap().to_bool());
    let err = is_test(&Value::Integer(1), &Value::from("gadget")).unwrap_err();
    assert!(err.is(&INVALID_TYPE_NAME));
}

#[test]
fn is_byref_detects_aliases() {
    use crate::bytecode::instruction::Intent;
    use std::rc::Rc;

    let target = Rc::new(Var::with_value("x", Value::Integer(1)));
    let alias = Rc::new(Var::new("p"));
    alias.alias_to(target.clone());
    let byref = Value::from("byref");
    assert!(is_test(&Value::var(alias, Intent::Read), &byref).unwrap().to_bool());
    assert!(!is_test(&Value::var(target, Intent::Read), &byref).unwrap().to_bool());
}
