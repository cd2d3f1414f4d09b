mod common;

use common::{define_simple, engine, eval};
use keyscript::{
    bytecode::{AssignOp, BinaryOp},
    runtime::{
        error::{INVALID_VALUE, KEY_NOT_FOUND},
        map::MapKey,
        value::Value,
    },
};
use pretty_assertions::assert_eq;

#[test]
fn integer_and_string_keys_are_distinct() {
    let engine = engine();
    let m = engine.define_global("m");
    eval(&engine, |b| {
        b.global_mut(m)
            .int(1)
            .str("int")
            .str("1")
            .str("string")
            .float(1.5)
            .str("float")
            .map(3)
            .assign(AssignOp::Set);
    })
    .unwrap();

    let count = eval(&engine, |b| {
        b.global(m).get_member("Count", 0);
    });
    assert_eq!(count.unwrap(), Value::Integer(3));
    let by_int = eval(&engine, |b| {
        b.global(m).int(1).get_item(1);
    });
    assert_eq!(by_int.unwrap(), Value::from("int"));
    let by_string = eval(&engine, |b| {
        b.global(m).str("1").get_item(1);
    });
    assert_eq!(by_string.unwrap(), Value::from("string"));
    let by_float_text = eval(&engine, |b| {
        b.global(m).str("1.5").get_item(1);
    });
    assert_eq!(by_float_text.unwrap(), Value::from("float"));
}

#[test]
fn entries_are_grouped_and_sorted_by_segment() {
    let engine = engine();
    let map = engine.new_map();
    let key_object = engine.new_object();
    engine
        .evaluate(
            &common::code(|b| {
                b.local(0)
                    .str("b")
                    .int(1)
                    .int(10)
                    .int(2)
                    .local(1)
                    .int(3)
                    .int(-5)
                    .int(4)
                    .str("a")
                    .int(5)
                    .call_method("Set", 10);
            }),
            &[Value::Object(map.clone()), Value::Object(key_object.clone())],
        )
        .unwrap();

    let contents = map.map().unwrap();
    let keys: Vec<String> = contents
        .entries()
        .iter()
        .map(|(key, _)| match key {
            MapKey::Integer(i) => i.to_string(),
            MapKey::Object(_) => "<object>".to_string(),
            MapKey::String(s) => s.to_string(),
        })
        .collect();
    assert_eq!(keys, vec!["-5", "10", "<object>", "a", "b"]);
    assert_eq!(contents.integer_entries().len(), 2);
    assert_eq!(contents.object_entries().len(), 1);
    assert_eq!(contents.string_entries().len(), 2);
}

#[test]
fn object_keys_compare_by_identity() {
    let engine = engine();
    let map = engine.new_map();
    let first = engine.new_object();
    let second = engine.new_object();
    let result = engine.evaluate(
        &common::code(|b| {
            b.local(0)
                .local(1)
                .str("first")
                .call_method("Set", 2)
                .pop()
                .local(0)
                .local(2)
                .call_method("Has", 1);
        }),
        &[
            Value::Object(map.clone()),
            Value::Object(first),
            Value::Object(second),
        ],
    );
    assert_eq!(result.unwrap(), Value::Integer(0));
}

#[test]
fn case_sense_controls_string_key_matching() {
    let engine = engine();
    let map = engine.new_map();
    let result = engine.evaluate(
        &common::code(|b| {
            b.local(0)
                .str("Off")
                .set_member("CaseSense", 0)
                .pop()
                .local(0)
                .str("Key")
                .str("upper")
                .set_item(1)
                .pop()
                .local(0)
                .str("KEY")
                .get_item(1);
        }),
        &[Value::Object(map.clone())],
    );
    assert_eq!(result.unwrap(), Value::from("upper"));

    let err = engine
        .evaluate(
            &common::code(|b| {
                b.local(0).str("On").set_member("CaseSense", 0);
            }),
            &[Value::Object(map)],
        )
        .unwrap_err();
    assert!(err.is(&INVALID_VALUE));
}

#[test]
fn missing_keys_raise_unless_a_default_is_given() {
    let engine = engine();
    let map = engine.new_map();
    let err = engine
        .evaluate(
            &common::code(|b| {
                b.local(0).str("nope").get_item(1);
            }),
            &[Value::Object(map.clone())],
        )
        .unwrap_err();
    assert!(err.is(&KEY_NOT_FOUND));

    let value = engine.evaluate(
        &common::code(|b| {
            b.local(0).str("nope").str("fallback").call_method("Get", 2);
        }),
        &[Value::Object(map.clone())],
    );
    assert_eq!(value.unwrap(), Value::from("fallback"));

    let err = engine
        .evaluate(
            &common::code(|b| {
                b.local(0).str("nope").call_method("Delete", 1);
            }),
            &[Value::Object(map)],
        )
        .unwrap_err();
    assert!(err.is(&KEY_NOT_FOUND));
}

#[test]
fn delete_and_clear_release_values() {
    let engine = engine();
    let m = engine.define_global("m");
    eval(&engine, |b| {
        b.global_mut(m)
            .str("a")
            .int(1)
            .str("b")
            .int(2)
            .str("c")
            .int(3)
            .map(3)
            .assign(AssignOp::Set);
    })
    .unwrap();

    let removed = eval(&engine, |b| {
        b.global(m).str("b").call_method("Delete", 1);
    });
    assert_eq!(removed.unwrap(), Value::Integer(2));
    let count = eval(&engine, |b| {
        b.global(m).get_member("Count", 0);
    });
    assert_eq!(count.unwrap(), Value::Integer(2));

    eval(&engine, |b| {
        b.global(m).call_method("Clear", 0);
    })
    .unwrap();
    let count = eval(&engine, |b| {
        b.global(m).get_member("Count", 0);
    });
    assert_eq!(count.unwrap(), Value::Integer(0));
}

/// A value's finalizer reads the map it was just removed from.
#[test]
fn finalizers_of_removed_values_may_reenter_the_map() {
    let engine = engine();
    let m = engine.define_global("m");
    let log = engine.define_global("log");
    engine.global("log").unwrap().set(Value::from(""));
    define_simple(&engine, "Report", &["this"], |b| {
        b.global_mut(log)
            .global(m)
            .get_member("Count", 0)
            .str(";")
            .binary(BinaryOp::Concat)
            .assign(AssignOp::Concat);
    });
    let tracked = |engine: &keyscript::runtime::engine::Engine| {
        let object = engine.new_object();
        object.define_method("__Delete", engine.function("Report").unwrap());
        Value::Object(object)
    };
    let map = engine.new_map();
    engine.global("m").unwrap().set(Value::Object(map.clone()));
    engine
        .evaluate(
            &common::code(|b| {
                b.local(0)
                    .str("x")
                    .local(1)
                    .str("y")
                    .local(2)
                    .str("z")
                    .local(3)
                    .call_method("Set", 6);
            }),
            &[
                Value::Object(map.clone()),
                tracked(&engine),
                tracked(&engine),
                tracked(&engine),
            ],
        )
        .unwrap();
    assert_eq!(engine.global("log").unwrap().get(), Value::from(""));

    // The removed value is dropped by `Pop` while the engine is current.
    eval(&engine, |b| {
        b.global(m).str("x").call_method("Delete", 1).pop().int(0);
    })
    .unwrap();
    assert_eq!(engine.global("log").unwrap().get(), Value::from("2;"));

    eval(&engine, |b| {
        b.global(m).call_method("Clear", 0);
    })
    .unwrap();
    assert_eq!(engine.global("log").unwrap().get(), Value::from("2;0;0;"));
}

#[test]
fn capacity_never_drops_below_the_count() {
    let engine = engine();
    let map = engine.new_map();
    let capacity = engine.evaluate(
        &common::code(|b| {
            b.local(0)
                .str("k")
                .int(1)
                .call_method("Set", 2)
                .int(0)
                .set_member("Capacity", 0)
                .pop()
                .local(0)
                .get_member("Capacity", 0);
        }),
        &[Value::Object(map)],
    );
    let capacity = common::int(&capacity.unwrap());
    assert!(capacity >= 1);
}
