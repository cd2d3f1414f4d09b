use crate::runtime::{
    engine::Prototypes,
    func::{Builtin, Callable, NativeFn},
    object::{Native, ObjRef, Object},
    value::Value,
};

mod array_ops;
mod func_ops;
mod helpers;
mod map_ops;
mod numeric_ops;
mod object_ops;
mod string_ops;
pub(crate) mod type_check;


/// A built-in property: either half may be absent. Arity counts the receiver.
pub struct PropertyDef {
    pub name: &'static str,
    pub get: Option<Builtin>,
    pub set: Option<Builtin>,
}

/// The built-in members installed on one prototype.
pub struct MemberTable {
    pub methods: &'static [Builtin],
    pub properties: &'static [PropertyDef],
}

const fn fixed(name: &'static str, min_params: usize, max_params: usize, func: NativeFn) -> Builtin {
    Builtin {
        name,
        min_params,
        max_params,
        variadic: false,
        forwards_refs: false,
        func,
    }
}

const fn variadic(name: &'static str, min_params: usize, func: NativeFn) -> Builtin {
    Builtin {
        name,
        min_params,
        max_params: min_params,
        variadic: true,
        forwards_refs: false,
        func,
    }
}

const fn forwarding(name: &'static str, func: NativeFn) -> Builtin {
    Builtin {
        forwards_refs: true,
        ..variadic(name, 1, func)
    }
}

const fn read_only(name: &'static str, get: NativeFn) -> PropertyDef {
    PropertyDef {
        name,
        get: Some(fixed(name, 1, 1, get)),
        set: None,
    }
}

const fn read_write(name: &'static str, get: NativeFn, set: NativeFn) -> PropertyDef {
    PropertyDef {
        name,
        get: Some(fixed(name, 1, 1, get)),
        set: Some(fixed(name, 2, 2, set)),
    }
}

/// `__Item` takes one parameter after the receiver; the setter sees the
/// value before it.
const fn item(get: NativeFn, set: NativeFn) -> PropertyDef {
    PropertyDef {
        name: "__Item",
        get: Some(fixed("__Item", 2, 2, get)),
        set: Some(fixed("__Item", 3, 3, set)),
    }
}

pub static OBJECT_MEMBERS: MemberTable = MemberTable {
    methods: &[
        fixed("Clone", 1, 1, object_ops::builtin_clone),
        fixed("DefineProp", 3, 3, object_ops::builtin_define_prop),
        fixed("DeleteProp", 2, 2, object_ops::builtin_delete_prop),
        fixed("HasOwnProp", 2, 2, object_ops::builtin_has_own_prop),
        fixed("OwnPropCount", 1, 1, object_ops::builtin_own_prop_count),
    ],
    properties: &[read_write(
        "Base",
        object_ops::builtin_base_get,
        object_ops::builtin_base_set,
    )],
};

pub static ARRAY_MEMBERS: MemberTable = MemberTable {
    methods: &[
        variadic("Push", 1, array_ops::builtin_push),
        fixed("Pop", 1, 1, array_ops::builtin_pop),
        variadic("InsertAt", 2, array_ops::builtin_insert_at),
        fixed("RemoveAt", 2, 3, array_ops::builtin_remove_at),
        fixed("Has", 2, 2, array_ops::builtin_has),
        fixed("Get", 2, 3, array_ops::builtin_get),
    ],
    properties: &[
        read_write(
            "Length",
            array_ops::builtin_length_get,
            array_ops::builtin_length_set,
        ),
        read_write(
            "Capacity",
            array_ops::builtin_capacity_get,
            array_ops::builtin_capacity_set,
        ),
        item(array_ops::builtin_item_get, array_ops::builtin_item_set),
    ],
};

pub static MAP_MEMBERS: MemberTable = MemberTable {
    methods: &[
        fixed("Has", 2, 2, map_ops::builtin_has),
        fixed("Get", 2, 3, map_ops::builtin_get),
        variadic("Set", 1, map_ops::builtin_set),
        fixed("Delete", 2, 2, map_ops::builtin_delete),
        fixed("Clear", 1, 1, map_ops::builtin_clear),
    ],
    properties: &[
        read_only("Count", map_ops::builtin_count),
        read_write(
            "Capacity",
            map_ops::builtin_capacity_get,
            map_ops::builtin_capacity_set,
        ),
        read_write(
            "CaseSense",
            map_ops::builtin_case_sense_get,
            map_ops::builtin_case_sense_set,
        ),
        item(map_ops::builtin_item_get, map_ops::builtin_item_set),
    ],
};

pub static FUNC_MEMBERS: MemberTable = MemberTable {
    methods: &[
        forwarding("Call", func_ops::builtin_call),
        forwarding("Bind", func_ops::builtin_bind),
        fixed("IsByRef", 1, 2, func_ops::builtin_is_byref),
    ],
    properties: &[
        read_only("Name", func_ops::builtin_name),
        read_only("MinParams", func_ops::builtin_min_params),
        read_only("MaxParams", func_ops::builtin_max_params),
        read_only("IsVariadic", func_ops::builtin_is_variadic),
        read_only("IsBuiltIn", func_ops::builtin_is_builtin),
    ],
};

/// Global built-in functions, registered by name at engine creation.
pub static BUILTINS: &[Builtin] = &[
    variadic("Object", 0, object_ops::builtin_object),
    variadic("Array", 0, object_ops::builtin_array),
    variadic("Map", 0, object_ops::builtin_map),
    fixed("Error", 0, 3, object_ops::builtin_error),
    fixed("Type", 1, 1, type_check::builtin_type),
    fixed("IsNumber", 1, 1, type_check::builtin_is_number),
    fixed("IsInteger", 1, 1, type_check::builtin_is_integer),
    fixed("IsFloat", 1, 1, type_check::builtin_is_float),
    fixed("IsObject", 1, 1, type_check::builtin_is_object),
    fixed("IsSet", 0, 1, type_check::builtin_is_set),
    fixed("Integer", 1, 1, numeric_ops::builtin_integer),
    fixed("Float", 1, 1, numeric_ops::builtin_float),
    fixed("String", 1, 1, numeric_ops::builtin_string),
    fixed("Number", 1, 1, numeric_ops::builtin_number),
    fixed("Abs", 1, 1, numeric_ops::builtin_abs),
    fixed("Floor", 1, 1, numeric_ops::builtin_floor),
    fixed("Ceil", 1, 1, numeric_ops::builtin_ceil),
    fixed("Round", 1, 2, numeric_ops::builtin_round),
    variadic("Min", 1, numeric_ops::builtin_min),
    variadic("Max", 1, numeric_ops::builtin_max),
    fixed("Mod", 2, 2, numeric_ops::builtin_mod),
    fixed("StrLen", 1, 1, string_ops::builtin_str_len),
    fixed("SubStr", 2, 3, string_ops::builtin_sub_str),
    fixed("InStr", 2, 4, string_ops::builtin_in_str),
    fixed("StrLower", 1, 1, string_ops::builtin_str_lower),
    fixed("StrUpper", 1, 1, string_ops::builtin_str_upper),
];

fn builtin_func(func_proto: &ObjRef, builtin: &'static Builtin) -> ObjRef {
    ObjRef::new(Object::new(
        Some(func_proto.clone()),
        Native::Func(Callable::Builtin(builtin)),
    ))
}

fn install(target: &ObjRef, func_proto: &ObjRef, table: &'static MemberTable) {
    for method in table.methods {
        target.define_method(method.name, builtin_func(func_proto, method));
    }
    for property in table.properties {
        let getter = property.get.as_ref().map(|b| builtin_func(func_proto, b));
        let setter = property.set.as_ref().map(|b| builtin_func(func_proto, b));
        target.define_property(property.name, getter, setter);
    }
}

/// Populates the built-in prototypes with their native members.
pub(crate) fn install_prototypes(protos: &Prototypes) {
    install(&protos.object, &protos.func, &OBJECT_MEMBERS);
    install(&protos.array, &protos.func, &ARRAY_MEMBERS);
    install(&protos.map, &protos.func, &MAP_MEMBERS);
    install(&protos.func, &protos.func, &FUNC_MEMBERS);
    for field in ["Message", "What", "Extra", "Stack"] {
        protos.error.set_own_value(field, Value::empty());
    }
}
