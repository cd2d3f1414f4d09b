use std::{
    cell::{Cell, Ref, RefCell, RefMut},
    fmt,
    ops::Deref,
    rc::{Rc, Weak},
};

use crate::runtime::{
    array::Array,
    collation::compare_ascii_insensitive,
    context::{self, EngineScope},
    engine::Engine,
    error::{Exception, INVALID_BASE},
    func::Callable,
    leak_detector,
    map::Map,
    value::Value,
};

/// Built-in type a prototype chain ultimately derives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Object,
    Array,
    Map,
    Func,
    Error,
}

impl RootKind {
    pub fn name(self) -> &'static str {
        match self {
            RootKind::Object => "Object",
            RootKind::Array => "Array",
            RootKind::Map => "Map",
            RootKind::Func => "Func",
            RootKind::Error => "Error",
        }
    }
}

/// Native payload carried by built-in object types.
pub enum Native {
    None,
    Array(RefCell<Array>),
    Map(RefCell<Map>),
    Func(Callable),
}

#[derive(Clone)]
pub struct Property {
    pub getter: Option<ObjRef>,
    pub setter: Option<ObjRef>,
}

impl Property {
    /// Positional parameters accepted beyond the receiver (and, for the
    /// setter, the assigned value).
    pub fn max_params(&self) -> usize {
        if let Some(getter) = self.getter.as_ref().and_then(|g| g.callable()) {
            return getter.max_params().saturating_sub(1);
        }
        if let Some(setter) = self.setter.as_ref().and_then(|s| s.callable()) {
            return setter.max_params().saturating_sub(2);
        }
        0
    }

    pub fn min_params(&self) -> usize {
        if let Some(getter) = self.getter.as_ref().and_then(|g| g.callable()) {
            return getter.min_params().saturating_sub(1);
        }
        if let Some(setter) = self.setter.as_ref().and_then(|s| s.callable()) {
            return setter.min_params().saturating_sub(2);
        }
        0
    }

    pub fn is_variadic(&self) -> bool {
        self.getter
            .as_ref()
            .or(self.setter.as_ref())
            .and_then(|f| f.callable())
            .is_some_and(Callable::is_variadic)
    }
}

#[derive(Clone)]
pub enum Slot {
    Value(Value),
    Property(Property),
}

#[derive(Clone)]
struct Field {
    name: Rc<str>,
    slot: Slot,
}

#[derive(Clone)]
struct Method {
    name: Rc<str>,
    func: ObjRef,
}

/// A dynamic object: sorted own fields, sorted own methods, an optional base
/// and a native payload.
pub struct Object {
    fields: RefCell<Vec<Field>>,
    methods: RefCell<Vec<Method>>,
    base: RefCell<Option<ObjRef>>,
    native: Native,
    /// Set on the built-in prototypes only.
    root: Option<RootKind>,
    /// Engine that created the object; finalizes it when released outside
    /// any evaluation.
    owner: Weak<Engine>,
    finalizing: Cell<bool>,
}

fn search<T>(items: &[T], name: &str, key: impl Fn(&T) -> &str) -> Result<usize, usize> {
    items.binary_search_by(|item| compare_ascii_insensitive(key(item), name))
}

impl Object {
    pub fn new(base: Option<ObjRef>, native: Native) -> Self {
        leak_detector::record_object_created();
        Self {
            fields: RefCell::new(Vec::new()),
            methods: RefCell::new(Vec::new()),
            base: RefCell::new(base),
            native,
            root: None,
            owner: Weak::new(),
            finalizing: Cell::new(false),
        }
    }

    pub fn owned_by(mut self, owner: Weak<Engine>) -> Self {
        self.owner = owner;
        self
    }

    pub fn prototype(base: Option<ObjRef>, root: RootKind) -> Self {
        let mut object = Self::new(base, Native::None);
        object.root = Some(root);
        object
    }

    pub fn native(&self) -> &Native {
        &self.native
    }

    pub fn array(&self) -> Option<Ref<'_, Array>> {
        match &self.native {
            Native::Array(a) => Some(a.borrow()),
            _ => None,
        }
    }

    pub fn array_mut(&self) -> Option<RefMut<'_, Array>> {
        match &self.native {
            Native::Array(a) => Some(a.borrow_mut()),
            _ => None,
        }
    }

    pub fn map(&self) -> Option<Ref<'_, Map>> {
        match &self.native {
            Native::Map(m) => Some(m.borrow()),
            _ => None,
        }
    }

    pub fn map_mut(&self) -> Option<RefMut<'_, Map>> {
        match &self.native {
            Native::Map(m) => Some(m.borrow_mut()),
            _ => None,
        }
    }

    pub fn callable(&self) -> Option<&Callable> {
        match &self.native {
            Native::Func(c) => Some(c),
            _ => None,
        }
    }

    pub fn root(&self) -> Option<RootKind> {
        self.root
    }

    pub fn base(&self) -> Option<ObjRef> {
        self.base.borrow().clone()
    }

    pub fn own_field(&self, name: &str) -> Option<Slot> {
        let fields = self.fields.borrow();
        search(&fields, name, |f| &*f.name)
            .ok()
            .map(|i| fields[i].slot.clone())
    }

    pub fn has_own_field(&self, name: &str) -> bool {
        search(&self.fields.borrow(), name, |f| &*f.name).is_ok()
    }

    pub fn own_value(&self, name: &str) -> Option<Value> {
        match self.own_field(name)? {
            Slot::Value(v) => Some(v),
            Slot::Property(_) => None,
        }
    }

    pub fn own_method(&self, name: &str) -> Option<ObjRef> {
        let methods = self.methods.borrow();
        search(&methods, name, |m| &*m.name)
            .ok()
            .map(|i| methods[i].func.clone())
    }

    pub fn field_count(&self) -> usize {
        self.fields.borrow().len()
    }

    pub fn field_names(&self) -> Vec<Rc<str>> {
        self.fields.borrow().iter().map(|f| f.name.clone()).collect()
    }

    fn put_field(&self, name: &str, slot: Slot) {
        let released = {
            let mut fields = self.fields.borrow_mut();
            match search(&fields, name, |f| &*f.name) {
                Ok(i) => Some(std::mem::replace(&mut fields[i].slot, slot)),
                Err(i) => {
                    fields.insert(
                        i,
                        Field {
                            name: Rc::from(name),
                            slot,
                        },
                    );
                    None
                }
            }
        };
        drop(released);
    }

    /// Creates or overwrites an own value field.
    pub fn set_own_value(&self, name: &str, value: Value) {
        self.put_field(name, Slot::Value(value.into_resolved()));
    }

    /// Defines accessors. A half passed as `None` keeps the existing own
    /// accessor of that half, if any.
    pub fn define_property(&self, name: &str, getter: Option<ObjRef>, setter: Option<ObjRef>) {
        let (getter, setter) = match self.own_field(name) {
            Some(Slot::Property(existing)) => (
                getter.or(existing.getter),
                setter.or(existing.setter),
            ),
            _ => (getter, setter),
        };
        self.put_field(name, Slot::Property(Property { getter, setter }));
    }

    pub fn define_method(&self, name: &str, func: ObjRef) {
        let released = {
            let mut methods = self.methods.borrow_mut();
            match search(&methods, name, |m| &*m.name) {
                Ok(i) => Some(std::mem::replace(&mut methods[i].func, func)),
                Err(i) => {
                    methods.insert(
                        i,
                        Method {
                            name: Rc::from(name),
                            func,
                        },
                    );
                    None
                }
            }
        };
        drop(released);
    }

    /// Removes an own field and an own method of that name. Returns the
    /// removed value field, if there was one.
    pub fn delete_own(&self, name: &str) -> Option<Value> {
        let field = {
            let mut fields = self.fields.borrow_mut();
            search(&fields, name, |f| &*f.name)
                .ok()
                .map(|i| fields.remove(i))
        };
        let method = {
            let mut methods = self.methods.borrow_mut();
            search(&methods, name, |m| &*m.name)
                .ok()
                .map(|i| methods.remove(i))
        };
        drop(method);
        match field?.slot {
            Slot::Value(v) => Some(v),
            Slot::Property(_) => None,
        }
    }

    /// Drops every member. Used to break the prototype/method cycles when an
    /// engine shuts down.
    pub(crate) fn clear_members(&self) {
        let fields = std::mem::take(&mut *self.fields.borrow_mut());
        let methods = std::mem::take(&mut *self.methods.borrow_mut());
        let base = self.base.borrow_mut().take();
        drop(fields);
        drop(methods);
        drop(base);
    }

    /// Shallow copy: members and native contents are copied, contained
    /// objects are shared.
    pub fn clone_object(&self) -> Object {
        let native = match &self.native {
            Native::None => Native::None,
            Native::Array(a) => Native::Array(RefCell::new(a.borrow().clone())),
            Native::Map(m) => Native::Map(RefCell::new(m.borrow().clone())),
            Native::Func(c) => Native::Func(c.clone()),
        };
        let object = Object::new(self.base(), native).owned_by(self.owner.clone());
        *object.fields.borrow_mut() = self.fields.borrow().clone();
        *object.methods.borrow_mut() = self.methods.borrow().clone();
        object
    }

    pub fn type_name(&self) -> &'static str {
        match &self.native {
            Native::Array(_) => "Array",
            Native::Map(_) => "Map",
            Native::Func(_) => "Func",
            Native::None if self.root.is_some() => "Prototype",
            Native::None => match root_of_chain(self.base()) {
                Some(RootKind::Error) => "Error",
                _ => "Object",
            },
        }
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        leak_detector::record_object_freed();
    }
}

/// First built-in root found walking from `start` toward the end of the
/// chain.
pub fn root_of_chain(start: Option<ObjRef>) -> Option<RootKind> {
    let mut link = start;
    while let Some(object) = link {
        if let Some(root) = object.root() {
            return Some(root);
        }
        link = object.base();
    }
    None
}

/// Counted reference to an [`Object`]. Releasing the last reference runs the
/// `__Delete` finalizer under the engine active on this thread, or else under
/// the engine that created the object while that engine is still alive.
pub struct ObjRef(Rc<Object>);

impl ObjRef {
    pub fn new(object: Object) -> Self {
        ObjRef(Rc::new(object))
    }

    pub fn ptr_eq(&self, other: &ObjRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// This object followed by each of its bases.
    pub fn chain(&self) -> Chain {
        Chain {
            next: Some(self.clone()),
        }
    }

    pub fn find_method(&self, name: &str) -> Option<ObjRef> {
        self.chain().find_map(|link| link.own_method(name))
    }

    /// True when `proto` appears in this object's base chain.
    pub fn has_base(&self, proto: &ObjRef) -> bool {
        let mut link = self.base();
        while let Some(object) = link {
            if object.ptr_eq(proto) {
                return true;
            }
            link = object.base();
        }
        false
    }

    /// Replaces the base. Rejected when the new chain would derive from a
    /// different built-in root or would contain this object.
    pub fn set_base(&self, new_base: ObjRef) -> Result<(), Exception> {
        if new_base.ptr_eq(self) || new_base.has_base(self) {
            return Err(Exception::new(&INVALID_BASE, &["the new base derives from this object"]));
        }
        let current = root_of_chain(self.base());
        let proposed = root_of_chain(Some(new_base.clone()));
        if current != proposed {
            let reason = format!(
                "a {} cannot derive from {}",
                current.map_or("base-less object", RootKind::name),
                proposed.map_or("a base-less object", RootKind::name)
            );
            return Err(Exception::new(&INVALID_BASE, &[&reason]));
        }
        tracing::debug!(object = self.addr(), base = new_base.addr(), "base changed");
        let old = self.0.base.replace(Some(new_base));
        drop(old);
        Ok(())
    }
}

pub struct Chain {
    next: Option<ObjRef>,
}

impl Iterator for Chain {
    type Item = ObjRef;

    fn next(&mut self) -> Option<ObjRef> {
        let current = self.next.take()?;
        self.next = current.base();
        Some(current)
    }
}

impl Clone for ObjRef {
    fn clone(&self) -> Self {
        ObjRef(self.0.clone())
    }
}

impl Deref for ObjRef {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

impl Drop for ObjRef {
    fn drop(&mut self) {
        if Rc::strong_count(&self.0) != 1 || self.0.finalizing.get() {
            return;
        }
        let Some(finalizer) = self.find_method("__Delete") else {
            return;
        };
        let (engine, _scope) = match context::current() {
            Some(engine) => (engine, None),
            None => match self.0.owner.upgrade() {
                Some(engine) => {
                    let scope = EngineScope::enter(&engine);
                    (engine, Some(scope))
                }
                None => {
                    leak_detector::record_finalizer_skipped();
                    tracing::warn!(object = self.addr(), "__Delete skipped: owning engine is gone");
                    return;
                }
            },
        };
        self.0.finalizing.set(true);
        engine.run_finalizer(ObjRef(self.0.clone()), finalizer);
        self.0.finalizing.set(false);
        if Rc::strong_count(&self.0) > 1 {
            leak_detector::record_resurrection();
            tracing::debug!(object = self.addr(), "object kept alive by its finalizer");
        }
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.type_name(), self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(base: Option<ObjRef>) -> ObjRef {
        ObjRef::new(Object::new(base, Native::None))
    }

    #[test]
    fn fields_are_case_insensitive_and_sorted() {
        let obj = plain(None);
        obj.set_own_value("beta", Value::Integer(2));
        obj.set_own_value("Alpha", Value::Integer(1));
        obj.set_own_value("ALPHA", Value::Integer(3));
        assert_eq!(obj.field_count(), 2);
        assert_eq!(obj.own_value("alpha"), Some(Value::Integer(3)));
        let names: Vec<String> = obj.field_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);
    }

    #[test]
    fn set_base_rejects_cycles() {
        let root = ObjRef::new(Object::prototype(None, RootKind::Object));
        let a = plain(Some(root.clone()));
        let b = plain(Some(a.clone()));
        let err = a.set_base(b.clone()).unwrap_err();
        assert!(err.is(&INVALID_BASE));
        assert!(a.set_base(a.clone()).is_err());
    }

    #[test]
    fn set_base_rejects_root_change() {
        let object_proto = ObjRef::new(Object::prototype(None, RootKind::Object));
        let array_proto = ObjRef::new(Object::prototype(
            Some(object_proto.clone()),
            RootKind::Array,
        ));
        let obj = plain(Some(object_proto.clone()));
        assert!(obj.set_base(array_proto).is_err());
        let other = plain(Some(object_proto));
        assert!(obj.set_base(other.clone()).is_ok());
        assert!(obj.has_base(&other));
    }

    #[test]
    fn clone_copies_fields_shallowly() {
        let obj = plain(None);
        obj.set_own_value("x", Value::Integer(1));
        let copy = ObjRef::new(obj.clone_object());
        copy.set_own_value("x", Value::Integer(2));
        assert_eq!(obj.own_value("x"), Some(Value::Integer(1)));
        assert_eq!(copy.own_value("x"), Some(Value::Integer(2)));
    }

    #[test]
    fn delete_own_removes_field_and_method() {
        let obj = plain(None);
        obj.set_own_value("x", Value::Integer(1));
        assert_eq!(obj.delete_own("X"), Some(Value::Integer(1)));
        assert!(!obj.has_own_field("x"));
        assert_eq!(obj.delete_own("x"), None);
    }
}
