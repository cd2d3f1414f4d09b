use std::{borrow::Cow, fmt, rc::Rc};

use crate::{
    bytecode::instruction::Intent,
    runtime::{
        number::{self, Number},
        object::ObjRef,
        var::Var,
    },
};

/// Tagged runtime value carried on the evaluator stack, in variables, and
/// in object fields.
///
/// ## Ownership
///
/// Strings are immutable `Rc<str>` slices; appends that should happen in
/// place go through a [`Var`] whose text buffer is growable. Objects are
/// reference counted through [`ObjRef`], whose last release runs the
/// object's `__Delete` finalizer.
///
/// `Var` is a reference to a variable cell rather than its contents. It is
/// resolved lazily when an operator reads it, and stays a reference where
/// the operator needs one (assignment targets, by-reference arguments,
/// the `is "byref"` test).
///
/// Containers and fields never store `Var` or `Missing`.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    Var(VarRef),
    Object(ObjRef),
    /// An omitted call argument.
    Missing,
}

#[derive(Debug, Clone)]
pub struct VarRef {
    pub var: Rc<Var>,
    pub intent: Intent,
}

/// Result of the numeric classification query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    NotNumeric,
    Integer,
    Float,
}

/// Returned in place of a number by invalid arithmetic.
pub const NAN_SENTINEL: &str = "NaN";

impl Value {
    pub fn empty() -> Self {
        Value::String(Rc::from(""))
    }

    pub fn nan() -> Self {
        Value::String(Rc::from(NAN_SENTINEL))
    }

    pub fn from_bool(b: bool) -> Self {
        Value::Integer(i64::from(b))
    }

    pub fn var(var: Rc<Var>, intent: Intent) -> Self {
        Value::Var(VarRef { var, intent })
    }

    pub fn from_number(n: Number) -> Self {
        match n {
            Number::Integer(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }

    /// Reads through a variable reference; other values are cloned.
    pub fn resolved(&self) -> Value {
        match self {
            Value::Var(r) => r.var.get(),
            other => other.clone(),
        }
    }

    /// Consumes the value, reading through a variable reference.
    pub fn into_resolved(self) -> Value {
        match self {
            Value::Var(r) => r.var.get(),
            other => other,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_nan_sentinel(&self) -> bool {
        matches!(self.resolved(), Value::String(s) if &*s == NAN_SENTINEL)
    }

    /// True only for values already tagged integer or float.
    pub fn is_pure_number(&self) -> bool {
        match self {
            Value::Integer(_) | Value::Float(_) => true,
            Value::Var(r) => r.var.is_pure_number(),
            _ => false,
        }
    }

    pub fn number_kind(&self) -> NumberKind {
        match self {
            Value::Integer(_) => NumberKind::Integer,
            Value::Float(_) => NumberKind::Float,
            Value::String(s) => kind_of_text(s),
            Value::Var(r) => r.var.number_kind(),
            Value::Object(_) | Value::Missing => NumberKind::NotNumeric,
        }
    }

    /// The value as a number, if it is one or is numeric text.
    pub fn to_number(&self) -> Option<Number> {
        match self {
            Value::Integer(i) => Some(Number::Integer(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::String(s) => number::parse(s),
            Value::Var(r) => r.var.get().to_number(),
            Value::Object(_) | Value::Missing => None,
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => match number::parse(s) {
                Some(n) => !n.is_zero(),
                None => !s.is_empty(),
            },
            Value::Var(r) => r.var.get().to_bool(),
            Value::Object(_) => true,
            Value::Missing => false,
        }
    }

    pub fn to_int64(&self) -> i64 {
        self.to_number().map_or(0, Number::as_i64)
    }

    pub fn to_double(&self) -> f64 {
        self.to_number().map_or(0.0, Number::as_f64)
    }

    /// String form of the value. String values are borrowed; objects format
    /// as the empty string.
    pub fn to_str(&self) -> Cow<'_, str> {
        match self {
            Value::Integer(i) => Cow::Owned(number::format_integer(*i)),
            Value::Float(f) => Cow::Owned(number::format_float(*f)),
            Value::String(s) => Cow::Borrowed(&**s),
            Value::Var(r) => Cow::Owned(r.var.get().to_str().into_owned()),
            Value::Object(_) | Value::Missing => Cow::Borrowed(""),
        }
    }

    pub fn as_object(&self) -> Option<ObjRef> {
        match self {
            Value::Object(o) => Some(o.clone()),
            Value::Var(r) => r.var.object(),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&VarRef> {
        match self {
            Value::Var(r) => Some(r),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Var(r) => r.var.get().type_name(),
            Value::Object(o) => o.type_name(),
            Value::Missing => "Missing",
        }
    }
}

pub(crate) fn kind_of_text(text: &str) -> NumberKind {
    match number::parse(text) {
        Some(Number::Integer(_)) => NumberKind::Integer,
        Some(Number::Float(_)) => NumberKind::Float,
        None => NumberKind::NotNumeric,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Var(a), Value::Var(b)) => Rc::ptr_eq(&a.var, &b.var),
            (Value::Missing, Value::Missing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(o) => write!(f, "<{}>", o.type_name()),
            Value::Missing => f.write_str("<missing>"),
            other => f.write_str(&other.to_str()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<ObjRef> for Value {
    fn from(value: ObjRef) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_bool_follows_numeric_text() {
        assert!(Value::Integer(3).to_bool());
        assert!(!Value::Float(0.0).to_bool());
        assert!(!Value::from("0").to_bool());
        assert!(!Value::from(" 0.0 ").to_bool());
        assert!(Value::from("abc").to_bool());
        assert!(!Value::from("").to_bool());
        assert!(!Value::Missing.to_bool());
    }

    #[test]
    fn numeric_conversions_are_lenient() {
        assert_eq!(Value::from(" 12 ").to_int64(), 12);
        assert_eq!(Value::from("0x10").to_int64(), 16);
        assert_eq!(Value::from("2.9").to_int64(), 2);
        assert_eq!(Value::from("-2.9").to_int64(), -2);
        assert_eq!(Value::from("junk").to_int64(), 0);
        assert_eq!(Value::from("junk").to_double(), 0.0);
        assert_eq!(Value::Integer(3).to_double(), 3.0);
    }

    #[test]
    fn to_str_formats_numbers() {
        assert_eq!(Value::Integer(-5).to_str(), "-5");
        assert_eq!(Value::Float(2.0).to_str(), "2.0");
        assert_eq!(Value::Float(0.5).to_str(), "0.5");
        assert!(matches!(Value::from("x").to_str(), Cow::Borrowed("x")));
    }

    #[test]
    fn pure_number_differs_from_numeric_text() {
        assert!(Value::Integer(1).is_pure_number());
        assert!(!Value::from("1").is_pure_number());
        assert_eq!(Value::from("1").number_kind(), NumberKind::Integer);
        assert_eq!(Value::from("1.0").number_kind(), NumberKind::Float);
        assert_eq!(Value::from("one").number_kind(), NumberKind::NotNumeric);
    }

    #[test]
    fn var_reference_reads_through() {
        let var = Rc::new(Var::new("x"));
        var.set(Value::Integer(9));
        let value = Value::var(var.clone(), Intent::Read);
        assert_eq!(value.resolved(), Value::Integer(9));
        assert_eq!(value.number_kind(), NumberKind::Integer);
        var.set(Value::from("text"));
        assert_eq!(value.to_str(), "text");
    }
}
