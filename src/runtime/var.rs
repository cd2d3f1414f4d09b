use std::{cell::RefCell, collections::TryReserveError, fmt, rc::Rc};

use crate::runtime::{
    number,
    object::ObjRef,
    value::{NumberKind, Value, kind_of_text},
};

enum Contents {
    Integer(i64),
    Float(f64),
    Text(String),
    Object(ObjRef),
    /// A by-reference parameter bound to the caller's variable.
    Alias(Rc<Var>),
}

/// A named variable cell.
///
/// Writers swap the new contents in and drop the old contents only after the
/// `RefCell` borrow has ended, so a finalizer triggered by the release may
/// read or write this same variable.
pub struct Var {
    name: Rc<str>,
    contents: RefCell<Contents>,
}

impl Var {
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            contents: RefCell::new(Contents::Text(String::new())),
        }
    }

    pub fn with_value(name: &str, value: Value) -> Self {
        let var = Self::new(name);
        var.set(value);
        var
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn alias_target(&self) -> Option<Rc<Var>> {
        match &*self.contents.borrow() {
            Contents::Alias(target) => Some(target.clone()),
            _ => None,
        }
    }

    /// The variable that actually holds the contents.
    pub fn target(self: &Rc<Self>) -> Rc<Var> {
        let mut current = self.clone();
        while let Some(next) = current.alias_target() {
            current = next;
        }
        current
    }

    fn with_contents<R>(&self, f: impl FnOnce(&Contents) -> R) -> R {
        match self.alias_target() {
            Some(target) => target.with_contents(f),
            None => f(&self.contents.borrow()),
        }
    }

    fn replace_contents(&self, new: Contents) {
        match self.alias_target() {
            Some(target) => target.replace_contents(new),
            None => {
                let old = self.contents.replace(new);
                drop(old);
            }
        }
    }

    pub fn is_alias(&self) -> bool {
        self.alias_target().is_some()
    }

    pub fn get(&self) -> Value {
        self.with_contents(|contents| match contents {
            Contents::Integer(i) => Value::Integer(*i),
            Contents::Float(f) => Value::Float(*f),
            Contents::Text(s) => Value::String(Rc::from(s.as_str())),
            Contents::Object(o) => Value::Object(o.clone()),
            Contents::Alias(_) => Value::empty(),
        })
    }

    pub fn object(&self) -> Option<ObjRef> {
        self.with_contents(|contents| match contents {
            Contents::Object(o) => Some(o.clone()),
            _ => None,
        })
    }

    pub fn set(&self, value: Value) {
        let new = match value.into_resolved() {
            Value::Integer(i) => Contents::Integer(i),
            Value::Float(f) => Contents::Float(f),
            Value::String(s) => Contents::Text(String::from(&*s)),
            Value::Object(o) => Contents::Object(o),
            Value::Var(_) | Value::Missing => Contents::Text(String::new()),
        };
        self.replace_contents(new);
    }

    /// Empties the variable, releasing whatever it held.
    pub fn clear(&self) {
        self.replace_contents(Contents::Text(String::new()));
    }

    /// Binds this cell to `target` so reads and writes go to the target.
    pub fn alias_to(&self, target: Rc<Var>) {
        let old = self.contents.replace(Contents::Alias(target));
        drop(old);
    }

    /// Appends to the text buffer in place. Numeric or object contents are
    /// first converted to text.
    pub fn append(&self, suffix: &str) -> Result<(), TryReserveError> {
        if let Some(target) = self.alias_target() {
            return target.append(suffix);
        }
        let mut contents = self.contents.borrow_mut();
        let released = match &mut *contents {
            Contents::Text(buffer) => {
                buffer.try_reserve(suffix.len())?;
                buffer.push_str(suffix);
                None
            }
            other => {
                let mut text = match other {
                    Contents::Integer(i) => number::format_integer(*i),
                    Contents::Float(f) => number::format_float(*f),
                    _ => String::new(),
                };
                text.try_reserve(suffix.len())?;
                text.push_str(suffix);
                Some(std::mem::replace(other, Contents::Text(text)))
            }
        };
        drop(contents);
        drop(released);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.with_contents(|contents| match contents {
            Contents::Text(s) => s.len(),
            Contents::Integer(i) => number::format_integer(*i).len(),
            Contents::Float(f) => number::format_float(*f).len(),
            Contents::Object(_) | Contents::Alias(_) => 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.with_contents(|contents| matches!(contents, Contents::Text(s) if s.is_empty()))
    }

    pub fn is_pure_number(&self) -> bool {
        self.with_contents(|contents| {
            matches!(contents, Contents::Integer(_) | Contents::Float(_))
        })
    }

    pub fn number_kind(&self) -> NumberKind {
        self.with_contents(|contents| match contents {
            Contents::Integer(_) => NumberKind::Integer,
            Contents::Float(_) => NumberKind::Float,
            Contents::Text(s) => kind_of_text(s),
            Contents::Object(_) | Contents::Alias(_) => NumberKind::NotNumeric,
        })
    }

    pub fn is_numeric(&self) -> bool {
        self.number_kind() != NumberKind::NotNumeric
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_alias() {
            return write!(f, "Var({} -> alias)", self.name);
        }
        write!(f, "Var({} = {:?})", self.name, self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_text_in_place() {
        let var = Var::with_value("s", Value::from("ab"));
        var.append("cd").unwrap();
        var.append("").unwrap();
        assert_eq!(var.get(), Value::from("abcd"));
        assert_eq!(var.len(), 4);
    }

    #[test]
    fn append_converts_numbers_to_text() {
        let var = Var::with_value("n", Value::Integer(12));
        var.append("3").unwrap();
        assert_eq!(var.get(), Value::from("123"));
        assert!(!var.is_pure_number());
        assert!(var.is_numeric());
    }

    #[test]
    fn alias_forwards_reads_and_writes() {
        let outer = Rc::new(Var::with_value("outer", Value::Integer(1)));
        let param = Var::new("param");
        param.alias_to(outer.clone());
        assert_eq!(param.get(), Value::Integer(1));
        param.set(Value::Integer(5));
        assert_eq!(outer.get(), Value::Integer(5));
        param.append("0").unwrap();
        assert_eq!(outer.get(), Value::from("50"));
        assert!(param.is_alias());
    }

    #[test]
    fn set_resolves_var_references() {
        let source = Rc::new(Var::with_value("a", Value::Float(1.5)));
        let dest = Var::new("b");
        dest.set(Value::var(source.clone(), crate::bytecode::Intent::Read));
        source.set(Value::Integer(0));
        assert_eq!(dest.get(), Value::Float(1.5));
    }

    #[test]
    fn new_var_is_blank() {
        let var = Var::new("x");
        assert!(var.is_empty());
        assert_eq!(var.number_kind(), NumberKind::NotNumeric);
    }
}
