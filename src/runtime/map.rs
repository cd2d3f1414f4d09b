use std::{cmp::Ordering, rc::Rc};

use crate::runtime::{
    collation::CaseSense,
    error::{Exception, INVALID_VALUE, RuntimeError, out_of_memory},
    number,
    object::ObjRef,
    value::Value,
};

#[derive(Debug, Clone)]
pub enum MapKey {
    Integer(i64),
    Object(ObjRef),
    String(Rc<str>),
}

impl MapKey {
    /// Classifies a key. Integer-tagged values become integer keys; floats
    /// and numeric strings stay string keys, so `1` and `"1"` differ.
    pub fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        match value.resolved() {
            Value::Integer(i) => Ok(MapKey::Integer(i)),
            Value::Float(f) => Ok(MapKey::String(Rc::from(number::format_float(f)))),
            Value::String(s) => Ok(MapKey::String(s)),
            Value::Object(o) => Ok(MapKey::Object(o)),
            Value::Var(_) | Value::Missing => {
                Err(Exception::new(&INVALID_VALUE, &["Map keys cannot be omitted."]).into())
            }
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Integer(i) => Value::Integer(*i),
            MapKey::Object(o) => Value::Object(o.clone()),
            MapKey::String(s) => Value::String(s.clone()),
        }
    }

    fn segment(&self) -> Segment {
        match self {
            MapKey::Integer(_) => Segment::Integer,
            MapKey::Object(_) => Segment::Object,
            MapKey::String(_) => Segment::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Integer,
    Object,
    String,
}

/// Sorted key/value storage split into three contiguous segments:
/// integer keys, then object keys (by identity), then string keys.
///
/// Invariant: `0 <= object_start <= string_start <= entries.len()`.
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: Vec<(MapKey, Value)>,
    object_start: usize,
    string_start: usize,
    case_sense: CaseSense,
}

impl Map {
    pub fn new() -> Self {
        Self {
            case_sense: CaseSense::Sensitive,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn case_sense(&self) -> CaseSense {
        self.case_sense
    }

    /// The string comparison mode can only change while the map is empty.
    pub fn set_case_sense(&mut self, mode: CaseSense) -> Result<(), RuntimeError> {
        if !self.entries.is_empty() {
            return Err(Exception::new(
                &INVALID_VALUE,
                &["CaseSense cannot be changed while the map has items."],
            )
            .into());
        }
        self.case_sense = mode;
        Ok(())
    }

    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), RuntimeError> {
        let capacity = capacity.max(self.entries.len());
        if capacity > self.entries.capacity() {
            let additional = capacity - self.entries.len();
            self.entries
                .try_reserve_exact(additional)
                .map_err(|_| out_of_memory(additional))?;
        } else {
            self.entries.shrink_to(capacity);
        }
        Ok(())
    }

    pub fn entries(&self) -> &[(MapKey, Value)] {
        &self.entries
    }

    pub fn integer_entries(&self) -> &[(MapKey, Value)] {
        &self.entries[..self.object_start]
    }

    pub fn object_entries(&self) -> &[(MapKey, Value)] {
        &self.entries[self.object_start..self.string_start]
    }

    pub fn string_entries(&self) -> &[(MapKey, Value)] {
        &self.entries[self.string_start..]
    }

    fn bounds(&self, segment: Segment) -> (usize, usize) {
        match segment {
            Segment::Integer => (0, self.object_start),
            Segment::Object => (self.object_start, self.string_start),
            Segment::String => (self.string_start, self.entries.len()),
        }
    }

    fn compare(&self, stored: &MapKey, key: &MapKey) -> Ordering {
        match (stored, key) {
            (MapKey::Integer(a), MapKey::Integer(b)) => a.cmp(b),
            (MapKey::Object(a), MapKey::Object(b)) => a.addr().cmp(&b.addr()),
            (MapKey::String(a), MapKey::String(b)) => self.case_sense.compare(a, b),
            _ => Ordering::Equal,
        }
    }

    /// `Ok(index)` of the key, or `Err(index)` where it would be inserted.
    fn find(&self, key: &MapKey) -> Result<usize, usize> {
        let (start, end) = self.bounds(key.segment());
        self.entries[start..end]
            .binary_search_by(|(stored, _)| self.compare(stored, key))
            .map(|i| start + i)
            .map_err(|i| start + i)
    }

    pub fn has(&self, key: &MapKey) -> bool {
        self.find(key).is_ok()
    }

    pub fn get(&self, key: &MapKey) -> Option<Value> {
        self.find(key).ok().map(|i| self.entries[i].1.clone())
    }

    /// Inserts or replaces; returns the replaced value so the caller can
    /// release it outside any borrow of the map.
    pub fn set(&mut self, key: MapKey, value: Value) -> Result<Option<Value>, RuntimeError> {
        match self.find(&key) {
            Ok(i) => Ok(Some(std::mem::replace(&mut self.entries[i].1, value))),
            Err(i) => {
                self.entries
                    .try_reserve(1)
                    .map_err(|_| out_of_memory(std::mem::size_of::<(MapKey, Value)>()))?;
                let segment = key.segment();
                self.entries.insert(i, (key, value));
                match segment {
                    Segment::Integer => {
                        self.object_start += 1;
                        self.string_start += 1;
                    }
                    Segment::Object => self.string_start += 1,
                    Segment::String => {}
                }
                Ok(None)
            }
        }
    }

    /// Removes a key. Both boundaries are updated before the pair is handed
    /// back, so releasing it may safely re-enter the map.
    pub fn remove(&mut self, key: &MapKey) -> Option<(MapKey, Value)> {
        let i = self.find(key).ok()?;
        match key.segment() {
            Segment::Integer => {
                self.object_start -= 1;
                self.string_start -= 1;
            }
            Segment::Object => self.string_start -= 1,
            Segment::String => {}
        }
        Some(self.entries.remove(i))
    }

    pub fn clear(&mut self) -> Vec<(MapKey, Value)> {
        self.object_start = 0;
        self.string_start = 0;
        std::mem::take(&mut self.entries)
    }
}
