use crate::runtime::{
    error::{Exception, INDEX_OUT_OF_RANGE, RuntimeError, out_of_memory},
    value::Value,
};

/// Smallest non-zero capacity an array grows to.
pub const MIN_CAPACITY: usize = 4;

/// Dense 0-based slot storage behind Array objects.
///
/// `capacity` is the logical capacity reported to scripts; the backing
/// vector is always reserved to at least that size. Unset slots hold
/// [`Value::Missing`].
///
/// Methods that remove slots hand the removed values back so the caller can
/// release them after its `RefCell` borrow ends.
#[derive(Debug, Clone, Default)]
pub struct Array {
    items: Vec<Value>,
    capacity: usize,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: Vec<Value>) -> Result<Self, RuntimeError> {
        let mut array = Self::new();
        array.push_all(values)?;
        Ok(array)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn values(&self) -> &[Value] {
        &self.items
    }

    /// Converts a script index (1-based; negative counts from the end) to a
    /// slot offset. With `allow_end`, the position one past the last slot is
    /// also accepted.
    pub fn resolve_index(&self, index: i64, allow_end: bool) -> Option<usize> {
        let len = self.items.len() as i64;
        let limit = if allow_end { len + 1 } else { len };
        let offset = if index > 0 {
            index - 1
        } else if index < 0 {
            len + index + i64::from(allow_end)
        } else {
            return None;
        };
        (0..limit).contains(&offset).then_some(offset as usize)
    }

    pub fn checked_index(&self, index: i64, allow_end: bool) -> Result<usize, RuntimeError> {
        self.resolve_index(index, allow_end).ok_or_else(|| {
            Exception::new(
                &INDEX_OUT_OF_RANGE,
                &[&index.to_string(), &self.items.len().to_string()],
            )
            .into()
        })
    }

    /// Grows capacity to hold `needed` slots: doubling from the minimum, or
    /// exactly `needed` when that exceeds double.
    fn ensure_capacity(&mut self, needed: usize) -> Result<(), RuntimeError> {
        if needed <= self.capacity {
            return Ok(());
        }
        let mut new_capacity = (self.capacity * 2).max(MIN_CAPACITY);
        if needed > new_capacity {
            new_capacity = needed;
        }
        self.reserve_exact(new_capacity)
    }

    fn reserve_exact(&mut self, new_capacity: usize) -> Result<(), RuntimeError> {
        let additional = new_capacity.saturating_sub(self.items.len());
        self.items
            .try_reserve_exact(additional)
            .map_err(|_| out_of_memory(additional * std::mem::size_of::<Value>()))?;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Sets the capacity, never below the current length.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), RuntimeError> {
        let capacity = capacity.max(self.items.len());
        if capacity > self.capacity {
            self.reserve_exact(capacity)
        } else {
            self.items.shrink_to(capacity);
            self.capacity = capacity;
            Ok(())
        }
    }

    pub fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        self.ensure_capacity(self.items.len() + 1)?;
        self.items.push(value);
        Ok(())
    }

    pub fn push_all(&mut self, values: Vec<Value>) -> Result<(), RuntimeError> {
        self.ensure_capacity(self.items.len() + values.len())?;
        self.items.extend(values);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.items.pop()
    }

    pub fn insert_at(&mut self, offset: usize, values: Vec<Value>) -> Result<(), RuntimeError> {
        self.ensure_capacity(self.items.len() + values.len())?;
        let tail = self.items.split_off(offset);
        self.items.extend(values);
        self.items.extend(tail);
        Ok(())
    }

    pub fn remove_at(&mut self, offset: usize, count: usize) -> Vec<Value> {
        let end = (offset + count).min(self.items.len());
        self.items.drain(offset..end).collect()
    }

    pub fn get(&self, offset: usize) -> Option<&Value> {
        self.items.get(offset)
    }

    /// Replaces a slot, returning the previous value.
    pub fn set(&mut self, offset: usize, value: Value) -> Option<Value> {
        self.items
            .get_mut(offset)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Truncates or pads with unset slots. Returns truncated values.
    pub fn set_len(&mut self, len: usize) -> Result<Vec<Value>, RuntimeError> {
        if len <= self.items.len() {
            return Ok(self.items.split_off(len));
        }
        self.ensure_capacity(len)?;
        self.items.resize(len, Value::Missing);
        Ok(Vec::new())
    }

    pub fn clear(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_doubles_from_minimum() {
        let mut array = Array::new();
        let mut seen = vec![array.capacity()];
        for i in 0..17 {
            array.push(Value::Integer(i)).unwrap();
            if seen.last() != Some(&array.capacity()) {
                seen.push(array.capacity());
            }
        }
        assert_eq!(seen, vec![0, 4, 8, 16, 32]);
    }

    #[test]
    fn bulk_insert_past_double_takes_exact_size() {
        let mut array = Array::new();
        array.push(Value::Integer(1)).unwrap();
        array
            .push_all((0..10).map(Value::Integer).collect())
            .unwrap();
        assert_eq!(array.capacity(), 11);
    }

    #[test]
    fn resolves_one_based_and_negative_indices() {
        let array = Array::from_values(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]).unwrap();
        assert_eq!(array.resolve_index(1, false), Some(0));
        assert_eq!(array.resolve_index(-1, false), Some(2));
        assert_eq!(array.resolve_index(-3, false), Some(0));
        assert_eq!(array.resolve_index(0, false), None);
        assert_eq!(array.resolve_index(4, false), None);
        assert_eq!(array.resolve_index(4, true), Some(3));
        assert_eq!(array.resolve_index(-1, true), Some(3));
        assert_eq!(array.resolve_index(-4, false), None);
    }

    #[test]
    fn insert_and_remove_shift_slots() {
        let mut array = Array::from_values(vec![Value::Integer(1), Value::Integer(4)]).unwrap();
        array.insert_at(1, vec![Value::Integer(2), Value::Integer(3)]).unwrap();
        assert_eq!(
            array.values(),
            &[
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(4)
            ]
        );
        let removed = array.remove_at(0, 2);
        assert_eq!(removed, vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(array.len(), 2);
        assert!(array.len() <= array.capacity());
    }

    #[test]
    fn set_len_pads_with_unset_slots() {
        let mut array = Array::new();
        array.set_len(3).unwrap();
        assert_eq!(array.get(2), Some(&Value::Missing));
        let removed = array.set_len(1).unwrap();
        assert_eq!(removed.len(), 2);
    }
}
