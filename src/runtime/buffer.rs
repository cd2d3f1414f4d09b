use crate::runtime::error::{RuntimeError, out_of_memory};

/// Position of a result inside an [`OutputBuffer`]. Handles are offsets, so
/// they stay valid when the buffer reallocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextHandle {
    offset: usize,
    len: usize,
}

impl TextHandle {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Caller-owned arena for string results that must outlive an evaluation.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    data: String,
    growths: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: String::with_capacity(capacity),
            growths: 0,
        }
    }

    /// Bytes already handed out.
    pub fn consumed(&self) -> usize {
        self.data.len()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn remaining(&self) -> usize {
        self.data.capacity() - self.data.len()
    }

    /// Number of reallocations so far.
    pub fn growths(&self) -> usize {
        self.growths
    }

    pub fn push_str(&mut self, text: &str) -> Result<TextHandle, RuntimeError> {
        if text.len() > self.remaining() {
            let additional = text.len().max(self.data.capacity());
            self.data
                .try_reserve(additional)
                .map_err(|_| out_of_memory(additional))?;
            self.growths += 1;
            tracing::trace!(capacity = self.data.capacity(), "output buffer grew");
        }
        let offset = self.data.len();
        self.data.push_str(text);
        Ok(TextHandle {
            offset,
            len: text.len(),
        })
    }

    pub fn get(&self, handle: TextHandle) -> &str {
        &self.data[handle.offset..handle.offset + handle.len]
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
