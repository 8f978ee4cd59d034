//! Operand stack.

use crate::error::VmError;
use crate::word::Word;

pub const DEFAULT_MAX_DEPTH: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct OperandStack {
    items: Vec<Word>,
    limit: usize,
}

impl OperandStack {
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::with_capacity(limit.min(1024)),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bottom to top.
    pub fn as_slice(&self) -> &[Word] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Fails unless at least `count` operands are present. Instructions call
    /// this before they mutate anything.
    pub fn require(&self, count: usize, instruction: &'static str) -> Result<(), VmError> {
        if self.items.len() < count {
            return Err(VmError::StackUnderflow {
                instruction,
                required: count,
                available: self.items.len(),
            });
        }
        Ok(())
    }

    /// Fails unless `count` more operands fit.
    pub fn reserve(&self, count: usize) -> Result<(), VmError> {
        if self.items.len() + count > self.limit {
            return Err(VmError::StackOverflow { limit: self.limit });
        }
        Ok(())
    }

    pub fn push(&mut self, value: Word) -> Result<(), VmError> {
        self.reserve(1)?;
        self.items.push(value);
        Ok(())
    }

    pub fn pop(&mut self, instruction: &'static str) -> Result<Word, VmError> {
        self.require(1, instruction)?;
        Ok(self.items.pop().unwrap_or_default())
    }

    pub fn peek(&self, instruction: &'static str) -> Result<Word, VmError> {
        self.peek_at(0, instruction)
    }

    /// Reads the operand `depth` entries below the top (0 is the top).
    pub fn peek_at(&self, depth: usize, instruction: &'static str) -> Result<Word, VmError> {
        self.require(depth + 1, instruction)?;
        Ok(self.items[self.items.len() - 1 - depth])
    }
}

impl Default for OperandStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
