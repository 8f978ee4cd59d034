use serde::{Deserialize, Serialize};

use crate::stack::DEFAULT_MAX_DEPTH;
use crate::tape::DEFAULT_CAPACITY;

/// Largest tape whose every address (and one-past-the-end) fits in a word.
pub const MAX_TAPE_CAPACITY: usize = i32::MAX as usize;

/// Sizing for one machine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Tape size in bytes; clamped to [`MAX_TAPE_CAPACITY`].
    pub tape_capacity: usize,
    /// Operand stack entries before PUSH-like instructions fault.
    pub max_stack_depth: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tape_capacity: DEFAULT_CAPACITY,
            max_stack_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MachineConfig {
    pub fn with_tape_capacity(mut self, bytes: usize) -> Self {
        self.tape_capacity = bytes;
        self
    }

    pub fn with_max_stack_depth(mut self, entries: usize) -> Self {
        self.max_stack_depth = entries;
        self
    }
}
