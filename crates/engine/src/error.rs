use console::ConsoleError;
use thiserror::Error;

/// Every way an execution can end other than HALT.
///
/// All variants are fatal: the machine moves to `Faulted` and stays there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// IP, an operand read, a memory access or a control-transfer target fell
    /// outside the tape.
    #[error("address {address} (width {width}) is outside the tape [0, {capacity})")]
    Bounds {
        address: i64,
        width: usize,
        capacity: usize,
    },
    #[error("{instruction} needs {required} stack operand(s) but only {available} present")]
    StackUnderflow {
        instruction: &'static str,
        required: usize,
        available: usize,
    },
    #[error("operand stack exceeded its limit of {limit} entries")]
    StackOverflow { limit: usize },
    #[error("{instruction}: division by zero")]
    Arithmetic { instruction: &'static str },
    #[error("unknown opcode 0x{opcode:02x} at address {address}")]
    UnknownOpcode { opcode: u8, address: usize },
    #[error("malformed input: {0}")]
    IoFormat(String),
    #[error("console failure: {0}")]
    Console(String),
    #[error("program image of {len} bytes exceeds tape capacity {capacity}")]
    Capacity { len: usize, capacity: usize },
}

/// Fieldless view of [`VmError`] for callers that only branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Bounds,
    StackUnderflow,
    StackOverflow,
    Arithmetic,
    UnknownOpcode,
    IoFormat,
    Console,
    Capacity,
}

impl VmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VmError::Bounds { .. } => ErrorKind::Bounds,
            VmError::StackUnderflow { .. } => ErrorKind::StackUnderflow,
            VmError::StackOverflow { .. } => ErrorKind::StackOverflow,
            VmError::Arithmetic { .. } => ErrorKind::Arithmetic,
            VmError::UnknownOpcode { .. } => ErrorKind::UnknownOpcode,
            VmError::IoFormat(_) => ErrorKind::IoFormat,
            VmError::Console(_) => ErrorKind::Console,
            VmError::Capacity { .. } => ErrorKind::Capacity,
        }
    }
}

impl From<ConsoleError> for VmError {
    fn from(err: ConsoleError) -> Self {
        match err {
            ConsoleError::Format { .. } => VmError::IoFormat(err.to_string()),
            other => VmError::Console(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_format_errors_become_io_format() {
        let err: VmError = ConsoleError::Format {
            input: "x".into(),
            expected: "a signed 32-bit integer",
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::IoFormat);

        let err: VmError = ConsoleError::Closed.into();
        assert_eq!(err, VmError::Console("input closed".into()));
    }

    #[test]
    fn messages_carry_context() {
        let err = VmError::UnknownOpcode {
            opcode: 0x2a,
            address: 17,
        };
        assert_eq!(err.to_string(), "unknown opcode 0x2a at address 17");
        let err = VmError::StackUnderflow {
            instruction: "POP",
            required: 1,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "POP needs 1 stack operand(s) but only 0 present"
        );
    }
}
