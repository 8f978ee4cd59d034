// Tape machine engine
// A byte-coded stack machine: one flat tape for code and data, an operand
// stack, and a flags register. Nothing in here touches the host directly;
// all I/O goes through the `console::Console` handed to `Machine::run`.

pub mod config;
pub mod error;
pub mod flags;
pub mod isa;
pub mod log;
pub mod stack;
pub mod tape;
pub mod vm;
pub mod word;

pub use config::MachineConfig;
pub use error::{ErrorKind, VmError};
pub use flags::{Condition, FlagFamily, Flags};
pub use isa::{ArithOp, Opcode};
pub use vm::{Machine, Snapshot, VmStatus};
pub use word::{WORD_SIZE, Word};
