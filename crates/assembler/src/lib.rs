// Assembler
// Produces tape images for the engine, from builder calls or from mnemonic text,
// and turns images back into listings.

pub mod builder;
pub mod disasm;
pub mod error;
pub mod text;

pub use builder::CodeBuilder;
pub use disasm::{Listing, disassemble};
pub use error::AsmError;
pub use text::assemble;
