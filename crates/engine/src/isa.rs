//! Instruction set: opcode bytes, mnemonics and immediate widths.
//!
//! The whole table is written once in `define_opcodes!`; the enum, the
//! mnemonic lookup and the 256-entry decode table are generated from it.
//!
//! # Encoding
//! - Opcode: 1 byte
//! - Immediate: one 4-byte little-endian signed word, only for the opcodes
//!   marked `Imm`

use serde::{Deserialize, Serialize};

use crate::error::VmError;
use crate::word::{WORD_SIZE, Word};

macro_rules! define_opcodes {
    (@width None) => { 0 };
    (@width Imm) => { WORD_SIZE };

    (
        $(
            $(#[$doc:meta])*
            $name:ident = $byte:literal, $mnemonic:literal, $operand:ident;
        )*
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum Opcode {
            $( $(#[$doc])* $name = $byte, )*
        }

        impl Opcode {
            /// Every opcode, in table order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Bytes of immediate operand following the opcode byte.
            pub const fn operand_width(self) -> usize {
                match self {
                    $( Opcode::$name => define_opcodes!(@width $operand), )*
                }
            }
        }
    };
}

define_opcodes! {
    // --- Core ---
    /// Advance only.
    Nop = 0x00, "NOP", None;
    /// Push the immediate word.
    Push = 0x01, "PUSH", Imm;
    /// Discard the top.
    Pop = 0x02, "POP", None;
    /// Same effect as PUSH.
    Const = 0x03, "CONST", Imm;

    // --- Memory ---
    /// Pop addr, push tape word at addr.
    Load = 0x04, "LOAD", None;
    /// Pop value, pop addr, write value at addr.
    Store = 0x05, "STORE", None;

    // --- Arithmetic: pop b, pop a, push a op b ---
    Add = 0x06, "ADD", None;
    Sub = 0x07, "SUB", None;
    Mul = 0x08, "MUL", None;
    Div = 0x09, "DIV", None;
    Mod = 0x0a, "MOD", None;

    // --- Calls / stack shuffling ---
    /// Pop target, push return address, jump.
    Call = 0x0b, "CALL", None;
    /// Pop address, jump.
    Ret = 0x0c, "RET", None;
    Dup = 0x0d, "DUP", None;
    Swap = 0x0e, "SWAP", None;

    // --- Flags ---
    /// Pop b, pop a, set the relational flags.
    Cmp = 0x0f, "CMP", None;
    /// Pop a, set the sign-test flags.
    Test = 0x19, "TEST", None;

    // --- Jumps ---
    Jmp = 0x10, "JMP", Imm;
    Jz = 0x11, "JZ", Imm;
    Jnz = 0x12, "JNZ", Imm;
    Jbz = 0x13, "JBZ", Imm;
    Jaz = 0x14, "JAZ", Imm;
    Jl = 0xf0, "JL", Imm;
    Jle = 0xf1, "JLE", Imm;
    Je = 0xf2, "JE", Imm;
    Jne = 0xf3, "JNE", Imm;
    Ja = 0xf4, "JA", Imm;
    Jae = 0xf5, "JAE", Imm;

    // --- Console ---
    /// Pop n, print it.
    PrintInt = 0x15, "PRINT_INT", None;
    /// Pop len, pop addr, print tape[addr..addr+len).
    PrintString = 0x16, "PRINT_STRING", None;
    /// Read a number, push it.
    ReadInt = 0x17, "READ_INT", None;
    /// Pop buffer length, pop addr, read a line into the buffer, push its length (or -1).
    ReadString = 0x18, "READ_STRING", None;

    Halt = 0xff, "HALT", None;
}

const fn build_decode_table() -> [Option<Opcode>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < Opcode::ALL.len() {
        let op = Opcode::ALL[i];
        table[op as usize] = Some(op);
        i += 1;
    }
    table
}

/// Opcode byte to instruction. Built at compile time, never mutated.
static DECODE: [Option<Opcode>; 256] = build_decode_table();

impl Opcode {
    pub fn decode(byte: u8) -> Option<Opcode> {
        DECODE[byte as usize]
    }

    /// Case-insensitive mnemonic lookup.
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Total encoded length: opcode plus immediate.
    pub const fn size(self) -> usize {
        1 + self.operand_width()
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// The binary arithmetic family, dispatched through one behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    /// Fixed-width wrapping arithmetic; DIV/MOD by zero is an error.
    pub fn apply(self, a: Word, b: Word) -> Result<Word, VmError> {
        Ok(match self {
            ArithOp::Add => a.wrapping_add(b),
            ArithOp::Sub => a.wrapping_sub(b),
            ArithOp::Mul => a.wrapping_mul(b),
            ArithOp::Div | ArithOp::Mod if b == 0 => {
                return Err(VmError::Arithmetic {
                    instruction: self.mnemonic(),
                });
            }
            ArithOp::Div => a.wrapping_div(b),
            ArithOp::Mod => a.wrapping_rem(b),
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithOp::Add => "ADD",
            ArithOp::Sub => "SUB",
            ArithOp::Mul => "MUL",
            ArithOp::Div => "DIV",
            ArithOp::Mod => "MOD",
        }
    }
}
