//! Image to listing.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use engine::Opcode;
use engine::word::{self, Word};

/// One disassembled line.
///
/// `opcode` is `None` for a byte that does not decode, or for an instruction
/// whose immediate runs past the end of the range; `byte` then holds the raw
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub address: usize,
    pub byte: u8,
    pub opcode: Option<Opcode>,
    pub operand: Option<Word>,
}

impl Listing {
    /// Encoded length this line covers.
    pub fn size(&self) -> usize {
        self.opcode.map_or(1, Opcode::size)
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  ", self.address)?;
        match (self.opcode, self.operand) {
            (Some(op), Some(operand)) => write!(f, "{} {}", op, operand),
            (Some(op), None) => write!(f, "{}", op),
            (None, _) => write!(f, ".byte 0x{:02x}", self.byte),
        }
    }
}

/// Decodes instructions in `range` of `image`, clamped to the image length.
///
/// Stops after the first byte that is not a complete instruction.
pub fn disassemble(image: &[u8], range: Range<usize>) -> Vec<Listing> {
    let end = range.end.min(image.len());
    let mut address = range.start;
    let mut lines = Vec::new();

    while address < end {
        let byte = image[address];
        let opcode = Opcode::decode(byte).filter(|op| address + op.size() <= end);
        let Some(op) = opcode else {
            lines.push(Listing {
                address,
                byte,
                opcode: None,
                operand: None,
            });
            break;
        };
        let operand = match op.operand_width() {
            0 => None,
            _ => word::decode(&image[address + 1..end]),
        };
        lines.push(Listing {
            address,
            byte,
            opcode: Some(op),
            operand,
        });
        address += op.size();
    }
    lines
}
