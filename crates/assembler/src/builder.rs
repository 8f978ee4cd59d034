//! Programmatic image construction.
//!
//! A [`CodeBuilder`] writes at a cursor that only moves when something is
//! emitted or when [`CodeBuilder::seek`] is called. Forward label references
//! are recorded as fixups and patched in [`CodeBuilder::finish`].

use std::collections::HashMap;

use engine::Opcode;
use engine::word::{self, Word};

use crate::error::AsmError;

#[derive(Debug, Clone)]
struct Fixup {
    at: usize,
    label: String,
}

#[derive(Debug, Clone, Default)]
pub struct CodeBuilder {
    image: Vec<u8>,
    cursor: usize,
    labels: HashMap<String, usize>,
    fixups: Vec<Fixup>,
    duplicates: Vec<String>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the next emitted byte lands on.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn label_address(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.bytes(&[value])
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.put(self.cursor, data);
        self.cursor += data.len();
        self
    }

    pub fn word(&mut self, value: Word) -> &mut Self {
        self.bytes(&word::encode(value))
    }

    pub fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.byte(opcode.byte())
    }

    pub fn op_word(&mut self, opcode: Opcode, operand: Word) -> &mut Self {
        self.op(opcode).word(operand)
    }

    /// Emits the UTF-8 bytes of `text`, no terminator.
    pub fn string(&mut self, text: &str) -> &mut Self {
        self.bytes(text.as_bytes())
    }

    /// Writes `text` at `address` and leaves the cursor where it was.
    pub fn place_string(&mut self, address: usize, text: &str) -> &mut Self {
        self.put(address, text.as_bytes());
        self
    }

    /// Moves the cursor. A gap past the end is zero-filled by the next emit,
    /// so a trailing seek adds nothing to the image.
    pub fn seek(&mut self, address: usize) -> &mut Self {
        self.cursor = address;
        self
    }

    /// Binds `name` to the current position.
    pub fn label(&mut self, name: &str) -> &mut Self {
        if self.labels.contains_key(name) {
            self.duplicates.push(name.to_string());
        } else {
            self.labels.insert(name.to_string(), self.cursor);
        }
        self
    }

    /// Emits a word placeholder that resolves to the address of `name`.
    pub fn word_label(&mut self, name: &str) -> &mut Self {
        self.fixups.push(Fixup {
            at: self.cursor,
            label: name.to_string(),
        });
        self.word(0)
    }

    pub fn op_label(&mut self, opcode: Opcode, name: &str) -> &mut Self {
        self.op(opcode).word_label(name)
    }

    /// Resolves every label reference and returns the image.
    pub fn finish(mut self) -> Result<Vec<u8>, AsmError> {
        if let Some(name) = self.duplicates.first() {
            return Err(AsmError::DuplicateLabel(name.clone()));
        }
        for fixup in std::mem::take(&mut self.fixups) {
            let address = self
                .labels
                .get(&fixup.label)
                .copied()
                .ok_or_else(|| AsmError::UndefinedLabel(fixup.label.clone()))?;
            let value = Word::try_from(address).map_err(|_| AsmError::AddressRange(address))?;
            self.put(fixup.at, &word::encode(value));
        }
        Ok(self.image)
    }

    fn put(&mut self, at: usize, data: &[u8]) {
        let end = at + data.len();
        if self.image.len() < end {
            self.image.resize(end, 0);
        }
        self.image[at..end].copy_from_slice(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_opcodes_and_little_endian_words() {
        let mut b = CodeBuilder::new();
        b.op_word(Opcode::Push, 258).op(Opcode::Halt);
        assert_eq!(b.position(), 6);
        assert_eq!(b.finish().unwrap(), vec![0x01, 2, 1, 0, 0, 0xff]);
    }

    #[test]
    fn forward_and_backward_labels() {
        let mut b = CodeBuilder::new();
        b.label("top")
            .op_label(Opcode::Jmp, "end")
            .op_label(Opcode::Jmp, "top")
            .label("end")
            .op(Opcode::Halt);
        let image = b.finish().unwrap();
        assert_eq!(&image[1..5], &word::encode(10));
        assert_eq!(&image[6..10], &word::encode(0));
    }

    #[test]
    fn undefined_label_fails() {
        let mut b = CodeBuilder::new();
        b.op_label(Opcode::Call, "missing");
        assert_eq!(b.finish(), Err(AsmError::UndefinedLabel("missing".into())));
    }

    #[test]
    fn duplicate_label_fails() {
        let mut b = CodeBuilder::new();
        b.label("x").op(Opcode::Nop).label("x");
        assert_eq!(b.finish(), Err(AsmError::DuplicateLabel("x".into())));
    }

    #[test]
    fn seek_pads_and_place_string_keeps_cursor() {
        let mut b = CodeBuilder::new();
        b.op(Opcode::Nop).seek(4).op(Opcode::Halt);
        b.place_string(8, "hi");
        assert_eq!(b.position(), 5);
        assert_eq!(b.finish().unwrap(), vec![0, 0, 0, 0, 0xff, 0, 0, 0, b'h', b'i']);
    }

    #[test]
    fn seek_backwards_overwrites() {
        let mut b = CodeBuilder::new();
        b.string("abc").seek(1).byte(b'X');
        assert_eq!(b.finish().unwrap(), b"aXc".to_vec());
    }

    #[test]
    fn far_seek_without_emit_allocates_nothing() {
        let mut b = CodeBuilder::new();
        b.op(Opcode::Halt).seek(i32::MAX as usize).label("end");
        assert_eq!(b.label_address("end"), Some(i32::MAX as usize));
        assert_eq!(b.finish().unwrap(), vec![0xff]);
    }
}
