//! Fixed-capacity byte-addressable memory shared by code and data.

use crate::error::VmError;
use crate::word::{self, WORD_SIZE, Word};

/// Default tape size: 16 KiB.
pub const DEFAULT_CAPACITY: usize = 16 * 1024;

pub struct Tape {
    bytes: Vec<u8>,
}

impl Tape {
    /// Creates a zero-filled tape of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copies `image` to address 0 and zeroes everything after it.
    pub fn load(&mut self, image: &[u8]) -> Result<(), VmError> {
        if image.len() > self.capacity() {
            return Err(VmError::Capacity {
                len: image.len(),
                capacity: self.capacity(),
            });
        }
        let (prefix, rest) = self.bytes.split_at_mut(image.len());
        prefix.copy_from_slice(image);
        rest.fill(0);
        Ok(())
    }

    /// Validates `[address, address + width)` and returns it as a range.
    pub fn check(&self, address: usize, width: usize) -> Result<std::ops::Range<usize>, VmError> {
        match address.checked_add(width) {
            Some(end) if end <= self.capacity() => Ok(address..end),
            _ => Err(self.out_of_bounds(address as i64, width)),
        }
    }

    /// Converts a word taken from the stack into an address with `width`
    /// readable bytes behind it.
    pub fn address(&self, value: Word, width: usize) -> Result<usize, VmError> {
        let address =
            usize::try_from(value).map_err(|_| self.out_of_bounds(value as i64, width))?;
        self.check(address, width)?;
        Ok(address)
    }

    pub(crate) fn out_of_bounds(&self, address: i64, width: usize) -> VmError {
        VmError::Bounds {
            address,
            width,
            capacity: self.capacity(),
        }
    }

    pub fn read_byte(&self, address: usize) -> Result<u8, VmError> {
        self.bytes
            .get(address)
            .copied()
            .ok_or_else(|| self.out_of_bounds(address as i64, 1))
    }

    pub fn write_byte(&mut self, address: usize, value: u8) -> Result<(), VmError> {
        let capacity = self.capacity();
        let slot = self.bytes.get_mut(address).ok_or(VmError::Bounds {
            address: address as i64,
            width: 1,
            capacity,
        })?;
        *slot = value;
        Ok(())
    }

    pub fn read_word(&self, address: usize) -> Result<Word, VmError> {
        let range = self.check(address, WORD_SIZE)?;
        word::decode(&self.bytes[range])
            .ok_or_else(|| self.out_of_bounds(address as i64, WORD_SIZE))
    }

    pub fn write_word(&mut self, address: usize, value: Word) -> Result<(), VmError> {
        let range = self.check(address, WORD_SIZE)?;
        word::encode_into(value, &mut self.bytes[range]);
        Ok(())
    }

    pub fn read_slice(&self, address: usize, len: usize) -> Result<&[u8], VmError> {
        let range = self.check(address, len)?;
        Ok(&self.bytes[range])
    }

    pub fn write_slice(&mut self, address: usize, data: &[u8]) -> Result<(), VmError> {
        let range = self.check(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_copies_prefix_and_zeroes_rest() {
        let mut tape = Tape::new(8);
        tape.load(&[9; 8]).unwrap();
        tape.load(&[1, 2, 3]).unwrap();
        assert_eq!(tape.as_bytes(), &[1, 2, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn load_rejects_oversized_image() {
        let mut tape = Tape::new(4);
        assert_eq!(
            tape.load(&[0; 5]),
            Err(VmError::Capacity { len: 5, capacity: 4 })
        );
        // exactly full is fine
        assert!(tape.load(&[0; 4]).is_ok());
    }

    #[test]
    fn word_access_at_the_edge() {
        let mut tape = Tape::new(8);
        tape.write_word(4, -7).unwrap();
        assert_eq!(tape.read_word(4).unwrap(), -7);
        assert!(matches!(tape.read_word(5), Err(VmError::Bounds { address: 5, width: 4, .. })));
        assert!(tape.write_word(usize::MAX - 1, 1).is_err());
    }

    #[test]
    fn byte_access_bounds() {
        let mut tape = Tape::new(2);
        tape.write_byte(1, 0xab).unwrap();
        assert_eq!(tape.read_byte(1).unwrap(), 0xab);
        assert!(tape.read_byte(2).is_err());
        assert!(tape.write_byte(2, 0).is_err());
    }

    #[test]
    fn negative_addresses_are_out_of_bounds() {
        let tape = Tape::new(16);
        assert_eq!(
            tape.address(-1, 4),
            Err(VmError::Bounds {
                address: -1,
                width: 4,
                capacity: 16
            })
        );
        assert_eq!(tape.address(12, 4), Ok(12));
        assert!(tape.address(13, 4).is_err());
    }

    #[test]
    fn slices() {
        let mut tape = Tape::new(8);
        tape.write_slice(2, b"hey").unwrap();
        assert_eq!(tape.read_slice(2, 3).unwrap(), b"hey");
        assert_eq!(tape.read_slice(8, 0).unwrap(), b"");
        assert!(tape.write_slice(6, b"hey").is_err());
    }
}
