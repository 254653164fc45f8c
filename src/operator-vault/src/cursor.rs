//! Forward-only big-endian reader over an immutable byte buffer.
//!
//! Every read returns the decoded value and advances the cursor by exactly the width it
//! consumed. There is no way to move the cursor backwards. Whether a region was consumed
//! exactly is checked by the caller through [`Cursor::expect_end_at`] or
//! [`Cursor::expect_exhausted`].

use alloy_primitives::{Address, B256, U256};
use operator_vault_types::{
    wire::{ADDRESS_WIDTH, CALLBACK_ALLOWANCE_WIDTH, SELECTOR_WIDTH, WORD_WIDTH},
    CallbackAllowance, Selector,
};

use crate::errors::DecodeError;

#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Cursor starting at `position`. A position past the end is clamped to the end.
    pub fn at(bytes: &'a [u8], position: usize) -> Self {
        Self { bytes, position: position.min(bytes.len()) }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEnd {
                position: self.position,
                needed: len - self.remaining(),
            });
        }
        let out = &self.bytes[self.position..self.position + len];
        self.position += len;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a flag byte that must be exactly 0 or 1.
    pub fn read_flag(&mut self) -> Result<bool, DecodeError> {
        let position = self.position;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidFlag { position, value }),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn read_address(&mut self) -> Result<Address, DecodeError> {
        Ok(Address::from_slice(self.take(ADDRESS_WIDTH)?))
    }

    pub fn read_selector(&mut self) -> Result<Selector, DecodeError> {
        self.take_array::<SELECTOR_WIDTH>()
    }

    pub fn read_b256(&mut self) -> Result<B256, DecodeError> {
        Ok(B256::from(self.take_array::<WORD_WIDTH>()?))
    }

    pub fn read_u256(&mut self) -> Result<U256, DecodeError> {
        Ok(U256::from_be_slice(self.take(WORD_WIDTH)?))
    }

    /// Reads the packed 208-bit callback allowance (caller | selector | user data offset).
    pub fn read_callback_allowance(&mut self) -> Result<CallbackAllowance, DecodeError> {
        let packed = self.take_array::<CALLBACK_ALLOWANCE_WIDTH>()?;
        Ok(CallbackAllowance::from_bytes(&packed))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.take(len)
    }

    /// Reads a `u16` length prefix followed by that many bytes.
    pub fn read_len_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_u16()? as usize;
        self.take(len)
    }

    /// The value just read must have ended exactly at `declared_end`.
    pub fn expect_end_at(&self, declared_end: usize) -> Result<(), DecodeError> {
        if self.position != declared_end {
            return Err(DecodeError::RegionLengthMismatch { position: self.position, declared_end });
        }
        Ok(())
    }

    /// The value just read must have ended exactly at the end of the whole buffer.
    pub fn expect_exhausted(&self) -> Result<(), DecodeError> {
        if self.remaining() != 0 {
            return Err(DecodeError::TrailingBytes {
                position: self.position,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_by_their_width() {
        let bytes = [0x01, 0x12, 0x34, 0xaa, 0xbb, 0xcc, 0xdd, 0xff];
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_u8().unwrap(), 0x01);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_selector().unwrap(), [0xaa, 0xbb, 0xcc, 0xdd]);
        assert_eq!(cursor.position(), 7);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn reading_past_the_end_is_a_decode_error() {
        let bytes = [0u8; 19];
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(
            cursor.read_address(),
            Err(DecodeError::UnexpectedEnd { position: 0, needed: 1 })
        );
        // A failed read does not move the cursor.
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn flags_must_be_zero_or_one() {
        let mut cursor = Cursor::new(&[0, 1, 2]);
        assert!(!cursor.read_flag().unwrap());
        assert!(cursor.read_flag().unwrap());
        assert_eq!(cursor.read_flag(), Err(DecodeError::InvalidFlag { position: 2, value: 2 }));
    }

    #[test]
    fn length_prefixed_runs_and_end_checks() {
        let bytes = [0x00, 0x03, 0xaa, 0xbb, 0xcc, 0xee];
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_len_prefixed().unwrap(), &[0xaa, 0xbb, 0xcc]);
        assert!(cursor.expect_end_at(5).is_ok());
        assert_eq!(
            cursor.expect_end_at(6),
            Err(DecodeError::RegionLengthMismatch { position: 5, declared_end: 6 })
        );
        assert_eq!(
            cursor.expect_exhausted(),
            Err(DecodeError::TrailingBytes { position: 5, remaining: 1 })
        );
        cursor.read_u8().unwrap();
        assert!(cursor.expect_exhausted().is_ok());
    }

    #[test]
    fn packed_callback_allowance_is_26_bytes() {
        let mut bytes = vec![0u8; 26];
        bytes[19] = 0x42;
        bytes[20..24].copy_from_slice(&[1, 2, 3, 4]);
        bytes[24..26].copy_from_slice(&[0x00, 0x24]);
        let mut cursor = Cursor::new(&bytes);
        let allowance = cursor.read_callback_allowance().unwrap();
        assert_eq!(allowance.caller.as_slice()[19], 0x42);
        assert_eq!(allowance.selector, [1, 2, 3, 4]);
        assert_eq!(allowance.user_data_offset, 0x24);
        assert!(cursor.expect_exhausted().is_ok());
    }
}
