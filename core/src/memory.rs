//! Linear, byte-addressable memory. Expands lazily in 32-byte words and is
//! zero-initialized; reads past the current end return zeroes without
//! growing the buffer.

use crate::error::ExitError;
use crate::prelude::*;
use core::cmp::min;
use core::ops::{BitAnd, Not};
use primitive_types::U256;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
    data: Vec<u8>,
    effective_len: U256,
    limit: usize,
}

impl Memory {
    /// Create a new memory with a maximum size in bytes, enforced lazily.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            effective_len: U256::zero(),
            limit,
        }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Current reported length, rounded up to the next multiple of 32.
    #[must_use]
    pub fn effective_len(&self) -> U256 {
        self.effective_len
    }

    #[must_use]
    pub fn data(&self) -> &Vec<u8> {
        &self.data
    }

    /// Round `value` up to the next multiple of 32.
    #[must_use]
    pub fn next_multiple_of_32(value: U256) -> U256 {
        let r = value.low_u32().bitand(31);
        if r == 0 {
            return value;
        }
        value + (U256::from(32) - r)
    }

    /// Resize `effective_len` to cover `end`, if `end` is larger. Does not
    /// allocate; call `get`/`copy_large`/`set` to materialize bytes.
    ///
    /// # Errors
    /// `InvalidRange` if the new length would exceed `limit`.
    pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExitError> {
        if len == U256::zero() {
            return Ok(());
        }

        if let Some(end) = offset.checked_add(len) {
            self.resize_end(end)
        } else {
            Err(ExitError::InvalidRange)
        }
    }

    fn resize_end(&mut self, end: U256) -> Result<(), ExitError> {
        if end > self.effective_len {
            let new_end = Self::next_multiple_of_32(end);
            if new_end > U256::from(self.limit) {
                return Err(ExitError::InvalidRange);
            }
            self.effective_len = new_end;
        }

        Ok(())
    }

    /// Read `size` bytes starting at `offset`, zero-extending past the
    /// current buffer length. Does not grow `effective_len`.
    #[must_use]
    pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut ret = vec![0; size];
        #[allow(clippy::needless_range_loop)]
        for index in 0..size {
            let position = offset + index;
            if position >= self.data.len() {
                break;
            }
            ret[index] = self.data[position];
        }
        ret
    }

    /// Write `value` at `offset`, growing the buffer as needed.
    ///
    /// # Errors
    /// `InvalidRange` if `offset + value.len()` overflows or exceeds `limit`.
    pub fn set(&mut self, offset: usize, value: &[u8], target_size: Option<usize>) -> Result<(), ExitError> {
        let target_size = target_size.unwrap_or(value.len());
        if target_size == 0 {
            return Ok(());
        }

        if offset.checked_add(target_size).map_or(true, |pos| pos > self.limit) {
            return Err(ExitError::InvalidRange);
        }

        if self.data.len() < offset + target_size {
            self.data.resize(offset + target_size, 0);
        }

        if target_size > value.len() {
            self.data[offset..((value.len()) + offset)].clone_from_slice(value);
            for index in (value.len())..target_size {
                self.data[offset + index] = 0;
            }
        } else {
            self.data[offset..((target_size) + offset)].clone_from_slice(&value[..target_size]);
        }

        Ok(())
    }

    /// Copy `len` bytes of `data` starting at `data_offset` (zero-extending
    /// reads past `data`'s end) into memory at `memory_offset`.
    ///
    /// # Errors
    /// `InvalidRange` if the write target exceeds `limit`.
    pub fn copy_data(
        &mut self,
        memory_offset: usize,
        data_offset: U256,
        len: usize,
        data: &[u8],
    ) -> Result<(), ExitError> {
        if len == 0 {
            return Ok(());
        }

        let data_offset = if data_offset > U256::from(usize::MAX) {
            usize::MAX
        } else {
            data_offset.as_usize()
        };

        if memory_offset.checked_add(len).map_or(true, |pos| pos > self.limit) {
            return Err(ExitError::InvalidRange);
        }

        if self.data.len() < memory_offset + len {
            self.data.resize(memory_offset + len, 0);
        }

        let data_len = data.len();
        let copy_len = min(data_len.saturating_sub(data_offset), len);
        if copy_len > 0 {
            self.data[memory_offset..memory_offset + copy_len]
                .copy_from_slice(&data[data_offset..data_offset + copy_len]);
        }
        for index in copy_len..len {
            self.data[memory_offset + index] = 0;
        }

        Ok(())
    }
}

impl Not for &Memory {
    type Output = bool;
    fn not(self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_multiple_of_32_rounds_up() {
        assert_eq!(Memory::next_multiple_of_32(U256::from(0)), U256::from(0));
        assert_eq!(Memory::next_multiple_of_32(U256::from(1)), U256::from(32));
        assert_eq!(Memory::next_multiple_of_32(U256::from(32)), U256::from(32));
        assert_eq!(Memory::next_multiple_of_32(U256::from(33)), U256::from(64));
    }

    #[test]
    fn get_zero_extends_past_end() {
        let mem = Memory::new(1024);
        let got = mem.get(0, 4);
        assert_eq!(got, vec![0, 0, 0, 0]);
    }

    #[test]
    fn set_then_get_roundtrip() {
        let mut mem = Memory::new(1024);
        mem.set(0, &[1, 2, 3, 4], None).unwrap();
        assert_eq!(mem.get(0, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn resize_beyond_limit_is_invalid_range() {
        let mut mem = Memory::new(64);
        assert_eq!(
            mem.resize_offset(U256::from(0), U256::from(100)),
            Err(ExitError::InvalidRange)
        );
    }

    #[test]
    fn copy_data_zero_extends_past_source() {
        let mut mem = Memory::new(1024);
        mem.copy_data(0, U256::from(2), 4, &[0xaa, 0xbb, 0xcc, 0xdd]).unwrap();
        assert_eq!(mem.get(0, 4), vec![0xcc, 0xdd, 0, 0]);
    }
}
