//! MSB-first bit-field extraction and insertion over a byte window.

use std::ops::Range;

/// Location of a bit field: a byte window relative to the module start and
/// a run of bits inside it, counted from the most significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub offset: usize,
    pub length: usize,
    pub bit_offset: usize,
    pub bit_length: usize,
}

impl BitField {
    pub const fn new(offset: usize, length: usize, bit_offset: usize, bit_length: usize) -> Self {
        Self {
            offset,
            length,
            bit_offset,
            bit_length,
        }
    }

    pub const fn window(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// Largest value the field can hold.
    pub const fn max_value(&self) -> u64 {
        if self.bit_length >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bit_length) - 1
        }
    }
}

/// Read `bit_length` bits starting `bit_offset` bits into `bytes`.
///
/// Bits beyond the end of `bytes` read as zero.
pub fn extract_bits(bytes: &[u8], bit_offset: usize, bit_length: usize) -> u64 {
    let mut out = 0u64;
    for idx in 0..bit_length.min(64) {
        let pos = bit_offset + idx;
        let bit = bytes
            .get(pos / 8)
            .map(|byte| (byte >> (7 - pos % 8)) & 1)
            .unwrap_or(0);
        out = (out << 1) | u64::from(bit);
    }
    out
}

/// Store the low `bit_length` bits of `value` at `bit_offset`, leaving every
/// other bit of `bytes` untouched. Bits that fall outside `bytes` are dropped.
pub fn insert_bits(bytes: &mut [u8], bit_offset: usize, bit_length: usize, value: u64) {
    let bit_length = bit_length.min(64);
    for idx in 0..bit_length {
        let pos = bit_offset + idx;
        let Some(byte) = bytes.get_mut(pos / 8) else {
            continue;
        };
        let mask = 1u8 << (7 - pos % 8);
        if (value >> (bit_length - 1 - idx)) & 1 == 1 {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}
