use std::ops::Range;

pub const NEXT_HEADER: Range<usize> = 0..1;
pub const HDR_EXT_LEN: Range<usize> = 1..2;
pub const OPTIONS: usize = 2;

/// Extension headers are sized in 8-octet units, not counting the first.
pub const UNIT: usize = 8;

pub const OPT_PAD1: u8 = 0;
pub const OPT_PADN: u8 = 1;
