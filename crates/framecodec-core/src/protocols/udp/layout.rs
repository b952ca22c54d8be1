use std::ops::Range;

pub const SRC_PORT: Range<usize> = 0..2;
pub const DST_PORT: Range<usize> = 2..4;
pub const LENGTH: Range<usize> = 4..6;
pub const CHECKSUM: Range<usize> = 6..8;

pub const HEADER_LEN: u64 = 8;
