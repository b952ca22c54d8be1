use std::ops::Range;

pub const TYPE: Range<usize> = 0..1;
pub const CODE: Range<usize> = 1..2;
pub const CHECKSUM: Range<usize> = 2..4;
pub const MESSAGE: usize = 4;

pub const TYPE_ECHO_REQUEST: u64 = 128;
