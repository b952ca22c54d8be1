use std::ops::Range;

pub const TYPE: Range<usize> = 0..1;
pub const CODE: Range<usize> = 1..2;
pub const CHECKSUM: Range<usize> = 2..4;
pub const IDENTIFIER: Range<usize> = 4..6;
pub const SEQUENCE: Range<usize> = 6..8;
pub const MESSAGE: usize = 8;
