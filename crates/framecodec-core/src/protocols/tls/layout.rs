use std::ops::{Range, RangeInclusive};

pub const CONTENT_TYPE: Range<usize> = 0..1;
pub const VERSION: Range<usize> = 1..3;
pub const LENGTH: Range<usize> = 3..5;
pub const FRAGMENT: usize = 5;

pub const HEADER_LEN: usize = 5;

/// Record content types 20 through 24, heartbeat included.
pub const CONTENT_TYPES: RangeInclusive<u8> = 20..=24;
/// SSL 3.0 through TLS 1.3 legacy record versions.
pub const VERSIONS: RangeInclusive<u16> = 0x0300..=0x0304;

pub const VERSION_TLS12: u64 = 0x0303;
