use std::ops::Range;

use crate::codec::bits::BitField;

pub const SRC_PORT: Range<usize> = 0..2;
pub const DST_PORT: Range<usize> = 2..4;
pub const SEQ: Range<usize> = 4..8;
pub const ACK: Range<usize> = 8..12;
pub const HDR_LEN: BitField = BitField::new(12, 1, 0, 4);
pub const RESERVED: BitField = BitField::new(12, 1, 4, 3);
pub const FLAG_AE: BitField = BitField::new(12, 1, 7, 1);
pub const FLAG_CWR: BitField = BitField::new(13, 1, 0, 1);
pub const FLAG_ECE: BitField = BitField::new(13, 1, 1, 1);
pub const FLAG_URG: BitField = BitField::new(13, 1, 2, 1);
pub const FLAG_ACK: BitField = BitField::new(13, 1, 3, 1);
pub const FLAG_PSH: BitField = BitField::new(13, 1, 4, 1);
pub const FLAG_RST: BitField = BitField::new(13, 1, 5, 1);
pub const FLAG_SYN: BitField = BitField::new(13, 1, 6, 1);
pub const FLAG_FIN: BitField = BitField::new(13, 1, 7, 1);
pub const WINDOW: Range<usize> = 14..16;
pub const CHECKSUM: Range<usize> = 16..18;
pub const URGENT_POINTER: Range<usize> = 18..20;
pub const OPTIONS: usize = 20;

pub const MIN_HEADER: u64 = 20;
pub const MAX_HEADER: u64 = 60;
pub const MAX_OPTIONS: usize = 40;

pub const KIND_EOL: u8 = 0;
pub const KIND_NOP: u8 = 1;
pub const KIND_MSS: u8 = 2;
pub const KIND_WINDOW_SCALE: u8 = 3;
pub const KIND_SACK_PERMITTED: u8 = 4;
pub const KIND_SACK: u8 = 5;
pub const KIND_TIMESTAMPS: u8 = 8;
pub const KIND_USER_TIMEOUT: u8 = 28;
pub const KIND_AUTHENTICATION: u8 = 29;

pub const MAX_WINDOW_SHIFT: u8 = 14;
