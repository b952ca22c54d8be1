use std::ops::Range;

use crate::codec::bits::BitField;

pub const VERSION: BitField = BitField::new(0, 1, 0, 4);
pub const HDR_LEN: BitField = BitField::new(0, 1, 4, 4);
pub const DSCP: BitField = BitField::new(1, 1, 0, 6);
pub const ECN: BitField = BitField::new(1, 1, 6, 2);
pub const LENGTH: Range<usize> = 2..4;
pub const IDENT: Range<usize> = 4..6;
pub const FLAG_RB: BitField = BitField::new(6, 1, 0, 1);
pub const FLAG_DF: BitField = BitField::new(6, 1, 1, 1);
pub const FLAG_MF: BitField = BitField::new(6, 1, 2, 1);
pub const FRAG_OFFSET: BitField = BitField::new(6, 2, 3, 13);
pub const TTL: Range<usize> = 8..9;
pub const PROTOCOL: Range<usize> = 9..10;
pub const CHECKSUM: Range<usize> = 10..12;
pub const SIP: Range<usize> = 12..16;
pub const DIP: Range<usize> = 16..20;
pub const OPTIONS: usize = 20;

/// Header length bounds in bytes.
pub const MIN_HEADER: u64 = 20;
pub const MAX_HEADER: u64 = 60;

pub const PROTOCOL_ICMP: u64 = 1;
pub const PROTOCOL_TCP: u64 = 6;
pub const PROTOCOL_UDP: u64 = 17;
