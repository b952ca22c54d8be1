use std::ops::Range;

use crate::codec::bits::BitField;

pub const VERSION: BitField = BitField::new(0, 4, 0, 4);
pub const DSCP: BitField = BitField::new(0, 4, 4, 6);
pub const ECN: BitField = BitField::new(0, 4, 10, 2);
pub const FLOW_LABEL: BitField = BitField::new(0, 4, 12, 20);
pub const PAYLOAD_LENGTH: Range<usize> = 4..6;
pub const NEXT_HEADER: Range<usize> = 6..7;
pub const HOP_LIMIT: Range<usize> = 7..8;
pub const SIP: Range<usize> = 8..24;
pub const DIP: Range<usize> = 24..40;

pub const HEADER_LEN: usize = 40;

pub const NEXT_HOPOPT: u64 = 0;
pub const NEXT_ICMPV6: u64 = 58;
