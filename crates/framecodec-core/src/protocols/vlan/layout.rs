use std::ops::Range;

use crate::codec::bits::BitField;

pub const PRIORITY: BitField = BitField::new(0, 2, 0, 3);
pub const DEI: BitField = BitField::new(0, 2, 3, 1);
pub const ID: BitField = BitField::new(0, 2, 4, 12);
pub const ETHER_TYPE: Range<usize> = 2..4;

/// Values below this are 802.3 lengths, not EtherTypes.
pub const MIN_ETHER_TYPE: i64 = 0x0600;
