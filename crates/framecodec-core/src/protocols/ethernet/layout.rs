use std::ops::Range;

pub const DMAC: Range<usize> = 0..6;
pub const SMAC: Range<usize> = 6..12;
pub const ETHER_TYPE: Range<usize> = 12..14;

pub const ETHERTYPE_IPV4: u64 = 0x0800;
pub const ETHERTYPE_ARP: u64 = 0x0806;
pub const ETHERTYPE_VLAN: u64 = 0x8100;
pub const ETHERTYPE_QINQ: u64 = 0x88a8;
pub const ETHERTYPE_IPV6: u64 = 0x86dd;
