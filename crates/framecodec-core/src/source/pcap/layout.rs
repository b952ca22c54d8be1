/// Read buffer handed to the `pcap-parser` readers.
pub const PCAP_READER_BUFFER_SIZE: usize = 65536;

/// Section Header Block type, also the first four bytes of every pcapng file.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

/// Legacy pcap magic numbers announcing nanosecond timestamps.
pub const PCAP_NANOSECOND_MAGIC: u32 = 0xa1b2_3c4d;
pub const PCAP_NANOSECOND_MAGIC_SWAPPED: u32 = 0x4d3c_b2a1;

pub const BLOCK_SECTION_HEADER: u32 = 0x0a0d_0d0a;
pub const BLOCK_INTERFACE_DESCRIPTION: u32 = 1;
pub const BLOCK_ENHANCED_PACKET: u32 = 6;
pub const BYTE_ORDER_MAGIC: u32 = 0x1a2b_3c4d;
pub const LINKTYPE_ETHERNET: u16 = 1;
pub const SNAPLEN: u32 = 65535;
