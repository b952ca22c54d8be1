use std::ops::Range;

pub const HARDWARE_TYPE: Range<usize> = 0..2;
pub const PROTOCOL_TYPE: Range<usize> = 2..4;
pub const HARDWARE_SIZE: Range<usize> = 4..5;
pub const PROTOCOL_SIZE: Range<usize> = 5..6;
pub const OPCODE: Range<usize> = 6..8;
pub const SENDER_MAC: Range<usize> = 8..14;
pub const SENDER_IPV4: Range<usize> = 14..18;
pub const TARGET_MAC: Range<usize> = 18..24;
pub const TARGET_IPV4: Range<usize> = 24..28;

pub const HARDWARE_ETHERNET: i64 = 1;
pub const PROTOCOL_IPV4: i64 = 0x0800;

/// Request, reply, RARP request, RARP reply.
pub const OPCODES: [i64; 4] = [1, 2, 3, 4];
