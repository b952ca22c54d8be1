//! Conventions shared by the reference protocols: deferred-action
//! priorities, auto-computed fields and transport checksums.

pub(crate) mod checksum;

use std::ops::Range;

use crate::codec::{FieldContext, ModuleRecord, Scope};
use crate::protocols::{ipv4, ipv6, ipv6_hopopt};

/// Packet-scope priorities, lowest first. Lengths must be final before any
/// checksum that covers them, and a network header checksum covers its
/// own length field but never a transport checksum.
pub mod priority {
    pub const HEADER_LENGTH: i32 = 1;
    pub const NETWORK_LENGTH: i32 = 10;
    pub const TRANSPORT_LENGTH: i32 = 20;
    pub const NETWORK_CHECKSUM: i32 = 30;
    pub const TRANSPORT_CHECKSUM: i32 = 100;
}

/// Upper-layer protocol number announced by an IP header or an IPv6
/// extension header.
pub(crate) fn next_protocol(module: &ModuleRecord) -> Option<u64> {
    match module.id {
        ipv4::ID => module.uint("protocol"),
        ipv6::ID | ipv6_hopopt::ID => module.uint("nxt"),
        _ => None,
    }
}

/// Encode a field that may be computed later: a non-zero input is written
/// as given, otherwise zero is written and `path` is queued under `scope`.
pub(crate) fn encode_auto(
    ctx: &mut FieldContext<'_>,
    path: &str,
    range: Range<usize>,
    scope: Scope,
    priority: i32,
) {
    if ctx.encode_uint(path, range) == 0 {
        ctx.defer(scope, priority, path);
    }
}

/// Write a computed value to both the buffer and the value tree.
pub(crate) fn stamp(ctx: &mut FieldContext<'_>, path: &str, range: Range<usize>, value: u64) {
    ctx.write_uint(range, value);
    ctx.set_value(path, serde_json::json!(value));
}

/// Bytes from the current module's start to the end of the chain.
pub(crate) fn span_to_chain_end(ctx: &FieldContext<'_>) -> usize {
    ctx.chain_end().saturating_sub(ctx.current().start_pos)
}
