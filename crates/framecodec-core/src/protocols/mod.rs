//! Reference protocol modules.
//!
//! Each protocol follows the same layered structure:
//! - `layout`: byte offsets, bit fields and wire constants (source of truth)
//! - `mod.rs`: schema, match predicate and per-field codec tables
//!
//! Modules never touch the buffer directly; every read and write goes
//! through the [`FieldContext`](crate::codec::FieldContext) they are handed.

pub mod arp;
pub(crate) mod common;
pub mod ethernet;
pub mod icmp;
pub mod icmpv6;
pub mod ipv4;
pub mod ipv6;
pub mod ipv6_hopopt;
pub mod raw;
pub mod tcp;
pub mod tls;
pub mod udp;
pub mod vlan;

use crate::codec::RegistryBuilder;

/// Register every reference protocol in decode order, with raw data as the
/// catch-all.
pub fn register_reference(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .register(ethernet::Ethernet::new())
        .register(vlan::Vlan::new())
        .register(arp::Arp::new())
        .register(ipv4::Ipv4::new())
        .register(ipv6::Ipv6::new())
        .register(ipv6_hopopt::HopByHop::new())
        .register(icmp::Icmp::new())
        .register(icmpv6::Icmpv6::new())
        .register(tcp::Tcp::new())
        .register(udp::Udp::new())
        .register(tls::Tls::new())
        .catch_all(raw::Raw::new())
}
