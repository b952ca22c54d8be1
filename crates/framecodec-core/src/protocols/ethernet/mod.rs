//! Ethernet II header.
//!
//! Always the first module of a chain: it matches exactly when nothing
//! precedes it. The `etherType` it decodes is what VLAN, ARP, IPv4 and IPv6
//! match on.

pub mod layout;

use crate::codec::{FieldContext, FieldSchema, MatchContext, Protocol};

pub const ID: &str = "eth";
pub const NAME: &str = "Ethernet II";

pub struct Ethernet {
    schema: Vec<FieldSchema>,
}

impl Ethernet {
    pub fn new() -> Self {
        Self {
            schema: vec![
                FieldSchema::string("dmac", "Destination MAC Address"),
                FieldSchema::string("smac", "Source MAC Address"),
                FieldSchema::integer("etherType", "Type").range(0, 0xffff),
            ],
        }
    }
}

impl Default for Ethernet {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for Ethernet {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn schema(&self) -> &[FieldSchema] {
        &self.schema
    }

    fn matches(&self, ctx: &MatchContext<'_>) -> bool {
        ctx.preceding.is_empty()
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "dmac" => ctx.decode_mac(path, layout::DMAC),
            "smac" => ctx.decode_mac(path, layout::SMAC),
            "etherType" => {
                ctx.decode_uint(path, layout::ETHER_TYPE);
            }
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "dmac" => ctx.encode_mac(path, layout::DMAC),
            "smac" => ctx.encode_mac(path, layout::SMAC),
            "etherType" => {
                ctx.encode_uint(path, layout::ETHER_TYPE);
            }
            _ => {}
        }
    }
}
