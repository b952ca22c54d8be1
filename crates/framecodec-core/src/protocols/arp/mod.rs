//! ARP over Ethernet with IPv4 addresses (RFC 826).
//!
//! The address fields assume 6-byte hardware and 4-byte protocol
//! addresses regardless of the size fields, which are still decoded and
//! encoded as-is.

pub mod layout;

use serde_json::json;

use crate::codec::{FieldContext, FieldSchema, MatchContext, Protocol};
use crate::protocols::ethernet;

pub const ID: &str = "arp";
pub const NAME: &str = "Address Resolution Protocol";

pub struct Arp {
    schema: Vec<FieldSchema>,
}

impl Arp {
    pub fn new() -> Self {
        let address = |name, label| {
            FieldSchema::object(
                name,
                label,
                vec![
                    FieldSchema::string("mac", "MAC Address"),
                    FieldSchema::string("ipv4", "IPv4 Address"),
                ],
            )
        };
        Self {
            schema: vec![
                FieldSchema::object(
                    "hardware",
                    "Hardware",
                    vec![
                        FieldSchema::integer("type", "Hardware Type")
                            .range(0, 0xffff)
                            .default_value(json!(layout::HARDWARE_ETHERNET)),
                        FieldSchema::integer("size", "Hardware Size")
                            .range(0, 0xff)
                            .default_value(json!(6)),
                    ],
                ),
                FieldSchema::object(
                    "protocol",
                    "Protocol",
                    vec![
                        FieldSchema::integer("type", "Protocol Type")
                            .range(0, 0xffff)
                            .default_value(json!(layout::PROTOCOL_IPV4)),
                        FieldSchema::integer("size", "Protocol Size")
                            .range(0, 0xff)
                            .default_value(json!(4)),
                    ],
                ),
                FieldSchema::integer("opcode", "Opcode").one_of(&layout::OPCODES),
                address("sender", "Sender"),
                address("target", "Target"),
            ],
        }
    }
}

impl Default for Arp {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for Arp {
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
        ctx.prev_uint("etherType") == Some(ethernet::layout::ETHERTYPE_ARP)
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "hardware.type" => {
                ctx.decode_uint(path, layout::HARDWARE_TYPE);
            }
            "hardware.size" => {
                ctx.decode_uint(path, layout::HARDWARE_SIZE);
            }
            "protocol.type" => {
                ctx.decode_uint(path, layout::PROTOCOL_TYPE);
            }
            "protocol.size" => {
                ctx.decode_uint(path, layout::PROTOCOL_SIZE);
            }
            "opcode" => {
                ctx.decode_uint(path, layout::OPCODE);
            }
            "sender.mac" => ctx.decode_mac(path, layout::SENDER_MAC),
            "sender.ipv4" => ctx.decode_ipv4(path, layout::SENDER_IPV4),
            "target.mac" => ctx.decode_mac(path, layout::TARGET_MAC),
            "target.ipv4" => ctx.decode_ipv4(path, layout::TARGET_IPV4),
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "hardware.type" => {
                ctx.encode_uint(path, layout::HARDWARE_TYPE);
            }
            "hardware.size" => {
                ctx.encode_uint(path, layout::HARDWARE_SIZE);
            }
            "protocol.type" => {
                ctx.encode_uint(path, layout::PROTOCOL_TYPE);
            }
            "protocol.size" => {
                ctx.encode_uint(path, layout::PROTOCOL_SIZE);
            }
            "opcode" => {
                ctx.encode_uint(path, layout::OPCODE);
            }
            "sender.mac" => ctx.encode_mac(path, layout::SENDER_MAC),
            "sender.ipv4" => ctx.encode_ipv4(path, layout::SENDER_IPV4),
            "target.mac" => ctx.encode_mac(path, layout::TARGET_MAC),
            "target.ipv4" => ctx.encode_ipv4(path, layout::TARGET_IPV4),
            _ => {}
        }
    }
}
