//! IPv6 fixed header (RFC 8200). The only extension header with a module
//! of its own is hop-by-hop options; anything else is chosen from `nxt`
//! directly.

pub mod layout;

use serde_json::json;

use crate::codec::{DeferredAction, FieldContext, FieldSchema, MatchContext, Protocol, Scope};
use crate::protocols::common::{self, priority};
use crate::protocols::ethernet;

pub const ID: &str = "ipv6";
pub const NAME: &str = "Internet Protocol Version 6";

pub struct Ipv6 {
    schema: Vec<FieldSchema>,
}

impl Ipv6 {
    pub fn new() -> Self {
        Self {
            schema: vec![
                FieldSchema::integer("version", "Version")
                    .range(0, 15)
                    .default_value(json!(6)),
                FieldSchema::object(
                    "tclass",
                    "Traffic Class",
                    vec![
                        FieldSchema::integer("dscp", "Differentiated Services Codepoint")
                            .range(0, 63)
                            .default_value(json!(0)),
                        FieldSchema::integer("ecn", "Explicit Congestion Notification")
                            .range(0, 3)
                            .default_value(json!(0)),
                    ],
                ),
                FieldSchema::integer("flow", "Flow Label")
                    .range(0, 0xf_ffff)
                    .default_value(json!(0)),
                FieldSchema::integer("plen", "Payload Length")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::integer("nxt", "Next Header").range(0, 0xff),
                FieldSchema::integer("hlim", "Hop Limit")
                    .range(0, 0xff)
                    .default_value(json!(64)),
                FieldSchema::string("sip", "Source Address"),
                FieldSchema::string("dip", "Destination Address"),
            ],
        }
    }
}

impl Default for Ipv6 {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for Ipv6 {
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
        ctx.prev_uint("etherType") == Some(ethernet::layout::ETHERTYPE_IPV6)
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "version" => {
                ctx.decode_bits(path, layout::VERSION);
            }
            "tclass.dscp" => {
                ctx.decode_bits(path, layout::DSCP);
            }
            "tclass.ecn" => {
                ctx.decode_bits(path, layout::ECN);
            }
            "flow" => {
                ctx.decode_bits(path, layout::FLOW_LABEL);
            }
            "plen" => {
                ctx.decode_uint(path, layout::PAYLOAD_LENGTH);
                ctx.defer(Scope::AfterDecode, 0, path);
            }
            "nxt" => {
                ctx.decode_uint(path, layout::NEXT_HEADER);
            }
            "hlim" => {
                ctx.decode_uint(path, layout::HOP_LIMIT);
            }
            "sip" => ctx.decode_ipv6(path, layout::SIP),
            "dip" => ctx.decode_ipv6(path, layout::DIP),
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "version" => {
                ctx.encode_bits(path, layout::VERSION);
            }
            "tclass.dscp" => {
                ctx.encode_bits(path, layout::DSCP);
            }
            "tclass.ecn" => {
                ctx.encode_bits(path, layout::ECN);
            }
            "flow" => {
                ctx.encode_bits(path, layout::FLOW_LABEL);
            }
            "plen" => common::encode_auto(
                ctx,
                path,
                layout::PAYLOAD_LENGTH,
                Scope::Packet,
                priority::NETWORK_LENGTH,
            ),
            "nxt" => {
                ctx.encode_uint(path, layout::NEXT_HEADER);
            }
            "hlim" => {
                ctx.encode_uint(path, layout::HOP_LIMIT);
            }
            "sip" => ctx.encode_ipv6(path, layout::SIP),
            "dip" => ctx.encode_ipv6(path, layout::DIP),
            _ => {}
        }
    }

    fn run_deferred(&self, action: &DeferredAction, ctx: &mut FieldContext<'_>) {
        let path = action.target.as_str();
        match (action.scope, path) {
            (Scope::AfterDecode, "plen") => {
                let Some(payload) = ctx.current().uint(path) else {
                    return;
                };
                let start = ctx.current().start_pos + layout::HEADER_LEN;
                let available = ctx.buffer().len().saturating_sub(start) as u64;
                if payload > available {
                    ctx.record_error(path, "Payload length exceeds captured bytes");
                }
            }
            (Scope::Packet, "plen") => {
                let payload = common::span_to_chain_end(ctx).saturating_sub(ctx.current().length);
                common::stamp(ctx, path, layout::PAYLOAD_LENGTH, payload as u64);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::{Codec, EncodeInput};
    use serde_json::json;

    #[test]
    fn payload_length_excludes_header() {
        let chain = Codec::default()
            .encode(&[
                EncodeInput::new(
                    "ipv6",
                    json!({"nxt": 59, "sip": "fe80::1", "dip": "ff02::1", "flow": 0x12345}),
                ),
                EncodeInput::new("raw", json!({"data": "aabbccdd"})),
            ])
            .unwrap();
        let packet = chain.packet();
        assert_eq!(packet.len(), 44);
        assert_eq!(&packet[..4], [0x60, 0x01, 0x23, 0x45]);
        assert_eq!(&packet[4..6], [0, 4]);
        assert_eq!(packet[6], 59);
        assert_eq!(packet[7], 64);
        assert_eq!(packet[8], 0xfe);
        assert_eq!(packet[39], 1);
        assert!(chain.errors().is_empty(), "{:?}", chain.errors());
    }

    #[test]
    fn decode_header_fields() {
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&[0x86, 0xdd]);
        frame.extend_from_slice(&[0x6b, 0x80, 0x00, 0x00, 0x00, 0x00, 0x3b, 0xff]);
        frame.extend_from_slice(&[0u8; 15]);
        frame.push(1);
        frame.extend_from_slice(&[0u8; 15]);
        frame.push(2);

        let chain = Codec::default().decode(&frame).unwrap();
        let ip = chain.find("ipv6").unwrap();
        assert_eq!(ip.span(), 14..54);
        assert_eq!(
            ip.value.to_value(),
            json!({
                "version": 6,
                "tclass": {"dscp": 0x2e, "ecn": 0},
                "flow": 0,
                "plen": 0,
                "nxt": 59,
                "hlim": 255,
                "sip": "::1",
                "dip": "::2",
            })
        );
        assert!(ip.errors.is_empty());
    }
}
