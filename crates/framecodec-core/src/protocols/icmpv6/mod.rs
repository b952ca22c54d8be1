//! ICMP for IPv6 (RFC 4443). Unlike ICMP for IPv4 the checksum covers an
//! IPv6 pseudo-header, and the message body is left as opaque hex.

pub mod layout;

use serde_json::json;

use crate::codec::convert::bytes_to_hex;
use crate::codec::{DeferredAction, FieldContext, FieldSchema, MatchContext, Protocol, Scope};
use crate::protocols::common::checksum::transport_checksum;
use crate::protocols::common::{self, priority};
use crate::protocols::{ipv6, ipv6_hopopt};

pub const ID: &str = "icmpv6";
pub const NAME: &str = "Internet Control Message Protocol for IPv6";

pub struct Icmpv6 {
    schema: Vec<FieldSchema>,
}

impl Icmpv6 {
    pub fn new() -> Self {
        Self {
            schema: vec![
                FieldSchema::integer("type", "Type").range(0, 0xff),
                FieldSchema::integer("code", "Code")
                    .range(0, 0xff)
                    .default_value(json!(0)),
                FieldSchema::integer("checksum", "Checksum")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::hex("message", "Message Body").default_value(json!("")),
            ],
        }
    }
}

impl Default for Icmpv6 {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for Icmpv6 {
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
        ctx.prev().is_some_and(|prev| {
            (prev.id == ipv6::ID || prev.id == ipv6_hopopt::ID)
                && common::next_protocol(prev) == Some(ipv6::layout::NEXT_ICMPV6)
        })
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "type" => {
                ctx.decode_uint(path, layout::TYPE);
            }
            "code" => {
                ctx.decode_uint(path, layout::CODE);
            }
            "checksum" => {
                ctx.decode_uint(path, layout::CHECKSUM);
            }
            "message" => {
                let bytes = ctx.read_rest(layout::MESSAGE);
                ctx.set_value(path, json!(bytes_to_hex(&bytes)));
            }
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "type" => {
                ctx.encode_uint(path, layout::TYPE);
            }
            "code" => {
                ctx.encode_uint(path, layout::CODE);
            }
            "checksum" => common::encode_auto(
                ctx,
                path,
                layout::CHECKSUM,
                Scope::Packet,
                priority::TRANSPORT_CHECKSUM,
            ),
            "message" => {
                ctx.encode_hex(path, layout::MESSAGE);
            }
            _ => {}
        }
    }

    fn run_deferred(&self, action: &DeferredAction, ctx: &mut FieldContext<'_>) {
        if action.scope != Scope::Packet || action.target != "checksum" {
            return;
        }
        let path = action.target.as_str();
        ctx.write_uint(layout::CHECKSUM, 0);
        match transport_checksum(ctx, ipv6::layout::NEXT_ICMPV6 as u8) {
            Ok(checksum) => common::stamp(ctx, path, layout::CHECKSUM, u64::from(checksum)),
            Err(err) => ctx.record_error(path, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::layout;
    use crate::codec::{Codec, EncodeInput};
    use serde_json::json;

    fn ip() -> EncodeInput {
        EncodeInput::new(
            "ipv6",
            json!({"nxt": 58, "sip": "2001:db8::1", "dip": "2001:db8::2"}),
        )
    }

    #[test]
    fn echo_request_layout() {
        let chain = Codec::default()
            .encode(&[
                ip(),
                EncodeInput::new(
                    "icmpv6",
                    json!({"type": layout::TYPE_ECHO_REQUEST, "message": "00010002"}),
                ),
            ])
            .unwrap();
        let icmp = &chain.packet()[40..];
        assert_eq!(icmp.len(), 8);
        assert_eq!(&icmp[..2], [128, 0]);
        assert_ne!(&icmp[2..4], [0, 0]);
        assert_eq!(&icmp[4..], [0, 1, 0, 2]);
        assert_eq!(chain.find("ipv6").unwrap().uint("plen"), Some(8));
        assert!(chain.errors().is_empty(), "{:?}", chain.errors());
    }

    #[test]
    fn checksum_needs_an_ip_layer() {
        let chain = Codec::default()
            .encode(&[EncodeInput::new("icmpv6", json!({"type": 135}))])
            .unwrap();
        let errors = chain.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "checksum");
        assert_eq!(errors[0].message, "No IP layer to build a pseudo-header from");
    }

    #[test]
    fn not_matched_after_ipv4() {
        let encoded = Codec::default()
            .encode(&[
                EncodeInput::new(
                    "ipv4",
                    json!({"protocol": 58, "sip": "10.0.0.1", "dip": "10.0.0.2"}),
                ),
                EncodeInput::new("raw", json!({"data": "80000000"})),
            ])
            .unwrap();
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&[0x08, 0x00]);
        frame.extend_from_slice(encoded.packet());
        let chain = Codec::default().decode(&frame).unwrap();
        let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
        assert_eq!(ids, ["eth", "ipv4", "raw"]);
    }
}
