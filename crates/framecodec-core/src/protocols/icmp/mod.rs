//! ICMP for IPv4 (RFC 792), echo-style layout: the identifier and sequence
//! words are decoded for every type, and everything after them is an
//! opaque message.

pub mod layout;

use serde_json::json;

use crate::codec::convert::{bytes_to_hex, internet_checksum};
use crate::codec::{DeferredAction, FieldContext, FieldSchema, MatchContext, Protocol, Scope};
use crate::protocols::common::{self, priority};
use crate::protocols::ipv4;

pub const ID: &str = "icmp";
pub const NAME: &str = "Internet Control Message Protocol";

pub struct Icmp {
    schema: Vec<FieldSchema>,
}

impl Icmp {
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
                FieldSchema::integer("ident", "Identifier")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::integer("seq", "Sequence Number")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::hex("message", "Message").default_value(json!("")),
            ],
        }
    }
}

impl Default for Icmp {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for Icmp {
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
            prev.id == ipv4::ID && prev.uint("protocol") == Some(ipv4::layout::PROTOCOL_ICMP)
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
            "ident" => {
                ctx.decode_uint(path, layout::IDENTIFIER);
            }
            "seq" => {
                ctx.decode_uint(path, layout::SEQUENCE);
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
            "ident" => {
                ctx.encode_uint(path, layout::IDENTIFIER);
            }
            "seq" => {
                ctx.encode_uint(path, layout::SEQUENCE);
            }
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
        ctx.write_uint(layout::CHECKSUM, 0);
        let start = ctx.current().start_pos;
        let Some(bytes) = ctx.buffer().get(start..ctx.chain_end()) else {
            return;
        };
        let checksum = internet_checksum(&[bytes]);
        common::stamp(ctx, &action.target, layout::CHECKSUM, u64::from(checksum));
    }
}
