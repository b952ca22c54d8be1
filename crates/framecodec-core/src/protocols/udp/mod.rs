//! UDP header (RFC 768).

pub mod layout;

use serde_json::json;

use crate::codec::{DeferredAction, FieldContext, FieldSchema, MatchContext, Protocol, Scope};
use crate::protocols::common::checksum::transport_checksum;
use crate::protocols::common::{self, priority};
use crate::protocols::ipv4;

pub const ID: &str = "udp";
pub const NAME: &str = "User Datagram Protocol";

pub struct Udp {
    schema: Vec<FieldSchema>,
}

impl Udp {
    pub fn new() -> Self {
        Self {
            schema: vec![
                FieldSchema::integer("srcport", "Source Port").range(0, 0xffff),
                FieldSchema::integer("dstport", "Destination Port").range(0, 0xffff),
                FieldSchema::integer("length", "Length")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::integer("checksum", "Checksum")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
            ],
        }
    }
}

impl Default for Udp {
    fn default() -> Self {
        Self::new()
    }
}

fn check_length(ctx: &mut FieldContext<'_>, path: &str) {
    let Some(length) = ctx.current().uint(path) else {
        return;
    };
    let available = ctx.buffer().len().saturating_sub(ctx.current().start_pos) as u64;
    if length < layout::HEADER_LEN {
        ctx.record_error(path, "Length should be at least 8");
    } else if length > available {
        ctx.record_error(path, "Length exceeds captured bytes");
    }
}

impl Protocol for Udp {
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
        ctx.prev().and_then(common::next_protocol) == Some(ipv4::layout::PROTOCOL_UDP)
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "srcport" => {
                ctx.decode_uint(path, layout::SRC_PORT);
            }
            "dstport" => {
                ctx.decode_uint(path, layout::DST_PORT);
            }
            "length" => {
                ctx.decode_uint(path, layout::LENGTH);
                ctx.defer(Scope::AfterDecode, 0, path);
            }
            "checksum" => {
                ctx.decode_uint(path, layout::CHECKSUM);
            }
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "srcport" => {
                ctx.encode_uint(path, layout::SRC_PORT);
            }
            "dstport" => {
                ctx.encode_uint(path, layout::DST_PORT);
            }
            "length" => common::encode_auto(
                ctx,
                path,
                layout::LENGTH,
                Scope::Packet,
                priority::TRANSPORT_LENGTH,
            ),
            "checksum" => common::encode_auto(
                ctx,
                path,
                layout::CHECKSUM,
                Scope::Packet,
                priority::TRANSPORT_CHECKSUM,
            ),
            _ => {}
        }
    }

    fn run_deferred(&self, action: &DeferredAction, ctx: &mut FieldContext<'_>) {
        let path = action.target.as_str();
        match (action.scope, path) {
            (Scope::AfterDecode, "length") => check_length(ctx, path),
            (Scope::Packet, "length") => {
                let length = common::span_to_chain_end(ctx) as u64;
                common::stamp(ctx, path, layout::LENGTH, length);
            }
            (Scope::Packet, "checksum") => {
                ctx.write_uint(layout::CHECKSUM, 0);
                match transport_checksum(ctx, ipv4::layout::PROTOCOL_UDP as u8) {
                    // Zero means "no checksum" on the wire.
                    Ok(0) => common::stamp(ctx, path, layout::CHECKSUM, 0xffff),
                    Ok(checksum) => {
                        common::stamp(ctx, path, layout::CHECKSUM, u64::from(checksum));
                    }
                    Err(err) => ctx.record_error(path, err.to_string()),
                }
            }
            _ => {}
        }
    }
}
