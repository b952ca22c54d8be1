//! IPv6 hop-by-hop options header (RFC 8200 §4.3). Options are kept as
//! opaque hex, padding included, so a decoded header re-encodes byte for
//! byte.

pub mod layout;

use serde_json::json;

use crate::codec::{DeferredAction, FieldContext, FieldSchema, MatchContext, Protocol, Scope};
use crate::protocols::common::{self, priority};
use crate::protocols::ipv6;

pub const ID: &str = "ipv6-hopopt";
pub const NAME: &str = "IPv6 Hop-by-Hop Options";

pub struct HopByHop {
    schema: Vec<FieldSchema>,
}

impl HopByHop {
    pub fn new() -> Self {
        Self {
            schema: vec![
                FieldSchema::integer("nxt", "Next Header").range(0, 0xff),
                FieldSchema::integer("hdrLen", "Header Extension Length")
                    .range(0, 0xff)
                    .default_value(json!(0)),
                FieldSchema::hex("options", "Options").default_value(json!("")),
            ],
        }
    }
}

impl Default for HopByHop {
    fn default() -> Self {
        Self::new()
    }
}

/// Pad1 or PadN bytes that bring `used` up to the next 8-octet boundary.
fn padding(used: usize) -> Vec<u8> {
    match (layout::UNIT - used % layout::UNIT) % layout::UNIT {
        0 => Vec::new(),
        1 => vec![layout::OPT_PAD1],
        n => {
            let mut pad = vec![0u8; n];
            pad[0] = layout::OPT_PADN;
            pad[1] = (n - 2) as u8;
            pad
        }
    }
}

fn decode_options(ctx: &mut FieldContext<'_>, path: &str) {
    let units = ctx.current().uint("hdrLen").unwrap_or(0) as usize;
    let length = (units + 1) * layout::UNIT - layout::OPTIONS;
    ctx.decode_hex(path, layout::OPTIONS..layout::OPTIONS + length);
}

fn encode_options(ctx: &mut FieldContext<'_>, path: &str) {
    let mut bytes = ctx.input_hex(path);
    bytes.extend(padding(layout::OPTIONS + bytes.len()));
    ctx.write_bytes(layout::OPTIONS, &bytes);
}

impl Protocol for HopByHop {
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
            prev.id == ipv6::ID && prev.uint("nxt") == Some(ipv6::layout::NEXT_HOPOPT)
        })
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "nxt" => {
                ctx.decode_uint(path, layout::NEXT_HEADER);
            }
            "hdrLen" => {
                ctx.decode_uint(path, layout::HDR_EXT_LEN);
            }
            "options" => decode_options(ctx, path),
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "nxt" => {
                ctx.encode_uint(path, layout::NEXT_HEADER);
            }
            "hdrLen" => common::encode_auto(
                ctx,
                path,
                layout::HDR_EXT_LEN,
                Scope::SelfEncode,
                priority::HEADER_LENGTH,
            ),
            "options" => encode_options(ctx, path),
            _ => {}
        }
    }

    fn run_deferred(&self, action: &DeferredAction, ctx: &mut FieldContext<'_>) {
        if action.scope != Scope::SelfEncode || action.target != "hdrLen" {
            return;
        }
        let units = (ctx.current().length / layout::UNIT).saturating_sub(1);
        common::stamp(ctx, &action.target, layout::HDR_EXT_LEN, units as u64);
    }
}
