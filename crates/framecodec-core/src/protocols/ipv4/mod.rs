//! IPv4 header (RFC 791).
//!
//! `hdrLen` is expressed in bytes, not 32-bit words. `hdrLen`, `length`
//! and `checksum` are computed on encode when left at zero: the header
//! length once the module's own fields are written, the total length and
//! then the checksum once the whole chain is.

pub mod layout;

use serde_json::json;

use crate::codec::convert::internet_checksum;
use crate::codec::{DeferredAction, FieldContext, FieldSchema, MatchContext, Protocol, Scope};
use crate::protocols::common::{self, priority};
use crate::protocols::ethernet;

pub const ID: &str = "ipv4";
pub const NAME: &str = "Internet Protocol Version 4";

pub struct Ipv4 {
    schema: Vec<FieldSchema>,
}

impl Ipv4 {
    pub fn new() -> Self {
        Self {
            schema: vec![
                FieldSchema::integer("version", "Version")
                    .range(0, 15)
                    .default_value(json!(4)),
                FieldSchema::integer("hdrLen", "Header Length")
                    .range(0, layout::MAX_HEADER as i64)
                    .default_value(json!(0)),
                FieldSchema::object(
                    "dsfield",
                    "Differentiated Services Field",
                    vec![
                        FieldSchema::integer("dscp", "Differentiated Services Codepoint")
                            .range(0, 63)
                            .default_value(json!(0)),
                        FieldSchema::integer("ecn", "Explicit Congestion Notification")
                            .range(0, 3)
                            .default_value(json!(0)),
                    ],
                ),
                FieldSchema::integer("length", "Total Length")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::integer("id", "Identification")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::object(
                    "flags",
                    "Flags",
                    vec![
                        FieldSchema::boolean("rb", "Reserved Bit").default_value(json!(false)),
                        FieldSchema::boolean("df", "Don't Fragment").default_value(json!(false)),
                        FieldSchema::boolean("mf", "More Fragments").default_value(json!(false)),
                    ],
                ),
                FieldSchema::integer("fragOffset", "Fragment Offset")
                    .range(0, 0x1fff)
                    .default_value(json!(0)),
                FieldSchema::integer("ttl", "Time to Live")
                    .range(0, 0xff)
                    .default_value(json!(64)),
                FieldSchema::integer("protocol", "Protocol").range(0, 0xff),
                FieldSchema::integer("checksum", "Header Checksum")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::string("sip", "Source Address"),
                FieldSchema::string("dip", "Destination Address"),
                FieldSchema::hex("options", "Options").length(0, 40),
            ],
        }
    }
}

impl Default for Ipv4 {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_header_length(ctx: &mut FieldContext<'_>, path: &str) {
    let length = ctx.read_bits(layout::HDR_LEN) * 4;
    ctx.set_value(path, json!(length));
    if length < layout::MIN_HEADER {
        ctx.record_error(path, "Header length should be at least 20");
    }
}

fn encode_header_length(ctx: &mut FieldContext<'_>, path: &str) {
    let length = ctx.input_uint(path, layout::MAX_HEADER);
    if length == 0 {
        ctx.write_bits(layout::HDR_LEN, 0);
        ctx.defer(Scope::SelfEncode, priority::HEADER_LENGTH, path);
        return;
    }
    if length % 4 != 0 || length < layout::MIN_HEADER {
        ctx.record_error(path, "Header length should be a multiple of 4 between 20 and 60");
    }
    ctx.write_bits(layout::HDR_LEN, length / 4);
}

fn decode_options(ctx: &mut FieldContext<'_>, path: &str) {
    let header = ctx.current().uint("hdrLen").unwrap_or(0) as usize;
    if header > layout::OPTIONS {
        ctx.decode_hex(path, layout::OPTIONS..header);
    }
}

fn encode_options(ctx: &mut FieldContext<'_>, path: &str) {
    if ctx.value(path).is_undefined() {
        return;
    }
    let mut bytes = ctx.input_hex(path);
    bytes.resize(bytes.len().next_multiple_of(4), 0);
    ctx.write_bytes(layout::OPTIONS, &bytes);
}

fn check_total_length(ctx: &mut FieldContext<'_>, path: &str) {
    let Some(total) = ctx.current().uint(path) else {
        return;
    };
    let header = ctx.current().uint("hdrLen").unwrap_or(layout::MIN_HEADER);
    let available = ctx.buffer().len().saturating_sub(ctx.current().start_pos) as u64;
    if total < header {
        ctx.record_error(path, "Total length smaller than header");
    } else if total > available {
        ctx.record_error(path, "Total length exceeds captured bytes");
    }
}

fn stamp_checksum(ctx: &mut FieldContext<'_>, path: &str) {
    ctx.write_uint(layout::CHECKSUM, 0);
    let start = ctx.current().start_pos;
    let header = ctx.current().uint("hdrLen").unwrap_or(0) as usize;
    let header = if header == 0 { ctx.current().length } else { header };
    let Some(bytes) = ctx.buffer().get(start..start + header) else {
        ctx.record_error(path, "Header extends past the end of the packet");
        return;
    };
    let checksum = internet_checksum(&[bytes]);
    common::stamp(ctx, path, layout::CHECKSUM, u64::from(checksum));
}

impl Protocol for Ipv4 {
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
        ctx.prev_uint("etherType") == Some(ethernet::layout::ETHERTYPE_IPV4)
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "version" => {
                ctx.decode_bits(path, layout::VERSION);
            }
            "hdrLen" => decode_header_length(ctx, path),
            "dsfield.dscp" => {
                ctx.decode_bits(path, layout::DSCP);
            }
            "dsfield.ecn" => {
                ctx.decode_bits(path, layout::ECN);
            }
            "length" => {
                ctx.decode_uint(path, layout::LENGTH);
                ctx.defer(Scope::AfterDecode, 0, path);
            }
            "id" => {
                ctx.decode_uint(path, layout::IDENT);
            }
            "flags.rb" => {
                ctx.decode_flag(path, layout::FLAG_RB);
            }
            "flags.df" => {
                ctx.decode_flag(path, layout::FLAG_DF);
            }
            "flags.mf" => {
                ctx.decode_flag(path, layout::FLAG_MF);
            }
            "fragOffset" => {
                ctx.decode_bits(path, layout::FRAG_OFFSET);
            }
            "ttl" => {
                ctx.decode_uint(path, layout::TTL);
            }
            "protocol" => {
                ctx.decode_uint(path, layout::PROTOCOL);
            }
            "checksum" => {
                ctx.decode_uint(path, layout::CHECKSUM);
            }
            "sip" => ctx.decode_ipv4(path, layout::SIP),
            "dip" => ctx.decode_ipv4(path, layout::DIP),
            "options" => decode_options(ctx, path),
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "version" => {
                ctx.encode_bits(path, layout::VERSION);
            }
            "hdrLen" => encode_header_length(ctx, path),
            "dsfield.dscp" => {
                ctx.encode_bits(path, layout::DSCP);
            }
            "dsfield.ecn" => {
                ctx.encode_bits(path, layout::ECN);
            }
            "length" => common::encode_auto(
                ctx,
                path,
                layout::LENGTH,
                Scope::Packet,
                priority::NETWORK_LENGTH,
            ),
            "id" => {
                ctx.encode_uint(path, layout::IDENT);
            }
            "flags.rb" => {
                ctx.encode_flag(path, layout::FLAG_RB);
            }
            "flags.df" => {
                ctx.encode_flag(path, layout::FLAG_DF);
            }
            "flags.mf" => {
                ctx.encode_flag(path, layout::FLAG_MF);
            }
            "fragOffset" => {
                ctx.encode_bits(path, layout::FRAG_OFFSET);
            }
            "ttl" => {
                ctx.encode_uint(path, layout::TTL);
            }
            "protocol" => {
                ctx.encode_uint(path, layout::PROTOCOL);
            }
            "checksum" => common::encode_auto(
                ctx,
                path,
                layout::CHECKSUM,
                Scope::Packet,
                priority::NETWORK_CHECKSUM,
            ),
            "sip" => ctx.encode_ipv4(path, layout::SIP),
            "dip" => ctx.encode_ipv4(path, layout::DIP),
            "options" => encode_options(ctx, path),
            _ => {}
        }
    }

    fn run_deferred(&self, action: &DeferredAction, ctx: &mut FieldContext<'_>) {
        let path = action.target.as_str();
        match (action.scope, path) {
            (Scope::AfterDecode, "length") => check_total_length(ctx, path),
            (Scope::SelfEncode, "hdrLen") => {
                let length = ctx.current().length as u64;
                ctx.write_bits(layout::HDR_LEN, length / 4);
                ctx.set_value(path, json!(length));
            }
            (Scope::Packet, "length") => {
                let length = common::span_to_chain_end(ctx) as u64;
                common::stamp(ctx, path, layout::LENGTH, length);
            }
            (Scope::Packet, "checksum") => stamp_checksum(ctx, path),
            _ => {}
        }
    }
}
