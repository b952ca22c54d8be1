//! TCP header (RFC 9293) with a structured option list.
//!
//! Like IPv4, `hdrLen` is in bytes and is computed when left at zero. The
//! checksum needs the addresses of the nearest preceding IPv4 or IPv6
//! module and covers every byte to the end of the chain.

pub mod layout;
pub mod options;

use serde_json::{Value, json};

use crate::codec::bits::BitField;
use crate::codec::{DeferredAction, FieldContext, FieldSchema, MatchContext, Protocol, Scope};
use crate::protocols::common::checksum::transport_checksum;
use crate::protocols::common::{self, priority};
use crate::protocols::ipv4;

pub const ID: &str = "tcp";
pub const NAME: &str = "Transmission Control Protocol";

pub struct Tcp {
    schema: Vec<FieldSchema>,
}

fn flag(name: &'static str, label: &'static str) -> FieldSchema {
    FieldSchema::boolean(name, label).default_value(json!(false))
}

impl Tcp {
    pub fn new() -> Self {
        Self {
            schema: vec![
                FieldSchema::integer("srcport", "Source Port").range(0, 0xffff),
                FieldSchema::integer("dstport", "Destination Port").range(0, 0xffff),
                FieldSchema::integer("seq", "Sequence Number")
                    .range(0, 0xffff_ffff)
                    .default_value(json!(0)),
                FieldSchema::integer("ack", "Acknowledgment Number")
                    .range(0, 0xffff_ffff)
                    .default_value(json!(0)),
                FieldSchema::integer("hdrLen", "Header Length")
                    .range(0, layout::MAX_HEADER as i64)
                    .default_value(json!(0)),
                FieldSchema::object(
                    "flags",
                    "Flags",
                    vec![
                        FieldSchema::integer("res", "Reserved")
                            .range(0, 7)
                            .default_value(json!(0)),
                        flag("ae", "Accurate ECN"),
                        flag("cwr", "Congestion Window Reduced"),
                        flag("ece", "ECN-Echo"),
                        flag("urg", "Urgent"),
                        flag("ack", "Acknowledgment"),
                        flag("push", "Push"),
                        flag("rst", "Reset"),
                        flag("syn", "Syn"),
                        flag("fin", "Fin"),
                    ],
                ),
                FieldSchema::integer("window", "Window")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::integer("checksum", "Checksum")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::integer("urgPtr", "Urgent Pointer")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::array(
                    "options",
                    "Options",
                    FieldSchema::object("option", "Option", Vec::new()),
                ),
            ],
        }
    }
}

impl Default for Tcp {
    fn default() -> Self {
        Self::new()
    }
}

fn flag_field(path: &str) -> Option<BitField> {
    let field = match path {
        "flags.ae" => layout::FLAG_AE,
        "flags.cwr" => layout::FLAG_CWR,
        "flags.ece" => layout::FLAG_ECE,
        "flags.urg" => layout::FLAG_URG,
        "flags.ack" => layout::FLAG_ACK,
        "flags.push" => layout::FLAG_PSH,
        "flags.rst" => layout::FLAG_RST,
        "flags.syn" => layout::FLAG_SYN,
        "flags.fin" => layout::FLAG_FIN,
        _ => return None,
    };
    Some(field)
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
    if header <= layout::OPTIONS {
        return;
    }
    let bytes = ctx.read_bytes(layout::OPTIONS, header - layout::OPTIONS);
    let (parsed, errors) = options::parse_options(&bytes);
    ctx.set_value(path, serde_json::to_value(&parsed).unwrap_or_default());
    for (index, message) in errors {
        ctx.record_error(&format!("{path}.{index}"), message);
    }
}

fn encode_options(ctx: &mut FieldContext<'_>, path: &str) {
    let Some(provided) = ctx.value(path).value() else {
        return;
    };
    let Value::Array(list) = provided else {
        ctx.record_error(path, "Options should be an array");
        return;
    };
    let (mut bytes, errors) = options::build_options(&list);
    for (index, message) in errors {
        ctx.record_error(&format!("{path}.{index}"), message);
    }
    if bytes.len() > layout::MAX_OPTIONS {
        ctx.record_error(path, format!("Maximum length is {}", layout::MAX_OPTIONS));
        bytes.truncate(layout::MAX_OPTIONS);
    }
    bytes.resize(bytes.len().next_multiple_of(4), 0);
    ctx.write_bytes(layout::OPTIONS, &bytes);
}

impl Protocol for Tcp {
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
        ctx.prev().and_then(common::next_protocol) == Some(ipv4::layout::PROTOCOL_TCP)
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        if let Some(field) = flag_field(path) {
            ctx.decode_flag(path, field);
            return;
        }
        match path {
            "srcport" => {
                ctx.decode_uint(path, layout::SRC_PORT);
            }
            "dstport" => {
                ctx.decode_uint(path, layout::DST_PORT);
            }
            "seq" => {
                ctx.decode_uint(path, layout::SEQ);
            }
            "ack" => {
                ctx.decode_uint(path, layout::ACK);
            }
            "hdrLen" => decode_header_length(ctx, path),
            "flags.res" => {
                ctx.decode_bits(path, layout::RESERVED);
            }
            "window" => {
                ctx.decode_uint(path, layout::WINDOW);
            }
            "checksum" => {
                ctx.decode_uint(path, layout::CHECKSUM);
            }
            "urgPtr" => {
                ctx.decode_uint(path, layout::URGENT_POINTER);
            }
            "options" => decode_options(ctx, path),
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        if let Some(field) = flag_field(path) {
            ctx.encode_flag(path, field);
            return;
        }
        match path {
            "srcport" => {
                ctx.encode_uint(path, layout::SRC_PORT);
            }
            "dstport" => {
                ctx.encode_uint(path, layout::DST_PORT);
            }
            "seq" => {
                ctx.encode_uint(path, layout::SEQ);
            }
            "ack" => {
                ctx.encode_uint(path, layout::ACK);
            }
            "hdrLen" => encode_header_length(ctx, path),
            "flags.res" => {
                ctx.encode_bits(path, layout::RESERVED);
            }
            "window" => {
                ctx.encode_uint(path, layout::WINDOW);
            }
            "checksum" => common::encode_auto(
                ctx,
                path,
                layout::CHECKSUM,
                Scope::Packet,
                priority::TRANSPORT_CHECKSUM,
            ),
            "urgPtr" => {
                ctx.encode_uint(path, layout::URGENT_POINTER);
            }
            "options" => encode_options(ctx, path),
            _ => {}
        }
    }

    fn run_deferred(&self, action: &DeferredAction, ctx: &mut FieldContext<'_>) {
        let path = action.target.as_str();
        match (action.scope, path) {
            (Scope::SelfEncode, "hdrLen") => {
                let length = ctx.current().length as u64;
                ctx.write_bits(layout::HDR_LEN, length / 4);
                ctx.set_value(path, json!(length));
            }
            (Scope::Packet, "checksum") => {
                ctx.write_uint(layout::CHECKSUM, 0);
                match transport_checksum(ctx, ipv4::layout::PROTOCOL_TCP as u8) {
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
