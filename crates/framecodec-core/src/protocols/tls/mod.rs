//! TLS record layer (RFC 8446 §5.1). Only the record header is decoded;
//! the fragment stays opaque. Several records in one segment decode as
//! consecutive modules.

pub mod layout;

use serde_json::json;

use crate::codec::{DeferredAction, FieldContext, FieldSchema, MatchContext, Protocol, Scope};
use crate::protocols::common::{self, priority};
use crate::protocols::tcp;

pub const ID: &str = "tls";
pub const NAME: &str = "Transport Layer Security Record";

pub struct Tls {
    schema: Vec<FieldSchema>,
}

impl Tls {
    pub fn new() -> Self {
        let content_types: Vec<i64> = layout::CONTENT_TYPES.map(i64::from).collect();
        Self {
            schema: vec![
                FieldSchema::integer("contentType", "Content Type").one_of(&content_types),
                FieldSchema::integer("version", "Legacy Record Version")
                    .range(0, 0xffff)
                    .default_value(json!(layout::VERSION_TLS12)),
                FieldSchema::integer("length", "Length")
                    .range(0, 0xffff)
                    .default_value(json!(0)),
                FieldSchema::hex("fragment", "Fragment").default_value(json!("")),
            ],
        }
    }
}

impl Default for Tls {
    fn default() -> Self {
        Self::new()
    }
}

/// A record header with a known content type and version.
fn looks_like_record(bytes: &[u8]) -> bool {
    match bytes {
        [content_type, major, minor, _, _, ..] => {
            layout::CONTENT_TYPES.contains(content_type)
                && layout::VERSIONS.contains(&u16::from_be_bytes([*major, *minor]))
        }
        _ => false,
    }
}

/// Read at most the captured bytes; a short capture is reported on
/// `length` after the walk.
fn decode_fragment(ctx: &mut FieldContext<'_>, path: &str) {
    let declared = ctx.current().uint("length").unwrap_or(0) as usize;
    let start = ctx.current().start_pos + layout::FRAGMENT;
    let captured = ctx.buffer().len().saturating_sub(start);
    let length = declared.min(captured);
    ctx.decode_hex(path, layout::FRAGMENT..layout::FRAGMENT + length);
}

impl Protocol for Tls {
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
        ctx.prev().is_some_and(|prev| prev.id == tcp::ID || prev.id == ID)
            && looks_like_record(ctx.remaining())
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "contentType" => {
                ctx.decode_uint(path, layout::CONTENT_TYPE);
            }
            "version" => {
                ctx.decode_uint(path, layout::VERSION);
            }
            "length" => {
                ctx.decode_uint(path, layout::LENGTH);
                ctx.defer(Scope::AfterDecode, 0, path);
            }
            "fragment" => decode_fragment(ctx, path),
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "contentType" => {
                ctx.encode_uint(path, layout::CONTENT_TYPE);
            }
            "version" => {
                ctx.encode_uint(path, layout::VERSION);
            }
            "length" => common::encode_auto(
                ctx,
                path,
                layout::LENGTH,
                Scope::SelfEncode,
                priority::HEADER_LENGTH,
            ),
            "fragment" => {
                ctx.encode_hex(path, layout::FRAGMENT);
            }
            _ => {}
        }
    }

    fn run_deferred(&self, action: &DeferredAction, ctx: &mut FieldContext<'_>) {
        let path = action.target.as_str();
        match (action.scope, path) {
            (Scope::AfterDecode, "length") => {
                let declared = ctx.current().uint(path).unwrap_or(0) as usize;
                if ctx.current().length < layout::HEADER_LEN + declared {
                    ctx.record_error(path, "Length exceeds captured bytes");
                }
            }
            (Scope::SelfEncode, "length") => {
                let length = ctx.current().length.saturating_sub(layout::HEADER_LEN);
                common::stamp(ctx, path, layout::LENGTH, length as u64);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::looks_like_record;
    use crate::codec::{Codec, EncodeInput};
    use serde_json::json;

    #[test]
    fn record_header_recognition() {
        assert!(looks_like_record(&[0x17, 0x03, 0x03, 0x00, 0x03]));
        assert!(looks_like_record(&[0x16, 0x03, 0x01, 0x02, 0x00, 0x01]));
        assert!(!looks_like_record(&[0x19, 0x03, 0x03, 0x00, 0x00]));
        assert!(!looks_like_record(&[0x17, 0x03, 0x05, 0x00, 0x00]));
        assert!(!looks_like_record(&[0x17, 0x03, 0x03, 0x00]));
    }

    #[test]
    fn length_is_computed_from_fragment() {
        let chain = Codec::default()
            .encode(&[EncodeInput::new(
                "tls",
                json!({"contentType": 23, "fragment": "aabbcc"}),
            )])
            .unwrap();
        assert_eq!(chain.packet(), [0x17, 0x03, 0x03, 0x00, 0x03, 0xaa, 0xbb, 0xcc]);
        assert_eq!(chain.find("tls").unwrap().uint("length"), Some(3));
        assert!(chain.errors().is_empty(), "{:?}", chain.errors());
    }

    #[test]
    fn unknown_content_type_is_reported() {
        let chain = Codec::default()
            .encode(&[EncodeInput::new("tls", json!({"contentType": 25}))])
            .unwrap();
        let errors = chain.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "contentType");
        assert_eq!(errors[0].message, "Content Type should be 20, 21, 22, 23 or 24");
    }
}
