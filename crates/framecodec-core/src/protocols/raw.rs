//! Opaque payload. Registered as the catch-all, so it takes whatever no
//! other module claims, but never the first layer of a chain.

use serde_json::json;

use crate::codec::convert::bytes_to_hex;
use crate::codec::{FieldContext, FieldSchema, MatchContext, Protocol};

pub const ID: &str = "raw";
pub const NAME: &str = "Raw Data";

pub struct Raw {
    schema: Vec<FieldSchema>,
}

impl Raw {
    pub fn new() -> Self {
        Self {
            schema: vec![FieldSchema::hex("data", "Data").default_value(json!(""))],
        }
    }
}

impl Default for Raw {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for Raw {
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
        !ctx.preceding.is_empty()
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        if path == "data" {
            let bytes = ctx.read_rest(0);
            ctx.set_value(path, json!(bytes_to_hex(&bytes)));
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        if path == "data" {
            ctx.encode_hex(path, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::{Codec, EncodeInput};
    use serde_json::json;

    #[test]
    fn takes_the_rest_of_the_packet() {
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&[0xff, 0xff, 0xca, 0xfe, 0x01]);
        let chain = Codec::default().decode(&frame).unwrap();
        let raw = chain.find("raw").unwrap();
        assert_eq!(raw.span(), 14..17);
        assert_eq!(raw.value.to_value(), json!({"data": "cafe01"}));
    }

    #[test]
    fn bad_hex_is_reported() {
        let chain = Codec::default()
            .encode(&[EncodeInput::new("raw", json!({"data": "zz"}))])
            .unwrap();
        assert!(chain.packet().is_empty());
        assert_eq!(chain.errors()[0].message, "Invalid hex string");
    }

    #[test]
    fn missing_data_encodes_nothing() {
        let chain = Codec::default()
            .encode(&[EncodeInput::new("raw", json!({}))])
            .unwrap();
        assert!(chain.packet().is_empty());
        assert!(chain.errors().is_empty());
    }
}
