//! IEEE 802.1Q tag (also accepted for 802.1ad service tags).

pub mod layout;

use serde_json::json;

use crate::codec::{FieldContext, FieldSchema, MatchContext, Protocol};
use crate::protocols::ethernet;

pub const ID: &str = "vlan";
pub const NAME: &str = "802.1Q Virtual LAN";

pub struct Vlan {
    schema: Vec<FieldSchema>,
}

impl Vlan {
    pub fn new() -> Self {
        Self {
            schema: vec![
                FieldSchema::integer("priority", "Priority")
                    .range(0, 7)
                    .default_value(json!(0)),
                FieldSchema::boolean("dei", "Drop Eligible Indicator").default_value(json!(false)),
                FieldSchema::integer("id", "VLAN Identifier").range(0, 4095),
                FieldSchema::integer("etherType", "Type").range(layout::MIN_ETHER_TYPE, 0xffff),
            ],
        }
    }
}

impl Default for Vlan {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for Vlan {
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
        matches!(
            ctx.prev_uint("etherType"),
            Some(ethernet::layout::ETHERTYPE_VLAN | ethernet::layout::ETHERTYPE_QINQ)
        )
    }

    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "priority" => {
                ctx.decode_bits(path, layout::PRIORITY);
            }
            "dei" => {
                ctx.decode_flag(path, layout::DEI);
            }
            "id" => {
                ctx.decode_bits(path, layout::ID);
            }
            "etherType" => {
                ctx.decode_uint(path, layout::ETHER_TYPE);
            }
            _ => {}
        }
    }

    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>) {
        match path {
            "priority" => {
                ctx.encode_bits(path, layout::PRIORITY);
            }
            "dei" => {
                ctx.encode_flag(path, layout::DEI);
            }
            "id" => {
                ctx.encode_bits(path, layout::ID);
            }
            "etherType" => {
                ctx.encode_uint(path, layout::ETHER_TYPE);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::{Codec, EncodeInput};
    use serde_json::json;

    fn tagged_frame() -> Vec<u8> {
        let mut frame = vec![0x02; 12];
        frame.extend_from_slice(&[0x81, 0x00, 0xb1, 0x23, 0x88, 0xb5, 0xde, 0xad]);
        frame
    }

    #[test]
    fn tag_control_bits_decode() {
        let chain = Codec::default().decode(&tagged_frame()).unwrap();
        let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
        assert_eq!(ids, ["eth", "vlan", "raw"]);
        let vlan = &chain.modules()[1];
        assert_eq!(vlan.span(), 14..18);
        assert_eq!(
            vlan.value.to_value(),
            json!({"priority": 5, "dei": true, "id": 0x123, "etherType": 0x88b5})
        );
    }

    #[test]
    fn out_of_range_id_clamps() {
        let chain = Codec::default()
            .encode(&[EncodeInput::new(
                "vlan",
                json!({"id": 5000, "etherType": "0800"}),
            )])
            .unwrap();
        assert_eq!(chain.packet(), [0x0f, 0xff, 0x08, 0x00]);
        let errors = chain.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "id");
        assert_eq!(errors[0].message, "Maximum value is 4095");
    }

    #[test]
    fn ether_type_below_minimum_clamps_up() {
        let chain = Codec::default()
            .encode(&[EncodeInput::new("vlan", json!({"id": 1, "etherType": 64}))])
            .unwrap();
        assert_eq!(&chain.packet()[2..], [0x06, 0x00]);
        assert_eq!(chain.errors()[0].message, "Minimum value is 1536");
    }
}
