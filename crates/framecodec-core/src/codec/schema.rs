//! Declarative field descriptions.
//!
//! A schema node describes one field: its type, constraints, and whether the
//! owning protocol provides a decoder and an encoder for it. The executable
//! part lives in the protocol's `decode_field`/`encode_field` tables, keyed
//! by the field's dotted path, so schemas stay plain data and serialize to a
//! JSON-Schema-like shape for tooling.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Boolean,
    String,
    Array,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<&'static str>,
    pub decode: bool,
    pub encode: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<FieldSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,
}

impl FieldSchema {
    fn leaf(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            enumeration: Vec::new(),
            default: None,
            content_encoding: None,
            decode: true,
            encode: true,
            properties: Vec::new(),
            items: None,
        }
    }

    pub fn integer(name: &'static str, label: &'static str) -> Self {
        Self::leaf(name, label, FieldKind::Integer)
    }

    pub fn boolean(name: &'static str, label: &'static str) -> Self {
        Self::leaf(name, label, FieldKind::Boolean)
    }

    pub fn string(name: &'static str, label: &'static str) -> Self {
        Self::leaf(name, label, FieldKind::String)
    }

    /// Hex-encoded opaque bytes.
    pub fn hex(name: &'static str, label: &'static str) -> Self {
        let mut field = Self::leaf(name, label, FieldKind::String);
        field.content_encoding = Some("hex");
        field
    }

    pub fn array(name: &'static str, label: &'static str, items: FieldSchema) -> Self {
        let mut field = Self::leaf(name, label, FieldKind::Array);
        field.items = Some(Box::new(items));
        field
    }

    /// A composite field. It has no codec of its own unless one is added
    /// with [`FieldSchema::with_codec`].
    pub fn object(name: &'static str, label: &'static str, properties: Vec<FieldSchema>) -> Self {
        let mut field = Self::leaf(name, label, FieldKind::Object);
        field.decode = false;
        field.encode = false;
        field.properties = properties;
        field
    }

    pub fn range(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn max(mut self, maximum: i64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn length(mut self, min_length: usize, max_length: usize) -> Self {
        self.min_length = Some(min_length);
        self.max_length = Some(max_length);
        self
    }

    pub fn one_of(mut self, values: &[i64]) -> Self {
        self.enumeration = values.to_vec();
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_codec(mut self) -> Self {
        self.decode = true;
        self.encode = true;
        self
    }
}

/// Find a field by dotted path.
pub fn find_field<'a>(fields: &'a [FieldSchema], path: &str) -> Option<&'a FieldSchema> {
    let mut current = fields;
    let mut found = None;
    for segment in path.split('.') {
        let field = current.iter().find(|field| field.name == segment)?;
        current = &field.properties;
        found = Some(field);
    }
    found
}

/// Serializable view of one protocol's schema.
#[derive(Debug, Serialize)]
pub struct ProtocolSchema<'a> {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub properties: &'a [FieldSchema],
}

impl<'a> ProtocolSchema<'a> {
    pub fn new(id: &'static str, name: &'static str, properties: &'a [FieldSchema]) -> Self {
        Self {
            id,
            name,
            kind: FieldKind::Object,
            properties,
        }
    }
}
