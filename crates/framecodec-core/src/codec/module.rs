//! Protocol module contract.
//!
//! A [`Protocol`] is a stateless description of one layer: a schema plus
//! per-field decode/encode handlers. The per-call state (the module's span,
//! its value tree and its errors) lives in a [`ModuleRecord`] held in the
//! chain's arena, and handlers reach it through a [`FieldContext`] scoped to
//! one module.
//!
//! Offsets given to `FieldContext` are relative to the module's start.
//! Reads never grow the buffer; writes grow it with zero fill. Either way
//! the module's length is the high-water mark of every offset touched.

use std::ops::Range;

use serde_json::{Value, json};

use super::bits::{self, BitField};
use super::convert;
use super::deferred::{DeferredAction, DeferredQueue, Scope};
use super::error::FieldError;
use super::schema::{FieldSchema, find_field};
use super::value::{NodeRef, ValueNode};

pub const NOT_FOUND: &str = "Not Found";
pub const UNEXPECTED_END: &str = "Unexpected end of packet";
pub const INVALID_VALUE: &str = "Invalid value";

pub trait Protocol: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn schema(&self) -> &[FieldSchema];

    /// Whether this protocol handles the bytes at `ctx.start`. Must not
    /// have side effects.
    fn matches(&self, ctx: &MatchContext<'_>) -> bool;

    /// Decode the field at `path` into the module's value tree.
    fn decode_field(&self, path: &str, ctx: &mut FieldContext<'_>);

    /// Encode the field at `path` from the module's value tree.
    fn encode_field(&self, path: &str, ctx: &mut FieldContext<'_>);

    /// Run an action this protocol registered with [`FieldContext::defer`].
    fn run_deferred(&self, _action: &DeferredAction, _ctx: &mut FieldContext<'_>) {}
}

/// One resolved module in a chain.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    protocol: usize,
    pub id: &'static str,
    pub name: &'static str,
    pub start_pos: usize,
    pub length: usize,
    pub value: ValueNode,
    pub errors: Vec<FieldError>,
}

impl ModuleRecord {
    pub fn new(protocol: usize, id: &'static str, name: &'static str, start_pos: usize) -> Self {
        Self {
            protocol,
            id,
            name,
            start_pos,
            length: 0,
            value: ValueNode::root(),
            errors: Vec::new(),
        }
    }

    /// Index of the protocol in the registry that produced this record.
    pub fn protocol_index(&self) -> usize {
        self.protocol
    }

    pub fn end_pos(&self) -> usize {
        self.start_pos + self.length
    }

    pub fn span(&self) -> Range<usize> {
        self.start_pos..self.end_pos()
    }

    /// Integer value at `path`, if present and numeric.
    pub fn uint(&self, path: &str) -> Option<u64> {
        self.value
            .at(path)
            .value()
            .and_then(|value| parse_integer(&value))
            .and_then(|value| u64::try_from(value).ok())
    }

    pub fn record_error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(self.id, path, message));
    }
}

/// What a protocol may look at when deciding whether it matches.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub buffer: &'a [u8],
    pub start: usize,
    pub preceding: &'a [ModuleRecord],
}

impl<'a> MatchContext<'a> {
    pub fn prev(&self) -> Option<&'a ModuleRecord> {
        self.preceding.last()
    }

    /// Integer field of the immediately preceding module.
    pub fn prev_uint(&self, path: &str) -> Option<u64> {
        self.prev().and_then(|module| module.uint(path))
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.buffer.get(self.start..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Decode,
    Encode,
}

/// Access to the shared buffer and the chain, scoped to one module.
pub struct FieldContext<'a> {
    mode: Mode,
    buffer: &'a mut Vec<u8>,
    modules: &'a mut [ModuleRecord],
    index: usize,
    schema: &'a [FieldSchema],
    queue: &'a mut DeferredQueue,
    field: String,
}

impl<'a> FieldContext<'a> {
    pub(crate) fn new(
        mode: Mode,
        buffer: &'a mut Vec<u8>,
        modules: &'a mut [ModuleRecord],
        index: usize,
        schema: &'a [FieldSchema],
        queue: &'a mut DeferredQueue,
    ) -> Self {
        Self {
            mode,
            buffer,
            modules,
            index,
            schema,
            queue,
            field: String::new(),
        }
    }

    /// Mark `path` as the field being processed; truncation errors are
    /// reported against it.
    pub(crate) fn enter(&mut self, path: &str) {
        self.field.clear();
        self.field.push_str(path);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &ModuleRecord {
        &self.modules[self.index]
    }

    fn current_mut(&mut self) -> &mut ModuleRecord {
        &mut self.modules[self.index]
    }

    pub fn preceding(&self) -> &[ModuleRecord] {
        &self.modules[..self.index]
    }

    pub fn prev(&self) -> Option<&ModuleRecord> {
        self.preceding().last()
    }

    /// End of the last module in the chain so far.
    pub fn chain_end(&self) -> usize {
        self.modules
            .last()
            .map(ModuleRecord::end_pos)
            .unwrap_or(self.buffer.len())
    }

    /// The whole packet buffer, absolute offsets.
    pub fn buffer(&self) -> &[u8] {
        self.buffer
    }

    pub fn field_schema(&self, path: &str) -> Option<&'a FieldSchema> {
        find_field(self.schema, path)
    }

    pub fn value<'s>(&'s self, path: &'s str) -> NodeRef<'s> {
        self.current().value.at(path)
    }

    pub fn set_value(&mut self, path: &str, value: Value) {
        self.current_mut().value.set_at(path, value);
    }

    pub fn record_error(&mut self, path: &str, message: impl Into<String>) {
        self.current_mut().record_error(path, message);
    }

    /// Queue `target` for later; see [`Scope`] for when it runs.
    pub fn defer(&mut self, scope: Scope, priority: i32, target: &str) {
        self.queue.push(scope, priority, self.index, target);
    }

    pub(crate) fn next_local(&mut self, scope: Scope) -> Option<DeferredAction> {
        self.queue.pop_next(scope, self.index)
    }

    fn window(&self, offset: usize, length: usize) -> Vec<u8> {
        let start = self.current().start_pos + offset;
        let mut out = vec![0u8; length];
        if start < self.buffer.len() {
            let stop = (start + length).min(self.buffer.len());
            out[..stop - start].copy_from_slice(&self.buffer[start..stop]);
        }
        out
    }

    fn touch(&mut self, relative_end: usize) {
        let start = self.current().start_pos;
        let limit = self.buffer.len().saturating_sub(start);
        let module = self.current_mut();
        module.length = module.length.max(relative_end.min(limit));
    }

    /// Read `length` bytes at `offset`. Bytes past the end of the buffer
    /// read as zero and, while decoding, are reported once per field.
    pub fn read_bytes(&mut self, offset: usize, length: usize) -> Vec<u8> {
        let out = self.window(offset, length);
        let end = self.current().start_pos + offset + length;
        if length > 0 && end > self.buffer.len() && self.mode == Mode::Decode {
            self.record_truncation();
        }
        self.touch(offset + length);
        out
    }

    /// Bytes from `offset` to the end of the buffer.
    pub fn read_rest(&mut self, offset: usize) -> Vec<u8> {
        let start = self.current().start_pos + offset;
        let length = self.buffer.len().saturating_sub(start);
        self.read_bytes(offset, length)
    }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) {
        let start = self.current().start_pos + offset;
        let end = start + bytes.len();
        if self.buffer.len() < end {
            self.buffer.resize(end, 0);
        }
        self.buffer[start..end].copy_from_slice(bytes);
        self.touch(offset + bytes.len());
    }

    pub fn read_bits(&mut self, field: BitField) -> u64 {
        let bytes = self.read_bytes(field.offset, field.length);
        bits::extract_bits(&bytes, field.bit_offset, field.bit_length)
    }

    /// Read-modify-write of the field's byte window.
    pub fn write_bits(&mut self, field: BitField, value: u64) {
        let mut bytes = self.window(field.offset, field.length);
        bits::insert_bits(&mut bytes, field.bit_offset, field.bit_length, value);
        self.write_bytes(field.offset, &bytes);
    }

    pub fn write_uint(&mut self, range: Range<usize>, value: u64) {
        let width = range.len();
        self.write_bytes(range.start, &convert::uint_to_bytes(value, width));
    }

    fn record_truncation(&mut self) {
        let path = self.field.clone();
        let module = self.current_mut();
        let seen = module
            .errors
            .iter()
            .any(|err| err.path == path && err.message == UNEXPECTED_END);
        if !seen {
            module.record_error(&path, UNEXPECTED_END);
        }
    }

    pub fn decode_uint(&mut self, path: &str, range: Range<usize>) -> u64 {
        let bytes = self.read_bytes(range.start, range.len());
        let value = convert::bytes_to_uint(&bytes);
        self.set_value(path, json!(value));
        value
    }

    pub fn decode_bits(&mut self, path: &str, field: BitField) -> u64 {
        let value = self.read_bits(field);
        self.set_value(path, json!(value));
        value
    }

    pub fn decode_flag(&mut self, path: &str, field: BitField) -> bool {
        let value = self.read_bits(field) != 0;
        self.set_value(path, json!(value));
        value
    }

    pub fn decode_mac(&mut self, path: &str, range: Range<usize>) {
        self.decode_text(path, range, convert::bytes_to_mac);
    }

    pub fn decode_ipv4(&mut self, path: &str, range: Range<usize>) {
        self.decode_text(path, range, convert::bytes_to_ipv4);
    }

    pub fn decode_ipv6(&mut self, path: &str, range: Range<usize>) {
        self.decode_text(path, range, convert::bytes_to_ipv6);
    }

    pub fn decode_hex(&mut self, path: &str, range: Range<usize>) -> Vec<u8> {
        let bytes = self.read_bytes(range.start, range.len());
        self.set_value(path, json!(convert::bytes_to_hex(&bytes)));
        bytes
    }

    fn decode_text(&mut self, path: &str, range: Range<usize>, format: fn(&[u8]) -> String) {
        let bytes = self.read_bytes(range.start, range.len());
        self.set_value(path, json!(format(&bytes)));
    }

    /// The value supplied for `path`, falling back to the schema default.
    /// Records `Not Found` when neither exists.
    pub fn input(&mut self, path: &str) -> Option<Value> {
        let fallback = self.field_schema(path).and_then(|field| field.default.clone());
        let mut missing = None;
        let provided: Option<Value> = self
            .value(path)
            .get_or(fallback, |at| missing = Some(at.to_string()));
        if let (None, Some(at)) = (&provided, missing) {
            self.record_error(&at, NOT_FOUND);
        }
        provided
    }

    /// Integer input for `path`, clamped to the schema range and to
    /// `width_max`. The normalized value is written back to the tree.
    pub fn input_uint(&mut self, path: &str, width_max: u64) -> u64 {
        let Some(provided) = self.input(path) else {
            return 0;
        };
        let Some(mut value) = parse_integer(&provided) else {
            self.record_error(path, INVALID_VALUE);
            return 0;
        };

        let field = self.field_schema(path);
        let minimum = field
            .and_then(|field| field.minimum)
            .map(i128::from)
            .unwrap_or(0)
            .max(0);
        let maximum = field
            .and_then(|field| field.maximum)
            .map(i128::from)
            .unwrap_or(i128::from(width_max))
            .min(i128::from(width_max));
        if value > maximum {
            self.record_error(path, format!("Maximum value is {maximum}"));
            value = maximum;
        } else if value < minimum {
            self.record_error(path, format!("Minimum value is {minimum}"));
            value = minimum;
        }

        let value = u64::try_from(value).unwrap_or(0);
        self.set_value(path, json!(value));
        value
    }

    pub fn input_flag(&mut self, path: &str) -> bool {
        match self.input(path) {
            None => false,
            Some(Value::Bool(flag)) => flag,
            Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
            Some(_) => {
                self.record_error(path, INVALID_VALUE);
                false
            }
        }
    }

    pub fn input_text(&mut self, path: &str) -> Option<String> {
        match self.input(path)? {
            Value::String(text) => Some(text),
            _ => {
                self.record_error(path, INVALID_VALUE);
                None
            }
        }
    }

    pub fn encode_uint(&mut self, path: &str, range: Range<usize>) -> u64 {
        let width = range.len().min(8);
        let width_max = if width == 8 {
            u64::MAX
        } else {
            (1u64 << (width * 8)) - 1
        };
        let value = self.input_uint(path, width_max);
        self.write_uint(range, value);
        value
    }

    pub fn encode_bits(&mut self, path: &str, field: BitField) -> u64 {
        let value = self.input_uint(path, field.max_value());
        self.write_bits(field, value);
        value
    }

    pub fn encode_flag(&mut self, path: &str, field: BitField) -> bool {
        let flag = self.input_flag(path);
        self.write_bits(field, u64::from(flag));
        flag
    }

    pub fn encode_mac(&mut self, path: &str, range: Range<usize>) {
        self.encode_text(path, range, "Invalid MAC address", |text| {
            convert::mac_to_bytes(text).map(|bytes| bytes.to_vec())
        });
    }

    pub fn encode_ipv4(&mut self, path: &str, range: Range<usize>) {
        self.encode_text(path, range, "Invalid IPv4 address", |text| {
            convert::ipv4_to_bytes(text).map(|bytes| bytes.to_vec())
        });
    }

    pub fn encode_ipv6(&mut self, path: &str, range: Range<usize>) {
        self.encode_text(path, range, "Invalid IPv6 address", |text| {
            convert::ipv6_to_bytes(text).map(|bytes| bytes.to_vec())
        });
    }

    fn encode_text<F>(&mut self, path: &str, range: Range<usize>, invalid: &str, parse: F)
    where
        F: Fn(&str) -> Option<Vec<u8>>,
    {
        let mut bytes = vec![0u8; range.len()];
        if let Some(text) = self.input_text(path) {
            match parse(&text) {
                Some(parsed) if parsed.len() == bytes.len() => bytes = parsed,
                _ => self.record_error(path, invalid),
            }
        }
        self.write_bytes(range.start, &bytes);
    }

    /// Hex input for `path`, checked against the schema length bounds
    /// (in bytes). Missing input yields no bytes.
    pub fn input_hex(&mut self, path: &str) -> Vec<u8> {
        let Some(text) = self.input_text(path) else {
            return Vec::new();
        };
        let Some(mut bytes) = convert::hex_to_bytes(&text) else {
            self.record_error(path, "Invalid hex string");
            return Vec::new();
        };
        let field = self.field_schema(path);
        if let Some(max) = field.and_then(|field| field.max_length) {
            if bytes.len() > max {
                self.record_error(path, format!("Maximum length is {max}"));
                bytes.truncate(max);
            }
        }
        if let Some(min) = field.and_then(|field| field.min_length) {
            if bytes.len() < min {
                self.record_error(path, format!("Minimum length is {min}"));
                bytes.resize(min, 0);
            }
        }
        bytes
    }

    /// Write hex input for `path` at `offset`; returns the byte count.
    pub fn encode_hex(&mut self, path: &str, offset: usize) -> usize {
        let bytes = self.input_hex(path);
        self.write_bytes(offset, &bytes);
        bytes.len()
    }

    /// Record an error if the integer at `path` is outside the field's
    /// enumeration. Undefined values are left alone.
    pub(crate) fn validate_enum(&mut self, field: &FieldSchema, path: &str) {
        if field.enumeration.is_empty() {
            return;
        }
        let Some(value) = self.value(path).value().and_then(|value| parse_integer(&value)) else {
            return;
        };
        if !field.enumeration.iter().any(|allowed| i128::from(*allowed) == value) {
            let message = format!("{} should be {}", field.label, list_choices(&field.enumeration));
            self.record_error(path, message);
        }
    }
}

/// Integers arrive as JSON numbers, booleans, or hex strings.
pub fn parse_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(i128::from)
            .or_else(|| number.as_i64().map(i128::from))
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0)
                    .map(|float| float as i128)
            }),
        Value::Bool(flag) => Some(i128::from(*flag)),
        Value::String(text) => convert::hex_to_uint(text).map(i128::from),
        _ => None,
    }
}

fn list_choices(values: &[i64]) -> String {
    match values {
        [] => String::new(),
        [only] => only.to_string(),
        [head @ .., last] => {
            let head: Vec<String> = head.iter().map(i64::to_string).collect();
            format!("{} or {}", head.join(", "), last)
        }
    }
}
