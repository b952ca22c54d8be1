//! Chain resolver.
//!
//! Decode walks the buffer, asking each registered candidate in turn whether
//! it matches at the cursor, and advances by the span of the module that
//! did. Encode runs the requested modules in order over a growing buffer,
//! then drains the packet-scope actions they queued.
//!
//! Within one module, decode visits a field before its nested properties
//! and encode visits them after, so a parent can rely on its children
//! already being written.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::deferred::{DeferredQueue, Scope};
use super::error::{CodecError, FieldError};
use super::module::{FieldContext, MatchContext, Mode, ModuleRecord, Protocol};
use super::registry::Registry;
use super::schema::{FieldSchema, find_field};
use super::value::ValueNode;

/// Result of a decode or encode pass: the packet bytes and the modules
/// that cover them.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    buffer: Vec<u8>,
    modules: Vec<ModuleRecord>,
}

impl Chain {
    pub fn packet(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_packet(self) -> Vec<u8> {
        self.buffer
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// First module with `id`.
    pub fn find(&self, id: &str) -> Option<&ModuleRecord> {
        self.modules.iter().find(|module| module.id == id)
    }

    /// Field errors of every module, in chain order.
    pub fn errors(&self) -> Vec<FieldError> {
        self.modules
            .iter()
            .flat_map(|module| module.errors.iter().cloned())
            .collect()
    }

    pub fn layers(&self) -> Vec<DecodedModule> {
        self.modules.iter().map(DecodedModule::from).collect()
    }

    /// Encode inputs that reproduce this chain.
    pub fn to_inputs(&self) -> Vec<EncodeInput> {
        self.modules
            .iter()
            .map(|module| EncodeInput::new(module.id, module.value.to_value()))
            .collect()
    }
}

/// Serializable summary of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedModule {
    pub id: String,
    pub name: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub data: Value,
    pub errors: Vec<FieldError>,
}

impl From<&ModuleRecord> for DecodedModule {
    fn from(module: &ModuleRecord) -> Self {
        Self {
            id: module.id.to_string(),
            name: module.name.to_string(),
            start_pos: module.start_pos,
            end_pos: module.end_pos(),
            data: module.value.to_value(),
            errors: module.errors.clone(),
        }
    }
}

/// One layer to encode: a protocol id and its value tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeInput {
    pub id: String,
    #[serde(default)]
    pub data: Value,
}

impl EncodeInput {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

#[derive(Default)]
pub struct Codec {
    registry: Registry,
}

impl Codec {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Chain, CodecError> {
        self.decode_from(bytes, 0)
    }

    /// Decode starting at `offset`; the resolved modules cover
    /// `[offset, bytes.len())` without gaps.
    pub fn decode_from(&self, bytes: &[u8], offset: usize) -> Result<Chain, CodecError> {
        let mut buffer = bytes.to_vec();
        let mut modules: Vec<ModuleRecord> = Vec::new();
        let mut pos = offset;

        while pos < buffer.len() {
            let candidate = self.select(&buffer, pos, &modules)?;
            let mut length = self.decode_module(&mut buffer, &mut modules, candidate, pos);

            if length == 0 {
                modules.pop();
                match self.registry.catch_all() {
                    Some(catch_all) if catch_all != candidate => {
                        let id = self.protocol(candidate)?.id();
                        warn!(module = id, offset = pos, "module consumed no bytes, using catch-all");
                        length = self.decode_module(&mut buffer, &mut modules, catch_all, pos);
                    }
                    _ => return Err(CodecError::NoMatchingModule { offset: pos }),
                }
                if length == 0 {
                    modules.pop();
                    return Err(CodecError::NoMatchingModule { offset: pos });
                }
            }
            pos += length;
        }

        Ok(Chain { buffer, modules })
    }

    fn select(
        &self,
        buffer: &[u8],
        start: usize,
        preceding: &[ModuleRecord],
    ) -> Result<usize, CodecError> {
        let ctx = MatchContext {
            buffer,
            start,
            preceding,
        };
        self.registry
            .iter()
            .position(|protocol| protocol.matches(&ctx))
            .ok_or(CodecError::NoMatchingModule { offset: start })
    }

    fn protocol(&self, index: usize) -> Result<&dyn Protocol, CodecError> {
        self.registry.get(index).ok_or(CodecError::ModuleIndex {
            index,
            len: self.registry.len(),
        })
    }

    /// Append a record for `candidate` at `start`, decode it and return its
    /// length.
    fn decode_module(
        &self,
        buffer: &mut Vec<u8>,
        modules: &mut Vec<ModuleRecord>,
        candidate: usize,
        start: usize,
    ) -> usize {
        let Some(protocol) = self.registry.get(candidate) else {
            return 0;
        };
        modules.push(ModuleRecord::new(candidate, protocol.id(), protocol.name(), start));
        let index = modules.len() - 1;

        let mut queue = DeferredQueue::new();
        let mut ctx = FieldContext::new(
            Mode::Decode,
            buffer,
            modules,
            index,
            protocol.schema(),
            &mut queue,
        );
        decode_fields(protocol, protocol.schema(), "", &mut ctx);
        drain_local(protocol, Scope::AfterDecode, &mut ctx);

        let module = ctx.current();
        debug!(
            module = module.id,
            start = module.start_pos,
            end = module.end_pos(),
            errors = module.errors.len(),
            "decoded module"
        );
        module.length
    }

    /// Encode `inputs` in order. An unknown protocol id fails the pass.
    pub fn encode(&self, inputs: &[EncodeInput]) -> Result<Chain, CodecError> {
        let mut buffer = Vec::new();
        let mut modules: Vec<ModuleRecord> = Vec::new();
        let mut queue = DeferredQueue::new();

        for input in inputs {
            let candidate =
                self.registry
                    .position(&input.id)
                    .ok_or_else(|| CodecError::UnknownProtocol {
                        id: input.id.clone(),
                    })?;
            let protocol = self.protocol(candidate)?;
            let start = modules.last().map(ModuleRecord::end_pos).unwrap_or(0);
            let mut record = ModuleRecord::new(candidate, protocol.id(), protocol.name(), start);
            record.value = ValueNode::from_value(input.data.clone());
            modules.push(record);
            let index = modules.len() - 1;

            let mut ctx = FieldContext::new(
                Mode::Encode,
                &mut buffer,
                &mut modules,
                index,
                protocol.schema(),
                &mut queue,
            );
            encode_fields(protocol, protocol.schema(), "", &mut ctx);
            drain_local(protocol, Scope::AfterEncode, &mut ctx);
            drain_local(protocol, Scope::SelfEncode, &mut ctx);

            let module = ctx.current();
            debug!(
                module = module.id,
                start = module.start_pos,
                end = module.end_pos(),
                "encoded module"
            );
        }

        self.run_packet_actions(&mut buffer, &mut modules, &mut queue)?;
        Ok(Chain { buffer, modules })
    }

    /// Set `path` on module `index` and re-run only that field's encoder.
    ///
    /// Actions the encoder queues run before this returns. A path without
    /// an encoder is ignored unless `throw_if_missing` is set.
    pub fn recode_field(
        &self,
        chain: &mut Chain,
        index: usize,
        path: &str,
        value: Value,
        throw_if_missing: bool,
    ) -> Result<(), CodecError> {
        let record = chain.modules.get(index).ok_or(CodecError::ModuleIndex {
            index,
            len: chain.modules.len(),
        })?;
        let protocol = self.protocol(record.protocol_index())?;
        let Some(field) = find_field(protocol.schema(), path).filter(|field| field.encode) else {
            if throw_if_missing {
                return Err(CodecError::MissingEncoder {
                    module: record.id.to_string(),
                    path: path.to_string(),
                });
            }
            return Ok(());
        };

        chain.modules[index].value.set_at(path, value);
        let mut queue = DeferredQueue::new();
        {
            let mut ctx = FieldContext::new(
                Mode::Encode,
                &mut chain.buffer,
                &mut chain.modules,
                index,
                protocol.schema(),
                &mut queue,
            );
            ctx.enter(path);
            protocol.encode_field(path, &mut ctx);
            ctx.validate_enum(field, path);
            drain_local(protocol, Scope::AfterEncode, &mut ctx);
            drain_local(protocol, Scope::SelfEncode, &mut ctx);
        }
        debug!(module = protocol.id(), path, "recoded field");
        self.run_packet_actions(&mut chain.buffer, &mut chain.modules, &mut queue)
    }

    fn run_packet_actions(
        &self,
        buffer: &mut Vec<u8>,
        modules: &mut [ModuleRecord],
        queue: &mut DeferredQueue,
    ) -> Result<(), CodecError> {
        while let Some(action) = queue.pop_next(Scope::Packet, 0) {
            let len = modules.len();
            let record = modules.get(action.module).ok_or(CodecError::ModuleIndex {
                index: action.module,
                len,
            })?;
            let protocol = self.protocol(record.protocol_index())?;
            trace!(
                module = protocol.id(),
                action = %action.target,
                priority = action.priority,
                "packet action"
            );
            let mut ctx = FieldContext::new(
                Mode::Encode,
                buffer,
                modules,
                action.module,
                protocol.schema(),
                queue,
            );
            ctx.enter(&action.target);
            protocol.run_deferred(&action, &mut ctx);
        }
        Ok(())
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn decode_fields(
    protocol: &dyn Protocol,
    fields: &[FieldSchema],
    prefix: &str,
    ctx: &mut FieldContext<'_>,
) {
    for field in fields {
        let path = join_path(prefix, field.name);
        if field.decode {
            ctx.enter(&path);
            protocol.decode_field(&path, ctx);
            ctx.validate_enum(field, &path);
            trace!(module = protocol.id(), path = %path, "decoded field");
        }
        decode_fields(protocol, &field.properties, &path, ctx);
    }
}

fn encode_fields(
    protocol: &dyn Protocol,
    fields: &[FieldSchema],
    prefix: &str,
    ctx: &mut FieldContext<'_>,
) {
    for field in fields {
        let path = join_path(prefix, field.name);
        encode_fields(protocol, &field.properties, &path, ctx);
        if field.encode {
            ctx.enter(&path);
            protocol.encode_field(&path, ctx);
            ctx.validate_enum(field, &path);
            trace!(module = protocol.id(), path = %path, "encoded field");
        }
    }
}

fn drain_local(protocol: &dyn Protocol, scope: Scope, ctx: &mut FieldContext<'_>) {
    while let Some(action) = ctx.next_local(scope) {
        trace!(module = protocol.id(), action = %action.target, ?scope, "module action");
        ctx.enter(&action.target);
        protocol.run_deferred(&action, ctx);
    }
}
