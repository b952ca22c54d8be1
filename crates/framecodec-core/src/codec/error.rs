use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that abort a whole decode/encode pass.
///
/// Per-field problems are never reported through this type; they are
/// collected as [`FieldError`] values on the module that hit them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("no module matches the bytes at offset {offset}")]
    NoMatchingModule { offset: usize },
    #[error("unknown protocol id: {id}")]
    UnknownProtocol { id: String },
    #[error("module {module} has no encoder for field {path}")]
    MissingEncoder { module: String, path: String },
    #[error("module index {index} out of range (chain has {len} modules)")]
    ModuleIndex { index: usize, len: usize },
}

/// A non-fatal problem with one field of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub id: String,
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(id: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: {}", self.id, self.path, self.message)
    }
}
