//! Generic frame codec engine.
//!
//! Leaves first: `convert` and `bits` are pure helpers, `value` and
//! `schema` describe field data, `module` defines what a protocol layer
//! implements, `deferred` orders post-processing, and `chain` resolves a
//! whole packet against a `registry` of layers.

pub mod bits;
pub mod chain;
pub mod convert;
pub mod deferred;
pub mod error;
pub mod module;
pub mod registry;
pub mod schema;
pub mod value;

pub use chain::{Chain, Codec, DecodedModule, EncodeInput};
pub use deferred::{DeferredAction, DeferredQueue, Scope};
pub use error::{CodecError, FieldError};
pub use module::{FieldContext, MatchContext, Mode, ModuleRecord, Protocol};
pub use registry::{Registry, RegistryBuilder};
pub use schema::{FieldKind, FieldSchema, ProtocolSchema};
pub use value::{NodeRef, ValueNode};
