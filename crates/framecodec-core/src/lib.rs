//! Framecodec core library: schema-driven packet codec.
//!
//! A packet is a chain of protocol modules laid over one byte buffer. The
//! `codec` layer owns the generic machinery (bit/number helpers, value
//! trees, field schemas, the deferred-action queue and the chain resolver);
//! `protocols` holds the reference layers registered by default; `source`
//! and `dissect` connect the codec to capture files.
//!
//! Invariants:
//! - Decoded modules cover the buffer from the start offset to the end
//!   without gaps or overlaps.
//! - Field problems never abort a pass; they are collected per module.
//! - Lengths are final before any checksum that covers them.
//!
//! # Examples
//! ```
//! use framecodec_core::{Codec, EncodeInput};
//! use serde_json::json;
//!
//! let codec = Codec::default();
//! let chain = codec.encode(&[
//!     EncodeInput::new("eth", json!({
//!         "dmac": "ff:ff:ff:ff:ff:ff",
//!         "smac": "02:00:00:00:00:01",
//!         "etherType": "0x0806",
//!     })),
//!     EncodeInput::new("arp", json!({
//!         "opcode": 1,
//!         "sender": {"mac": "02:00:00:00:00:01", "ipv4": "10.0.0.1"},
//!         "target": {"mac": "00:00:00:00:00:00", "ipv4": "10.0.0.2"},
//!     })),
//! ])?;
//! assert_eq!(chain.packet().len(), 42);
//!
//! let decoded = codec.decode(chain.packet())?;
//! assert_eq!(decoded.find("arp").and_then(|arp| arp.uint("opcode")), Some(1));
//! # Ok::<(), framecodec_core::CodecError>(())
//! ```

pub mod codec;
pub mod dissect;
pub mod protocols;
pub mod source;

pub use codec::{
    Chain, Codec, CodecError, DecodedModule, EncodeInput, FieldError, ModuleRecord, Protocol,
    Registry, RegistryBuilder,
};
pub use dissect::{
    CaptureSummary, DissectError, DissectedFrame, Dissection, dissect_frame, dissect_pcap_file,
    dissect_source,
};
pub use source::{CapturedFrame, FrameSource, PcapFileSource, SourceError, write_pcapng};
