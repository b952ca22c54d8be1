//! PCAP/PCAPNG files.
//!
//! Reading goes through `pcap-parser`; writing produces a minimal pcapng
//! with a single Ethernet interface, enough to round-trip encoded frames.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod writer;

pub use parser::PcapFileSource;
