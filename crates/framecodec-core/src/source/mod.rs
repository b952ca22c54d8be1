//! Capture-source boundary.
//!
//! A [`FrameSource`] yields captured frames one at a time; the codec never
//! sees files. Only the pcap/pcapng reader lives here today.

pub mod pcap;

pub use pcap::PcapFileSource;
pub use pcap::writer::write_pcapng;

use pcap_parser::Linktype;
use thiserror::Error;

/// One captured frame and when it was seen.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub data: Vec<u8>,
    pub seconds: u32,
    pub microseconds: u32,
    /// Zero-based position in the capture.
    pub index: u64,
    pub linktype: Linktype,
}

impl CapturedFrame {
    /// An Ethernet frame with the given timestamp.
    pub fn ethernet(data: Vec<u8>, seconds: u32, microseconds: u32) -> Self {
        Self {
            data,
            seconds,
            microseconds,
            index: 0,
            linktype: Linktype::ETHERNET,
        }
    }

    /// Timestamp in microseconds since the Unix epoch.
    pub fn timestamp_micros(&self) -> u64 {
        u64::from(self.seconds) * 1_000_000 + u64::from(self.microseconds)
    }
}

pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SourceError> {
        (**self).next_frame()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error: {0}")]
    Pcap(String),
}

impl From<pcap::error::PcapSourceError> for SourceError {
    fn from(value: pcap::error::PcapSourceError) -> Self {
        match value {
            pcap::error::PcapSourceError::Io(err) => SourceError::Io(err),
            pcap::error::PcapSourceError::Pcap { context, message } => {
                SourceError::Pcap(format!("{context}: {message}"))
            }
        }
    }
}
