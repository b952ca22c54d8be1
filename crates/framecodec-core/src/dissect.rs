//! Capture dissection: run the codec over every frame of a source.

use std::path::Path;

use pcap_parser::Linktype;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, warn};

use crate::codec::{Codec, CodecError, DecodedModule};
use crate::source::{CapturedFrame, FrameSource, PcapFileSource, SourceError};

/// Used when a frame's timestamp cannot be represented.
pub const DEFAULT_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

#[derive(Debug, Error)]
pub enum DissectError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("frame {index}: {source}")]
    Codec {
        index: u64,
        #[source]
        source: CodecError,
    },
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DissectedFrame {
    pub index: u64,
    /// RFC3339 capture time.
    pub timestamp: String,
    pub seconds: u32,
    pub microseconds: u32,
    pub length: usize,
    pub layers: Vec<DecodedModule>,
}

/// Totals over a whole capture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub frames_total: u64,
    /// Frames skipped for an unsupported link type.
    pub frames_skipped: u64,
    /// Field errors across every decoded frame.
    pub field_errors: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dissection {
    pub summary: CaptureSummary,
    pub frames: Vec<DissectedFrame>,
}

pub fn dissect_pcap_file(path: &Path) -> Result<Dissection, DissectError> {
    let source = PcapFileSource::open(path)?;
    dissect_source(&Codec::default(), source)
}

/// Decode every Ethernet frame of `source` with `codec`.
pub fn dissect_source<S: FrameSource>(
    codec: &Codec,
    mut source: S,
) -> Result<Dissection, DissectError> {
    let mut dissection = Dissection::default();
    let mut first_ts: Option<u64> = None;
    let mut last_ts: Option<u64> = None;

    while let Some(frame) = source.next_frame()? {
        dissection.summary.frames_total += 1;
        if frame.linktype != Linktype::ETHERNET {
            warn!(
                index = frame.index,
                linktype = frame.linktype.0,
                "skipping frame with unsupported link type"
            );
            dissection.summary.frames_skipped += 1;
            continue;
        }

        let ts = frame.timestamp_micros();
        first_ts = Some(first_ts.map_or(ts, |first| first.min(ts)));
        last_ts = Some(last_ts.map_or(ts, |last| last.max(ts)));

        let decoded = dissect_frame(codec, &frame)?;
        dissection.summary.field_errors += decoded
            .layers
            .iter()
            .map(|layer| layer.errors.len() as u64)
            .sum::<u64>();
        dissection.frames.push(decoded);
    }

    dissection.summary.time_start = first_ts.and_then(micros_to_rfc3339);
    dissection.summary.time_end = last_ts.and_then(micros_to_rfc3339);
    debug!(
        frames = dissection.summary.frames_total,
        skipped = dissection.summary.frames_skipped,
        "dissected capture"
    );
    Ok(dissection)
}

/// Decode a single frame regardless of its link type.
pub fn dissect_frame(codec: &Codec, frame: &CapturedFrame) -> Result<DissectedFrame, DissectError> {
    let chain = codec
        .decode(&frame.data)
        .map_err(|source| DissectError::Codec {
            index: frame.index,
            source,
        })?;
    Ok(DissectedFrame {
        index: frame.index,
        timestamp: micros_to_rfc3339(frame.timestamp_micros())
            .unwrap_or_else(|| DEFAULT_TIMESTAMP.to_string()),
        seconds: frame.seconds,
        microseconds: frame.microseconds,
        length: frame.data.len(),
        layers: chain.layers(),
    })
}

fn micros_to_rfc3339(micros: u64) -> Option<String> {
    let nanos = i128::from(micros) * 1_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
