//! Minimal pcapng writer: one section, one Ethernet interface, and an
//! Enhanced Packet Block per frame. Timestamps are microseconds.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::error::PcapSourceError;
use super::layout;
use crate::source::CapturedFrame;

/// Write `frames` to `path` as a pcapng file, creating parent directories.
pub fn write_pcapng(path: &Path, frames: &[CapturedFrame]) -> Result<(), PcapSourceError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_pcapng(frames))?;
    debug!(path = %path.display(), frames = frames.len(), "wrote capture");
    Ok(())
}

/// The bytes [`write_pcapng`] would write.
pub fn encode_pcapng(frames: &[CapturedFrame]) -> Vec<u8> {
    let mut output = Vec::new();
    output.extend_from_slice(&block(layout::BLOCK_SECTION_HEADER, &section_header_body()));
    output.extend_from_slice(&block(
        layout::BLOCK_INTERFACE_DESCRIPTION,
        &interface_desc_body(),
    ));
    for frame in frames {
        output.extend_from_slice(&block(
            layout::BLOCK_ENHANCED_PACKET,
            &enhanced_packet_body(frame.timestamp_micros(), &frame.data),
        ));
    }
    output
}

fn block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&layout::BYTE_ORDER_MAGIC.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&layout::LINKTYPE_ETHERNET.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&layout::SNAPLEN.to_be_bytes());
    body
}

fn enhanced_packet_body(ts_us: u64, data: &[u8]) -> Vec<u8> {
    let ts_high = (ts_us >> 32) as u32;
    let ts_low = (ts_us & 0xFFFF_FFFF) as u32;
    let cap_len = data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&ts_high.to_be_bytes());
    body.extend_from_slice(&ts_low.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    body.resize(body.len() + (4 - data.len() % 4) % 4, 0);
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_aligned_and_framed() {
        let frames = [CapturedFrame::ethernet(vec![1, 2, 3], 1, 2)];
        let bytes = encode_pcapng(&frames);
        assert_eq!(&bytes[..4], layout::PCAPNG_MAGIC);
        assert_eq!(bytes.len() % 4, 0);

        let epb = &bytes[28 + 20..];
        assert_eq!(&epb[..4], 6u32.to_be_bytes());
        let total = u32::from_be_bytes([epb[4], epb[5], epb[6], epb[7]]) as usize;
        assert_eq!(total, epb.len());
        assert_eq!(&epb[total - 4..], (total as u32).to_be_bytes());
    }
}
