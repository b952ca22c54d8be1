use thiserror::Error;

use crate::codec::convert::internet_checksum;
use crate::codec::{FieldContext, ModuleRecord};
use crate::protocols::{ipv4, ipv6};

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum PseudoHeaderError {
    #[error("No IP layer to build a pseudo-header from")]
    NoIpLayer,
    #[error("IP addresses lie outside the packet")]
    Truncated,
    #[error("Segment too long for pseudo-header")]
    SegmentTooLong,
}

/// Pseudo-header for a transport segment of `segment_len` bytes, built from
/// the final bytes of the nearest preceding IP module.
pub(crate) fn pseudo_header(
    buffer: &[u8],
    preceding: &[ModuleRecord],
    protocol: u8,
    segment_len: usize,
) -> Result<Vec<u8>, PseudoHeaderError> {
    let ip = preceding
        .iter()
        .rev()
        .find(|module| module.id == ipv4::ID || module.id == ipv6::ID)
        .ok_or(PseudoHeaderError::NoIpLayer)?;
    let at = |range: std::ops::Range<usize>| {
        buffer
            .get(ip.start_pos + range.start..ip.start_pos + range.end)
            .ok_or(PseudoHeaderError::Truncated)
    };

    let mut out = Vec::with_capacity(40);
    if ip.id == ipv4::ID {
        let length =
            u16::try_from(segment_len).map_err(|_| PseudoHeaderError::SegmentTooLong)?;
        out.extend_from_slice(at(ipv4::layout::SIP)?);
        out.extend_from_slice(at(ipv4::layout::DIP)?);
        out.push(0);
        out.push(protocol);
        out.extend_from_slice(&length.to_be_bytes());
    } else {
        let length =
            u32::try_from(segment_len).map_err(|_| PseudoHeaderError::SegmentTooLong)?;
        out.extend_from_slice(at(ipv6::layout::SIP)?);
        out.extend_from_slice(at(ipv6::layout::DIP)?);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&[0, 0, 0, protocol]);
    }
    Ok(out)
}

/// Checksum over the pseudo-header and everything from the current module
/// to the end of the chain.
pub(crate) fn transport_checksum(
    ctx: &FieldContext<'_>,
    protocol: u8,
) -> Result<u16, PseudoHeaderError> {
    let start = ctx.current().start_pos;
    let segment = ctx.buffer().get(start..ctx.chain_end()).unwrap_or_default();
    let pseudo = pseudo_header(ctx.buffer(), ctx.preceding(), protocol, segment.len())?;
    Ok(internet_checksum(&[&pseudo, segment]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip_record(id: &'static str, start: usize, length: usize) -> ModuleRecord {
        let mut record = ModuleRecord::new(0, id, id, start);
        record.length = length;
        record
    }

    #[test]
    fn ipv4_pseudo_header_layout() {
        let mut buffer = vec![0u8; 20];
        buffer[12..16].copy_from_slice(&[10, 0, 0, 1]);
        buffer[16..20].copy_from_slice(&[10, 0, 0, 2]);
        let preceding = [ip_record(ipv4::ID, 0, 20)];
        let header = pseudo_header(&buffer, &preceding, 6, 20).unwrap();
        assert_eq!(header, [10, 0, 0, 1, 10, 0, 0, 2, 0, 6, 0, 20]);
    }

    #[test]
    fn ipv6_pseudo_header_layout() {
        let mut buffer = vec![0u8; 40];
        buffer[23] = 1;
        buffer[39] = 2;
        let preceding = [ip_record(ipv6::ID, 0, 40)];
        let header = pseudo_header(&buffer, &preceding, 17, 8).unwrap();
        assert_eq!(header.len(), 40);
        assert_eq!(header[15], 1);
        assert_eq!(header[31], 2);
        assert_eq!(&header[32..], [0, 0, 0, 8, 0, 0, 0, 17]);
    }

    #[test]
    fn nearest_ip_layer_wins() {
        let mut buffer = vec![0u8; 60];
        buffer[20 + 12..20 + 16].copy_from_slice(&[192, 168, 0, 1]);
        let preceding = [ip_record(ipv4::ID, 0, 20), ip_record(ipv4::ID, 20, 20)];
        let header = pseudo_header(&buffer, &preceding, 6, 0).unwrap();
        assert_eq!(&header[..4], [192, 168, 0, 1]);
    }

    #[test]
    fn no_ip_layer() {
        let preceding = [ip_record("eth", 0, 14)];
        assert_eq!(
            pseudo_header(&[0u8; 14], &preceding, 6, 0),
            Err(PseudoHeaderError::NoIpLayer)
        );
    }

    #[test]
    fn oversized_segment_is_not_a_missing_ip_layer() {
        let preceding = [ip_record(ipv4::ID, 0, 20)];
        let err = pseudo_header(&[0u8; 20], &preceding, 6, 70_000).unwrap_err();
        assert_eq!(err, PseudoHeaderError::SegmentTooLong);
        assert_eq!(err.to_string(), "Segment too long for pseudo-header");

        let preceding = [ip_record(ipv6::ID, 0, 40)];
        assert!(pseudo_header(&[0u8; 40], &preceding, 17, 70_000).is_ok());
    }

    #[test]
    fn addresses_outside_buffer() {
        let preceding = [ip_record(ipv4::ID, 0, 20)];
        assert_eq!(
            pseudo_header(&[0u8; 14], &preceding, 6, 0),
            Err(PseudoHeaderError::Truncated)
        );
    }
}
