use std::io::{Read, Seek, SeekFrom};

use super::error::PcapSourceError;
use super::layout;
use pcap_parser::Linktype;

/// Read the magic bytes and rewind the reader to the start.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use framecodec_core::source::pcap::reader::read_magic_and_rewind;
/// use std::io::Cursor;
///
/// let bytes = [0x0a, 0x0d, 0x0d, 0x0a, 0x01];
/// let mut cursor = Cursor::new(bytes);
/// let magic = read_magic_and_rewind(&mut cursor).unwrap();
/// assert_eq!(magic, [0x0a, 0x0d, 0x0d, 0x0a]);
/// ```
///
/// # Errors
/// Returns `PcapSourceError` when the reader cannot be read or rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], PcapSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Whether a legacy pcap header magic announces nanosecond timestamps.
pub fn is_nanosecond_magic(magic_number: u32) -> bool {
    magic_number == layout::PCAP_NANOSECOND_MAGIC
        || magic_number == layout::PCAP_NANOSECOND_MAGIC_SWAPPED
}

/// Resolve the linktype for a given interface id, defaulting to Ethernet.
///
/// # Examples
/// ```text
/// use framecodec_core::source::pcap::reader::linktype_for_interface;
/// use pcap_parser::Linktype;
///
/// let linktypes = [Linktype::RAW];
/// assert_eq!(linktype_for_interface(&linktypes, 0), Linktype::RAW);
/// assert_eq!(linktype_for_interface(&linktypes, 1), Linktype::ETHERNET);
/// ```
pub fn linktype_for_interface(linktypes: &[Linktype], if_id: u32) -> Linktype {
    linktypes
        .get(if_id as usize)
        .copied()
        .unwrap_or(Linktype::ETHERNET)
}

/// Split a PCAPNG high/low microsecond timestamp into seconds and
/// microseconds. Seconds saturate at `u32::MAX`.
///
/// # Examples
/// ```text
/// use framecodec_core::source::pcap::reader::pcapng_ts_split;
///
/// assert_eq!(pcapng_ts_split(0, 1_500_000), (1, 500_000));
/// ```
pub fn pcapng_ts_split(ts_high: u32, ts_low: u32) -> (u32, u32) {
    let ts = (u64::from(ts_high) << 32) | u64::from(ts_low);
    let seconds = u32::try_from(ts / 1_000_000).unwrap_or(u32::MAX);
    (seconds, (ts % 1_000_000) as u32)
}

/// Sub-second part of a legacy pcap record in microseconds.
pub fn legacy_micros(fraction: u32, nanosecond: bool) -> u32 {
    if nanosecond { fraction / 1_000 } else { fraction }
}

#[cfg(test)]
mod tests {
    use super::{
        is_nanosecond_magic, is_pcapng_magic, legacy_micros, linktype_for_interface,
        pcapng_ts_split, read_magic_and_rewind,
    };
    use crate::source::pcap::error::PcapSourceError;
    use pcap_parser::Linktype;
    use std::io::Cursor;
    use std::io::Read;

    #[test]
    fn detect_pcapng_magic() {
        let data = super::layout::PCAPNG_MAGIC;
        assert!(is_pcapng_magic(&data));
        assert!(!is_pcapng_magic(&[0xd4, 0xc3, 0xb2, 0xa1]));
    }

    #[test]
    fn read_magic_rewinds() {
        let bytes = [0x0a, 0x0d, 0x0d, 0x0a, 0x01];
        let mut cursor = Cursor::new(bytes);
        let magic = read_magic_and_rewind(&mut cursor).unwrap();
        assert_eq!(magic, [0x0a, 0x0d, 0x0d, 0x0a]);
        let mut buf = [0u8; 1];
        cursor.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], 0x0a);
    }

    #[test]
    fn read_magic_too_short() {
        let bytes = [0x0a, 0x0d, 0x0d];
        let mut cursor = Cursor::new(bytes);
        let err = read_magic_and_rewind(&mut cursor).unwrap_err();
        assert!(matches!(err, PcapSourceError::Io(_)));
    }

    #[test]
    fn linktype_defaults_to_ethernet_when_missing() {
        let linktypes = [Linktype::RAW];
        assert_eq!(linktype_for_interface(&linktypes, 0), Linktype::RAW);
        assert_eq!(linktype_for_interface(&linktypes, 1), Linktype::ETHERNET);
    }

    #[test]
    fn pcapng_timestamp_splits() {
        assert_eq!(pcapng_ts_split(0, 1_500_000), (1, 500_000));
        assert_eq!(pcapng_ts_split(1, 0), (4294, 967_296));
    }

    #[test]
    fn nanosecond_records_scale_down() {
        assert!(is_nanosecond_magic(0xa1b2_3c4d));
        assert!(!is_nanosecond_magic(0xa1b2_c3d4));
        assert_eq!(legacy_micros(1_500, true), 1);
        assert_eq!(legacy_micros(1_500, false), 1_500);
    }
}
