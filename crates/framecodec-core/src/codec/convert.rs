//! Fixed-width integer, text-address and hex conversions.
//!
//! Everything here is pure and big-endian. Text parsers return `None` on
//! malformed input; callers decide whether that becomes a field error.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Encode the low `width` bytes of `value` big-endian (`width` is capped at 8).
pub fn uint_to_bytes(value: u64, width: usize) -> Vec<u8> {
    let width = width.min(8);
    value.to_be_bytes()[8 - width..].to_vec()
}

/// Decode up to eight big-endian bytes as an unsigned integer.
///
/// Longer inputs keep their trailing eight bytes.
pub fn bytes_to_uint(bytes: &[u8]) -> u64 {
    let tail = &bytes[bytes.len().saturating_sub(8)..];
    tail.iter().fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Encode `value` as a `width`-byte two's complement big-endian integer.
pub fn int_to_bytes(value: i64, width: usize) -> Vec<u8> {
    uint_to_bytes(value as u64, width)
}

/// Decode up to eight big-endian bytes as a sign-extended integer.
pub fn bytes_to_int(bytes: &[u8]) -> i64 {
    let width = bytes.len().min(8);
    if width == 0 {
        return 0;
    }
    let raw = bytes_to_uint(bytes);
    let shift = 64 - (width as u32) * 8;
    ((raw << shift) as i64) >> shift
}

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse a hex string into bytes.
///
/// Accepts an optional `0x` prefix; an odd digit count is left-padded with
/// a zero nibble.
pub fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    let digits = strip_hex_prefix(hex.trim());
    if digits.is_empty() {
        return Some(Vec::new());
    }
    let padded;
    let digits = if digits.len() % 2 == 1 {
        padded = format!("0{digits}");
        padded.as_str()
    } else {
        digits
    };
    if !digits.is_ascii() {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|idx| u8::from_str_radix(&digits[idx..idx + 2], 16).ok())
        .collect()
}

/// Format `value` as zero-padded lowercase hex covering `width` bytes.
pub fn uint_to_hex(value: u64, width: usize) -> String {
    bytes_to_hex(&uint_to_bytes(value, width))
}

pub fn hex_to_uint(hex: &str) -> Option<u64> {
    let digits = strip_hex_prefix(hex.trim());
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

pub fn ipv4_to_bytes(text: &str) -> Option<[u8; 4]> {
    text.trim().parse::<Ipv4Addr>().ok().map(|addr| addr.octets())
}

/// Format four bytes as dotted-quad text; short input is zero-padded.
pub fn bytes_to_ipv4(bytes: &[u8]) -> String {
    Ipv4Addr::from(fixed::<4>(bytes)).to_string()
}

pub fn ipv6_to_bytes(text: &str) -> Option<[u8; 16]> {
    text.trim().parse::<Ipv6Addr>().ok().map(|addr| addr.octets())
}

/// Format sixteen bytes as RFC 5952 colon-hex text; short input is zero-padded.
pub fn bytes_to_ipv6(bytes: &[u8]) -> String {
    Ipv6Addr::from(fixed::<16>(bytes)).to_string()
}

/// Parse `aa:bb:cc:dd:ee:ff` (or `-` separated) MAC text.
pub fn mac_to_bytes(text: &str) -> Option<[u8; 6]> {
    let mut out = [0u8; 6];
    let mut parts = text.trim().split([':', '-']);
    for slot in out.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 2 {
            return None;
        }
        *slot = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

pub fn bytes_to_mac(bytes: &[u8]) -> String {
    fixed::<6>(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// RFC 1071 ones'-complement checksum over the concatenation of `parts`.
///
/// An odd total length is padded with a trailing zero byte.
pub fn internet_checksum(parts: &[&[u8]]) -> u16 {
    let mut sum = 0u32;
    let mut pending: Option<u8> = None;
    for byte in parts.iter().flat_map(|part| part.iter().copied()) {
        match pending.take() {
            Some(high) => sum += u32::from(u16::from_be_bytes([high, byte])),
            None => pending = Some(byte),
        }
        if sum > 0xFFFF {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
    }
    if let Some(high) = pending {
        sum += u32::from(u16::from_be_bytes([high, 0]));
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let len = bytes.len().min(N);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}
