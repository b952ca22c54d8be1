//! TCP option list codec.
//!
//! Options are exposed as a JSON array. Known kinds are tagged by an
//! `option` name; anything else round-trips as `{kind, data}` with the
//! body in hex. Problems are returned as `(index, message)` pairs so the
//! caller can report them under `options.<index>`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::layout;
use crate::codec::convert::{bytes_to_hex, hex_to_bytes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TcpOption {
    Known(KnownOption),
    Other { kind: u8, data: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "option")]
pub enum KnownOption {
    #[serde(rename = "EOL")]
    EndOfList,
    #[serde(rename = "NOP")]
    NoOperation,
    #[serde(rename = "MSS")]
    MaxSegmentSize { mss: u16 },
    #[serde(rename = "Window-Scale")]
    WindowScale { shift: u8 },
    #[serde(rename = "SACK-Permitted")]
    SackPermitted,
    #[serde(rename = "SACK")]
    Sack { blocks: Vec<SackBlock> },
    #[serde(rename = "TS")]
    Timestamps { tsval: u32, tsecr: u32 },
    #[serde(rename = "UTO")]
    UserTimeout { granularity: bool, timeout: u16 },
    #[serde(rename = "TCP-AO", rename_all = "camelCase")]
    Authentication {
        key_id: u8,
        r_next_key_id: u8,
        mac: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SackBlock {
    pub left: u32,
    pub right: u32,
}

pub type OptionErrors = Vec<(usize, String)>;

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Fixed TLV length of a known kind, if it has one.
fn fixed_length(kind: u8) -> Option<(&'static str, usize)> {
    match kind {
        layout::KIND_MSS => Some(("MSS", 4)),
        layout::KIND_WINDOW_SCALE => Some(("Window Scale", 3)),
        layout::KIND_SACK_PERMITTED => Some(("SACK Permitted", 2)),
        layout::KIND_TIMESTAMPS => Some(("Timestamps", 10)),
        layout::KIND_USER_TIMEOUT => Some(("User Timeout", 4)),
        _ => None,
    }
}

/// Parse an option block. Parsing stops at End of Option List or at the
/// first TLV that does not fit.
pub fn parse_options(bytes: &[u8]) -> (Vec<TcpOption>, OptionErrors) {
    let mut options = Vec::new();
    let mut errors = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let kind = bytes[pos];
        match kind {
            layout::KIND_EOL => {
                options.push(TcpOption::Known(KnownOption::EndOfList));
                break;
            }
            layout::KIND_NOP => {
                options.push(TcpOption::Known(KnownOption::NoOperation));
                pos += 1;
                continue;
            }
            _ => {}
        }

        let index = options.len();
        let Some(&length) = bytes.get(pos + 1) else {
            errors.push((index, "Option length is missing".to_string()));
            break;
        };
        let length = usize::from(length);
        if length < 2 || pos + length > bytes.len() {
            errors.push((index, format!("Option length {length} does not fit the header")));
            break;
        }
        let body = &bytes[pos + 2..pos + length];
        pos += length;

        let other = || TcpOption::Other {
            kind,
            data: bytes_to_hex(body),
        };
        if let Some((name, expected)) = fixed_length(kind) {
            if length != expected {
                errors.push((index, format!("{name} option TLV length should be {expected}")));
                options.push(other());
                continue;
            }
        }

        let option = match kind {
            layout::KIND_MSS => KnownOption::MaxSegmentSize { mss: be_u16(body) },
            layout::KIND_WINDOW_SCALE => {
                let shift = body[0];
                if shift > layout::MAX_WINDOW_SHIFT {
                    errors.push((index, "Window Scale shift should be at most 14".to_string()));
                }
                KnownOption::WindowScale { shift }
            }
            layout::KIND_SACK_PERMITTED => KnownOption::SackPermitted,
            layout::KIND_SACK => {
                if body.is_empty() || body.len() % 8 != 0 {
                    errors.push((index, "SACK option TLV length should be 2 + 8n".to_string()));
                    options.push(other());
                    continue;
                }
                let blocks = body
                    .chunks_exact(8)
                    .map(|block| SackBlock {
                        left: be_u32(&block[..4]),
                        right: be_u32(&block[4..]),
                    })
                    .collect();
                KnownOption::Sack { blocks }
            }
            layout::KIND_TIMESTAMPS => KnownOption::Timestamps {
                tsval: be_u32(&body[..4]),
                tsecr: be_u32(&body[4..]),
            },
            layout::KIND_USER_TIMEOUT => {
                let word = be_u16(body);
                KnownOption::UserTimeout {
                    granularity: word & 0x8000 != 0,
                    timeout: word & 0x7fff,
                }
            }
            layout::KIND_AUTHENTICATION if body.len() >= 2 => KnownOption::Authentication {
                key_id: body[0],
                r_next_key_id: body[1],
                mac: bytes_to_hex(&body[2..]),
            },
            _ => {
                options.push(other());
                continue;
            }
        };
        options.push(TcpOption::Known(option));
    }

    (options, errors)
}

fn tlv(out: &mut Vec<u8>, kind: u8, body: &[u8]) -> Result<(), String> {
    let length = u8::try_from(body.len() + 2).map_err(|_| "Option is too long".to_string())?;
    out.push(kind);
    out.push(length);
    out.extend_from_slice(body);
    Ok(())
}

fn build_one(option: &TcpOption, out: &mut Vec<u8>) -> Result<(), String> {
    let known = match option {
        TcpOption::Other { kind, data } => {
            let body = hex_to_bytes(data).ok_or_else(|| "Invalid hex string".to_string())?;
            if *kind <= layout::KIND_NOP {
                out.push(*kind);
                return Ok(());
            }
            return tlv(out, *kind, &body);
        }
        TcpOption::Known(known) => known,
    };

    match known {
        KnownOption::EndOfList => out.push(layout::KIND_EOL),
        KnownOption::NoOperation => out.push(layout::KIND_NOP),
        KnownOption::MaxSegmentSize { mss } => tlv(out, layout::KIND_MSS, &mss.to_be_bytes())?,
        KnownOption::WindowScale { shift } => {
            tlv(out, layout::KIND_WINDOW_SCALE, &[*shift])?;
            if *shift > layout::MAX_WINDOW_SHIFT {
                return Err("Window Scale shift should be at most 14".to_string());
            }
        }
        KnownOption::SackPermitted => tlv(out, layout::KIND_SACK_PERMITTED, &[])?,
        KnownOption::Sack { blocks } => {
            let body: Vec<u8> = blocks
                .iter()
                .flat_map(|block| {
                    let mut edges = block.left.to_be_bytes().to_vec();
                    edges.extend_from_slice(&block.right.to_be_bytes());
                    edges
                })
                .collect();
            tlv(out, layout::KIND_SACK, &body)?;
        }
        KnownOption::Timestamps { tsval, tsecr } => {
            let mut body = tsval.to_be_bytes().to_vec();
            body.extend_from_slice(&tsecr.to_be_bytes());
            tlv(out, layout::KIND_TIMESTAMPS, &body)?;
        }
        KnownOption::UserTimeout {
            granularity,
            timeout,
        } => {
            let word = (u16::from(*granularity) << 15) | (timeout & 0x7fff);
            tlv(out, layout::KIND_USER_TIMEOUT, &word.to_be_bytes())?;
            if *timeout > 0x7fff {
                return Err("User Timeout should be at most 32767".to_string());
            }
        }
        KnownOption::Authentication {
            key_id,
            r_next_key_id,
            mac,
        } => {
            let mac = hex_to_bytes(mac).ok_or_else(|| "Invalid hex string".to_string())?;
            let mut body = vec![*key_id, *r_next_key_id];
            body.extend_from_slice(&mac);
            tlv(out, layout::KIND_AUTHENTICATION, &body)?;
        }
    }
    Ok(())
}

/// Serialize a JSON option list. Elements that cannot be understood are
/// skipped and reported; the result is not padded.
pub fn build_options(options: &[Value]) -> (Vec<u8>, OptionErrors) {
    let mut out = Vec::new();
    let mut errors = Vec::new();
    for (index, value) in options.iter().enumerate() {
        let result = serde_json::from_value::<TcpOption>(value.clone())
            .map_err(|_| "Unknown option".to_string())
            .and_then(|option| build_one(&option, &mut out));
        if let Err(message) = result {
            errors.push((index, message));
        }
    }
    (out, errors)
}
