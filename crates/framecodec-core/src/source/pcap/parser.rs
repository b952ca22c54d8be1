use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};
use tracing::debug;

use crate::source::{CapturedFrame, FrameSource, SourceError};

use super::error::PcapSourceError;
use super::layout;
use super::reader::{
    is_nanosecond_magic, is_pcapng_magic, legacy_micros, linktype_for_interface, pcapng_ts_split,
    read_magic_and_rewind,
};

pub struct PcapFileSource {
    inner: PcapReader,
    next_index: u64,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
        nanosecond: bool,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

/// Frame fields read from one packet block, before it is numbered.
struct RawFrame {
    data: Vec<u8>,
    seconds: u32,
    microseconds: u32,
    linktype: Linktype,
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(SourceError::from)?;
        let inner = create_reader(file).map_err(SourceError::from)?;
        debug!(path = %path.display(), "opened capture");
        Ok(Self {
            inner,
            next_index: 0,
        })
    }
}

impl FrameSource for PcapFileSource {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SourceError> {
        let Some(raw) = next_packet(&mut self.inner).map_err(SourceError::from)? else {
            return Ok(None);
        };
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(CapturedFrame {
            data: raw.data,
            seconds: raw.seconds,
            microseconds: raw.microseconds,
            index,
            linktype: raw.linktype,
        }))
    }
}

fn create_reader(file: File) -> Result<PcapReader, PcapSourceError> {
    let mut file = file;
    let magic = read_magic_and_rewind(&mut file)?;

    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::pcap("pcapng reader init", e))?;
        Ok(PcapReader::Ng {
            reader,
            linktypes: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::pcap("pcap reader init", e))?;
        Ok(PcapReader::Legacy {
            reader,
            linktype: None,
            nanosecond: false,
        })
    }
}

fn next_packet(reader: &mut PcapReader) -> Result<Option<RawFrame>, PcapSourceError> {
    loop {
        match reader {
            PcapReader::Legacy {
                reader,
                linktype,
                nanosecond,
            } => match reader.next() {
                Ok((offset, block)) => {
                    let frame = match block {
                        PcapBlockOwned::LegacyHeader(header) => {
                            *linktype = Some(header.network);
                            *nanosecond = is_nanosecond_magic(header.magic_number);
                            None
                        }
                        PcapBlockOwned::Legacy(packet) => Some(RawFrame {
                            data: packet.data.to_vec(),
                            seconds: packet.ts_sec,
                            microseconds: legacy_micros(packet.ts_usec, *nanosecond),
                            linktype: linktype.unwrap_or(Linktype::ETHERNET),
                        }),
                        _ => None,
                    };
                    reader.consume(offset);
                    if frame.is_some() {
                        return Ok(frame);
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    reader
                        .refill()
                        .map_err(|e| PcapSourceError::pcap("pcap reader refill", e))?;
                }
                Err(e) => return Err(PcapSourceError::pcap("pcap reader next", e)),
            },
            PcapReader::Ng { reader, linktypes } => match reader.next() {
                Ok((offset, block)) => {
                    let frame = match block {
                        PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                            linktypes.push(intf.linktype);
                            None
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                            let (seconds, microseconds) =
                                pcapng_ts_split(packet.ts_high, packet.ts_low);
                            Some(RawFrame {
                                data: packet.data.to_vec(),
                                seconds,
                                microseconds,
                                linktype: linktype_for_interface(linktypes, packet.if_id),
                            })
                        }
                        _ => None,
                    };
                    reader.consume(offset);
                    if frame.is_some() {
                        return Ok(frame);
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    reader
                        .refill()
                        .map_err(|e| PcapSourceError::pcap("pcapng reader refill", e))?;
                }
                Err(e) => return Err(PcapSourceError::pcap("pcapng reader next", e)),
            },
        }
    }
}
