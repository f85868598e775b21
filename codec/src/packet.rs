//! Inspection of single Ogg Opus container packets.
//!
//! An Ogg Opus logical stream starts with exactly two header packets, the
//! identification header (`OpusHead`) and the comment header (`OpusTags`),
//! followed by audio packets. See RFC 7845 section 5.
//!
//! All multi-byte fields are little endian on the wire regardless of the
//! host.

use std::borrow::Cow;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{engine::Backend, error::check, Error};

pub const ID_MAGIC: &[u8; 8] = b"OpusHead";
pub const COMMENT_MAGIC: &[u8; 8] = b"OpusTags";

/// Size of the identification header without a channel mapping table.
const ID_HEADER_SIZE: usize = 19;

/// Whether the packet is an identification header.
pub fn is_header(packet: &[u8]) -> bool {
    packet.len() >= 8 && &packet[..8] == ID_MAGIC
}

/// Whether the packet is a comment header.
pub fn is_comment_header(packet: &[u8]) -> bool {
    packet.len() >= 8 && &packet[..8] == COMMENT_MAGIC
}

/// Number of channels an audio packet carries, as reported by the engine's
/// packet probe.
pub fn channels<B: Backend>(packet: &[u8]) -> Result<usize, Error> {
    // The probe reads the first byte unconditionally.
    if packet.is_empty() {
        log::warn!("rejected empty audio packet");

        return Err(Error::InvalidPacket);
    }

    match check(B::packet_channels(packet)) {
        Ok(channels) if channels > 0 => Ok(channels as usize),
        Ok(_) => Err(Error::InvalidPacket),
        Err(e) => {
            log::warn!("engine rejected audio packet: {}", e);

            Err(Error::InvalidPacket)
        }
    }
}

/// Stream layout for channel mapping families other than 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapping {
    pub streams: u8,
    pub coupled_streams: u8,
    pub mapping: Vec<u8>,
}

/// Decoded identification header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdHeader {
    pub version: u8,
    pub channels: u8,
    /// Samples at 48 kHz to discard from the decoder output at the start.
    pub pre_skip: u16,
    /// Sample rate of the original input, 0 if unspecified. This is not the
    /// playback rate.
    pub input_sample_rate: u32,
    /// Gain to apply on decode, Q7.8 in dB.
    pub output_gain: i16,
    pub mapping_family: u8,
    pub mapping: Option<ChannelMapping>,
}

impl IdHeader {
    pub fn parse(packet: &[u8]) -> Result<Self, Error> {
        if !is_header(packet) || packet.len() < ID_HEADER_SIZE {
            return Err(Error::InvalidPacket);
        }

        let mut buf = &packet[8..];
        let version = buf.get_u8();
        let channels = buf.get_u8();
        let pre_skip = buf.get_u16_le();
        let input_sample_rate = buf.get_u32_le();
        let output_gain = buf.get_i16_le();
        let mapping_family = buf.get_u8();

        // Only the minor nibble may change while staying compatible.
        if version >> 4 != 0 || channels == 0 {
            return Err(Error::InvalidPacket);
        }

        let mapping = if mapping_family != 0 {
            if buf.remaining() < 2 + channels as usize {
                return Err(Error::InvalidPacket);
            }

            let streams = buf.get_u8();
            let coupled_streams = buf.get_u8();
            if streams == 0 || coupled_streams > streams {
                return Err(Error::InvalidPacket);
            }

            Some(ChannelMapping {
                streams,
                coupled_streams,
                mapping: buf[..channels as usize].to_vec(),
            })
        } else {
            None
        };

        Ok(Self {
            version,
            channels,
            pre_skip,
            input_sample_rate,
            output_gain,
            mapping_family,
            mapping,
        })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(ID_HEADER_SIZE + 2 + self.channels as usize);
        bytes.put_slice(ID_MAGIC);
        bytes.put_u8(self.version);
        bytes.put_u8(self.channels);
        bytes.put_u16_le(self.pre_skip);
        bytes.put_u32_le(self.input_sample_rate);
        bytes.put_i16_le(self.output_gain);
        bytes.put_u8(self.mapping_family);

        if let Some(mapping) = &self.mapping {
            bytes.put_u8(mapping.streams);
            bytes.put_u8(mapping.coupled_streams);
            bytes.put_slice(&mapping.mapping);
        }

        bytes.freeze()
    }
}

/// Vendor string and user comments of a comment header, kept byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentBlock {
    pub vendor: Vec<u8>,
    pub comments: Vec<Vec<u8>>,
}

impl CommentBlock {
    pub fn vendor_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.vendor)
    }

    /// Well-formed `KEY=value` entries in order. Entries that are not UTF-8
    /// or carry no `=` are skipped.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.comments
            .iter()
            .filter_map(|it| std::str::from_utf8(it).ok())
            .filter_map(|it| it.split_once('='))
    }

    /// First value of the field `key`. Field names compare case-insensitively.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    pub fn to_bytes(&self) -> Result<Bytes, Error> {
        let size = 8
            + 4
            + self.vendor.len()
            + 4
            + self.comments.iter().map(|it| 4 + it.len()).sum::<usize>();

        let mut bytes = BytesMut::with_capacity(size);
        bytes.put_slice(COMMENT_MAGIC);
        put_field(&mut bytes, &self.vendor)?;
        bytes.put_u32_le(to_u32(self.comments.len())?);
        for comment in &self.comments {
            put_field(&mut bytes, comment)?;
        }

        Ok(bytes.freeze())
    }
}

/// Parses a comment header.
///
/// Every length field is checked against the bytes left in the packet
/// before it is used.
pub fn parse_comments(packet: &[u8]) -> Result<CommentBlock, Error> {
    if !is_comment_header(packet) {
        return Err(Error::InvalidPacket);
    }

    let mut buf = &packet[8..];
    let vendor = read_field(&mut buf)?;

    // Each entry takes at least its length field.
    let count = read_len(&mut buf)?;
    if count > buf.remaining() / 4 {
        log::warn!("comment count {} exceeds the packet", count);

        return Err(Error::InvalidPacket);
    }

    let mut comments = Vec::with_capacity(count);
    for _ in 0..count {
        comments.push(read_field(&mut buf)?);
    }

    Ok(CommentBlock { vendor, comments })
}

fn read_len(buf: &mut &[u8]) -> Result<usize, Error> {
    if buf.remaining() < 4 {
        return Err(Error::InvalidPacket);
    }

    Ok(buf.get_u32_le() as usize)
}

fn read_field(buf: &mut &[u8]) -> Result<Vec<u8>, Error> {
    let len = read_len(buf)?;
    if len > buf.remaining() {
        log::warn!("length field {} exceeds the {} bytes left", len, buf.remaining());

        return Err(Error::InvalidPacket);
    }

    let field = buf[..len].to_vec();
    buf.advance(len);

    Ok(field)
}

fn to_u32(len: usize) -> Result<u32, Error> {
    u32::try_from(len).map_err(|_| Error::bad_argument("comment field is too long"))
}

fn put_field(bytes: &mut BytesMut, field: &[u8]) -> Result<(), Error> {
    bytes.put_u32_le(to_u32(field.len())?);
    bytes.put_slice(field);

    Ok(())
}
