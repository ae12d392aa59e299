//! NAL unit extraction from encoder output buffers.
//!
//! Hardware encoders hand us either Annex B streams (start codes
//! 0x000001 / 0x00000001) or AVCC-style buffers where each NAL unit is
//! preceded by a 4-byte big-endian length. FLV wants the latter, so the
//! muxer splits whatever arrives into individual NAL units first.

use bytes::Bytes;
use tracing::warn;

/// H.264 NAL unit types the muxer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NalType {
    /// IDR slice (keyframe).
    Idr = 5,
    /// Sequence Parameter Set.
    Sps = 7,
    /// Picture Parameter Set.
    Pps = 8,
    /// Access Unit Delimiter.
    Aud = 9,
    /// Anything else (slices, SEI, ...).
    Other = 0,
}

impl NalType {
    /// Classify from the first byte of an H.264 NAL unit.
    pub fn from_header(byte: u8) -> Self {
        match byte & 0x1F {
            5 => NalType::Idr,
            7 => NalType::Sps,
            8 => NalType::Pps,
            9 => NalType::Aud,
            _ => NalType::Other,
        }
    }
}

/// H.265 NAL unit types the muxer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HevcNalType {
    /// IDR with leading pictures.
    IdrWRadl = 19,
    /// IDR without leading pictures.
    IdrNLp = 20,
    /// Clean random access point.
    Cra = 21,
    /// Video Parameter Set.
    Vps = 32,
    /// Sequence Parameter Set.
    Sps = 33,
    /// Picture Parameter Set.
    Pps = 34,
    /// Access Unit Delimiter.
    Aud = 35,
    /// Anything else.
    Other = 0,
}

impl HevcNalType {
    /// Classify from the first byte of an H.265 NAL unit.
    pub fn from_header(byte: u8) -> Self {
        match (byte >> 1) & 0x3F {
            19 => HevcNalType::IdrWRadl,
            20 => HevcNalType::IdrNLp,
            21 => HevcNalType::Cra,
            32 => HevcNalType::Vps,
            33 => HevcNalType::Sps,
            34 => HevcNalType::Pps,
            35 => HevcNalType::Aud,
            _ => HevcNalType::Other,
        }
    }

    /// True for the random-access point types that mark a keyframe.
    pub fn is_keyframe(self) -> bool {
        matches!(
            self,
            HevcNalType::IdrWRadl | HevcNalType::IdrNLp | HevcNalType::Cra
        )
    }
}

/// Byte offset and length of an Annex B start code.
struct StartCode {
    offset: usize,
    length: usize,
}

fn find_start_code(data: &[u8], from: usize) -> Option<StartCode> {
    if from >= data.len() {
        return None;
    }

    let len = data.len();
    let mut i = from;
    while i + 2 < len {
        if data[i] == 0x00 && data[i + 1] == 0x00 {
            if data[i + 2] == 0x01 {
                return Some(StartCode { offset: i, length: 3 });
            }
            if i + 3 < len && data[i + 2] == 0x00 && data[i + 3] == 0x01 {
                return Some(StartCode { offset: i, length: 4 });
            }
        }
        i += 1;
    }
    None
}

/// Split an Annex B stream into NAL units (start codes removed).
///
/// Returns an empty vector when the buffer contains no start code at
/// all, which is how the combined splitter detects AVCC input.
pub fn split_annex_b(data: &[u8]) -> Vec<Bytes> {
    let mut nals = Vec::new();

    let Some(first) = find_start_code(data, 0) else {
        return nals;
    };

    let mut position = first.offset + first.length;
    loop {
        let next = find_start_code(data, position);
        let nal_end = next.as_ref().map_or(data.len(), |sc| sc.offset);
        if nal_end > position {
            nals.push(Bytes::copy_from_slice(&data[position..nal_end]));
        }
        match next {
            Some(sc) => position = sc.offset + sc.length,
            None => break,
        }
    }

    nals
}

/// Split a buffer of `(u32 big-endian length)(NAL bytes)` records.
///
/// Stops at a zero length or a length that overruns the buffer; the
/// remainder is malformed encoder output and is discarded.
pub fn split_length_prefixed(data: &[u8]) -> Vec<Bytes> {
    let mut nals = Vec::new();
    let mut position = 0usize;

    while position + 4 <= data.len() {
        let size = u32::from_be_bytes([
            data[position],
            data[position + 1],
            data[position + 2],
            data[position + 3],
        ]) as usize;
        position += 4;

        if size == 0 || position + size > data.len() {
            if size != 0 {
                warn!(
                    declared = size,
                    remaining = data.len() - position,
                    "discarding truncated length-prefixed NAL record"
                );
            }
            break;
        }

        nals.push(Bytes::copy_from_slice(&data[position..position + size]));
        position += size;
    }

    nals
}

/// Split an encoder buffer into NAL units, trying Annex B first and
/// falling back to 4-byte length prefixes.
pub fn split_nal_units(data: &[u8]) -> Vec<Bytes> {
    let nals = split_annex_b(data);
    if !nals.is_empty() {
        return nals;
    }
    split_length_prefixed(data)
}
