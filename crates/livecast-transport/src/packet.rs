//! Owned RTMP packets.

use bytes::Bytes;

/// RTMP message type of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Audio data (0x08).
    Audio = 0x08,

    /// Video data (0x09).
    Video = 0x09,

    /// AMF0 script data (0x12).
    Info = 0x12,
}

/// A ready-to-send RTMP packet.
///
/// Ownership moves into the queue on enqueue and ends with the writer
/// after a send attempt (or in `clear()` at shutdown). Every packet
/// this core produces uses a relative timestamp and a format-0
/// ("large") chunk header.
#[derive(Debug, Clone)]
pub struct RtmpPacket {
    /// FLV tag body.
    pub body: Bytes,

    /// RTMP message type.
    pub packet_type: PacketType,

    /// Milliseconds since publish start.
    pub timestamp_ms: u32,

    /// Chunk-stream channel (0x03 info, 0x04 video, 0x05 audio).
    pub channel: u8,

    /// Message stream id, stamped by the writer before sending.
    pub stream_id: u32,
}

impl RtmpPacket {
    /// Create a packet; the stream id is filled in by the writer.
    pub fn new(body: Bytes, packet_type: PacketType, timestamp_ms: u32, channel: u8) -> Self {
        Self {
            body,
            packet_type,
            timestamp_ms,
            channel,
            stream_id: 0,
        }
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// True when the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
