//! RTMP publishing pipeline.
//!
//! This crate owns everything between the FLV muxer and the wire
//! library: the owned packet type, the blocking packet queue, the
//! publisher state machine with its writer thread, and the traits the
//! host implements (status sink) or provides (RTMP transport).

mod error;
mod packet;
mod publisher;
mod queue;
mod status;
mod transport;

pub use error::{StreamErrorCode, TransportError};
pub use packet::{PacketType, RtmpPacket};
pub use publisher::{PublisherState, RtmpPublisher};
pub use queue::PacketQueue;
pub use status::{StatusSink, ThreadContext};
pub use transport::{RtmpTransport, TransportFactory};

/// Chunk-stream channel for script/info packets.
pub const CHANNEL_INFO: u8 = 0x03;

/// Chunk-stream channel for video packets.
pub const CHANNEL_VIDEO: u8 = 0x04;

/// Chunk-stream channel for audio packets.
pub const CHANNEL_AUDIO: u8 = 0x05;

/// Connect timeout handed to the transport, in seconds.
pub const CONNECT_TIMEOUT_SECS: u32 = 10;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
