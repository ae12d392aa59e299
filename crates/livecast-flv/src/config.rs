//! Video and audio stream configuration.

use serde::{Deserialize, Serialize};

/// FLV video codec identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum VideoCodecId {
    /// AVC (H.264).
    #[default]
    H264 = 7,

    /// HEVC (H.265).
    H265 = 12,
}

impl VideoCodecId {
    /// FLV CodecID nibble for the video tag header.
    pub fn flv_id(self) -> u8 {
        self as u8
    }
}

/// Video stream configuration supplied by the host.
///
/// Replacing the configuration mid-stream clears the muxer's
/// metadata/sequence-header flags, so configure video before starting a
/// publish session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Video codec of the incoming NAL units.
    pub codec: VideoCodecId,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Nominal frames per second.
    pub fps: u32,
}

impl VideoConfig {
    /// True once width, height and fps are all known.
    pub fn is_complete(&self) -> bool {
        self.width > 0 && self.height > 0 && self.fps > 0
    }
}

/// Audio stream configuration supplied by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Channel count.
    pub channels: u8,

    /// Bits per sample.
    pub sample_size_bits: u8,

    /// Raw AudioSpecificConfig bytes from the AAC encoder's first
    /// output-format change. Audio publishing is gated on this being
    /// non-empty.
    pub asc: Vec<u8>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            sample_size_bits: 16,
            asc: Vec::new(),
        }
    }
}
