//! FLV muxing for live RTMP publishing.
//!
//! This crate turns already-encoded H.264/H.265 NAL units and raw AAC
//! frames into FLV tag bodies ready to hand to an RTMP transport:
//! bitstream splitting, parameter-set harvesting, decoder configuration
//! records and script-data metadata.

mod amf;
mod bits;
mod config;
mod hevc;
mod muxer;
mod nal;

pub use bits::BitReader;
pub use config::{AudioConfig, VideoCodecId, VideoConfig};
pub use hevc::{build_hevc_decoder_configuration_record, parse_sps_summary, HevcSpsSummary};
pub use muxer::{FlvMuxer, ParsedVideoFrame};
pub use nal::{split_annex_b, split_length_prefixed, split_nal_units, HevcNalType, NalType};
