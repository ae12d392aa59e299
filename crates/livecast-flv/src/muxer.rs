//! FLV tag construction for a live publish session.
//!
//! The muxer owns the stream configuration, the harvested parameter
//! sets and the one-shot flags that gate metadata and sequence headers.
//! It produces tag *bodies* only; RTMP chunking is the transport's job.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::amf;
use crate::config::{AudioConfig, VideoCodecId, VideoConfig};
use crate::hevc;
use crate::nal::{split_nal_units, HevcNalType, NalType};

const SOUND_FORMAT_AAC: u8 = 10;
const SOUND_RATE_44K: u8 = 3;
const SOUND_SIZE_16BIT: u8 = 1;
const SOUND_TYPE_STEREO: u8 = 1;

const FRAME_KEY: u8 = 1;
const FRAME_INTER: u8 = 2;

const AVC_PACKET_SEQUENCE: u8 = 0x00;
const AVC_PACKET_NALU: u8 = 0x01;

/// A video input buffer reduced to length-prefixed slice NALs.
///
/// Parameter sets and access unit delimiters have been stripped; an
/// empty payload means the input carried no slice data.
#[derive(Debug, Clone, Default)]
pub struct ParsedVideoFrame {
    /// Concatenated `(u32 big-endian size)(NAL)` records.
    pub payload: Bytes,

    /// True when any NAL is an IDR / random-access picture.
    pub is_key_frame: bool,
}

impl ParsedVideoFrame {
    /// True when the frame contains slice data worth a media tag.
    pub fn has_data(&self) -> bool {
        !self.payload.is_empty()
    }
}

/// FLV tag builder with per-session state.
#[derive(Debug, Default)]
pub struct FlvMuxer {
    video: VideoConfig,
    audio: AudioConfig,

    sps: Vec<u8>,
    pps: Vec<u8>,
    vps: Vec<u8>,

    metadata_sent: bool,
    video_seq_sent: bool,
    audio_seq_sent: bool,
}

impl FlvMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget flags and parameter sets for a fresh publish session.
    pub fn reset(&mut self) {
        self.metadata_sent = false;
        self.video_seq_sent = false;
        self.audio_seq_sent = false;
        self.sps.clear();
        self.pps.clear();
        self.vps.clear();
    }

    /// Replace the video configuration.
    ///
    /// Clears the metadata and video-sequence flags; parameter sets are
    /// kept and will be overwritten by the next parameter-set NAL.
    pub fn set_video_config(&mut self, config: VideoConfig) {
        debug!(?config, "video config updated");
        self.video = config;
        self.metadata_sent = false;
        self.video_seq_sent = false;
    }

    /// Replace the audio configuration.
    pub fn set_audio_config(&mut self, config: AudioConfig) {
        debug!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            asc_len = config.asc.len(),
            "audio config updated"
        );
        self.audio = config;
        self.metadata_sent = false;
        self.audio_seq_sent = false;
    }

    pub fn video_config(&self) -> &VideoConfig {
        &self.video
    }

    pub fn audio_config(&self) -> &AudioConfig {
        &self.audio
    }

    /// True once the parameter sets for the configured codec are known.
    pub fn video_sequence_ready(&self) -> bool {
        match self.video.codec {
            VideoCodecId::H264 => !self.sps.is_empty() && !self.pps.is_empty(),
            VideoCodecId::H265 => {
                !self.vps.is_empty() && !self.sps.is_empty() && !self.pps.is_empty()
            }
        }
    }

    /// True once the AAC encoder has delivered an AudioSpecificConfig.
    pub fn audio_sequence_ready(&self) -> bool {
        !self.audio.asc.is_empty()
    }

    pub fn metadata_sent(&self) -> bool {
        self.metadata_sent
    }

    pub fn video_sequence_sent(&self) -> bool {
        self.video_seq_sent
    }

    pub fn audio_sequence_sent(&self) -> bool {
        self.audio_seq_sent
    }

    pub fn mark_metadata_sent(&mut self) {
        self.metadata_sent = true;
    }

    pub fn mark_audio_sequence_sent(&mut self) {
        self.audio_seq_sent = true;
    }

    /// Build the `onMetaData` SCRIPTDATA payload.
    ///
    /// Returns `None` until the video dimensions and frame rate are
    /// configured.
    pub fn build_metadata_tag(&self) -> Option<Bytes> {
        if !self.video.is_complete() {
            return None;
        }

        let mut buf = BytesMut::with_capacity(160);
        amf::write_string(&mut buf, "onMetaData");
        amf::write_ecma_array_header(&mut buf, 7);

        amf::write_number_property(&mut buf, "width", f64::from(self.video.width));
        amf::write_number_property(&mut buf, "height", f64::from(self.video.height));
        amf::write_number_property(&mut buf, "framerate", f64::from(self.video.fps));
        amf::write_number_property(&mut buf, "videocodecid", f64::from(self.video.codec.flv_id()));
        amf::write_number_property(&mut buf, "audiosamplerate", f64::from(self.audio.sample_rate));
        amf::write_number_property(
            &mut buf,
            "audiosamplesize",
            f64::from(self.audio.sample_size_bits),
        );
        amf::write_boolean_property(&mut buf, "stereo", self.audio.channels > 1);
        amf::write_number_property(&mut buf, "audiocodecid", f64::from(SOUND_FORMAT_AAC));

        amf::write_object_end(&mut buf);
        Some(buf.freeze())
    }

    /// Build the video sequence-header tag body.
    ///
    /// Returns `None` until the parameter sets are ready; marks the
    /// video sequence as sent on success.
    pub fn build_video_sequence_header(&mut self) -> Option<Bytes> {
        if !self.video_sequence_ready() {
            return None;
        }

        let mut buf = BytesMut::with_capacity(16 + self.sps.len() + self.pps.len() + self.vps.len());
        buf.put_u8(video_tag_header(self.video.codec, true));
        buf.put_u8(AVC_PACKET_SEQUENCE);
        buf.put_slice(&[0x00, 0x00, 0x00]); // composition time

        match self.video.codec {
            VideoCodecId::H264 => {
                buf.put_slice(&self.build_avc_decoder_configuration_record());
            }
            VideoCodecId::H265 => {
                let record =
                    hevc::build_hevc_decoder_configuration_record(&self.vps, &self.sps, &self.pps)?;
                buf.put_slice(&record);
            }
        }

        self.video_seq_sent = true;
        Some(buf.freeze())
    }

    /// Build the AAC sequence-header tag body (`0xAF 0x00` + ASC).
    pub fn build_audio_sequence_header(&self) -> Option<Bytes> {
        if !self.audio_sequence_ready() {
            return None;
        }

        let mut buf = BytesMut::with_capacity(2 + self.audio.asc.len());
        buf.put_u8(audio_tag_header());
        buf.put_u8(0x00);
        buf.put_slice(&self.audio.asc);
        Some(buf.freeze())
    }

    /// Split a video input buffer, harvest parameter sets and return
    /// the remaining slice NALs with 4-byte length prefixes.
    pub fn parse_video_frame(&mut self, data: &[u8]) -> ParsedVideoFrame {
        if data.is_empty() {
            return ParsedVideoFrame::default();
        }

        let nals = split_nal_units(data);
        let mut payload = BytesMut::with_capacity(data.len() + 4 * nals.len());
        let mut key_frame = false;

        for nal in &nals {
            if nal.is_empty() {
                continue;
            }

            match self.video.codec {
                VideoCodecId::H264 => match NalType::from_header(nal[0]) {
                    NalType::Aud => continue,
                    NalType::Sps => {
                        trace!(len = nal.len(), "harvested H.264 SPS");
                        self.sps = nal.to_vec();
                        continue;
                    }
                    NalType::Pps => {
                        trace!(len = nal.len(), "harvested H.264 PPS");
                        self.pps = nal.to_vec();
                        continue;
                    }
                    NalType::Idr => key_frame = true,
                    NalType::Other => {}
                },
                VideoCodecId::H265 => {
                    let nal_type = HevcNalType::from_header(nal[0]);
                    match nal_type {
                        HevcNalType::Aud => continue,
                        HevcNalType::Vps => {
                            trace!(len = nal.len(), "harvested H.265 VPS");
                            self.vps = nal.to_vec();
                            continue;
                        }
                        HevcNalType::Sps => {
                            trace!(len = nal.len(), "harvested H.265 SPS");
                            self.sps = nal.to_vec();
                            continue;
                        }
                        HevcNalType::Pps => {
                            trace!(len = nal.len(), "harvested H.265 PPS");
                            self.pps = nal.to_vec();
                            continue;
                        }
                        _ => {
                            if nal_type.is_keyframe() {
                                key_frame = true;
                            }
                        }
                    }
                }
            }

            payload.put_u32(nal.len() as u32);
            payload.put_slice(nal);
        }

        ParsedVideoFrame {
            payload: payload.freeze(),
            is_key_frame: key_frame,
        }
    }

    /// Build a video media-tag body from a parsed frame.
    pub fn build_video_tag(&self, frame: &ParsedVideoFrame) -> Bytes {
        if !frame.has_data() {
            return Bytes::new();
        }

        let mut buf = BytesMut::with_capacity(5 + frame.payload.len());
        buf.put_u8(video_tag_header(self.video.codec, frame.is_key_frame));
        buf.put_u8(AVC_PACKET_NALU);
        buf.put_slice(&[0x00, 0x00, 0x00]); // composition time
        buf.put_slice(&frame.payload);
        buf.freeze()
    }

    /// Build an audio media-tag body (`0xAF 0x01` + raw AAC frame).
    ///
    /// The caller is trusted to have stripped any ADTS header upstream.
    pub fn build_audio_tag(&self, data: &[u8]) -> Bytes {
        if data.is_empty() {
            return Bytes::new();
        }

        let mut buf = BytesMut::with_capacity(2 + data.len());
        buf.put_u8(audio_tag_header());
        buf.put_u8(0x01);
        buf.put_slice(data);
        buf.freeze()
    }

    fn build_avc_decoder_configuration_record(&self) -> Bytes {
        let mut record = BytesMut::with_capacity(11 + self.sps.len() + self.pps.len());
        record.put_u8(0x01); // configurationVersion
        record.put_u8(self.sps.get(1).copied().unwrap_or(0)); // AVCProfileIndication
        record.put_u8(self.sps.get(2).copied().unwrap_or(0)); // profile_compatibility
        record.put_u8(self.sps.get(3).copied().unwrap_or(0)); // AVCLevelIndication
        record.put_u8(0xFF); // lengthSizeMinusOne = 3

        record.put_u8(0xE1); // one SPS
        record.put_u16(self.sps.len() as u16);
        record.put_slice(&self.sps);

        record.put_u8(0x01); // one PPS
        record.put_u16(self.pps.len() as u16);
        record.put_slice(&self.pps);
        record.freeze()
    }
}

/// FLV AUDIODATA header byte. The rate/size/type bits are fixed; the
/// real values travel in the AudioSpecificConfig.
fn audio_tag_header() -> u8 {
    (SOUND_FORMAT_AAC << 4) | (SOUND_RATE_44K << 2) | (SOUND_SIZE_16BIT << 1) | SOUND_TYPE_STEREO
}

/// FLV VIDEODATA header byte: frame type nibble plus codec id nibble.
fn video_tag_header(codec: VideoCodecId, key_frame: bool) -> u8 {
    let frame_type = if key_frame { FRAME_KEY } else { FRAME_INTER };
    (frame_type << 4) | (codec.flv_id() & 0x0F)
}
