//! HEVC SPS field harvesting and decoder configuration records.
//!
//! The RTMP sequence header for H.265 carries an `hvcC` box whose
//! profile/tier/level, chroma and bit-depth fields come from the SPS.
//! Only the fields the record needs are kept; everything else is read
//! to preserve bitstream alignment and discarded.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::bits::{hevc_rbsp, BitReader};
use crate::nal::HevcNalType;

/// Fields harvested from an HEVC sequence parameter set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HevcSpsSummary {
    pub max_sub_layers_minus1: u32,
    pub temporal_id_nested: bool,
    pub profile_space: u32,
    pub tier_flag: u32,
    pub profile_idc: u32,
    pub profile_compatibility_flags: u32,
    pub constraint_indicator_flags: u64,
    pub level_idc: u32,
    pub chroma_format_idc: u32,
    pub bit_depth_luma_minus8: u32,
    pub bit_depth_chroma_minus8: u32,
}

/// Parse the leading fields of an HEVC SPS NAL unit.
///
/// `sps` is the full NAL unit including its 2-byte header. Returns
/// `None` when the unit is too short to contain an RBSP.
pub fn parse_sps_summary(sps: &[u8]) -> Option<HevcSpsSummary> {
    let rbsp = hevc_rbsp(sps);
    if rbsp.is_empty() {
        return None;
    }

    let mut reader = BitReader::new(&rbsp);
    let mut summary = HevcSpsSummary::default();

    reader.read_bits(4); // sps_video_parameter_set_id
    summary.max_sub_layers_minus1 = reader.read_bits(3);
    summary.temporal_id_nested = reader.read_bit() == 1;

    // profile_tier_level
    summary.profile_space = reader.read_bits(2);
    summary.tier_flag = reader.read_bit();
    summary.profile_idc = reader.read_bits(5);
    summary.profile_compatibility_flags = reader.read_bits(32);
    summary.constraint_indicator_flags = reader.read_bits_long(48);
    summary.level_idc = reader.read_bits(8);

    let sub_layers = summary.max_sub_layers_minus1 as usize;
    let mut profile_present = vec![false; sub_layers];
    let mut level_present = vec![false; sub_layers];
    for i in 0..sub_layers {
        profile_present[i] = reader.read_bit() == 1;
        level_present[i] = reader.read_bit() == 1;
    }
    if sub_layers > 0 {
        for _ in sub_layers..8 {
            reader.read_bits(2); // reserved_zero_2bits
        }
    }
    for i in 0..sub_layers {
        if profile_present[i] {
            reader.read_bits(2);
            reader.read_bits(1);
            reader.read_bits(5);
            reader.read_bits(32);
            reader.read_bits_long(48);
        }
        if level_present[i] {
            reader.read_bits(8);
        }
    }

    reader.read_ue(); // sps_seq_parameter_set_id
    summary.chroma_format_idc = reader.read_ue();
    if summary.chroma_format_idc == 3 {
        reader.read_bit(); // separate_colour_plane_flag
    }

    reader.read_ue(); // pic_width_in_luma_samples
    reader.read_ue(); // pic_height_in_luma_samples

    if reader.read_bit() == 1 {
        // conformance window offsets
        reader.read_ue();
        reader.read_ue();
        reader.read_ue();
        reader.read_ue();
    }

    summary.bit_depth_luma_minus8 = reader.read_ue();
    summary.bit_depth_chroma_minus8 = reader.read_ue();

    Some(summary)
}

/// Build an HEVC decoder configuration record (`hvcC`) from raw
/// VPS/SPS/PPS NAL units.
pub fn build_hevc_decoder_configuration_record(
    vps: &[u8],
    sps: &[u8],
    pps: &[u8],
) -> Option<Bytes> {
    let summary = parse_sps_summary(sps)?;

    debug!(
        profile_idc = summary.profile_idc,
        level_idc = summary.level_idc,
        chroma_format_idc = summary.chroma_format_idc,
        "building hvcC record"
    );

    let mut record = BytesMut::with_capacity(38 + vps.len() + sps.len() + pps.len());

    record.put_u8(0x01); // configurationVersion
    record.put_u8(
        ((summary.profile_space as u8) << 6)
            | ((summary.tier_flag as u8) << 5)
            | (summary.profile_idc as u8 & 0x1F),
    );
    record.put_u32(summary.profile_compatibility_flags);
    for shift in (0..=40).rev().step_by(8) {
        record.put_u8(((summary.constraint_indicator_flags >> shift) & 0xFF) as u8);
    }
    record.put_u8(summary.level_idc as u8);

    let min_spatial_segmentation: u16 = 0x0FFF;
    record.put_u16(0xF000 | min_spatial_segmentation);
    record.put_u8(0xFC); // parallelismType = 0
    record.put_u8(0xFC | (summary.chroma_format_idc as u8 & 0x03));
    record.put_u8(0xF8 | (summary.bit_depth_luma_minus8 as u8 & 0x07));
    record.put_u8(0xF8 | (summary.bit_depth_chroma_minus8 as u8 & 0x07));

    record.put_u16(0x0000); // avgFrameRate

    let num_temporal_layers = (summary.max_sub_layers_minus1 + 1).min(7) as u8;
    let flags = (num_temporal_layers << 3)
        | (if summary.temporal_id_nested { 1 << 2 } else { 0 })
        | 0x03; // constantFrameRate = 0, lengthSizeMinusOne = 3
    record.put_u8(flags);

    record.put_u8(0x03); // numOfArrays

    let mut append_array = |nal_type: HevcNalType, nal: &[u8]| {
        record.put_u8((1 << 7) | (nal_type as u8 & 0x3F));
        record.put_u16(0x0001); // numNalus
        record.put_u16(nal.len() as u16);
        record.put_slice(nal);
    };
    append_array(HevcNalType::Vps, vps);
    append_array(HevcNalType::Sps, sps);
    append_array(HevcNalType::Pps, pps);

    Some(record.freeze())
}
