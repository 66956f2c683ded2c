//! H.264 Sequence Parameter Set (SPS) parsing

use crate::error::{CodecError, Result};
use crate::nal::{nal_type, remove_emulation_prevention, NAL_SPS};
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::io::Cursor;
use streamdemux_common::{FrameRate, Sar};

/// Fields of an SPS a demuxer reports.
#[derive(Debug, Clone, PartialEq)]
pub struct SpsInfo {
    pub profile_idc: u8,
    pub constraint_flags: u8,
    pub level_idc: u8,
    pub profile_string: String,
    pub level_string: String,
    pub chroma_format_idc: u8,
    pub chroma_format_string: String,
    pub bit_depth_luma: u8,
    pub bit_depth_chroma: u8,
    pub ref_frames: u32,
    pub frame_mbs_only: bool,
    /// Decoded size after cropping.
    pub codec_width: u32,
    pub codec_height: u32,
    /// Display size: codec width stretched by the sample aspect ratio.
    pub present_width: u32,
    pub present_height: u32,
    pub sar: Sar,
    /// From VUI timing info, when present.
    pub frame_rate: Option<FrameRate>,
    /// `avc1.PPCCLL`
    pub codec_string: String,
}

/// Table E-1 sample aspect ratios, indexed by `aspect_ratio_idc - 1`.
const SAR_TABLE: [(u32, u32); 16] = [
    (1, 1),
    (12, 11),
    (10, 11),
    (16, 11),
    (40, 33),
    (24, 11),
    (20, 11),
    (32, 11),
    (80, 33),
    (18, 11),
    (15, 11),
    (64, 33),
    (160, 99),
    (4, 3),
    (3, 2),
    (2, 1),
];

/// Profiles whose SPS carries chroma format and bit depth fields.
const HIGH_PROFILES: [u8; 11] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 144];

/// Parse an SPS NAL unit, header byte included.
pub fn parse_sps(data: &[u8]) -> Result<SpsInfo> {
    if data.len() < 4 {
        return Err(CodecError::truncated("sequence parameter set"));
    }
    if nal_type(data[0]) != NAL_SPS {
        return Err(CodecError::invalid(
            "sequence parameter set",
            format!("NAL type {} is not an SPS", nal_type(data[0])),
        ));
    }

    // Remove emulation prevention bytes for proper parsing
    let rbsp = remove_emulation_prevention(&data[1..]);
    let mut reader = RbspReader::new(&rbsp);

    let profile_idc = reader.bits(8)? as u8;
    let constraint_flags = reader.bits(8)? as u8;
    let level_idc = reader.bits(8)? as u8;

    // seq_parameter_set_id
    reader.ue()?;

    let mut chroma_format_idc = 1u8;
    let mut bit_depth_luma = 8u8;
    let mut bit_depth_chroma = 8u8;

    if HIGH_PROFILES.contains(&profile_idc) {
        chroma_format_idc = reader.ue()? as u8;
        if chroma_format_idc == 3 {
            // separate_colour_plane_flag
            reader.flag()?;
        }
        bit_depth_luma = (reader.ue()? + 8) as u8;
        bit_depth_chroma = (reader.ue()? + 8) as u8;

        // qpprime_y_zero_transform_bypass_flag
        reader.flag()?;

        // seq_scaling_matrix_present_flag
        if reader.flag()? {
            let lists = if chroma_format_idc == 3 { 12 } else { 8 };
            for i in 0..lists {
                if reader.flag()? {
                    skip_scaling_list(&mut reader, if i < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    // log2_max_frame_num_minus4
    reader.ue()?;

    let pic_order_cnt_type = reader.ue()?;
    if pic_order_cnt_type == 0 {
        // log2_max_pic_order_cnt_lsb_minus4
        reader.ue()?;
    } else if pic_order_cnt_type == 1 {
        reader.flag()?; // delta_pic_order_always_zero_flag
        reader.se()?; // offset_for_non_ref_pic
        reader.se()?; // offset_for_top_to_bottom_field
        let cycle = reader.ue()?;
        for _ in 0..cycle {
            reader.se()?; // offset_for_ref_frame
        }
    }

    let ref_frames = reader.ue()?;

    // gaps_in_frame_num_value_allowed_flag
    reader.flag()?;

    let pic_width_in_mbs_minus1 = reader.ue()?;
    let pic_height_in_map_units_minus1 = reader.ue()?;

    let frame_mbs_only = reader.flag()?;
    if !frame_mbs_only {
        // mb_adaptive_frame_field_flag
        reader.flag()?;
    }

    // direct_8x8_inference_flag
    reader.flag()?;

    let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0, 0, 0, 0);
    if reader.flag()? {
        crop_left = reader.ue()?;
        crop_right = reader.ue()?;
        crop_top = reader.ue()?;
        crop_bottom = reader.ue()?;
    }

    let mut sar = Sar::default();
    let mut frame_rate = None;

    // vui_parameters_present_flag
    if reader.flag()? {
        let vui = parse_vui(&mut reader)?;
        sar = vui.sar;
        frame_rate = vui.frame_rate;
    }

    let field_factor = if frame_mbs_only { 1 } else { 2 };
    let (crop_unit_x, crop_unit_y) = match chroma_format_idc {
        0 => (1, field_factor),
        1 => (2, 2 * field_factor),
        2 => (2, field_factor),
        _ => (1, field_factor),
    };

    let codec_width = ((pic_width_in_mbs_minus1 + 1) * 16)
        .saturating_sub((crop_left + crop_right) * crop_unit_x);
    let codec_height = (field_factor * (pic_height_in_map_units_minus1 + 1) * 16)
        .saturating_sub((crop_top + crop_bottom) * crop_unit_y);

    let present_width = if sar.width > 0 && sar.height > 0 {
        (codec_width as u64 * sar.width as u64).div_ceil(sar.height as u64) as u32
    } else {
        codec_width
    };

    Ok(SpsInfo {
        profile_idc,
        constraint_flags,
        level_idc,
        profile_string: profile_string(profile_idc).to_string(),
        level_string: format!("{:.1}", level_idc as f64 / 10.0),
        chroma_format_idc,
        chroma_format_string: chroma_format_string(chroma_format_idc).to_string(),
        bit_depth_luma,
        bit_depth_chroma,
        ref_frames,
        frame_mbs_only,
        codec_width,
        codec_height,
        present_width,
        present_height: codec_height,
        sar,
        frame_rate,
        codec_string: format!("avc1.{:02x}{:02x}{:02x}", profile_idc, constraint_flags, level_idc),
    })
}

pub fn profile_string(profile_idc: u8) -> &'static str {
    match profile_idc {
        66 => "Baseline",
        77 => "Main",
        88 => "Extended",
        100 => "High",
        110 => "High10",
        122 => "High422",
        244 => "High444",
        _ => "Unknown",
    }
}

pub fn chroma_format_string(chroma_format_idc: u8) -> &'static str {
    match chroma_format_idc {
        0 => "4:0:0",
        1 => "4:2:0",
        2 => "4:2:2",
        3 => "4:4:4",
        _ => "Unknown",
    }
}

struct Vui {
    sar: Sar,
    frame_rate: Option<FrameRate>,
}

/// Parse VUI parameters up to the timing info
fn parse_vui(reader: &mut RbspReader<'_>) -> Result<Vui> {
    let mut sar = Sar::default();

    // aspect_ratio_info_present_flag
    if reader.flag()? {
        let aspect_ratio_idc = reader.bits(8)?;
        if aspect_ratio_idc == 255 {
            // Extended_SAR
            sar = Sar {
                width: reader.bits(16)?,
                height: reader.bits(16)?,
            };
        } else if let Some((w, h)) = (aspect_ratio_idc as usize)
            .checked_sub(1)
            .and_then(|i| SAR_TABLE.get(i))
        {
            sar = Sar { width: *w, height: *h };
        }
    }

    // overscan_info_present_flag
    if reader.flag()? {
        reader.flag()?; // overscan_appropriate_flag
    }

    // video_signal_type_present_flag
    if reader.flag()? {
        reader.skip(4)?; // video_format, video_full_range_flag
        if reader.flag()? {
            // colour_primaries, transfer_characteristics, matrix_coefficients
            reader.skip(24)?;
        }
    }

    // chroma_loc_info_present_flag
    if reader.flag()? {
        reader.ue()?;
        reader.ue()?;
    }

    let mut frame_rate = None;

    // timing_info_present_flag
    if reader.flag()? {
        let num_units_in_tick = reader.bits(32)?;
        let time_scale = reader.bits(32)?;
        let fixed = reader.flag()?;
        if num_units_in_tick > 0 && time_scale > 0 {
            // Two field ticks per frame
            frame_rate = Some(FrameRate::from_ratio(time_scale, num_units_in_tick.saturating_mul(2), fixed));
        }
    }

    Ok(Vui { sar, frame_rate })
}

fn skip_scaling_list(reader: &mut RbspReader<'_>, size: usize) -> Result<()> {
    let mut last_scale = 8i32;
    let mut next_scale = 8i32;
    for _ in 0..size {
        if next_scale != 0 {
            let delta = reader.se()?;
            next_scale = (last_scale + delta + 256).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Ok(())
}

/// Exp-Golomb reader over RBSP bytes
struct RbspReader<'a> {
    inner: BitReader<Cursor<&'a [u8]>, BigEndian>,
}

impl<'a> RbspReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            inner: BitReader::endian(Cursor::new(data), BigEndian),
        }
    }

    fn bits(&mut self, n: u32) -> Result<u32> {
        self.inner.read::<u32>(n).map_err(|_| CodecError::truncated("sequence parameter set"))
    }

    fn flag(&mut self) -> Result<bool> {
        self.inner.read_bit().map_err(|_| CodecError::truncated("sequence parameter set"))
    }

    fn skip(&mut self, n: u32) -> Result<()> {
        self.inner.skip(n).map_err(|_| CodecError::truncated("sequence parameter set"))
    }

    /// Unsigned Exp-Golomb value
    fn ue(&mut self) -> Result<u32> {
        let mut leading_zeros = 0u32;
        while !self.flag()? {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(CodecError::Unsupported {
                    what: "Exp-Golomb code length",
                    value: leading_zeros,
                });
            }
        }
        if leading_zeros == 0 {
            return Ok(0);
        }
        let suffix = self.bits(leading_zeros)?;
        Ok(((1u64 << leading_zeros) - 1 + suffix as u64) as u32)
    }

    /// Signed Exp-Golomb value
    fn se(&mut self) -> Result<i32> {
        let code = self.ue()? as i64;
        let magnitude = (code + 1) / 2;
        Ok(if code % 2 == 1 { magnitude as i32 } else { -(magnitude as i32) })
    }
}
