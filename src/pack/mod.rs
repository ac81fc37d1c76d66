//! Row unpack/pack callables referenced by the format registry.
//!
//! Each callable converts one row between a format's byte layout and the
//! canonical RGBA representation, 8-bit ([`Rgba<u8>`](rgb::Rgba)) or float
//! ([`Rgba<f32>`](rgb::Rgba)). Row length is taken from the pixel slice; the
//! byte slice must be at least `len * bytes_per_pixel` long.
//!
//! Gamma handling:
//! - 8-bit layouts to and from 8-bit canonical copy encoded values and ignore
//!   the flag.
//! - Integer layouts to and from float canonical normalize to `0.0..=1.0` and,
//!   when `gamma` is set, move RGB (never alpha) through the sRGB transfer.
//! - Float and half layouts are linear and ignore the flag.

pub(crate) mod float;
pub(crate) mod half;
pub(crate) mod packed;
pub(crate) mod uint;

use linear_srgb::default::{linear_to_srgb, srgb_to_linear};

/// Integer sample with `max` as full scale, to float canonical.
#[inline]
pub(crate) fn decode_unorm(value: u32, max: u32, gamma: bool) -> f32 {
    let v = value as f32 / max as f32;
    if gamma { srgb_to_linear(v) } else { v }
}

/// Float canonical to an integer sample with `max` as full scale.
#[inline]
pub(crate) fn encode_unorm(value: f32, max: u32, gamma: bool) -> u32 {
    let v = if gamma { linear_to_srgb(value.clamp(0.0, 1.0)) } else { value };
    // NaN maps to zero through the saturating cast.
    (v.clamp(0.0, 1.0) * max as f32 + 0.5) as u32
}

/// Alpha channels never go through the transfer curve.
#[inline]
pub(crate) fn decode_alpha(value: u32, max: u32) -> f32 {
    decode_unorm(value, max, false)
}

#[inline]
pub(crate) fn encode_alpha(value: f32, max: u32) -> u32 {
    encode_unorm(value, max, false)
}

/// Rec. 601 luma of an 8-bit RGB triple.
#[inline]
pub(crate) fn luma8(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}

#[inline]
pub(crate) fn luma_f32(r: f32, g: f32, b: f32) -> f32 {
    r * 0.299 + g * 0.587 + b * 0.114
}

/// Rescale an `n`-bit value to 8 bits with rounding.
#[inline]
pub(crate) fn expand_bits(value: u32, bits: u32) -> u8 {
    let max = (1u32 << bits) - 1;
    ((value * 255 + max / 2) / max) as u8
}

/// Rescale an 8-bit value to `n` bits with rounding.
#[inline]
pub(crate) fn quantize_bits(value: u8, bits: u32) -> u32 {
    let max = (1u32 << bits) - 1;
    (u32::from(value) * max + 127) / 255
}
