//! Bit-packed 16-bit layouts. One native-endian `u16` per pixel, first-named
//! channel in the most significant bits.

use rgb::Rgba;

use super::{decode_alpha, decode_unorm, encode_alpha, encode_unorm, expand_bits, quantize_bits};

#[inline]
fn words(src: &[u8]) -> impl Iterator<Item = u16> + '_ {
    src.chunks_exact(2).map(|w| u16::from_ne_bytes([w[0], w[1]]))
}

#[inline]
fn field(word: u16, shift: u32, bits: u32) -> u32 {
    (u32::from(word) >> shift) & ((1 << bits) - 1)
}

pub(crate) fn unpack_rgb565(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, w) in dst.iter_mut().zip(words(src)) {
        *px = Rgba::new(
            expand_bits(field(w, 11, 5), 5),
            expand_bits(field(w, 5, 6), 6),
            expand_bits(field(w, 0, 5), 5),
            255,
        );
    }
}

pub(crate) fn pack_rgb565(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        let w = quantize_bits(px.r, 5) << 11 | quantize_bits(px.g, 6) << 5 | quantize_bits(px.b, 5);
        out.copy_from_slice(&(w as u16).to_ne_bytes());
    }
}

pub(crate) fn unpack_rgb565_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, w) in dst.iter_mut().zip(words(src)) {
        *px = Rgba::new(
            decode_unorm(field(w, 11, 5), 31, gamma),
            decode_unorm(field(w, 5, 6), 63, gamma),
            decode_unorm(field(w, 0, 5), 31, gamma),
            1.0,
        );
    }
}

pub(crate) fn pack_rgb565_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        let w = encode_unorm(px.r, 31, gamma) << 11
            | encode_unorm(px.g, 63, gamma) << 5
            | encode_unorm(px.b, 31, gamma);
        out.copy_from_slice(&(w as u16).to_ne_bytes());
    }
}

pub(crate) fn unpack_rgba4444(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, w) in dst.iter_mut().zip(words(src)) {
        *px = Rgba::new(
            expand_bits(field(w, 12, 4), 4),
            expand_bits(field(w, 8, 4), 4),
            expand_bits(field(w, 4, 4), 4),
            expand_bits(field(w, 0, 4), 4),
        );
    }
}

pub(crate) fn pack_rgba4444(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        let w = quantize_bits(px.r, 4) << 12
            | quantize_bits(px.g, 4) << 8
            | quantize_bits(px.b, 4) << 4
            | quantize_bits(px.a, 4);
        out.copy_from_slice(&(w as u16).to_ne_bytes());
    }
}

pub(crate) fn unpack_rgba4444_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, w) in dst.iter_mut().zip(words(src)) {
        *px = Rgba::new(
            decode_unorm(field(w, 12, 4), 15, gamma),
            decode_unorm(field(w, 8, 4), 15, gamma),
            decode_unorm(field(w, 4, 4), 15, gamma),
            decode_alpha(field(w, 0, 4), 15),
        );
    }
}

pub(crate) fn pack_rgba4444_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        let w = encode_unorm(px.r, 15, gamma) << 12
            | encode_unorm(px.g, 15, gamma) << 8
            | encode_unorm(px.b, 15, gamma) << 4
            | encode_alpha(px.a, 15);
        out.copy_from_slice(&(w as u16).to_ne_bytes());
    }
}

pub(crate) fn unpack_rgba5551(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, w) in dst.iter_mut().zip(words(src)) {
        *px = Rgba::new(
            expand_bits(field(w, 11, 5), 5),
            expand_bits(field(w, 6, 5), 5),
            expand_bits(field(w, 1, 5), 5),
            if w & 1 != 0 { 255 } else { 0 },
        );
    }
}

pub(crate) fn pack_rgba5551(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        let w = quantize_bits(px.r, 5) << 11
            | quantize_bits(px.g, 5) << 6
            | quantize_bits(px.b, 5) << 1
            | u32::from(px.a >= 128);
        out.copy_from_slice(&(w as u16).to_ne_bytes());
    }
}

pub(crate) fn unpack_rgba5551_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, w) in dst.iter_mut().zip(words(src)) {
        *px = Rgba::new(
            decode_unorm(field(w, 11, 5), 31, gamma),
            decode_unorm(field(w, 6, 5), 31, gamma),
            decode_unorm(field(w, 1, 5), 31, gamma),
            decode_alpha(field(w, 0, 1), 1),
        );
    }
}

pub(crate) fn pack_rgba5551_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        let w = encode_unorm(px.r, 31, gamma) << 11
            | encode_unorm(px.g, 31, gamma) << 6
            | encode_unorm(px.b, 31, gamma) << 1
            | encode_alpha(px.a, 1);
        out.copy_from_slice(&(w as u16).to_ne_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(bytes: &[u8]) -> u16 {
        u16::from_ne_bytes([bytes[0], bytes[1]])
    }

    #[test]
    fn rgb565_bit_positions() {
        let mut bytes = [0u8; 2];
        pack_rgb565(&[Rgba::new(255, 0, 0, 255)], &mut bytes, false);
        assert_eq!(word(&bytes), 0xF800);
        pack_rgb565(&[Rgba::new(0, 255, 0, 255)], &mut bytes, false);
        assert_eq!(word(&bytes), 0x07E0);
        pack_rgb565(&[Rgba::new(0, 0, 255, 255)], &mut bytes, false);
        assert_eq!(word(&bytes), 0x001F);
    }

    #[test]
    fn rgba4444_and_5551_bit_positions() {
        let mut bytes = [0u8; 2];
        pack_rgba4444(&[Rgba::new(255, 0, 255, 0)], &mut bytes, false);
        assert_eq!(word(&bytes), 0xF0F0);
        pack_rgba5551(&[Rgba::new(0, 0, 0, 255)], &mut bytes, false);
        assert_eq!(word(&bytes), 0x0001);
        pack_rgba5551(&[Rgba::new(255, 255, 255, 10)], &mut bytes, false);
        assert_eq!(word(&bytes), 0xFFFE);
    }

    #[test]
    fn quantized_values_are_fixed_points() {
        let mut bytes = [0u8; 2];
        let mut back = [Rgba::new(0u8, 0, 0, 0)];
        for v in 0..32u32 {
            let c = expand_bits(v, 5);
            let px = Rgba::new(c, c, c, 255);
            pack_rgb565(&[px], &mut bytes, false);
            unpack_rgb565(&bytes, &mut back, false);
            assert_eq!(back[0].r, c);
            assert_eq!(back[0].b, c);
        }
    }

    #[test]
    fn float_path_matches_integer_path_without_gamma() {
        let src = 0xA5C3u16.to_ne_bytes();
        let mut ints = [Rgba::new(0u8, 0, 0, 0)];
        let mut floats = [Rgba::new(0.0f32, 0.0, 0.0, 0.0)];
        unpack_rgba4444(&src, &mut ints, false);
        unpack_rgba4444_f32(&src, &mut floats, false);
        assert!((f32::from(ints[0].g) / 255.0 - floats[0].g).abs() < 1e-6);
        assert!((f32::from(ints[0].a) / 255.0 - floats[0].a).abs() < 1e-6);
    }
}
