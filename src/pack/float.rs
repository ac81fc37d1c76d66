//! 32-bit float layouts. Values are linear and pass through unclamped.

use rgb::Rgba;

use super::luma_f32;

#[inline]
fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Channels beyond `C` read as zero, alpha as one.
pub(crate) fn unpack_float<const C: usize>(src: &[u8], dst: &mut [Rgba<f32>], _gamma: bool) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(C * 4)) {
        let mut v = [0.0, 0.0, 0.0, 1.0];
        for (i, f) in c.chunks_exact(4).enumerate() {
            v[i] = read_f32(f);
        }
        *px = Rgba::new(v[0], v[1], v[2], v[3]);
    }
}

pub(crate) fn pack_float<const C: usize>(src: &[Rgba<f32>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(C * 4).zip(src) {
        let v = [px.r, px.g, px.b, px.a];
        for (f, value) in out.chunks_exact_mut(4).zip(v) {
            f.copy_from_slice(&value.to_ne_bytes());
        }
    }
}

pub(crate) fn unpack_l32f(src: &[u8], dst: &mut [Rgba<f32>], _gamma: bool) {
    for (px, f) in dst.iter_mut().zip(src.chunks_exact(4)) {
        let l = read_f32(f);
        *px = Rgba::new(l, l, l, 1.0);
    }
}

pub(crate) fn pack_l32f(src: &[Rgba<f32>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src) {
        out.copy_from_slice(&luma_f32(px.r, px.g, px.b).to_ne_bytes());
    }
}
