//! 8-bit and 16-bit integer layouts.

use rgb::{ComponentBytes, Rgba};

use super::{decode_alpha, decode_unorm, encode_alpha, encode_unorm, luma8, luma_f32};

// ── Luminance / alpha / red-green ───────────────────────────────────

pub(crate) fn unpack_l8(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, &l) in dst.iter_mut().zip(src) {
        *px = Rgba::new(l, l, l, 255);
    }
}

pub(crate) fn pack_l8(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.iter_mut().zip(src) {
        *out = luma8(px.r, px.g, px.b);
    }
}

pub(crate) fn unpack_l8_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, &l) in dst.iter_mut().zip(src) {
        let v = decode_unorm(u32::from(l), 255, gamma);
        *px = Rgba::new(v, v, v, 1.0);
    }
}

pub(crate) fn pack_l8_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.iter_mut().zip(src) {
        *out = encode_unorm(luma_f32(px.r, px.g, px.b), 255, gamma) as u8;
    }
}

pub(crate) fn unpack_a8(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, &a) in dst.iter_mut().zip(src) {
        *px = Rgba::new(0, 0, 0, a);
    }
}

pub(crate) fn pack_a8(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.iter_mut().zip(src) {
        *out = px.a;
    }
}

pub(crate) fn unpack_a8_f32(src: &[u8], dst: &mut [Rgba<f32>], _gamma: bool) {
    for (px, &a) in dst.iter_mut().zip(src) {
        *px = Rgba::new(0.0, 0.0, 0.0, decode_alpha(u32::from(a), 255));
    }
}

pub(crate) fn pack_a8_f32(src: &[Rgba<f32>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.iter_mut().zip(src) {
        *out = encode_alpha(px.a, 255) as u8;
    }
}

pub(crate) fn unpack_la8(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, la) in dst.iter_mut().zip(src.chunks_exact(2)) {
        *px = Rgba::new(la[0], la[0], la[0], la[1]);
    }
}

pub(crate) fn pack_la8(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        out[0] = luma8(px.r, px.g, px.b);
        out[1] = px.a;
    }
}

pub(crate) fn unpack_la8_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, la) in dst.iter_mut().zip(src.chunks_exact(2)) {
        let v = decode_unorm(u32::from(la[0]), 255, gamma);
        *px = Rgba::new(v, v, v, decode_alpha(u32::from(la[1]), 255));
    }
}

pub(crate) fn pack_la8_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        out[0] = encode_unorm(luma_f32(px.r, px.g, px.b), 255, gamma) as u8;
        out[1] = encode_alpha(px.a, 255) as u8;
    }
}

pub(crate) fn unpack_r8(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, &r) in dst.iter_mut().zip(src) {
        *px = Rgba::new(r, 0, 0, 255);
    }
}

pub(crate) fn pack_r8(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.iter_mut().zip(src) {
        *out = px.r;
    }
}

pub(crate) fn unpack_r8_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, &r) in dst.iter_mut().zip(src) {
        *px = Rgba::new(decode_unorm(u32::from(r), 255, gamma), 0.0, 0.0, 1.0);
    }
}

pub(crate) fn pack_r8_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.iter_mut().zip(src) {
        *out = encode_unorm(px.r, 255, gamma) as u8;
    }
}

pub(crate) fn unpack_rg8(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, rg) in dst.iter_mut().zip(src.chunks_exact(2)) {
        *px = Rgba::new(rg[0], rg[1], 0, 255);
    }
}

pub(crate) fn pack_rg8(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        out[0] = px.r;
        out[1] = px.g;
    }
}

pub(crate) fn unpack_rg8_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, rg) in dst.iter_mut().zip(src.chunks_exact(2)) {
        *px = Rgba::new(
            decode_unorm(u32::from(rg[0]), 255, gamma),
            decode_unorm(u32::from(rg[1]), 255, gamma),
            0.0,
            1.0,
        );
    }
}

pub(crate) fn pack_rg8_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(2).zip(src) {
        out[0] = encode_unorm(px.r, 255, gamma) as u8;
        out[1] = encode_unorm(px.g, 255, gamma) as u8;
    }
}

// ── 3- and 4-channel byte layouts ───────────────────────────────────
//
// Const parameters are the byte offsets of each channel inside a pixel.

pub(crate) fn unpack_3x8<const R: usize, const G: usize, const B: usize>(
    src: &[u8],
    dst: &mut [Rgba<u8>],
    _gamma: bool,
) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(3)) {
        *px = Rgba::new(c[R], c[G], c[B], 255);
    }
}

pub(crate) fn pack_3x8<const R: usize, const G: usize, const B: usize>(
    src: &[Rgba<u8>],
    dst: &mut [u8],
    _gamma: bool,
) {
    for (out, px) in dst.chunks_exact_mut(3).zip(src) {
        out[R] = px.r;
        out[G] = px.g;
        out[B] = px.b;
    }
}

pub(crate) fn unpack_3x8_f32<const R: usize, const G: usize, const B: usize>(
    src: &[u8],
    dst: &mut [Rgba<f32>],
    gamma: bool,
) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(3)) {
        *px = Rgba::new(
            decode_unorm(u32::from(c[R]), 255, gamma),
            decode_unorm(u32::from(c[G]), 255, gamma),
            decode_unorm(u32::from(c[B]), 255, gamma),
            1.0,
        );
    }
}

pub(crate) fn pack_3x8_f32<const R: usize, const G: usize, const B: usize>(
    src: &[Rgba<f32>],
    dst: &mut [u8],
    gamma: bool,
) {
    for (out, px) in dst.chunks_exact_mut(3).zip(src) {
        out[R] = encode_unorm(px.r, 255, gamma) as u8;
        out[G] = encode_unorm(px.g, 255, gamma) as u8;
        out[B] = encode_unorm(px.b, 255, gamma) as u8;
    }
}

pub(crate) fn unpack_4x8<const R: usize, const G: usize, const B: usize, const A: usize>(
    src: &[u8],
    dst: &mut [Rgba<u8>],
    _gamma: bool,
) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(4)) {
        *px = Rgba::new(c[R], c[G], c[B], c[A]);
    }
}

pub(crate) fn pack_4x8<const R: usize, const G: usize, const B: usize, const A: usize>(
    src: &[Rgba<u8>],
    dst: &mut [u8],
    _gamma: bool,
) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src) {
        out[R] = px.r;
        out[G] = px.g;
        out[B] = px.b;
        out[A] = px.a;
    }
}

pub(crate) fn unpack_4x8_f32<const R: usize, const G: usize, const B: usize, const A: usize>(
    src: &[u8],
    dst: &mut [Rgba<f32>],
    gamma: bool,
) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(4)) {
        *px = Rgba::new(
            decode_unorm(u32::from(c[R]), 255, gamma),
            decode_unorm(u32::from(c[G]), 255, gamma),
            decode_unorm(u32::from(c[B]), 255, gamma),
            decode_alpha(u32::from(c[A]), 255),
        );
    }
}

pub(crate) fn pack_4x8_f32<const R: usize, const G: usize, const B: usize, const A: usize>(
    src: &[Rgba<f32>],
    dst: &mut [u8],
    gamma: bool,
) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src) {
        out[R] = encode_unorm(px.r, 255, gamma) as u8;
        out[G] = encode_unorm(px.g, 255, gamma) as u8;
        out[B] = encode_unorm(px.b, 255, gamma) as u8;
        out[A] = encode_alpha(px.a, 255) as u8;
    }
}

/// Like [`unpack_4x8`] but byte `X` is padding and alpha reads as opaque.
pub(crate) fn unpack_4x8_opaque<const R: usize, const G: usize, const B: usize, const X: usize>(
    src: &[u8],
    dst: &mut [Rgba<u8>],
    _gamma: bool,
) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(4)) {
        *px = Rgba::new(c[R], c[G], c[B], 255);
    }
}

pub(crate) fn pack_4x8_opaque<const R: usize, const G: usize, const B: usize, const X: usize>(
    src: &[Rgba<u8>],
    dst: &mut [u8],
    _gamma: bool,
) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src) {
        out[R] = px.r;
        out[G] = px.g;
        out[B] = px.b;
        out[X] = 255;
    }
}

pub(crate) fn unpack_4x8_opaque_f32<
    const R: usize,
    const G: usize,
    const B: usize,
    const X: usize,
>(
    src: &[u8],
    dst: &mut [Rgba<f32>],
    gamma: bool,
) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(4)) {
        *px = Rgba::new(
            decode_unorm(u32::from(c[R]), 255, gamma),
            decode_unorm(u32::from(c[G]), 255, gamma),
            decode_unorm(u32::from(c[B]), 255, gamma),
            1.0,
        );
    }
}

pub(crate) fn pack_4x8_opaque_f32<
    const R: usize,
    const G: usize,
    const B: usize,
    const X: usize,
>(
    src: &[Rgba<f32>],
    dst: &mut [u8],
    gamma: bool,
) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src) {
        out[R] = encode_unorm(px.r, 255, gamma) as u8;
        out[G] = encode_unorm(px.g, 255, gamma) as u8;
        out[B] = encode_unorm(px.b, 255, gamma) as u8;
        out[X] = 255;
    }
}

// ── Canonical layouts with fast paths ───────────────────────────────

pub(crate) fn unpack_rgba8(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    let n = dst.len() * 4;
    dst.as_bytes_mut().copy_from_slice(&src[..n]);
}

pub(crate) fn pack_rgba8(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    let n = src.len() * 4;
    dst[..n].copy_from_slice(src.as_bytes());
}

pub(crate) fn unpack_bgra8(src: &[u8], dst: &mut [Rgba<u8>], gamma: bool) {
    #[cfg(feature = "simd")]
    {
        let n = dst.len() * 4;
        if garb::bytes::rgba_to_bgra(&src[..n], dst.as_bytes_mut()).is_ok() {
            return;
        }
    }
    unpack_4x8::<2, 1, 0, 3>(src, dst, gamma);
}

pub(crate) fn pack_bgra8(src: &[Rgba<u8>], dst: &mut [u8], gamma: bool) {
    #[cfg(feature = "simd")]
    {
        let n = src.len() * 4;
        if garb::bytes::rgba_to_bgra(src.as_bytes(), &mut dst[..n]).is_ok() {
            return;
        }
    }
    pack_4x8::<2, 1, 0, 3>(src, dst, gamma);
}

// ── 16-bit integer layouts (native endian) ──────────────────────────

#[inline]
fn read_u16(bytes: &[u8], i: usize) -> u16 {
    u16::from_ne_bytes([bytes[i * 2], bytes[i * 2 + 1]])
}

#[inline]
fn write_u16(bytes: &mut [u8], i: usize, v: u16) {
    bytes[i * 2..i * 2 + 2].copy_from_slice(&v.to_ne_bytes());
}

#[inline]
fn narrow16(v: u16) -> u8 {
    ((u32::from(v) * 255 + 32767) / 65535) as u8
}

#[inline]
fn widen8(v: u8) -> u16 {
    u16::from(v) * 257
}

pub(crate) fn unpack_la16(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, la) in dst.iter_mut().zip(src.chunks_exact(4)) {
        let l = narrow16(read_u16(la, 0));
        *px = Rgba::new(l, l, l, narrow16(read_u16(la, 1)));
    }
}

pub(crate) fn pack_la16(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src) {
        write_u16(out, 0, widen8(luma8(px.r, px.g, px.b)));
        write_u16(out, 1, widen8(px.a));
    }
}

pub(crate) fn unpack_la16_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, la) in dst.iter_mut().zip(src.chunks_exact(4)) {
        let l = decode_unorm(u32::from(read_u16(la, 0)), 65535, gamma);
        *px = Rgba::new(l, l, l, decode_alpha(u32::from(read_u16(la, 1)), 65535));
    }
}

pub(crate) fn pack_la16_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src) {
        let l = encode_unorm(luma_f32(px.r, px.g, px.b), 65535, gamma) as u16;
        write_u16(out, 0, l);
        write_u16(out, 1, encode_alpha(px.a, 65535) as u16);
    }
}

pub(crate) fn unpack_rgba16(src: &[u8], dst: &mut [Rgba<u8>], _gamma: bool) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(8)) {
        *px = Rgba::new(
            narrow16(read_u16(c, 0)),
            narrow16(read_u16(c, 1)),
            narrow16(read_u16(c, 2)),
            narrow16(read_u16(c, 3)),
        );
    }
}

pub(crate) fn pack_rgba16(src: &[Rgba<u8>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(8).zip(src) {
        write_u16(out, 0, widen8(px.r));
        write_u16(out, 1, widen8(px.g));
        write_u16(out, 2, widen8(px.b));
        write_u16(out, 3, widen8(px.a));
    }
}

pub(crate) fn unpack_rgba16_f32(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(8)) {
        *px = Rgba::new(
            decode_unorm(u32::from(read_u16(c, 0)), 65535, gamma),
            decode_unorm(u32::from(read_u16(c, 1)), 65535, gamma),
            decode_unorm(u32::from(read_u16(c, 2)), 65535, gamma),
            decode_alpha(u32::from(read_u16(c, 3)), 65535),
        );
    }
}

pub(crate) fn pack_rgba16_f32(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(8).zip(src) {
        write_u16(out, 0, encode_unorm(px.r, 65535, gamma) as u16);
        write_u16(out, 1, encode_unorm(px.g, 65535, gamma) as u16);
        write_u16(out, 2, encode_unorm(px.b, 65535, gamma) as u16);
        write_u16(out, 3, encode_alpha(px.a, 65535) as u16);
    }
}
