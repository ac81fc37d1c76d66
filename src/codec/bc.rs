//! BC1/BC2/BC3/BC5 (DXT1, DXT3, DXT5, DXN2). All fields little-endian.

use rgb::Rgba;

use super::{BlockDecoder, BlockEncoder, CompressionQuality, rgb_error};
use crate::pack::{expand_bits, quantize_bits};

pub(crate) struct Bc1;
pub(crate) struct Bc2;
pub(crate) struct Bc3;
pub(crate) struct Bc5;

impl BlockDecoder for Bc1 {
    const BLOCK_BYTES: usize = 8;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_color(block, false, out);
    }
}

impl BlockEncoder for Bc1 {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        encode_color(pixels, &mut out[..8], false, quality);
    }
}

impl BlockDecoder for Bc2 {
    const BLOCK_BYTES: usize = 16;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_color(&block[8..], true, out);
        let bits = read_u64(&block[..8]);
        for (i, px) in out.iter_mut().enumerate() {
            px.a = expand_bits(((bits >> (4 * i)) & 0xF) as u32, 4);
        }
    }
}

impl BlockEncoder for Bc2 {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        let bits = pixels
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, px)| acc | u64::from(quantize_bits(px.a, 4)) << (4 * i));
        out[..8].copy_from_slice(&bits.to_le_bytes());
        encode_color(pixels, &mut out[8..16], true, quality);
    }
}

impl BlockDecoder for Bc3 {
    const BLOCK_BYTES: usize = 16;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_color(&block[8..], true, out);
        let mut alpha = [0u8; 16];
        decode_interpolated(&block[..8], &mut alpha);
        for (px, a) in out.iter_mut().zip(alpha) {
            px.a = a;
        }
    }
}

impl BlockEncoder for Bc3 {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        encode_interpolated(&pixels.map(|p| p.a), &mut out[..8], quality);
        encode_color(pixels, &mut out[8..16], true, quality);
    }
}

impl BlockDecoder for Bc5 {
    const BLOCK_BYTES: usize = 16;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        let (mut red, mut green) = ([0u8; 16], [0u8; 16]);
        decode_interpolated(&block[..8], &mut red);
        decode_interpolated(&block[8..16], &mut green);
        for (i, px) in out.iter_mut().enumerate() {
            *px = Rgba::new(red[i], green[i], 0, 255);
        }
    }
}

impl BlockEncoder for Bc5 {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        encode_interpolated(&pixels.map(|p| p.r), &mut out[..8], quality);
        encode_interpolated(&pixels.map(|p| p.g), &mut out[8..16], quality);
    }
}

#[inline]
fn read_u64(bytes: &[u8]) -> u64 {
    let mut b = [0u8; 8];
    b[..bytes.len().min(8)].copy_from_slice(&bytes[..bytes.len().min(8)]);
    u64::from_le_bytes(b)
}

// ── Color endpoints ─────────────────────────────────────────────────

fn decode_565(c: u16) -> Rgba<u8> {
    let c = u32::from(c);
    Rgba::new(
        expand_bits(c >> 11, 5),
        expand_bits((c >> 5) & 0x3F, 6),
        expand_bits(c & 0x1F, 5),
        255,
    )
}

fn encode_565(c: [f32; 3]) -> u16 {
    let q = |v: f32, bits| quantize_bits(v.clamp(0.0, 255.0).round() as u8, bits);
    (q(c[0], 5) << 11 | q(c[1], 6) << 5 | q(c[2], 5)) as u16
}

fn mix(a: Rgba<u8>, b: Rgba<u8>, wa: u32, wb: u32) -> Rgba<u8> {
    let div = wa + wb;
    let f = |x: u8, y: u8| ((wa * u32::from(x) + wb * u32::from(y) + div / 2) / div) as u8;
    Rgba::new(f(a.r, b.r), f(a.g, b.g), f(a.b, b.b), 255)
}

/// Palette of a color block. `four_only` blocks (BC2/BC3) ignore endpoint
/// order; BC1 switches to three colors plus transparent when `c0 <= c1`.
fn color_palette(c0: u16, c1: u16, four_only: bool) -> [Rgba<u8>; 4] {
    let (a, b) = (decode_565(c0), decode_565(c1));
    if four_only || c0 > c1 {
        [a, b, mix(a, b, 2, 1), mix(a, b, 1, 2)]
    } else {
        [a, b, mix(a, b, 1, 1), Rgba::new(0, 0, 0, 0)]
    }
}

fn decode_color(block: &[u8], four_only: bool, out: &mut [Rgba<u8>; 16]) {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let palette = color_palette(c0, c1, four_only);
    for (i, px) in out.iter_mut().enumerate() {
        *px = palette[(indices >> (2 * i)) as usize & 3];
    }
}

#[derive(Clone, Copy)]
struct ColorFit {
    c0: u16,
    c1: u16,
    indices: u32,
    error: u32,
    /// Palette is in three-color mode.
    three: bool,
}

/// Order the endpoints for the requested mode and pick the nearest palette
/// entry for every pixel. Bits set in `transparent` get index 3 in
/// three-color mode.
fn assign(
    pixels: &[Rgba<u8>; 16],
    transparent: u16,
    mut c0: u16,
    mut c1: u16,
    three: bool,
    four_only: bool,
) -> ColorFit {
    if !four_only && three == (c0 > c1) {
        core::mem::swap(&mut c0, &mut c1);
    }
    let palette = color_palette(c0, c1, four_only);
    let three = !four_only && c0 <= c1;
    let usable = if three { 3 } else { 4 };

    let (mut indices, mut error) = (0u32, 0u32);
    for (i, &px) in pixels.iter().enumerate() {
        if transparent & (1 << i) != 0 {
            indices |= 3 << (2 * i);
            continue;
        }
        let (idx, err) = (0..usable)
            .map(|k| (k, rgb_error(palette[k], px)))
            .min_by_key(|&(_, e)| e)
            .unwrap_or((0, 0));
        indices |= (idx as u32) << (2 * i);
        error += err;
    }
    ColorFit {
        c0,
        c1,
        indices,
        error,
        three,
    }
}

/// Least-squares endpoints for the current index assignment.
fn refit(pixels: &[Rgba<u8>; 16], transparent: u16, fit: &ColorFit) -> Option<([f32; 3], [f32; 3])> {
    let weights: [f32; 4] = if fit.three {
        [1.0, 0.0, 0.5, 0.0]
    } else {
        [1.0, 0.0, 2.0 / 3.0, 1.0 / 3.0]
    };
    let (mut aa, mut ab, mut bb) = (0.0f32, 0.0f32, 0.0f32);
    let (mut ax, mut bx) = ([0.0f32; 3], [0.0f32; 3]);
    for (i, px) in pixels.iter().enumerate() {
        if transparent & (1 << i) != 0 {
            continue;
        }
        let alpha = weights[(fit.indices >> (2 * i)) as usize & 3];
        let beta = 1.0 - alpha;
        aa += alpha * alpha;
        ab += alpha * beta;
        bb += beta * beta;
        for (c, v) in [px.r, px.g, px.b].into_iter().enumerate() {
            ax[c] += alpha * f32::from(v);
            bx[c] += beta * f32::from(v);
        }
    }
    let det = aa * bb - ab * ab;
    if det.abs() < 1e-6 {
        return None;
    }
    let a: [f32; 3] = core::array::from_fn(|c| (ax[c] * bb - bx[c] * ab) / det);
    let b: [f32; 3] = core::array::from_fn(|c| (bx[c] * aa - ax[c] * ab) / det);
    Some((a, b))
}

fn bounding_box(points: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut lo = [255.0f32; 3];
    let mut hi = [0.0f32; 3];
    for p in points {
        for c in 0..3 {
            lo[c] = lo[c].min(p[c]);
            hi[c] = hi[c].max(p[c]);
        }
    }
    (lo, hi)
}

/// Extremes of the points projected on their principal axis.
fn principal_axis(points: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let n = points.len() as f32;
    let mut mean = [0.0f32; 3];
    for p in points {
        for c in 0..3 {
            mean[c] += p[c] / n;
        }
    }
    let mut cov = [[0.0f32; 3]; 3];
    for p in points {
        let d = [p[0] - mean[0], p[1] - mean[1], p[2] - mean[2]];
        for i in 0..3 {
            for j in 0..3 {
                cov[i][j] += d[i] * d[j];
            }
        }
    }
    let mut axis = [1.0f32, 1.0, 1.0];
    for _ in 0..8 {
        let next: [f32; 3] =
            core::array::from_fn(|i| cov[i][0] * axis[0] + cov[i][1] * axis[1] + cov[i][2] * axis[2]);
        let len = next.iter().map(|v| v * v).sum::<f32>().sqrt();
        if len < 1e-6 {
            return bounding_box(points);
        }
        axis = next.map(|v| v / len);
    }
    let (mut tmin, mut tmax) = (f32::MAX, f32::MIN);
    for p in points {
        let t = (p[0] - mean[0]) * axis[0] + (p[1] - mean[1]) * axis[1] + (p[2] - mean[2]) * axis[2];
        tmin = tmin.min(t);
        tmax = tmax.max(t);
    }
    let at = |t: f32| -> [f32; 3] {
        core::array::from_fn(|c| (mean[c] + t * axis[c]).clamp(0.0, 255.0))
    };
    (at(tmin), at(tmax))
}

fn encode_color(pixels: &[Rgba<u8>; 16], out: &mut [u8], four_only: bool, quality: CompressionQuality) {
    let transparent = if four_only {
        0
    } else {
        pixels
            .iter()
            .enumerate()
            .filter(|(_, p)| p.a < 128)
            .fold(0u16, |m, (i, _)| m | 1 << i)
    };
    let points: Vec<[f32; 3]> = pixels
        .iter()
        .enumerate()
        .filter(|(i, _)| transparent & (1 << i) == 0)
        .map(|(_, p)| [f32::from(p.r), f32::from(p.g), f32::from(p.b)])
        .collect();

    let fit = if points.is_empty() {
        // Fully transparent: three-color mode, every index 3.
        ColorFit {
            c0: 0,
            c1: 0,
            indices: u32::MAX,
            error: 0,
            three: true,
        }
    } else {
        let (lo, hi) = match quality {
            CompressionQuality::Fastest => bounding_box(&points),
            _ => principal_axis(&points),
        };
        let refits = match quality {
            CompressionQuality::Fastest => 0,
            CompressionQuality::Normal => 1,
            CompressionQuality::HighQuality => 4,
        };
        let fit_mode = |three: bool| {
            let mut fit = assign(pixels, transparent, encode_565(hi), encode_565(lo), three, four_only);
            for _ in 0..refits {
                let Some((a, b)) = refit(pixels, transparent, &fit) else {
                    break;
                };
                let next = assign(pixels, transparent, encode_565(a), encode_565(b), three, four_only);
                if next.error >= fit.error {
                    break;
                }
                fit = next;
            }
            fit
        };
        if transparent != 0 {
            fit_mode(true)
        } else if !four_only && quality == CompressionQuality::HighQuality {
            let four = fit_mode(false);
            let three = fit_mode(true);
            if three.error < four.error { three } else { four }
        } else {
            fit_mode(false)
        }
    };
    out[0..2].copy_from_slice(&fit.c0.to_le_bytes());
    out[2..4].copy_from_slice(&fit.c1.to_le_bytes());
    out[4..8].copy_from_slice(&fit.indices.to_le_bytes());
}

// ── Interpolated single channel (BC3 alpha, BC4/BC5) ─────────────────

fn interpolated_palette(a0: u8, a1: u8) -> [u8; 8] {
    let (x, y) = (u32::from(a0), u32::from(a1));
    let lerp = |wx: u32, wy: u32, div: u32| ((wx * x + wy * y + div / 2) / div) as u8;
    if a0 > a1 {
        [
            a0,
            a1,
            lerp(6, 1, 7),
            lerp(5, 2, 7),
            lerp(4, 3, 7),
            lerp(3, 4, 7),
            lerp(2, 5, 7),
            lerp(1, 6, 7),
        ]
    } else {
        [
            a0,
            a1,
            lerp(4, 1, 5),
            lerp(3, 2, 5),
            lerp(2, 3, 5),
            lerp(1, 4, 5),
            0,
            255,
        ]
    }
}

pub(crate) fn decode_interpolated(block: &[u8], out: &mut [u8; 16]) {
    let palette = interpolated_palette(block[0], block[1]);
    let bits = read_u64(&block[2..8]);
    for (i, v) in out.iter_mut().enumerate() {
        *v = palette[(bits >> (3 * i)) as usize & 7];
    }
}

pub(crate) fn encode_interpolated(values: &[u8; 16], out: &mut [u8], quality: CompressionQuality) {
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);

    let mut candidates = vec![(max, min)];
    if quality >= CompressionQuality::Normal {
        // Six-value mode keeps exact 0 and 255 for free.
        let inner = values.iter().copied().filter(|&v| v != 0 && v != 255);
        let lo = inner.clone().min().unwrap_or(0);
        let hi = inner.max().unwrap_or(0);
        candidates.push((lo, hi));
    }
    if quality == CompressionQuality::HighQuality {
        for inset_hi in 0..=3u8 {
            for inset_lo in 0..=3u8 {
                let (a0, a1) = (max.saturating_sub(inset_hi), min.saturating_add(inset_lo));
                if a0 > a1 {
                    candidates.push((a0, a1));
                }
            }
        }
    }

    let mut best = (u32::MAX, 0u8, 0u8, 0u64);
    for (a0, a1) in candidates {
        let palette = interpolated_palette(a0, a1);
        let (mut error, mut bits) = (0u32, 0u64);
        for (i, &v) in values.iter().enumerate() {
            let (idx, err) = palette
                .iter()
                .enumerate()
                .map(|(k, &p)| (k, u32::from(p.abs_diff(v)).pow(2)))
                .min_by_key(|&(_, e)| e)
                .unwrap_or((0, 0));
            error += err;
            bits |= (idx as u64) << (3 * i);
        }
        if error < best.0 {
            best = (error, a0, a1, bits);
        }
    }
    out[0] = best.1;
    out[1] = best.2;
    out[2..8].copy_from_slice(&best.3.to_le_bytes()[..6]);
}
