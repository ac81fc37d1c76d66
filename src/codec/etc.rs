//! ETC1 and ETC2 color blocks (RGB, punch-through alpha, and RGBA with an
//! EAC alpha block). Blocks are big-endian; pixel indices run column-major.

use rgb::Rgba;

use super::eac::{decode_alpha8, encode_alpha8};
use super::{BlockDecoder, BlockEncoder, CompressionQuality, rgb_error};

pub(crate) struct Etc1;
pub(crate) struct Etc2Rgb;
pub(crate) struct Etc2PunchThrough;
pub(crate) struct Etc2Rgba;

impl BlockDecoder for Etc1 {
    const BLOCK_BYTES: usize = 8;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_etc1(block, out);
    }
}

impl BlockEncoder for Etc1 {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        out[..8].copy_from_slice(&encode_color(pixels, quality, false));
    }
}

impl BlockDecoder for Etc2Rgb {
    const BLOCK_BYTES: usize = 8;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_color(block, false, out);
    }
}

impl BlockEncoder for Etc2Rgb {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        out[..8].copy_from_slice(&encode_color(pixels, quality, false));
    }
}

impl BlockDecoder for Etc2PunchThrough {
    const BLOCK_BYTES: usize = 8;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_color(block, true, out);
    }
}

impl BlockEncoder for Etc2PunchThrough {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        out[..8].copy_from_slice(&encode_color(pixels, quality, true));
    }
}

impl BlockDecoder for Etc2Rgba {
    const BLOCK_BYTES: usize = 16;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_color(&block[8..16], false, out);
        let mut alpha = [0u8; 16];
        decode_alpha8(&block[..8], &mut alpha);
        for (px, a) in out.iter_mut().zip(alpha) {
            px.a = a;
        }
    }
}

impl BlockEncoder for Etc2Rgba {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        encode_alpha8(&pixels.map(|p| p.a), &mut out[..8], quality);
        out[8..16].copy_from_slice(&encode_color(pixels, quality, false));
    }
}

const MODIFIERS: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

/// T and H mode paint color distances.
const DISTANCES: [i32; 8] = [3, 6, 11, 16, 23, 32, 41, 64];

#[inline]
fn modifier(table: usize, index: u32) -> i32 {
    let [small, large] = MODIFIERS[table];
    match index {
        0 => small,
        1 => large,
        2 => -small,
        _ => -large,
    }
}

#[inline]
fn clamp8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn ext4(v: u8) -> i32 {
    i32::from(v << 4 | v)
}

#[inline]
fn ext5(v: u8) -> i32 {
    i32::from(v << 3 | v >> 2)
}

#[inline]
fn ext6(v: u8) -> i32 {
    i32::from(v << 2 | v >> 4)
}

#[inline]
fn ext7(v: u8) -> i32 {
    i32::from(v << 1 | v >> 6)
}

/// Two's complement 3-bit delta.
#[inline]
fn delta3(v: u8) -> i32 {
    let v = i32::from(v & 7);
    if v >= 4 { v - 8 } else { v }
}

/// 2-bit index of pixel (x, y): MSB at bit `k + 16`, LSB at bit `k`, `k = x * 4 + y`.
#[inline]
fn pixel_index(lo: u32, x: usize, y: usize) -> u32 {
    let k = x * 4 + y;
    ((lo >> (k + 16)) & 1) << 1 | (lo >> k) & 1
}

#[inline]
fn set_index(lo: &mut u32, x: usize, y: usize, index: u32) {
    let k = x * 4 + y;
    *lo |= (index >> 1) << (k + 16) | (index & 1) << k;
}

#[inline]
fn rgb(c: [i32; 3], a: u8) -> Rgba<u8> {
    Rgba::new(clamp8(c[0]), clamp8(c[1]), clamp8(c[2]), a)
}

#[inline]
fn offset(c: [i32; 3], d: i32) -> [i32; 3] {
    [c[0] + d, c[1] + d, c[2] + d]
}

/// Decode an ETC2 RGB block. With `punch_through` the differential bit is
/// the opaque flag instead, and individual mode does not exist.
fn decode_color(b: &[u8], punch_through: bool, out: &mut [Rgba<u8>; 16]) {
    let lo = u32::from_be_bytes([b[4], b[5], b[6], b[7]]);
    let diff_bit = b[3] & 2 != 0;
    let opaque = !punch_through || diff_bit;
    let flip = b[3] & 1 != 0;
    let tables = [usize::from(b[3] >> 5), usize::from((b[3] >> 2) & 7)];

    if !punch_through && !diff_bit {
        decode_subblocks(individual_bases(b), tables, flip, lo, true, out);
        return;
    }

    let r = i32::from(b[0] >> 3);
    let g = i32::from(b[1] >> 3);
    let bl = i32::from(b[2] >> 3);
    let (r2, g2, b2) = (r + delta3(b[0]), g + delta3(b[1]), bl + delta3(b[2]));
    if !(0..32).contains(&r2) {
        decode_t(b, lo, opaque, out);
    } else if !(0..32).contains(&g2) {
        decode_h(b, lo, opaque, out);
    } else if !(0..32).contains(&b2) {
        decode_planar(b, out);
    } else {
        let base = [
            [ext5(r as u8), ext5(g as u8), ext5(bl as u8)],
            [ext5(r2 as u8), ext5(g2 as u8), ext5(b2 as u8)],
        ];
        decode_subblocks(base, tables, flip, lo, opaque, out);
    }
}

fn individual_bases(b: &[u8]) -> [[i32; 3]; 2] {
    [
        [ext4(b[0] >> 4), ext4(b[1] >> 4), ext4(b[2] >> 4)],
        [ext4(b[0] & 0xF), ext4(b[1] & 0xF), ext4(b[2] & 0xF)],
    ]
}

/// Decode an ETC1 block. ETC1 has no T, H or planar modes: a differential
/// base that leaves `0..32` wraps to 5 bits.
fn decode_etc1(b: &[u8], out: &mut [Rgba<u8>; 16]) {
    let lo = u32::from_be_bytes([b[4], b[5], b[6], b[7]]);
    let flip = b[3] & 1 != 0;
    let tables = [usize::from(b[3] >> 5), usize::from((b[3] >> 2) & 7)];
    let base = if b[3] & 2 == 0 {
        individual_bases(b)
    } else {
        let first = [b[0] >> 3, b[1] >> 3, b[2] >> 3];
        let second: [u8; 3] =
            core::array::from_fn(|c| ((i32::from(first[c]) + delta3(b[c])) & 0x1F) as u8);
        [first.map(ext5), second.map(ext5)]
    };
    decode_subblocks(base, tables, flip, lo, true, out);
}

fn decode_subblocks(
    base: [[i32; 3]; 2],
    tables: [usize; 2],
    flip: bool,
    lo: u32,
    opaque: bool,
    out: &mut [Rgba<u8>; 16],
) {
    for x in 0..4 {
        for y in 0..4 {
            let sub = usize::from(if flip { y >= 2 } else { x >= 2 });
            let index = pixel_index(lo, x, y);
            out[y * 4 + x] = match (opaque, index) {
                (false, 2) => Rgba::new(0, 0, 0, 0),
                (false, 0) => rgb(base[sub], 255),
                _ => rgb(offset(base[sub], modifier(tables[sub], index)), 255),
            };
        }
    }
}

fn decode_paint(paint: [[i32; 3]; 4], lo: u32, opaque: bool, out: &mut [Rgba<u8>; 16]) {
    for x in 0..4 {
        for y in 0..4 {
            let index = pixel_index(lo, x, y);
            out[y * 4 + x] = if !opaque && index == 2 {
                Rgba::new(0, 0, 0, 0)
            } else {
                rgb(paint[index as usize], 255)
            };
        }
    }
}

fn decode_t(b: &[u8], lo: u32, opaque: bool, out: &mut [Rgba<u8>; 16]) {
    let r1 = ((b[0] >> 3) & 3) << 2 | (b[0] & 3);
    let c1 = [ext4(r1), ext4(b[1] >> 4), ext4(b[1] & 0xF)];
    let c2 = [ext4(b[2] >> 4), ext4(b[2] & 0xF), ext4(b[3] >> 4)];
    let d = DISTANCES[usize::from(((b[3] >> 2) & 3) << 1 | (b[3] & 1))];
    decode_paint([c1, offset(c2, d), c2, offset(c2, -d)], lo, opaque, out);
}

fn decode_h(b: &[u8], lo: u32, opaque: bool, out: &mut [Rgba<u8>; 16]) {
    let r1 = (b[0] >> 3) & 0xF;
    let g1 = (b[0] & 7) << 1 | (b[1] >> 4) & 1;
    let b1 = (b[1] & 8) | (b[1] & 3) << 1 | b[2] >> 7;
    let r2 = (b[2] >> 3) & 0xF;
    let g2 = (b[2] & 7) << 1 | b[3] >> 7;
    let b2 = (b[3] >> 3) & 0xF;
    let first = u32::from(r1) << 8 | u32::from(g1) << 4 | u32::from(b1);
    let second = u32::from(r2) << 8 | u32::from(g2) << 4 | u32::from(b2);
    let d_index = ((b[3] >> 2) & 1) << 2 | (b[3] & 1) << 1 | u8::from(first >= second);
    let d = DISTANCES[usize::from(d_index)];
    let c1 = [ext4(r1), ext4(g1), ext4(b1)];
    let c2 = [ext4(r2), ext4(g2), ext4(b2)];
    decode_paint(
        [offset(c1, d), offset(c1, -d), offset(c2, d), offset(c2, -d)],
        lo,
        opaque,
        out,
    );
}

fn decode_planar(b: &[u8], out: &mut [Rgba<u8>; 16]) {
    let o = [
        ext6((b[0] >> 1) & 0x3F),
        ext7((b[0] & 1) << 6 | (b[1] >> 1) & 0x3F),
        ext6((b[1] & 1) << 5 | ((b[2] >> 3) & 3) << 3 | (b[2] & 3) << 1 | b[3] >> 7),
    ];
    let h = [
        ext6(((b[3] >> 2) & 0x1F) << 1 | (b[3] & 1)),
        ext7(b[4] >> 1),
        ext6((b[4] & 1) << 5 | b[5] >> 3),
    ];
    let v = [
        ext6((b[5] & 7) << 3 | b[6] >> 5),
        ext7((b[6] & 0x1F) << 2 | b[7] >> 6),
        ext6(b[7] & 0x3F),
    ];
    for y in 0..4i32 {
        for x in 0..4i32 {
            let c: [i32; 3] =
                core::array::from_fn(|i| (x * (h[i] - o[i]) + y * (v[i] - o[i]) + 4 * o[i] + 2) >> 2);
            out[(y * 4 + x) as usize] = rgb(c, 255);
        }
    }
}

// ── Encoder ─────────────────────────────────────────────────────────
//
// Searches flip orientation, individual and differential base colors and
// every modifier table. The output never uses the ETC2-only T, H or planar
// modes, so it is also a valid ETC1 block.

#[derive(Clone, Copy)]
struct SubblockFit {
    table: usize,
    /// Index bits of this subblock's pixels only.
    lo: u32,
    error: u32,
}

fn subblock_pixels(flip: bool, sub: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..4usize)
        .flat_map(|x| (0..4usize).map(move |y| (x, y)))
        .filter(move |&(x, y)| usize::from(if flip { y >= 2 } else { x >= 2 }) == sub)
}

/// Best modifier table for one subblock around `base` (8-bit color).
fn fit_subblock(
    pixels: &[Rgba<u8>; 16],
    flip: bool,
    sub: usize,
    base: [i32; 3],
    transparent: u16,
) -> SubblockFit {
    let opaque = transparent == 0;
    let mut best = SubblockFit {
        table: 0,
        lo: 0,
        error: u32::MAX,
    };
    for table in 0..8 {
        let (mut lo, mut error) = (0u32, 0u32);
        for (x, y) in subblock_pixels(flip, sub) {
            if transparent & (1 << (y * 4 + x)) != 0 {
                set_index(&mut lo, x, y, 2);
                continue;
            }
            let px = pixels[y * 4 + x];
            let (index, err) = [0u32, 1, 2, 3]
                .into_iter()
                .filter(|&i| opaque || i != 2)
                .map(|i| {
                    let m = if !opaque && i == 0 { 0 } else { modifier(table, i) };
                    (i, rgb_error(rgb(offset(base, m), 255), px))
                })
                .min_by_key(|&(_, e)| e)
                .unwrap_or((0, 0));
            set_index(&mut lo, x, y, index);
            error += err;
        }
        if error < best.error {
            best = SubblockFit { table, lo, error };
        }
    }
    best
}

fn subblock_average(pixels: &[Rgba<u8>; 16], flip: bool, sub: usize, transparent: u16) -> Option<[f32; 3]> {
    let mut sum = [0.0f32; 3];
    let mut n = 0.0f32;
    for (x, y) in subblock_pixels(flip, sub) {
        let i = y * 4 + x;
        if transparent & (1 << i) != 0 {
            continue;
        }
        let p = pixels[i];
        sum[0] += f32::from(p.r);
        sum[1] += f32::from(p.g);
        sum[2] += f32::from(p.b);
        n += 1.0;
    }
    (n > 0.0).then(|| sum.map(|s| s / n))
}

fn quantize(c: [f32; 3], max: f32) -> [i32; 3] {
    c.map(|v| (v * max / 255.0).round().clamp(0.0, max) as i32)
}

/// Quantized candidates around `q`: `q` itself, or its 3x3x3 neighborhood.
fn neighborhood(q: [i32; 3], max: i32, wide: bool) -> Vec<[i32; 3]> {
    if !wide {
        return vec![q];
    }
    let mut out = Vec::with_capacity(27);
    for dr in -1..=1 {
        for dg in -1..=1 {
            for db in -1..=1 {
                let c = [q[0] + dr, q[1] + dg, q[2] + db];
                if c.iter().all(|v| (0..=max).contains(v)) {
                    out.push(c);
                }
            }
        }
    }
    out
}

fn best_base(
    pixels: &[Rgba<u8>; 16],
    flip: bool,
    sub: usize,
    transparent: u16,
    candidates: impl IntoIterator<Item = [i32; 3]>,
    expand: fn(u8) -> i32,
) -> Option<([i32; 3], SubblockFit)> {
    candidates
        .into_iter()
        .map(|q| {
            let base = q.map(|v| expand(v as u8));
            (q, fit_subblock(pixels, flip, sub, base, transparent))
        })
        .min_by_key(|(_, fit)| fit.error)
}

struct Candidate {
    bytes: [u8; 8],
    error: u32,
}

fn pack_block(
    colors: [u8; 3],
    fits: [SubblockFit; 2],
    mode_bit: bool,
    flip: bool,
) -> [u8; 8] {
    let lo = (fits[0].lo | fits[1].lo).to_be_bytes();
    let control = (fits[0].table as u8) << 5
        | (fits[1].table as u8) << 2
        | u8::from(mode_bit) << 1
        | u8::from(flip);
    [colors[0], colors[1], colors[2], control, lo[0], lo[1], lo[2], lo[3]]
}

fn encode_flip(
    pixels: &[Rgba<u8>; 16],
    flip: bool,
    quality: CompressionQuality,
    punch_through: bool,
    transparent: u16,
) -> Option<Candidate> {
    let narrow = encode_bases(pixels, flip, quality, punch_through, transparent, false);
    if quality < CompressionQuality::HighQuality {
        return narrow;
    }
    // The wide search optimizes subblocks one at a time, so keep the narrow
    // result when it happens to be better overall.
    let wide = encode_bases(pixels, flip, quality, punch_through, transparent, true);
    match (narrow, wide) {
        (Some(n), Some(w)) => Some(if w.error < n.error { w } else { n }),
        (n, w) => n.or(w),
    }
}

fn encode_bases(
    pixels: &[Rgba<u8>; 16],
    flip: bool,
    quality: CompressionQuality,
    punch_through: bool,
    transparent: u16,
    wide: bool,
) -> Option<Candidate> {
    let avg0 = subblock_average(pixels, flip, 0, transparent);
    let avg1 = subblock_average(pixels, flip, 1, transparent);
    let avg = [
        avg0.or(avg1).unwrap_or([0.0; 3]),
        avg1.or(avg0).unwrap_or([0.0; 3]),
    ];
    let mut best: Option<Candidate> = None;
    let mut consider = |c: Candidate| {
        if best.as_ref().is_none_or(|b| c.error < b.error) {
            best = Some(c);
        }
    };

    // Differential: second base within [-4, 3] of the first on every channel.
    let q0 = quantize(avg[0], 31.0);
    let q1 = quantize(avg[1], 31.0);
    let in_range = (0..3).all(|c| (-4..=3).contains(&(q1[c] - q0[c])));
    let try_individual = !punch_through
        && (!in_range || quality >= CompressionQuality::Normal);
    if in_range || punch_through {
        if let Some((b0, fit0)) =
            best_base(pixels, flip, 0, transparent, neighborhood(q0, 31, wide), ext5)
        {
            let clamp_to = |q: [i32; 3]| -> [i32; 3] {
                core::array::from_fn(|c| q[c].clamp(b0[c] - 4, b0[c] + 3))
            };
            let near: Vec<[i32; 3]> = neighborhood(q1, 31, wide)
                .into_iter()
                .map(clamp_to)
                .filter(|c| c.iter().all(|v| (0..=31).contains(v)))
                .collect();
            if let Some((b1, fit1)) = best_base(pixels, flip, 1, transparent, near, ext5) {
                let colors: [u8; 3] = core::array::from_fn(|c| {
                    ((b0[c] as u8) << 3) | ((b1[c] - b0[c]) as u8 & 7)
                });
                let opaque_bit = if punch_through { transparent == 0 } else { true };
                consider(Candidate {
                    bytes: pack_block(colors, [fit0, fit1], opaque_bit, flip),
                    error: fit0.error + fit1.error,
                });
            }
        }
    }

    if try_individual {
        let q0 = quantize(avg[0], 15.0);
        let q1 = quantize(avg[1], 15.0);
        let first = best_base(pixels, flip, 0, 0, neighborhood(q0, 15, wide), ext4);
        let second = best_base(pixels, flip, 1, 0, neighborhood(q1, 15, wide), ext4);
        if let (Some((b0, fit0)), Some((b1, fit1))) = (first, second) {
            let colors: [u8; 3] = core::array::from_fn(|c| (b0[c] as u8) << 4 | b1[c] as u8);
            consider(Candidate {
                bytes: pack_block(colors, [fit0, fit1], false, flip),
                error: fit0.error + fit1.error,
            });
        }
    }
    best
}

/// Encode 16 pixels as an ETC1-compatible block. With `punch_through`, pixels
/// with alpha below 128 become transparent.
fn encode_color(pixels: &[Rgba<u8>; 16], quality: CompressionQuality, punch_through: bool) -> [u8; 8] {
    let transparent = if punch_through {
        pixels
            .iter()
            .enumerate()
            .filter(|(_, p)| p.a < 128)
            .fold(0u16, |m, (i, _)| m | 1 << i)
    } else {
        0
    };
    let flips: &[bool] = if quality == CompressionQuality::Fastest {
        &[false]
    } else {
        &[false, true]
    };
    flips
        .iter()
        .filter_map(|&flip| encode_flip(pixels, flip, quality, punch_through, transparent))
        .min_by_key(|c| c.error)
        .map_or([0; 8], |c| c.bytes)
}
