//! EAC single-channel blocks: 8-bit alpha (inside ETC2 RGBA8) and the 11-bit
//! unsigned and signed R/RG formats. Big-endian, 3-bit indices column-major.

use rgb::Rgba;

use super::{BlockDecoder, BlockEncoder, CompressionQuality};

pub(crate) struct EacRg11;
pub(crate) struct EacSignedRg11;

impl BlockDecoder for EacRg11 {
    const BLOCK_BYTES: usize = 16;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_rg(block, false, out);
    }
}

impl BlockDecoder for EacSignedRg11 {
    const BLOCK_BYTES: usize = 16;

    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]) {
        decode_rg(block, true, out);
    }
}

impl BlockEncoder for EacSignedRg11 {
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality) {
        encode_signed_r11(&pixels.map(|p| p.r), &mut out[..8], quality);
        encode_signed_r11(&pixels.map(|p| p.g), &mut out[8..16], quality);
    }
}

const TABLES: [[i32; 8]; 16] = [
    [-3, -6, -9, -15, 2, 5, 8, 14],
    [-3, -7, -10, -13, 2, 6, 9, 12],
    [-2, -5, -8, -13, 1, 4, 7, 12],
    [-2, -4, -6, -13, 1, 3, 5, 12],
    [-3, -6, -8, -12, 2, 5, 7, 11],
    [-3, -7, -9, -11, 2, 6, 8, 10],
    [-4, -7, -8, -11, 3, 6, 7, 10],
    [-3, -5, -8, -11, 2, 4, 7, 10],
    [-2, -6, -8, -10, 1, 5, 7, 9],
    [-2, -5, -8, -10, 1, 4, 7, 9],
    [-2, -4, -8, -10, 1, 3, 7, 9],
    [-2, -5, -7, -10, 1, 4, 6, 9],
    [-3, -4, -7, -10, 2, 3, 6, 9],
    [-1, -2, -3, -10, 0, 1, 2, 9],
    [-4, -6, -8, -9, 3, 5, 7, 8],
    [-3, -5, -7, -9, 2, 4, 6, 8],
];

struct Header {
    base: u8,
    multiplier: i32,
    table: usize,
    bits: u64,
}

impl Header {
    fn read(b: &[u8]) -> Self {
        Self {
            base: b[0],
            multiplier: i32::from(b[1] >> 4),
            table: usize::from(b[1] & 0xF),
            bits: u64::from_be_bytes([0, 0, b[2], b[3], b[4], b[5], b[6], b[7]]),
        }
    }

    /// Modifier of the pixel at row-major position `i`.
    fn modifier(&self, i: usize) -> i32 {
        let k = (i % 4) * 4 + i / 4;
        TABLES[self.table][((self.bits >> (45 - 3 * k)) & 7) as usize]
    }
}

fn write_block(out: &mut [u8], base: u8, multiplier: i32, table: usize, indices: &[usize; 16]) {
    let mut bits = 0u64;
    for (i, &idx) in indices.iter().enumerate() {
        let k = (i % 4) * 4 + i / 4;
        bits |= (idx as u64) << (45 - 3 * k);
    }
    out[0] = base;
    out[1] = (multiplier as u8) << 4 | table as u8;
    out[2..8].copy_from_slice(&bits.to_be_bytes()[2..8]);
}

pub(crate) fn decode_alpha8(block: &[u8], out: &mut [u8; 16]) {
    let h = Header::read(block);
    let base = i32::from(h.base);
    for (i, v) in out.iter_mut().enumerate() {
        *v = (base + h.modifier(i) * h.multiplier).clamp(0, 255) as u8;
    }
}

/// Decode one R11 block to 11-bit values (`0..=2047`, or `-1023..=1023` signed).
fn decode_r11(block: &[u8], signed: bool, out: &mut [i32; 16]) {
    let h = Header::read(block);
    for (i, v) in out.iter_mut().enumerate() {
        let m = h.modifier(i);
        let step = if h.multiplier == 0 { m } else { m * h.multiplier * 8 };
        *v = if signed {
            let base = i32::from(h.base as i8).max(-127);
            (base * 8 + step).clamp(-1023, 1023)
        } else {
            (i32::from(h.base) * 8 + 4 + step).clamp(0, 2047)
        };
    }
}

/// 11-bit sample to 8 bits. Signed values map -1023..=1023 onto 0..=255.
fn r11_to_u8(v: i32, signed: bool) -> u8 {
    if signed {
        (((v + 1023) * 255 + 1023) / 2046) as u8
    } else {
        ((v * 255 + 1023) / 2047) as u8
    }
}

fn u8_to_signed_r11(v: u8) -> i32 {
    (i32::from(v) * 2046 + 127) / 255 - 1023
}

fn decode_rg(block: &[u8], signed: bool, out: &mut [Rgba<u8>; 16]) {
    let (mut red, mut green) = ([0i32; 16], [0i32; 16]);
    decode_r11(&block[..8], signed, &mut red);
    decode_r11(&block[8..16], signed, &mut green);
    for (i, px) in out.iter_mut().enumerate() {
        *px = Rgba::new(r11_to_u8(red[i], signed), r11_to_u8(green[i], signed), 0, 255);
    }
}

// ── Encoder ─────────────────────────────────────────────────────────

struct Fit {
    error: i64,
    base: i32,
    multiplier: i32,
    table: usize,
    indices: [usize; 16],
}

/// Search base, multiplier and table for `targets`.
///
/// `scale` is the value step of one base or multiplier unit (1 for alpha, 8
/// for 11-bit). `reconstruct` maps (base code, multiplier, modifier) to a
/// sample.
fn search(
    targets: &[i32; 16],
    quality: CompressionQuality,
    base_codes: (i32, i32),
    scale: i32,
    reconstruct: fn(i32, i32, i32) -> i32,
) -> Fit {
    let min = targets.iter().copied().min().unwrap_or(0);
    let max = targets.iter().copied().max().unwrap_or(0);
    let mut best = Fit {
        error: i64::MAX,
        base: 0,
        multiplier: 1,
        table: 0,
        indices: [0; 16],
    };

    for (table, mods) in TABLES.iter().enumerate() {
        let span = mods[7] - mods[3];
        let estimate = ((max - min + span * scale / 2) / (span * scale)).clamp(1, 15);
        let multipliers = match quality {
            CompressionQuality::Fastest => estimate..=estimate,
            CompressionQuality::Normal => (estimate - 1).max(1)..=(estimate + 1).min(15),
            CompressionQuality::HighQuality => 1..=15,
        };
        let radius = match quality {
            CompressionQuality::Fastest => 0,
            CompressionQuality::Normal => 2,
            CompressionQuality::HighQuality => 4,
        };
        for multiplier in multipliers {
            let center_offset = multiplier * scale * (mods[7] + mods[3]) / 2;
            let mid = (min + max) / 2 - center_offset;
            let base_estimate = mid.div_euclid(scale);
            for base in base_estimate - radius..=base_estimate + radius {
                if base < base_codes.0 || base > base_codes.1 {
                    continue;
                }
                let mut indices = [0usize; 16];
                let mut error = 0i64;
                for (i, &t) in targets.iter().enumerate() {
                    let (idx, err) = mods
                        .iter()
                        .enumerate()
                        .map(|(k, &m)| {
                            let d = i64::from(reconstruct(base, multiplier, m) - t);
                            (k, d * d)
                        })
                        .min_by_key(|&(_, e)| e)
                        .unwrap_or((0, 0));
                    indices[i] = idx;
                    error += err;
                }
                if error < best.error {
                    best = Fit {
                        error,
                        base,
                        multiplier,
                        table,
                        indices,
                    };
                    if error == 0 {
                        return best;
                    }
                }
            }
        }
    }
    best
}

pub(crate) fn encode_alpha8(values: &[u8; 16], out: &mut [u8], quality: CompressionQuality) {
    let targets = values.map(i32::from);
    let fit = search(&targets, quality, (0, 255), 1, |base, mult, m| {
        (base + m * mult).clamp(0, 255)
    });
    write_block(out, fit.base as u8, fit.multiplier, fit.table, &fit.indices);
}

fn encode_signed_r11(values: &[u8; 16], out: &mut [u8], quality: CompressionQuality) {
    let targets = values.map(u8_to_signed_r11);
    let fit = search(&targets, quality, (-127, 127), 8, |base, mult, m| {
        (base * 8 + m * mult * 8).clamp(-1023, 1023)
    });
    write_block(out, fit.base as i8 as u8, fit.multiplier, fit.table, &fit.indices);
}
