//! PVRTC decoding at 2 and 4 bits per pixel.
//!
//! PVRTC stores two low-resolution color images (A and B) and a per-pixel
//! modulation weight. A pixel blends the bilinearly upscaled A and B
//! colors of the four words around it, so words do not decode independently.
//! Each level is decoded through a buffer padded to whole words (at least
//! 2x2) and then cropped to the level size.

use rgb::Rgba;

use crate::error::ConvertError;
use crate::image::Image;

const WORD_HEIGHT: usize = 4;

pub(crate) fn decompress_4bpp(src: &Image, dst: &mut Image) -> Result<(), ConvertError> {
    decompress(src, dst, false)
}

pub(crate) fn decompress_2bpp(src: &Image, dst: &mut Image) -> Result<(), ConvertError> {
    decompress(src, dst, true)
}

#[derive(Clone, Copy, Default)]
struct Word {
    modulation: u32,
    color: u32,
}

fn decompress(src: &Image, dst: &mut Image, two_bpp: bool) -> Result<(), ConvertError> {
    let word_width = if two_bpp { 8 } else { 4 };
    super::check_decode(src, dst, 8, word_width as u32)?;
    for mip in 0..src.num_mipmaps().min(dst.num_mipmaps()) {
        let (w, h, d) = src.level_dims(mip);
        let (w, h) = (w as usize, h as usize);
        let words_x = w.div_ceil(word_width).max(2);
        let words_y = h.div_ceil(WORD_HEIGHT).max(2);
        let layer_bytes = words_x * words_y * 8;
        let padded_w = words_x * word_width;
        let mut padded = vec![Rgba::new(0u8, 0, 0, 0); padded_w * words_y * WORD_HEIGHT];

        for slice in 0..src.num_slices() {
            let data = src.level_data(mip, slice);
            let out = dst.level_data_mut(mip, slice);
            for (z, layer) in data.chunks_exact(layer_bytes).take(d as usize).enumerate() {
                decode_layer(layer, words_x, words_y, two_bpp, &mut padded);
                for y in 0..h {
                    for x in 0..w {
                        let p = padded[y * padded_w + x];
                        let at = ((z * h + y) * w + x) * 4;
                        out[at..at + 4].copy_from_slice(&[p.r, p.g, p.b, p.a]);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Morton order of words. The smaller dimension is interleaved; the rest of
/// the larger one is appended above.
fn twiddle(x_size: usize, y_size: usize, x_pos: usize, y_pos: usize) -> usize {
    let (min_dim, mut rest) = if y_size < x_size {
        (y_size, x_pos)
    } else {
        (x_size, y_pos)
    };
    let (mut twiddled, mut src_bit, mut dst_bit, mut shift) = (0, 1, 1, 0);
    while src_bit < min_dim {
        if y_pos & src_bit != 0 {
            twiddled |= dst_bit;
        }
        if x_pos & src_bit != 0 {
            twiddled |= dst_bit << 1;
        }
        src_bit <<= 1;
        dst_bit <<= 2;
        shift += 1;
    }
    rest >>= shift;
    twiddled | rest << (2 * shift)
}

fn decode_layer(data: &[u8], words_x: usize, words_y: usize, two_bpp: bool, out: &mut [Rgba<u8>]) {
    let word_width = if two_bpp { 8 } else { 4 };
    let padded_w = words_x * word_width;
    let read = |x: usize, y: usize| -> Word {
        let at = twiddle(words_y, words_x, y, x) * 8;
        data.get(at..at + 8).map_or(Word::default(), |b| Word {
            modulation: u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            color: u32::from_le_bytes([b[4], b[5], b[6], b[7]]),
        })
    };
    let (half_w, half_h) = (word_width / 2, WORD_HEIGHT / 2);

    for wy in 0..words_y {
        for wx in 0..words_x {
            let (nx, ny) = ((wx + 1) % words_x, (wy + 1) % words_y);
            let window = decode_window(
                [read(wx, wy), read(nx, wy), read(wx, ny), read(nx, ny)],
                two_bpp,
            );
            // The window spans from the center of P to the center of S; each
            // quadrant lands in a different word.
            for y in 0..half_h {
                for x in 0..half_w {
                    let top = (wy * WORD_HEIGHT + y + half_h) * padded_w;
                    let bottom = (ny * WORD_HEIGHT + y) * padded_w;
                    out[top + wx * word_width + x + half_w] = window[y * word_width + x];
                    out[top + nx * word_width + x] = window[y * word_width + x + half_w];
                    out[bottom + wx * word_width + x + half_w] = window[(y + half_h) * word_width + x];
                    out[bottom + nx * word_width + x] = window[(y + half_h) * word_width + x + half_w];
                }
            }
        }
    }
}

/// Color A as 5-bit RGB and 4-bit alpha.
fn color_a(c: u32) -> [i32; 4] {
    let v = if c & 0x8000 != 0 {
        [(c >> 10) & 0x1F, (c >> 5) & 0x1F, (c & 0x1E) | (c & 0x1E) >> 4, 0xF]
    } else {
        [
            (c & 0xF00) >> 7 | (c & 0xF00) >> 11,
            (c & 0xF0) >> 3 | (c & 0xF0) >> 7,
            (c & 0xE) << 1 | (c & 0xE) >> 2,
            (c & 0x7000) >> 11,
        ]
    };
    v.map(|x| x as i32)
}

/// Color B as 5-bit RGB and 4-bit alpha.
fn color_b(c: u32) -> [i32; 4] {
    let v = if c & 0x8000_0000 != 0 {
        [(c >> 26) & 0x1F, (c >> 21) & 0x1F, (c >> 16) & 0x1F, 0xF]
    } else {
        [
            (c & 0x0F00_0000) >> 23 | (c & 0x0F00_0000) >> 27,
            (c & 0x00F0_0000) >> 19 | (c & 0x00F0_0000) >> 23,
            (c & 0x000F_0000) >> 15 | (c & 0x000F_0000) >> 19,
            (c & 0x7000_0000) >> 27,
        ]
    };
    v.map(|x| x as i32)
}

/// Bilinear upscale of the four corner colors to 8-bit over one window.
fn interpolate(corners: [[i32; 4]; 4], two_bpp: bool) -> [[i32; 4]; 32] {
    let word_width = if two_bpp { 8 } else { 4 };
    let [p, q, r, s] = corners;
    let mut out = [[0; 4]; 32];
    let mut hp = p.map(|v| v * word_width as i32);
    let mut hr = r.map(|v| v * word_width as i32);
    for x in 0..word_width {
        let mut result = hp.map(|v| 4 * v);
        let dy: [i32; 4] = core::array::from_fn(|c| hr[c] - hp[c]);
        for y in 0..WORD_HEIGHT {
            out[y * word_width + x] = if two_bpp {
                [
                    (result[0] >> 7) + (result[0] >> 2),
                    (result[1] >> 7) + (result[1] >> 2),
                    (result[2] >> 7) + (result[2] >> 2),
                    (result[3] >> 5) + (result[3] >> 1),
                ]
            } else {
                [
                    (result[0] >> 6) + (result[0] >> 1),
                    (result[1] >> 6) + (result[1] >> 1),
                    (result[2] >> 6) + (result[2] >> 1),
                    (result[3] >> 4) + result[3],
                ]
            };
            for c in 0..4 {
                result[c] += dy[c];
            }
        }
        for c in 0..4 {
            hp[c] += q[c] - p[c];
            hr[c] += s[c] - r[c];
        }
    }
    out
}

/// Modulation weights (0..=8, or 14 for punch-through) and modes over the
/// 2x2 words of a window, indexed `[x][y]`.
struct Modulation {
    values: [[i32; 8]; 16],
    modes: [[u8; 8]; 16],
}

impl Modulation {
    fn unpack(&mut self, word: Word, ox: usize, oy: usize, two_bpp: bool) {
        let mut mode = (word.color & 1) as u8;
        let mut bits = word.modulation;
        if two_bpp {
            if mode != 0 {
                // Interpolated modes keep only every other pixel.
                if bits & 1 != 0 {
                    mode = if bits & (1 << 20) != 0 { 3 } else { 2 };
                    if bits & (1 << 21) != 0 {
                        bits |= 1 << 20;
                    } else {
                        bits &= !(1 << 20);
                    }
                }
                if bits & 2 != 0 {
                    bits |= 1;
                } else {
                    bits &= !1;
                }
                for y in 0..4 {
                    for x in 0..8 {
                        self.modes[x + ox][y + oy] = mode;
                        if (x ^ y) & 1 == 0 {
                            self.values[x + ox][y + oy] = (bits & 3) as i32;
                            bits >>= 2;
                        }
                    }
                }
            } else {
                for y in 0..4 {
                    for x in 0..8 {
                        self.modes[x + ox][y + oy] = 0;
                        self.values[x + ox][y + oy] = if bits & 1 != 0 { 3 } else { 0 };
                        bits >>= 1;
                    }
                }
            }
        } else {
            for y in 0..4 {
                for x in 0..4 {
                    let v = (bits & 3) as i32;
                    self.values[x + ox][y + oy] = if mode != 0 {
                        [0, 4, 14, 8][v as usize]
                    } else {
                        [0, 3, 5, 8][v as usize]
                    };
                    bits >>= 2;
                }
            }
        }
    }

    fn weight(&self, x: usize, y: usize, two_bpp: bool) -> i32 {
        const LEVELS: [i32; 4] = [0, 3, 5, 8];
        if !two_bpp {
            return self.values[x][y];
        }
        let at = |x: usize, y: usize| LEVELS[self.values[x][y] as usize & 3];
        match self.modes[x][y] {
            _ if (x ^ y) & 1 == 0 => at(x, y),
            0 => at(x, y),
            1 => (at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) + 2) / 4,
            2 => (at(x - 1, y) + at(x + 1, y) + 1) / 2,
            _ => (at(x, y - 1) + at(x, y + 1) + 1) / 2,
        }
    }
}

fn decode_window(words: [Word; 4], two_bpp: bool) -> [Rgba<u8>; 32] {
    let word_width = if two_bpp { 8 } else { 4 };
    let mut modulation = Modulation {
        values: [[0; 8]; 16],
        modes: [[0; 8]; 16],
    };
    let offsets = [(0, 0), (word_width, 0), (0, WORD_HEIGHT), (word_width, WORD_HEIGHT)];
    for (word, (ox, oy)) in words.iter().zip(offsets) {
        modulation.unpack(*word, ox, oy, two_bpp);
    }
    let a = interpolate(words.map(|w| color_a(w.color)), two_bpp);
    let b = interpolate(words.map(|w| color_b(w.color)), two_bpp);

    let mut out = [Rgba::new(0u8, 0, 0, 0); 32];
    for y in 0..WORD_HEIGHT {
        for x in 0..word_width {
            let mut weight = modulation.weight(x + word_width / 2, y + WORD_HEIGHT / 2, two_bpp);
            let punch_through = weight > 10;
            if punch_through {
                weight -= 10;
            }
            let i = y * word_width + x;
            let blend = |c: usize| ((a[i][c] * (8 - weight) + b[i][c] * weight) / 8) as u8;
            out[i] = Rgba::new(
                blend(0),
                blend(1),
                blend(2),
                if punch_through { 0 } else { blend(3) },
            );
        }
    }
    out
}
