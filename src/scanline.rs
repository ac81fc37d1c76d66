//! Row-by-row transcoding between uncompressed formats through canonical RGBA.

use rgb::Rgba;

use crate::format::{Format, PackRgba8Fn, PackRgba32fFn, UnpackRgba8Fn, UnpackRgba32fFn};
use crate::image::Image;

/// The unpack/pack pair that moves pixels from one uncompressed format to
/// another.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Transcoder {
    Rgba8 {
        unpack: UnpackRgba8Fn,
        pack: PackRgba8Fn,
    },
    Rgba32F {
        unpack: UnpackRgba32fFn,
        pack: PackRgba32fFn,
    },
}

impl Transcoder {
    /// Float canonical when either side is a float format, 8-bit otherwise.
    /// `None` when either side lacks the callable for that precision.
    pub(crate) fn select(src: Format, dst: Format) -> Option<Self> {
        let (s, d) = (src.descriptor(), dst.descriptor());
        if s.is_float() || d.is_float() {
            Some(Self::Rgba32F {
                unpack: s.unpack_rgba32f?,
                pack: d.pack_rgba32f?,
            })
        } else {
            Some(Self::Rgba8 {
                unpack: s.unpack_rgba8?,
                pack: d.pack_rgba8?,
            })
        }
    }

    pub(crate) fn is_float(&self) -> bool {
        matches!(self, Self::Rgba32F { .. })
    }
}

/// Transcode every row of every mip, slice and depth layer of `src` into
/// `dst`, which must have the same dimensions, slices and mip count.
///
/// `gamma` is handed unchanged to every callable.
pub(crate) fn transcode(src: &Image, dst: &mut Image, transcoder: Transcoder, gamma: bool) {
    match transcoder {
        Transcoder::Rgba8 { unpack, pack } => {
            run(src, dst, unpack, pack, gamma, Rgba::new(0u8, 0, 0, 0));
        }
        Transcoder::Rgba32F { unpack, pack } => {
            run(src, dst, unpack, pack, gamma, Rgba::new(0.0f32, 0.0, 0.0, 0.0));
        }
    }
}

fn run<P: Copy>(
    src: &Image,
    dst: &mut Image,
    unpack: fn(&[u8], &mut [P], bool),
    pack: fn(&[P], &mut [u8], bool),
    gamma: bool,
    zero: P,
) {
    debug_assert_eq!(src.shape(), dst.shape());
    let src_bpp = src.format().bytes_per_pixel();
    let dst_bpp = dst.format().bytes_per_pixel();
    // Level 0 is the widest; one scratch row serves the whole run.
    let mut scratch = vec![zero; src.width() as usize];

    let src_data = src.data();
    let dst_data = dst.data_mut();
    let (mut src_off, mut dst_off) = (0usize, 0usize);
    for mip in 0..src.num_mipmaps() {
        let (w, h, d) = src.level_dims(mip);
        let w = w as usize;
        let rows = h as usize * d as usize;
        let (src_pitch, dst_pitch) = (src_bpp * w, dst_bpp * w);
        let row = &mut scratch[..w];
        for _slice in 0..src.num_slices() {
            for _ in 0..rows {
                unpack(&src_data[src_off..src_off + src_pitch], row, gamma);
                pack(row, &mut dst_data[dst_off..dst_off + dst_pitch], gamma);
                src_off += src_pitch;
                dst_off += dst_pitch;
            }
        }
    }
}
