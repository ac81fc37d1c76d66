//! IEEE 754 binary16 layouts with 1 to 4 channels.

use half::f16;
use rgb::Rgba;

/// Channels beyond `C` read as zero, alpha as one.
pub(crate) fn unpack_half<const C: usize>(src: &[u8], dst: &mut [Rgba<f32>], _gamma: bool) {
    for (px, c) in dst.iter_mut().zip(src.chunks_exact(C * 2)) {
        let mut v = [0.0, 0.0, 0.0, 1.0];
        for (i, h) in c.chunks_exact(2).enumerate() {
            v[i] = f16::from_ne_bytes([h[0], h[1]]).to_f32();
        }
        *px = Rgba::new(v[0], v[1], v[2], v[3]);
    }
}

pub(crate) fn pack_half<const C: usize>(src: &[Rgba<f32>], dst: &mut [u8], _gamma: bool) {
    for (out, px) in dst.chunks_exact_mut(C * 2).zip(src) {
        let v = [px.r, px.g, px.b, px.a];
        for (h, &f) in out.chunks_exact_mut(2).zip(&v) {
            h.copy_from_slice(&f16::from_f32(f).to_ne_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(out: &[u8], i: usize) -> u16 {
        u16::from_ne_bytes([out[2 * i], out[2 * i + 1]])
    }

    #[test]
    fn missing_channels_default() {
        let src = f16::from_f32(0.25).to_ne_bytes();
        let mut dst = [Rgba::new(9.0f32, 9.0, 9.0, 9.0)];
        unpack_half::<1>(&src, &mut dst, true);
        assert_eq!(dst[0], Rgba::new(0.25, 0.0, 0.0, 1.0));

        let mut out = [0u8; 4];
        pack_half::<2>(&[Rgba::new(1.0, 0.5, 7.0, 7.0)], &mut out, true);
        assert_eq!(bits(&out, 0), 0x3C00);
        assert_eq!(bits(&out, 1), 0x3800);
    }

    #[test]
    fn out_of_range_values() {
        let mut out = [0u8; 8];
        pack_half::<4>(&[Rgba::new(1.0e6, -0.0, f32::NAN, 65504.0)], &mut out, false);
        assert_eq!(bits(&out, 0), 0x7C00);
        assert_eq!(bits(&out, 1), 0x8000);
        assert!(f16::from_bits(bits(&out, 2)).is_nan());
        assert_eq!(bits(&out, 3), 0x7BFF);
    }

    #[test]
    fn hdr_values_survive_a_row() {
        let row = [Rgba::new(4.5f32, 0.125, 1024.0, 1.0), Rgba::new(-2.0, 0.0, 0.5, 0.0)];
        let mut bytes = [0u8; 16];
        pack_half::<4>(&row, &mut bytes, true);
        let mut back = [Rgba::new(0.0f32, 0.0, 0.0, 0.0); 2];
        unpack_half::<4>(&bytes, &mut back, true);
        assert_eq!(back, row);
    }
}
