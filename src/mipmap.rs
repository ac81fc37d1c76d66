//! Mip chain regeneration with a gamma-correct box filter.

use log::debug;
use rgb::Rgba;

use crate::error::ConvertError;
use crate::format::Format;
use crate::image::Image;

/// Whether levels of `format` can be regenerated.
///
/// Requires the float unpack/pack pair; block-compressed and depth formats
/// never qualify.
pub fn supports(format: Format) -> bool {
    let desc = format.descriptor();
    !desc.is_compressed() && desc.has_rgba32f()
}

/// Rebuild mip levels `1..num_mipmaps` of every slice from level 0.
///
/// Each texel of level `k` is the average of the 2x2x2 texels of level
/// `k - 1` it covers, with coordinates clamped at odd edges. Samples are
/// filtered in linear light unless the image is flagged linear already.
pub fn generate_mipmaps(image: &mut Image) -> Result<(), ConvertError> {
    let format = image.format();
    let desc = format.descriptor();
    let (Some(unpack), Some(pack)) = (desc.unpack_rgba32f, desc.pack_rgba32f) else {
        return Err(ConvertError::UnsupportedMipmapFormat(format));
    };
    if desc.is_compressed() {
        return Err(ConvertError::UnsupportedMipmapFormat(format));
    }
    debug!(
        "regenerating {} mip levels of {} slices ({format})",
        image.num_mipmaps().saturating_sub(1),
        image.num_slices()
    );

    let gamma = image.is_gamma();
    let (w0, h0, d0) = image.level_dims(0);
    let top = w0 as usize * h0 as usize * d0 as usize;
    let mut parent = vec![Rgba::new(0.0f32, 0.0, 0.0, 0.0); top];
    let mut child = Vec::with_capacity(top / 2 + 1);

    for slice in 0..image.num_slices() {
        for mip in 1..image.num_mipmaps() {
            let (pw, ph, pd) = image.level_dims(mip - 1);
            let (cw, ch, cd) = image.level_dims(mip);
            let parent_len = pw as usize * ph as usize * pd as usize;
            unpack(
                image.level_data(mip - 1, slice),
                &mut parent[..parent_len],
                gamma,
            );

            child.clear();
            for z in 0..cd {
                for y in 0..ch {
                    for x in 0..cw {
                        child.push(box_sample(&parent, (pw, ph, pd), x, y, z));
                    }
                }
            }
            pack(&child, image.level_data_mut(mip, slice), gamma);
        }
    }
    Ok(())
}

fn box_sample(src: &[Rgba<f32>], (w, h, d): (u32, u32, u32), x: u32, y: u32, z: u32) -> Rgba<f32> {
    let xs = [(2 * x).min(w - 1), (2 * x + 1).min(w - 1)];
    let ys = [(2 * y).min(h - 1), (2 * y + 1).min(h - 1)];
    let zs = [(2 * z).min(d - 1), (2 * z + 1).min(d - 1)];

    let mut sum = Rgba::new(0.0f32, 0.0, 0.0, 0.0);
    for &sz in &zs {
        for &sy in &ys {
            for &sx in &xs {
                let p = src[(sz as usize * h as usize + sy as usize) * w as usize + sx as usize];
                sum.r += p.r;
                sum.g += p.g;
                sum.b += p.b;
                sum.a += p.a;
            }
        }
    }
    Rgba::new(sum.r / 8.0, sum.g / 8.0, sum.b / 8.0, sum.a / 8.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageFlags, Shape};

    #[test]
    fn flat_color_stays_flat() {
        let shape = Shape::new_2d(8, 4).with_mipmaps(4);
        let mut image = Image::new(shape, Format::Rgba8, ImageFlags::NONE).unwrap();
        for px in image.level_data_mut(0, 0).chunks_exact_mut(4) {
            px.copy_from_slice(&[200, 100, 50, 255]);
        }
        generate_mipmaps(&mut image).unwrap();
        for mip in 1..4 {
            for px in image.level_data(mip, 0).chunks_exact(4) {
                assert_eq!(px, &[200, 100, 50, 255], "mip {mip}");
            }
        }
        assert_eq!(image.level_data(3, 0).len(), 4);
    }

    #[test]
    fn averaging_happens_in_linear_light() {
        let shape = Shape::new_2d(2, 1).with_mipmaps(2);
        let mut srgb = Image::new(shape, Format::L8, ImageFlags::NONE).unwrap();
        srgb.level_data_mut(0, 0).copy_from_slice(&[0, 255]);
        let mut linear = srgb.clone();
        linear.set_flags(ImageFlags::LINEAR_SPACE);

        generate_mipmaps(&mut srgb).unwrap();
        generate_mipmaps(&mut linear).unwrap();
        // Half of full intensity is ~188 after sRGB encoding.
        assert!((186..=189).contains(&srgb.level_data(1, 0)[0]));
        assert_eq!(linear.level_data(1, 0)[0], 128);
    }

    #[test]
    fn volumes_shrink_in_depth() {
        let shape = Shape::new_2d(2, 2).with_depth(2).with_mipmaps(2);
        let mut image = Image::new(shape, Format::R32F, ImageFlags::LINEAR_SPACE).unwrap();
        let values: Vec<u8> = (0..8).flat_map(|i| (i as f32).to_ne_bytes()).collect();
        image.level_data_mut(0, 0).copy_from_slice(&values);
        generate_mipmaps(&mut image).unwrap();
        let out = image.level_data(1, 0);
        assert_eq!(f32::from_ne_bytes([out[0], out[1], out[2], out[3]]), 3.5);
    }

    #[test]
    fn compressed_and_depth_formats_are_rejected() {
        for format in [Format::Dxt1, Format::Depth16] {
            let shape = Shape::new_2d(4, 4).with_mipmaps(2);
            let mut image = Image::new(shape, format, ImageFlags::NONE).unwrap();
            assert!(!supports(format));
            assert!(matches!(
                generate_mipmaps(&mut image),
                Err(ConvertError::UnsupportedMipmapFormat(f)) if f == format
            ));
        }
        assert!(supports(Format::Rgba8));
        assert!(supports(Format::Rgba16F));
    }
}
