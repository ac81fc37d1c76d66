//! Block codec dispatch.
//!
//! Compressed formats name a [`BlockFamily`]. [`decompressor`] and
//! [`compressor`] resolve a format to the entry point that decodes a whole
//! image into RGBA8, or encodes a whole RGBA8 image. Both return `None` for
//! formats the family cannot handle. The entry points check that source and
//! destination agree on format and dimensions before touching a pixel.

pub(crate) mod bc;
pub(crate) mod eac;
pub(crate) mod etc;
pub(crate) mod pvrtc;

use log::warn;
use rgb::Rgba;

use crate::error::ConvertError;
use crate::format::Format;
use crate::image::Image;

/// Compression effort. Higher levels search harder for better endpoints but
/// never change the output layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompressionQuality {
    /// Single-pass endpoint estimate.
    Fastest,
    /// Principal-axis endpoints with one refinement pass.
    #[default]
    Normal,
    /// Iterative refinement and wider mode search.
    HighQuality,
}

/// Block codec family of a compressed format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BlockFamily {
    /// DXT1.
    Bc1,
    /// DXT3.
    Bc2,
    /// DXT5.
    Bc3,
    /// DXT5 with swizzled channels.
    Bc3Xgbr,
    /// DXN2 / ATI2.
    Bc5,
    Etc1,
    Etc2Rgb,
    Etc2PunchThrough,
    Etc2Rgba,
    EacRg11,
    EacSignedRg11,
    Pvrtc2Bpp,
    Pvrtc4Bpp,
}

impl BlockFamily {
    /// Whether images of this family can be produced.
    pub const fn can_compress(self) -> bool {
        !matches!(
            self,
            Self::Bc3Xgbr | Self::EacRg11 | Self::Pvrtc2Bpp | Self::Pvrtc4Bpp
        )
    }
}

/// Decode every level of a compressed image into an RGBA8 image.
///
/// `dst` must be RGBA8 with the source's dimensions and slice count; levels
/// present in both are decoded.
pub type Decompressor = fn(src: &Image, dst: &mut Image) -> Result<(), ConvertError>;

/// Encode every level of an RGBA8 image into a compressed image of the same
/// dimensions and slice count.
pub type Compressor =
    fn(src: &Image, dst: &mut Image, quality: CompressionQuality) -> Result<(), ConvertError>;

/// Decompression entry point for `format`, if it is block-compressed.
pub fn decompressor(format: Format) -> Option<Decompressor> {
    let family = format.descriptor().codec?;
    let decode: Decompressor = match family {
        BlockFamily::Bc1 => decompress_blocks::<bc::Bc1>,
        BlockFamily::Bc2 => decompress_blocks::<bc::Bc2>,
        BlockFamily::Bc3 => decompress_blocks::<bc::Bc3>,
        BlockFamily::Bc3Xgbr => decompress_xgbr,
        BlockFamily::Bc5 => decompress_blocks::<bc::Bc5>,
        BlockFamily::Etc1 => decompress_blocks::<etc::Etc1>,
        BlockFamily::Etc2Rgb => decompress_blocks::<etc::Etc2Rgb>,
        BlockFamily::Etc2PunchThrough => decompress_blocks::<etc::Etc2PunchThrough>,
        BlockFamily::Etc2Rgba => decompress_blocks::<etc::Etc2Rgba>,
        BlockFamily::EacRg11 => decompress_blocks::<eac::EacRg11>,
        BlockFamily::EacSignedRg11 => decompress_blocks::<eac::EacSignedRg11>,
        BlockFamily::Pvrtc2Bpp => pvrtc::decompress_2bpp,
        BlockFamily::Pvrtc4Bpp => pvrtc::decompress_4bpp,
    };
    Some(decode)
}

/// Compression entry point for `format`, if its family can be encoded.
pub fn compressor(format: Format) -> Option<Compressor> {
    let family = format.descriptor().codec?;
    let encode: Compressor = match family {
        BlockFamily::Bc1 => compress_blocks::<bc::Bc1>,
        BlockFamily::Bc2 => compress_blocks::<bc::Bc2>,
        BlockFamily::Bc3 => compress_blocks::<bc::Bc3>,
        BlockFamily::Bc5 => compress_blocks::<bc::Bc5>,
        BlockFamily::Etc1 => compress_blocks::<etc::Etc1>,
        BlockFamily::Etc2Rgb => compress_blocks::<etc::Etc2Rgb>,
        BlockFamily::Etc2PunchThrough => compress_blocks::<etc::Etc2PunchThrough>,
        BlockFamily::Etc2Rgba => compress_blocks::<etc::Etc2Rgba>,
        BlockFamily::EacSignedRg11 => compress_blocks::<eac::EacSignedRg11>,
        BlockFamily::Bc3Xgbr | BlockFamily::EacRg11 | BlockFamily::Pvrtc2Bpp | BlockFamily::Pvrtc4Bpp => {
            return None;
        }
    };
    Some(encode)
}

/// A 4x4 block format whose blocks decode independently.
pub(crate) trait BlockDecoder {
    const BLOCK_BYTES: usize;

    /// Decode one block into row-major pixels.
    fn decode_block(block: &[u8], out: &mut [Rgba<u8>; 16]);
}

pub(crate) trait BlockEncoder: BlockDecoder {
    /// Encode 16 row-major pixels into `out` (`BLOCK_BYTES` long).
    fn encode_block(pixels: &[Rgba<u8>; 16], out: &mut [u8], quality: CompressionQuality);
}

/// Whether `format` is stored in blocks of `bytes` covering `width`x4 pixels.
pub(crate) fn has_blocks(format: Format, bytes: usize, width: u32) -> bool {
    let desc = format.descriptor();
    desc.codec.is_some()
        && desc.size == bytes
        && desc.block_width == width
        && desc.block_height == 4
}

/// Dimensions and slice count must match; mip counts may differ.
pub(crate) fn check_extent(src: &Image, dst: &Image) -> Result<(), ConvertError> {
    let (s, d) = (src.shape(), dst.shape());
    if (s.width, s.height, s.depth, s.num_slices) != (d.width, d.height, d.depth, d.num_slices) {
        return Err(ConvertError::InvalidShape(format!(
            "source is {}x{}x{} with {} slices, destination is {}x{}x{} with {} slices",
            s.width, s.height, s.depth, s.num_slices, d.width, d.height, d.depth, d.num_slices
        )));
    }
    Ok(())
}

/// Source must be blocks of `bytes` (`width`x4), destination RGBA8.
pub(crate) fn check_decode(
    src: &Image,
    dst: &Image,
    bytes: usize,
    width: u32,
) -> Result<(), ConvertError> {
    if !has_blocks(src.format(), bytes, width) {
        return Err(ConvertError::UnsupportedSourceFormat(src.format()));
    }
    if dst.format() != Format::Rgba8 {
        return Err(ConvertError::LayoutMismatch {
            expected: Format::Rgba8,
            actual: dst.format(),
        });
    }
    check_extent(src, dst)
}

fn decompress_blocks<C: BlockDecoder>(src: &Image, dst: &mut Image) -> Result<(), ConvertError> {
    check_decode(src, dst, C::BLOCK_BYTES, 4)?;
    let mut block = [Rgba::new(0u8, 0, 0, 0); 16];
    for mip in 0..src.num_mipmaps().min(dst.num_mipmaps()) {
        let (w, h, d) = src.level_dims(mip);
        let (bw, bh) = (w.div_ceil(4) as usize, h.div_ceil(4) as usize);
        let (w, h) = (w as usize, h as usize);
        for slice in 0..src.num_slices() {
            let blocks = src.level_data(mip, slice);
            let pixels = dst.level_data_mut(mip, slice);
            let mut chunks = blocks.chunks_exact(C::BLOCK_BYTES);
            for z in 0..d as usize {
                for by in 0..bh {
                    for bx in 0..bw {
                        let Some(chunk) = chunks.next() else {
                            return Ok(());
                        };
                        C::decode_block(chunk, &mut block);
                        // Edge blocks are clipped to the level.
                        for py in 0..4.min(h - by * 4) {
                            for px in 0..4.min(w - bx * 4) {
                                let p = block[py * 4 + px];
                                let at = ((z * h + by * 4 + py) * w + bx * 4 + px) * 4;
                                pixels[at..at + 4].copy_from_slice(&[p.r, p.g, p.b, p.a]);
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn compress_blocks<C: BlockEncoder>(
    src: &Image,
    dst: &mut Image,
    quality: CompressionQuality,
) -> Result<(), ConvertError> {
    if src.format() != Format::Rgba8 {
        return Err(ConvertError::LayoutMismatch {
            expected: Format::Rgba8,
            actual: src.format(),
        });
    }
    if !has_blocks(dst.format(), C::BLOCK_BYTES, 4) {
        return Err(ConvertError::UnsupportedDestinationFormat(dst.format()));
    }
    check_extent(src, dst)?;
    let mut block = [Rgba::new(0u8, 0, 0, 0); 16];
    for mip in 0..src.num_mipmaps().min(dst.num_mipmaps()) {
        let (w, h, d) = src.level_dims(mip);
        let (bw, bh) = (w.div_ceil(4) as usize, h.div_ceil(4) as usize);
        let (w, h) = (w as usize, h as usize);
        for slice in 0..src.num_slices() {
            let pixels = src.level_data(mip, slice);
            let blocks = dst.level_data_mut(mip, slice);
            let mut chunks = blocks.chunks_exact_mut(C::BLOCK_BYTES);
            for z in 0..d as usize {
                for by in 0..bh {
                    for bx in 0..bw {
                        let Some(chunk) = chunks.next() else {
                            return Ok(());
                        };
                        // Edge blocks replicate the last row and column.
                        for py in 0..4 {
                            let y = (by * 4 + py).min(h - 1);
                            for px in 0..4 {
                                let x = (bx * 4 + px).min(w - 1);
                                let at = ((z * h + y) * w + x) * 4;
                                let c = &pixels[at..at + 4];
                                block[py * 4 + px] = Rgba::new(c[0], c[1], c[2], c[3]);
                            }
                        }
                        C::encode_block(&block, chunk, quality);
                    }
                }
            }
        }
    }
    Ok(())
}

fn decompress_xgbr(src: &Image, dst: &mut Image) -> Result<(), ConvertError> {
    warn!(
        "{} is decoded as plain DXT5; channels stay swizzled",
        src.format()
    );
    decompress_blocks::<bc::Bc3>(src, dst)
}

/// Squared RGB distance.
#[inline]
pub(crate) fn rgb_error(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    let dr = i32::from(a.r) - i32::from(b.r);
    let dg = i32::from(a.g) - i32::from(b.g);
    let db = i32::from(a.b) - i32::from(b.b);
    (dr * dr + dg * dg + db * db) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageFlags, Shape};

    #[test]
    fn every_compressed_format_decompresses() {
        for format in Format::ALL.into_iter().filter(|f| f.is_compressed()) {
            assert!(decompressor(format).is_some(), "{format}");
        }
        assert!(decompressor(Format::Rgba8).is_none());
    }

    #[test]
    fn compressor_capabilities() {
        for format in [
            Format::Dxt1,
            Format::Dxt3,
            Format::Dxt5,
            Format::Dxn2,
            Format::Etc1Rgb8,
            Format::Etc2Rgb8,
            Format::Etc2Rgb8A1,
            Format::Etc2Rgba8,
            Format::EacSignedRg11,
        ] {
            assert!(compressor(format).is_some(), "{format}");
        }
        for format in [
            Format::XgbrDxt5,
            Format::EacRg11,
            Format::PvrtcRgb2Bpp,
            Format::PvrtcRgba4Bpp,
            Format::Pvrtc2Rgba4Bpp,
            Format::Rgba8,
            Format::Depth24,
        ] {
            assert!(compressor(format).is_none(), "{format}");
        }
    }

    #[test]
    fn family_capability_matches_dispatch() {
        for format in Format::ALL {
            if let Some(family) = format.descriptor().codec {
                assert_eq!(family.can_compress(), compressor(format).is_some(), "{format}");
            }
        }
    }

    #[test]
    fn partial_blocks_are_padded_and_clipped() {
        // 5x3 needs 2x1 blocks; the 5th column and missing 4th row replicate edges.
        let shape = Shape::new_2d(5, 3);
        let mut src = Image::new(shape, Format::Rgba8, ImageFlags::NONE).unwrap();
        for (i, px) in src.data_mut().chunks_exact_mut(4).enumerate() {
            let v = if i % 5 == 4 { 255 } else { 0 };
            px.copy_from_slice(&[v, v, v, 255]);
        }
        let mut packed = Image::new(shape, Format::Dxt1, ImageFlags::NONE).unwrap();
        compress_blocks::<bc::Bc1>(&src, &mut packed, CompressionQuality::Normal).unwrap();
        assert_eq!(packed.data().len(), 16);

        let mut back = Image::new(shape, Format::Rgba8, ImageFlags::NONE).unwrap();
        decompress_blocks::<bc::Bc1>(&packed, &mut back).unwrap();
        assert_eq!(back.data(), src.data());
    }

    #[test]
    fn mismatched_images_are_rejected() {
        let shape = Shape::new_2d(8, 8);
        let dxt1 = Image::new(shape, Format::Dxt1, ImageFlags::NONE).unwrap();
        let rgba = Image::new(shape, Format::Rgba8, ImageFlags::NONE).unwrap();

        let mut rgb = Image::new(shape, Format::Rgb8, ImageFlags::NONE).unwrap();
        assert!(matches!(
            decompress_blocks::<bc::Bc1>(&dxt1, &mut rgb),
            Err(ConvertError::LayoutMismatch {
                expected: Format::Rgba8,
                actual: Format::Rgb8
            })
        ));

        // DXT1 blocks are 8 bytes; the DXT5 decoder must not read them.
        let mut out = rgba.clone();
        assert!(matches!(
            decompress_blocks::<bc::Bc3>(&dxt1, &mut out),
            Err(ConvertError::UnsupportedSourceFormat(Format::Dxt1))
        ));

        let mut small = Image::new(Shape::new_2d(4, 4), Format::Rgba8, ImageFlags::NONE).unwrap();
        assert!(matches!(
            decompress_blocks::<bc::Bc1>(&dxt1, &mut small),
            Err(ConvertError::InvalidShape(_))
        ));

        let mut small = Image::new(Shape::new_2d(4, 4), Format::Dxt1, ImageFlags::NONE).unwrap();
        assert!(matches!(
            compress_blocks::<bc::Bc1>(&rgba, &mut small, CompressionQuality::Normal),
            Err(ConvertError::InvalidShape(_))
        ));
        let mut dxt5 = Image::new(shape, Format::Dxt5, ImageFlags::NONE).unwrap();
        assert!(matches!(
            compress_blocks::<bc::Bc1>(&rgba, &mut dxt5, CompressionQuality::Normal),
            Err(ConvertError::UnsupportedDestinationFormat(Format::Dxt5))
        ));
        let mut packed = dxt1.clone();
        assert!(matches!(
            compress_blocks::<bc::Bc1>(&dxt1, &mut packed, CompressionQuality::Normal),
            Err(ConvertError::LayoutMismatch { .. })
        ));
    }
}
