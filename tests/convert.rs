//! Conversion laws: identity, shape, failure cleanliness, gamma, and the
//! three reference scenarios.

use rstest::rstest;
use zentexconv::*;

fn noise(shape: Shape, format: Format, seed: u32) -> Image {
    let mut image = Image::new(shape, format, ImageFlags::NONE).unwrap();
    let mut state = seed;
    for b in image.data_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *b = state as u8;
    }
    image
}

fn solid(shape: Shape, pixel: [u8; 4], flags: ImageFlags) -> Image {
    let mut image = Image::new(shape, Format::Rgba8, flags).unwrap();
    for p in image.data_mut().chunks_exact_mut(4) {
        p.copy_from_slice(&pixel);
    }
    image
}

fn rgba32f(shape: Shape, pixel: [f32; 4]) -> Image {
    let mut image = Image::new(shape, Format::Rgba32F, ImageFlags::NONE).unwrap();
    let bytes: Vec<u8> = pixel.iter().flat_map(|c| c.to_ne_bytes()).collect();
    for p in image.data_mut().chunks_exact_mut(16) {
        p.copy_from_slice(&bytes);
    }
    image
}

// ── Identity law ─────────────────────────────────────────────────────

#[rstest]
#[case::rgba8(Format::Rgba8, Shape::new_2d(13, 7))]
#[case::rgb565_mips(Format::Rgb565, Shape::new_2d(16, 16).with_mipmaps(5))]
#[case::half_cube(Format::Rgba16F, Shape::new_2d(8, 8).with_slices(6).with_mipmaps(2))]
#[case::dxt1_mips(Format::Dxt1, Shape::new_2d(32, 8).with_mipmaps(6))]
#[case::pvrtc(Format::PvrtcRgba2Bpp, Shape::new_2d(16, 16))]
#[case::depth_volume(Format::Depth32F, Shape::new_2d(4, 4).with_depth(4))]
fn identity_returns_equal_copy(#[case] format: Format, #[case] shape: Shape) {
    let src = noise(shape, format, 0xDEAD_BEEF);
    let out = src.convert_format(format).unwrap();
    assert_eq!(out, src);
}

// ── Shape law ────────────────────────────────────────────────────────

#[rstest]
#[case(Shape::new_2d(256, 256), 9)]
#[case(Shape::new_2d(64, 16).with_mipmaps(3), 7)]
#[case(Shape::new_2d(5, 3).with_slices(4), 3)]
#[case(Shape::new_2d(4, 4).with_depth(32), 6)]
#[case(Shape::new_2d(1, 1), 1)]
fn mip_count_follows_request(#[case] shape: Shape, #[case] full_chain: u32) {
    let src = noise(shape, Format::Rgba8, 7);

    let kept = src.convert_format(Format::Rgb565).unwrap();
    assert_eq!(kept.num_mipmaps(), shape.num_mipmaps);
    assert_eq!(kept.num_slices(), shape.num_slices);

    let rebuilt = ConvertRequest::new(&src, Format::Rgb565)
        .regenerate_mipmaps(true)
        .convert()
        .unwrap();
    assert_eq!(rebuilt.num_mipmaps(), full_chain);
    assert_eq!(rebuilt.num_slices(), shape.num_slices);
    for mip in 0..full_chain {
        assert_eq!(rebuilt.level_dims(mip), shape.level_dims(mip));
    }
}

// ── Failure cleanliness ──────────────────────────────────────────────

#[rstest]
#[case::pvrtc(Format::Rgba8, Format::PvrtcRgba4Bpp)]
#[case::pvrtc2(Format::Rgba8, Format::Pvrtc2Rgba2Bpp)]
#[case::xgbr(Format::Rgba8, Format::XgbrDxt5)]
#[case::eac_unsigned(Format::Rgba8, Format::EacRg11)]
#[case::to_depth(Format::Rgba8, Format::Depth16)]
#[case::from_depth(Format::Depth24, Format::Rgba8)]
#[case::depth_to_block(Format::Depth16, Format::Dxt1)]
fn unsupported_pairs_leave_destination_empty(#[case] src: Format, #[case] dst: Format) {
    let src = noise(Shape::new_2d(8, 8), src, 1);
    let mut out = noise(Shape::new_2d(4, 4), Format::Rgba8, 2);
    let err = ConvertRequest::new(&src, dst).convert_into(&mut out);
    assert!(err.is_err(), "{} -> {dst}", src.format());
    assert!(out.is_empty());
    assert!(out.data().is_empty());
}

#[test]
fn error_kinds_name_the_missing_capability() {
    let src = noise(Shape::new_2d(8, 8), Format::Rgba8, 3);
    assert!(matches!(
        src.convert_format(Format::PvrtcRgb2Bpp),
        Err(ConvertError::UnsupportedDestinationFormat(Format::PvrtcRgb2Bpp))
    ));
    assert!(matches!(
        src.convert_format(Format::Depth24Stencil8),
        Err(ConvertError::UnsupportedConversionPair { .. })
    ));
    let depth = noise(Shape::new_2d(8, 8), Format::Depth16, 3);
    assert!(matches!(
        ConvertRequest::new(&depth, Format::Depth16)
            .regenerate_mipmaps(true)
            .convert(),
        Err(ConvertError::UnsupportedMipmapFormat(Format::Depth16))
    ));
}

#[test]
fn in_place_failure_keeps_image() {
    let mut image = noise(Shape::new_2d(8, 8), Format::Rgba8, 4);
    let before = image.clone();
    assert!(image.convert_format_in_place(Format::EacRg11).is_err());
    assert_eq!(image, before);

    image.convert_format_in_place(Format::Bgra8).unwrap();
    assert_eq!(image.format(), Format::Bgra8);
    image.convert_format_in_place(Format::Rgba8).unwrap();
    assert_eq!(image, before);
}

#[test]
fn in_place_conversion_can_regenerate() {
    let mut image = solid(Shape::new_2d(16, 16), [40, 90, 200, 255], ImageFlags::NONE);
    image
        .convert_in_place(Format::Dxt1, true, CompressionQuality::HighQuality)
        .unwrap();
    assert_eq!(image.format(), Format::Dxt1);
    assert_eq!(image.num_mipmaps(), 5);

    // Same format with regeneration still rebuilds the chain.
    let mut image = solid(Shape::new_2d(8, 8), [10, 20, 30, 255], ImageFlags::NONE);
    image
        .convert_in_place(Format::Rgba8, true, CompressionQuality::Fastest)
        .unwrap();
    assert_eq!(image.num_mipmaps(), 4);
    assert_eq!(image.level_data(3, 0), &[10, 20, 30, 255]);
}

#[test]
fn in_place_regeneration_failure_keeps_image() {
    let mut depth = noise(Shape::new_2d(8, 8), Format::Depth16, 12);
    let before = depth.clone();
    assert!(matches!(
        depth.convert_in_place(Format::Depth16, true, CompressionQuality::Normal),
        Err(ConvertError::UnsupportedMipmapFormat(Format::Depth16))
    ));
    assert_eq!(depth, before);

    let mut image = noise(Shape::new_2d(8, 8), Format::Rgba8, 13);
    let before = image.clone();
    assert!(
        image
            .convert_in_place(Format::PvrtcRgba4Bpp, true, CompressionQuality::HighQuality)
            .is_err()
    );
    assert_eq!(image, before);
}

#[test]
fn limits_reject_before_allocating() {
    let src = noise(Shape::new_2d(64, 64), Format::Rgba8, 5);
    let limits = Limits {
        max_width: Some(32),
        ..Default::default()
    };
    let mut out = Image::default();
    let err = ConvertRequest::new(&src, Format::Dxt1)
        .with_limits(&limits)
        .convert_into(&mut out);
    assert!(matches!(err, Err(ConvertError::LimitExceeded(_))));
    assert!(out.is_empty());
}

// ── Gamma ────────────────────────────────────────────────────────────

#[test]
fn gamma_flag_changes_float_output() {
    let shape = Shape::new_2d(4, 4);
    let gamma = solid(shape, [128, 64, 200, 90], ImageFlags::NONE);
    let linear = solid(shape, [128, 64, 200, 90], ImageFlags::LINEAR_SPACE);

    let from_gamma = gamma.convert_format(Format::Rgba32F).unwrap();
    let from_linear = linear.convert_format(Format::Rgba32F).unwrap();
    assert_ne!(from_gamma.data(), from_linear.data());

    // Alpha is never gamma-encoded.
    assert_eq!(from_gamma.data()[12..16], from_linear.data()[12..16]);

    assert_eq!(from_gamma.convert_format(Format::Rgba8).unwrap(), gamma);
    assert_eq!(from_linear.convert_format(Format::Rgba8).unwrap(), linear);
}

#[test]
fn eight_bit_paths_ignore_gamma() {
    let shape = Shape::new_2d(4, 4);
    let gamma = solid(shape, [10, 20, 30, 40], ImageFlags::NONE);
    let linear = solid(shape, [10, 20, 30, 40], ImageFlags::LINEAR_SPACE);
    assert_eq!(
        gamma.convert_format(Format::Abgr8).unwrap().data(),
        linear.convert_format(Format::Abgr8).unwrap().data()
    );
}

// ── Scenarios ────────────────────────────────────────────────────────

#[rstest]
#[case::dxt1(Format::Dxt1, 0)]
#[case::dxt3(Format::Dxt3, 0)]
#[case::dxt5(Format::Dxt5, 0)]
#[case::etc1(Format::Etc1Rgb8, 8)]
#[case::etc2(Format::Etc2Rgb8, 8)]
#[case::etc2_a1(Format::Etc2Rgb8A1, 8)]
#[case::etc2_rgba(Format::Etc2Rgba8, 8)]
fn opaque_red_survives_compression(#[case] format: Format, #[case] tolerance: u8) {
    let src = solid(Shape::new_2d(4, 4), [255, 0, 0, 255], ImageFlags::NONE);
    let compressed = src.convert_format(format).unwrap();
    assert_eq!(compressed.format(), format);
    let back = compressed.convert_format(Format::Rgba8).unwrap();
    for p in back.data().chunks_exact(4) {
        for (got, want) in p.iter().zip([255u8, 0, 0, 255]) {
            assert!(got.abs_diff(want) <= tolerance, "{format}: {p:?}");
        }
    }
}

#[test]
fn full_chain_from_256() {
    let src = noise(Shape::new_2d(256, 256), Format::Rgba8, 6);
    let out = ConvertRequest::new(&src, Format::Rgba8)
        .regenerate_mipmaps(true)
        .convert()
        .unwrap();
    assert_eq!(out.num_mipmaps(), 9);
    for k in 0..9 {
        let side = 256 >> k;
        assert_eq!(out.level_dims(k), (side, side, 1));
        assert_eq!(out.level_data(k, 0).len(), (side * side * 4) as usize);
    }
    assert_eq!(out.level_data(0, 0), src.level_data(0, 0));
}

/// Left half white, right half black.
fn half_white(w: u32, h: u32, flags: ImageFlags) -> Image {
    let mut image = solid(Shape::new_2d(w, h), [0, 0, 0, 255], flags);
    for (i, p) in image.data_mut().chunks_exact_mut(4).enumerate() {
        if (i as u32 % w) < w / 2 {
            p.copy_from_slice(&[255, 255, 255, 255]);
        }
    }
    image
}

#[test]
fn compressed_source_regenerates_from_decoded_pixels() {
    // Linear so the 1x1 average is exactly half.
    let dxt1 = half_white(8, 8, ImageFlags::LINEAR_SPACE)
        .convert_format(Format::Dxt1)
        .unwrap();
    assert_eq!(dxt1.num_mipmaps(), 1);

    let rgba = ConvertRequest::new(&dxt1, Format::Rgba8)
        .regenerate_mipmaps(true)
        .convert()
        .unwrap();
    assert_eq!(rgba.num_mipmaps(), 4);
    assert_eq!(rgba.level_dims(3), (1, 1, 1));
    assert_eq!(
        rgba.level_data(2, 0),
        &[255, 255, 255, 255, 0, 0, 0, 255, 255, 255, 255, 255, 0, 0, 0, 255]
    );
    assert_eq!(rgba.level_data(3, 0), &[128, 128, 128, 255]);

    let etc = ConvertRequest::new(&dxt1, Format::Etc2Rgb8)
        .regenerate_mipmaps(true)
        .convert()
        .unwrap();
    assert_eq!(etc.format(), Format::Etc2Rgb8);
    assert_eq!(etc.num_mipmaps(), 4);
    let back = etc.convert_format(Format::Rgba8).unwrap();
    for (c, v) in back.level_data(3, 0).iter().zip([128u8, 128, 128, 255]) {
        assert!(c.abs_diff(v) <= 8, "{:?}", back.level_data(3, 0));
    }
}

#[test]
fn float_source_regenerates_into_compressed() {
    let mut src = rgba32f(Shape::new_2d(8, 8), [0.0, 0.0, 0.0, 1.0]);
    let white: Vec<u8> = [1.0f32; 4].iter().flat_map(|c| c.to_ne_bytes()).collect();
    for (i, p) in src.data_mut().chunks_exact_mut(16).enumerate() {
        if i % 8 < 4 {
            p.copy_from_slice(&white);
        }
    }

    let dxt5 = ConvertRequest::new(&src, Format::Dxt5)
        .regenerate_mipmaps(true)
        .with_quality(CompressionQuality::HighQuality)
        .convert()
        .unwrap();
    assert_eq!(dxt5.num_mipmaps(), 4);
    // 8x8, 4x4, 2x2 and 1x1 take 4 + 1 + 1 + 1 blocks.
    assert_eq!(dxt5.data().len(), 7 * 16);

    let back = dxt5.convert_format(Format::Rgba8).unwrap();
    let top = back.level_data(0, 0);
    assert_eq!(top[..4], [255, 255, 255, 255]);
    assert_eq!(top[top.len() - 4..], [0, 0, 0, 255]);
    // Linear 0.5 written as sRGB lands near 188.
    let p = back.level_data(3, 0);
    for c in &p[..3] {
        assert!(c.abs_diff(188) <= 5, "{p:?}");
    }
    assert_eq!(p[3], 255);
}

#[test]
fn hdr_float_to_eight_bit() {
    let shape = Shape::new_2d(16, 16);

    // Over-range values clamp; 0.5 linear lands on sRGB 188.
    let src = rgba32f(shape, [4.0, 0.5, -1.0, 1.0]);
    let out = src.convert_format(Format::Rgba8).unwrap();
    for p in out.data().chunks_exact(4) {
        assert_eq!(p[0], 255);
        assert!((187..=188).contains(&p[1]), "{p:?}");
        assert_eq!(p[2], 0);
        assert_eq!(p[3], 255);
    }

    let mut linear = rgba32f(shape, [0.5, 0.5, 0.5, 0.5]);
    linear.set_flags(ImageFlags::LINEAR_SPACE);
    let out = linear.convert_format(Format::Rgb565).unwrap();
    let v = u16::from_ne_bytes([out.data()[0], out.data()[1]]);
    // 0.5 quantized without the sRGB curve: 16/31, 32/63, 16/31.
    assert_eq!(v, 16 << 11 | 32 << 5 | 16);
}

// ── Compressed round trips ───────────────────────────────────────────

fn gradient(w: u32, h: u32) -> Image {
    let mut image = Image::new(Shape::new_2d(w, h), Format::Rgba8, ImageFlags::NONE).unwrap();
    for (i, p) in image.data_mut().chunks_exact_mut(4).enumerate() {
        let (x, y) = (i as u32 % w, i as u32 / w);
        p.copy_from_slice(&[(x * 255 / (w - 1)) as u8, (y * 255 / (h - 1)) as u8, 96, 255]);
    }
    image
}

fn mean_error(a: &Image, b: &Image, channels: usize) -> f64 {
    let total: u64 = a
        .data()
        .chunks_exact(4)
        .zip(b.data().chunks_exact(4))
        .flat_map(|(p, q)| (0..channels).map(move |c| u64::from(p[c].abs_diff(q[c]))))
        .sum();
    total as f64 / (a.data().len() / 4 * channels) as f64
}

#[rstest]
#[case(Format::Dxt1, CompressionQuality::Fastest)]
#[case(Format::Dxt1, CompressionQuality::HighQuality)]
#[case(Format::Dxt3, CompressionQuality::Normal)]
#[case(Format::Dxt5, CompressionQuality::Normal)]
#[case(Format::Etc1Rgb8, CompressionQuality::Normal)]
#[case(Format::Etc2Rgb8, CompressionQuality::Fastest)]
#[case(Format::Etc2Rgba8, CompressionQuality::HighQuality)]
fn gradient_error_is_bounded(#[case] format: Format, #[case] quality: CompressionQuality) {
    let src = gradient(32, 32);
    let compressed = ConvertRequest::new(&src, format)
        .with_quality(quality)
        .convert()
        .unwrap();
    let back = compressed.convert_format(Format::Rgba8).unwrap();
    let err = mean_error(&src, &back, 4);
    assert!(err < 8.0, "{format} at {quality:?}: mean error {err}");
}

#[test]
fn two_channel_formats_keep_red_and_green() {
    let src = gradient(16, 16);
    for format in [Format::Dxn2, Format::EacSignedRg11] {
        let back = src
            .convert_format(format)
            .unwrap()
            .convert_format(Format::Rgba8)
            .unwrap();
        let err = mean_error(&src, &back, 2);
        assert!(err < 6.0, "{format}: mean error {err}");
    }
}

#[test]
fn compressed_to_compressed_goes_through_rgba8() {
    let src = gradient(16, 16);
    let etc = src.convert_format(Format::Etc2Rgb8).unwrap();
    let dxt = etc.convert_format(Format::Dxt1).unwrap();
    assert_eq!(dxt.format(), Format::Dxt1);
    assert_eq!(dxt.data().len(), 16 / 4 * 16 / 4 * 8);
    let back = dxt.convert_format(Format::Rgba8).unwrap();
    assert!(mean_error(&src, &back, 3) < 12.0);
}

#[test]
fn decode_only_formats_decode() {
    for format in [
        Format::XgbrDxt5,
        Format::EacRg11,
        Format::PvrtcRgb2Bpp,
        Format::PvrtcRgba4Bpp,
        Format::Pvrtc2Rgba4Bpp,
    ] {
        let src = noise(Shape::new_2d(16, 8).with_mipmaps(2), format, 9);
        let out = src.convert_format(Format::Rgba8).unwrap();
        assert_eq!(out.shape(), src.shape());
        assert_eq!(out.data().len(), (16 * 8 + 8 * 4) * 4);
    }
}

// ── Codec entry points ───────────────────────────────────────────────

#[test]
fn codec_entry_points_reject_mismatched_images() {
    let shape = Shape::new_2d(8, 8);
    let dxt1 = noise(shape, Format::Dxt1, 10);

    let decode = decompressor(Format::Dxt1).unwrap();
    let mut rgb8 = Image::new(shape, Format::Rgb8, ImageFlags::NONE).unwrap();
    assert!(matches!(
        decode(&dxt1, &mut rgb8),
        Err(ConvertError::LayoutMismatch { .. })
    ));
    let mut rgba = Image::new(shape, Format::Rgba8, ImageFlags::NONE).unwrap();
    decode(&dxt1, &mut rgba).unwrap();
    assert_eq!(rgba, dxt1.convert_format(Format::Rgba8).unwrap());

    let pvrtc = noise(shape, Format::PvrtcRgba4Bpp, 11);
    let decode_2bpp = decompressor(Format::PvrtcRgba2Bpp).unwrap();
    assert!(matches!(
        decode_2bpp(&pvrtc, &mut rgba),
        Err(ConvertError::UnsupportedSourceFormat(Format::PvrtcRgba4Bpp))
    ));

    let encode = compressor(Format::Dxt1).unwrap();
    let mut small = Image::new(Shape::new_2d(4, 4), Format::Dxt1, ImageFlags::NONE).unwrap();
    assert!(matches!(
        encode(&rgba, &mut small, CompressionQuality::Normal),
        Err(ConvertError::InvalidShape(_))
    ));
    let mut packed = Image::new(shape, Format::Dxt1, ImageFlags::NONE).unwrap();
    assert!(matches!(
        encode(&dxt1, &mut packed, CompressionQuality::Normal),
        Err(ConvertError::LayoutMismatch { .. })
    ));
    encode(&rgba, &mut packed, CompressionQuality::Normal).unwrap();
    assert_eq!(packed, rgba.convert_format(Format::Dxt1).unwrap());
}
