#![no_main]
use libfuzzer_sys::fuzz_target;
use zentexconv::*;

fuzz_target!(|data: &[u8]| {
    // Header: src format, dst format, width, height, depth/slices, options.
    let [src, dst, w, h, layers, options, pixels @ ..] = data else {
        return;
    };
    let src = Format::ALL[*src as usize % Format::COUNT];
    let dst = Format::ALL[*dst as usize % Format::COUNT];
    let (w, h) = (u32::from(*w % 64) + 1, u32::from(*h % 64) + 1);
    let depth = u32::from(layers & 0x3) + 1;
    let slices = u32::from(layers >> 2 & 0x7) + 1;
    let mut shape = Shape::new_2d(w, h).with_depth(depth).with_slices(slices);
    shape.num_mipmaps = u32::from(options & 0xF) % shape.max_mip_levels() + 1;

    let flags = if options & 0x10 != 0 {
        ImageFlags::LINEAR_SPACE
    } else {
        ImageFlags::NONE
    };
    let Ok(image) = Image::from_bytes(shape, src, flags, pixels) else {
        return;
    };
    let quality = match options >> 5 & 0x3 {
        0 => CompressionQuality::Fastest,
        1 => CompressionQuality::Normal,
        _ => CompressionQuality::HighQuality,
    };
    let limits = Limits {
        max_memory_bytes: Some(64 << 20),
        ..Default::default()
    };

    let mut out = Image::default();
    let result = ConvertRequest::new(&image, dst)
        .regenerate_mipmaps(options & 0x80 != 0)
        .with_quality(quality)
        .with_limits(&limits)
        .convert_into(&mut out);
    match result {
        Ok(()) => {
            assert_eq!(out.format(), dst);
            assert_eq!(out.width(), w);
            assert_eq!(out.num_slices(), slices);
        }
        Err(_) => assert!(out.is_empty()),
    }
});
