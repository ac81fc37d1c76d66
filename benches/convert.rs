use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use zentexconv::{CompressionQuality, ConvertRequest, Format, Image, ImageFlags, Shape};

const SIDE: u32 = 256;

fn noise() -> Image {
    let mut image = Image::new(Shape::new_2d(SIDE, SIDE), Format::Rgba8, ImageFlags::NONE).unwrap();
    let mut state: u32 = 0x1234_5678;
    for b in image.data_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *b = state as u8;
    }
    image
}

fn scanline(c: &mut Criterion) {
    let src = noise();
    let mut group = c.benchmark_group("scanline (256x256 RGBA8 ->)");
    group.throughput(Throughput::Bytes(src.data().len() as u64));
    for format in [Format::Bgra8, Format::Rgb565, Format::Rgba16F, Format::Rgba32F] {
        group.bench_function(format.name(), |b| {
            b.iter(|| black_box(&src).convert_format(format).unwrap())
        });
    }
    group.finish();
}

fn compress(c: &mut Criterion) {
    let src = noise();
    let mut group = c.benchmark_group("compress (256x256 RGBA8 ->)");
    group.throughput(Throughput::Bytes(src.data().len() as u64));
    for format in [Format::Dxt1, Format::Dxt5, Format::Etc2Rgb8, Format::EacSignedRg11] {
        for quality in [CompressionQuality::Fastest, CompressionQuality::Normal] {
            group.bench_function(format!("{format} {quality:?}"), |b| {
                b.iter(|| {
                    ConvertRequest::new(black_box(&src), format)
                        .with_quality(quality)
                        .convert()
                        .unwrap()
                })
            });
        }
    }
    group.finish();
}

fn decompress(c: &mut Criterion) {
    let src = noise();
    let mut group = c.benchmark_group("decompress (256x256 -> RGBA8)");
    group.throughput(Throughput::Bytes(src.data().len() as u64));
    for format in [Format::Dxt1, Format::Dxt5, Format::Etc2Rgba8, Format::PvrtcRgba4Bpp] {
        let compressed = Image::from_bytes(
            Shape::new_2d(SIDE, SIDE),
            format,
            ImageFlags::NONE,
            src.data(),
        )
        .unwrap();
        group.bench_function(format.name(), |b| {
            b.iter(|| black_box(&compressed).convert_format(Format::Rgba8).unwrap())
        });
    }
    group.finish();
}

fn mipmaps(c: &mut Criterion) {
    let src = noise();
    c.bench_function("regenerate mipmaps 256x256 RGBA8", |b| {
        b.iter(|| {
            ConvertRequest::new(black_box(&src), Format::Rgba8)
                .regenerate_mipmaps(true)
                .convert()
                .unwrap()
        })
    });
}

criterion_group!(benches, scanline, compress, decompress, mipmaps);
criterion_main!(benches);
