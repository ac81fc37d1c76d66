//! Pixel formats and the process-wide format descriptor registry.
//!
//! Every [`Format`] has exactly one [`FormatDescriptor`] in a `static` table
//! that is built at compile time. Uncompressed formats carry row callables that
//! decode into (and encode from) canonical RGBA, either 8-bit or `f32`.
//! Compressed formats carry no callables; they name a [`BlockFamily`] that the
//! codec dispatcher resolves.

use core::fmt;
use core::ops::BitOr;

use rgb::Rgba;

use crate::codec::BlockFamily;
use crate::pack::{float, half, packed, uint};

/// Decode one row of `dst.len()` pixels into canonical 8-bit RGBA.
pub type UnpackRgba8Fn = fn(src: &[u8], dst: &mut [Rgba<u8>], gamma: bool);
/// Encode one row of `src.len()` canonical 8-bit RGBA pixels.
pub type PackRgba8Fn = fn(src: &[Rgba<u8>], dst: &mut [u8], gamma: bool);
/// Decode one row of `dst.len()` pixels into canonical float RGBA.
pub type UnpackRgba32fFn = fn(src: &[u8], dst: &mut [Rgba<f32>], gamma: bool);
/// Encode one row of `src.len()` canonical float RGBA pixels.
pub type PackRgba32fFn = fn(src: &[Rgba<f32>], dst: &mut [u8], gamma: bool);

/// Classification bits of a format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FormatType(u8);

impl FormatType {
    pub const NONE: Self = Self(0);
    /// Several pixels share one fixed-size code block.
    pub const COMPRESSED: Self = Self(1 << 0);
    /// Samples are floating point (half or single precision).
    pub const FLOAT: Self = Self(1 << 1);
    /// Samples are 16-bit half floats.
    pub const HALF: Self = Self(1 << 2);
    /// Channels are bit-packed into one machine word.
    pub const PACKED: Self = Self(1 << 3);
    pub const DEPTH: Self = Self(1 << 4);
    pub const STENCIL: Self = Self(1 << 5);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for FormatType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Pixel encoding identifier.
///
/// Multi-byte samples of uncompressed formats are stored in native byte order.
/// Packed formats (`Rgb565` and friends) store one native-endian `u16` per
/// pixel with the first-named channel in the most significant bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    /// 8-bit luminance.
    L8,
    /// 8-bit alpha.
    A8,
    /// 8-bit luminance + alpha.
    La8,
    R8,
    Rg8,
    Rgb8,
    Bgr8,
    #[default]
    Rgba8,
    Bgra8,
    Argb8,
    Abgr8,
    /// RGBA8 memory layout with an ignored, opaque fourth byte.
    Rgbx8,
    Bgrx8,
    Rgba4444,
    Rgba5551,
    Rgb565,
    /// 16-bit luminance + alpha.
    La16,
    Rgba16,
    R16F,
    Rg16F,
    Rgb16F,
    Rgba16F,
    L32F,
    R32F,
    Rg32F,
    Rgb32F,
    Rgba32F,
    Depth16,
    Depth24,
    Depth24Stencil8,
    Depth32F,
    /// BC1: 4x4 blocks of 8 bytes, optional 1-bit alpha.
    Dxt1,
    /// BC2: explicit 4-bit alpha.
    Dxt3,
    /// BC3: interpolated alpha.
    Dxt5,
    /// BC3 with X stored in alpha (normal maps).
    XgbrDxt5,
    /// BC5: two interpolated channels (normal maps).
    Dxn2,
    Etc1Rgb8,
    Etc2Rgb8,
    /// ETC2 with punch-through (1-bit) alpha.
    Etc2Rgb8A1,
    /// ETC2 color + EAC alpha.
    Etc2Rgba8,
    EacRg11,
    EacSignedRg11,
    PvrtcRgb2Bpp,
    PvrtcRgb4Bpp,
    PvrtcRgba2Bpp,
    PvrtcRgba4Bpp,
    Pvrtc2Rgba2Bpp,
    Pvrtc2Rgba4Bpp,
}

/// Capabilities of one pixel format.
#[derive(Clone, Copy)]
pub struct FormatDescriptor {
    pub format: Format,
    pub name: &'static str,
    pub kind: FormatType,
    /// Bytes per pixel, or bytes per block for compressed formats.
    pub size: usize,
    pub block_width: u32,
    pub block_height: u32,
    /// Minimum number of blocks along each axis of a level.
    pub min_blocks: u32,
    pub unpack_rgba8: Option<UnpackRgba8Fn>,
    pub pack_rgba8: Option<PackRgba8Fn>,
    pub unpack_rgba32f: Option<UnpackRgba32fFn>,
    pub pack_rgba32f: Option<PackRgba32fFn>,
    /// Block codec family of a compressed format.
    pub codec: Option<BlockFamily>,
}

impl fmt::Debug for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatDescriptor")
            .field("format", &self.format)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("block", &(self.block_width, self.block_height))
            .field("rgba8", &self.has_rgba8())
            .field("rgba32f", &self.has_rgba32f())
            .field("codec", &self.codec)
            .finish()
    }
}

impl FormatDescriptor {
    #[inline]
    pub const fn is_compressed(&self) -> bool {
        self.kind.contains(FormatType::COMPRESSED)
    }

    #[inline]
    pub const fn is_float(&self) -> bool {
        self.kind.contains(FormatType::FLOAT)
    }

    /// Both 8-bit callables are present.
    pub const fn has_rgba8(&self) -> bool {
        self.unpack_rgba8.is_some() && self.pack_rgba8.is_some()
    }

    /// Both float callables are present.
    pub const fn has_rgba32f(&self) -> bool {
        self.unpack_rgba32f.is_some() && self.pack_rgba32f.is_some()
    }

    /// Bytes occupied by one `width` x `height` x `depth` level, or `None` on
    /// overflow.
    pub fn level_size(&self, width: u32, height: u32, depth: u32) -> Option<usize> {
        let blocks_x = width
            .div_ceil(self.block_width)
            .max(self.min_blocks) as usize;
        let blocks_y = height
            .div_ceil(self.block_height)
            .max(self.min_blocks) as usize;
        blocks_x
            .checked_mul(blocks_y)?
            .checked_mul(self.size)?
            .checked_mul(depth as usize)
    }
}

const fn plain(format: Format, name: &'static str, kind: FormatType, size: usize) -> FormatDescriptor {
    FormatDescriptor {
        format,
        name,
        kind,
        size,
        block_width: 1,
        block_height: 1,
        min_blocks: 1,
        unpack_rgba8: None,
        pack_rgba8: None,
        unpack_rgba32f: None,
        pack_rgba32f: None,
        codec: None,
    }
}

const fn integer(
    format: Format,
    name: &'static str,
    kind: FormatType,
    size: usize,
    rgba8: (UnpackRgba8Fn, PackRgba8Fn),
    rgba32f: (UnpackRgba32fFn, PackRgba32fFn),
) -> FormatDescriptor {
    let mut desc = plain(format, name, kind, size);
    desc.unpack_rgba8 = Some(rgba8.0);
    desc.pack_rgba8 = Some(rgba8.1);
    desc.unpack_rgba32f = Some(rgba32f.0);
    desc.pack_rgba32f = Some(rgba32f.1);
    desc
}

const fn floating(
    format: Format,
    name: &'static str,
    kind: FormatType,
    size: usize,
    rgba32f: (UnpackRgba32fFn, PackRgba32fFn),
) -> FormatDescriptor {
    let mut desc = plain(format, name, kind.union(FormatType::FLOAT), size);
    desc.unpack_rgba32f = Some(rgba32f.0);
    desc.pack_rgba32f = Some(rgba32f.1);
    desc
}

const fn compressed(
    format: Format,
    name: &'static str,
    size: usize,
    block: (u32, u32),
    min_blocks: u32,
    codec: BlockFamily,
) -> FormatDescriptor {
    let mut desc = plain(format, name, FormatType::COMPRESSED, size);
    desc.block_width = block.0;
    desc.block_height = block.1;
    desc.min_blocks = min_blocks;
    desc.codec = Some(codec);
    desc
}

const N: FormatType = FormatType::NONE;
const P: FormatType = FormatType::PACKED;

const DESCRIPTORS: [FormatDescriptor; Format::COUNT] = [
    integer(Format::L8, "L8", N, 1, (uint::unpack_l8, uint::pack_l8), (uint::unpack_l8_f32, uint::pack_l8_f32)),
    integer(Format::A8, "A8", N, 1, (uint::unpack_a8, uint::pack_a8), (uint::unpack_a8_f32, uint::pack_a8_f32)),
    integer(Format::La8, "LA8", N, 2, (uint::unpack_la8, uint::pack_la8), (uint::unpack_la8_f32, uint::pack_la8_f32)),
    integer(Format::R8, "R8", N, 1, (uint::unpack_r8, uint::pack_r8), (uint::unpack_r8_f32, uint::pack_r8_f32)),
    integer(Format::Rg8, "RG8", N, 2, (uint::unpack_rg8, uint::pack_rg8), (uint::unpack_rg8_f32, uint::pack_rg8_f32)),
    integer(
        Format::Rgb8,
        "RGB8",
        N,
        3,
        (uint::unpack_3x8::<0, 1, 2>, uint::pack_3x8::<0, 1, 2>),
        (uint::unpack_3x8_f32::<0, 1, 2>, uint::pack_3x8_f32::<0, 1, 2>),
    ),
    integer(
        Format::Bgr8,
        "BGR8",
        N,
        3,
        (uint::unpack_3x8::<2, 1, 0>, uint::pack_3x8::<2, 1, 0>),
        (uint::unpack_3x8_f32::<2, 1, 0>, uint::pack_3x8_f32::<2, 1, 0>),
    ),
    integer(
        Format::Rgba8,
        "RGBA8",
        N,
        4,
        (uint::unpack_rgba8, uint::pack_rgba8),
        (uint::unpack_4x8_f32::<0, 1, 2, 3>, uint::pack_4x8_f32::<0, 1, 2, 3>),
    ),
    integer(
        Format::Bgra8,
        "BGRA8",
        N,
        4,
        (uint::unpack_bgra8, uint::pack_bgra8),
        (uint::unpack_4x8_f32::<2, 1, 0, 3>, uint::pack_4x8_f32::<2, 1, 0, 3>),
    ),
    integer(
        Format::Argb8,
        "ARGB8",
        N,
        4,
        (uint::unpack_4x8::<1, 2, 3, 0>, uint::pack_4x8::<1, 2, 3, 0>),
        (uint::unpack_4x8_f32::<1, 2, 3, 0>, uint::pack_4x8_f32::<1, 2, 3, 0>),
    ),
    integer(
        Format::Abgr8,
        "ABGR8",
        N,
        4,
        (uint::unpack_4x8::<3, 2, 1, 0>, uint::pack_4x8::<3, 2, 1, 0>),
        (uint::unpack_4x8_f32::<3, 2, 1, 0>, uint::pack_4x8_f32::<3, 2, 1, 0>),
    ),
    integer(
        Format::Rgbx8,
        "RGBX8",
        N,
        4,
        (uint::unpack_4x8_opaque::<0, 1, 2, 3>, uint::pack_4x8_opaque::<0, 1, 2, 3>),
        (uint::unpack_4x8_opaque_f32::<0, 1, 2, 3>, uint::pack_4x8_opaque_f32::<0, 1, 2, 3>),
    ),
    integer(
        Format::Bgrx8,
        "BGRX8",
        N,
        4,
        (uint::unpack_4x8_opaque::<2, 1, 0, 3>, uint::pack_4x8_opaque::<2, 1, 0, 3>),
        (uint::unpack_4x8_opaque_f32::<2, 1, 0, 3>, uint::pack_4x8_opaque_f32::<2, 1, 0, 3>),
    ),
    integer(
        Format::Rgba4444,
        "RGBA4444",
        P,
        2,
        (packed::unpack_rgba4444, packed::pack_rgba4444),
        (packed::unpack_rgba4444_f32, packed::pack_rgba4444_f32),
    ),
    integer(
        Format::Rgba5551,
        "RGBA5551",
        P,
        2,
        (packed::unpack_rgba5551, packed::pack_rgba5551),
        (packed::unpack_rgba5551_f32, packed::pack_rgba5551_f32),
    ),
    integer(
        Format::Rgb565,
        "RGB565",
        P,
        2,
        (packed::unpack_rgb565, packed::pack_rgb565),
        (packed::unpack_rgb565_f32, packed::pack_rgb565_f32),
    ),
    integer(
        Format::La16,
        "LA16",
        N,
        4,
        (uint::unpack_la16, uint::pack_la16),
        (uint::unpack_la16_f32, uint::pack_la16_f32),
    ),
    integer(
        Format::Rgba16,
        "RGBA16",
        N,
        8,
        (uint::unpack_rgba16, uint::pack_rgba16),
        (uint::unpack_rgba16_f32, uint::pack_rgba16_f32),
    ),
    floating(Format::R16F, "R16F", FormatType::HALF, 2, (half::unpack_half::<1>, half::pack_half::<1>)),
    floating(Format::Rg16F, "RG16F", FormatType::HALF, 4, (half::unpack_half::<2>, half::pack_half::<2>)),
    floating(Format::Rgb16F, "RGB16F", FormatType::HALF, 6, (half::unpack_half::<3>, half::pack_half::<3>)),
    floating(Format::Rgba16F, "RGBA16F", FormatType::HALF, 8, (half::unpack_half::<4>, half::pack_half::<4>)),
    floating(Format::L32F, "L32F", N, 4, (float::unpack_l32f, float::pack_l32f)),
    floating(Format::R32F, "R32F", N, 4, (float::unpack_float::<1>, float::pack_float::<1>)),
    floating(Format::Rg32F, "RG32F", N, 8, (float::unpack_float::<2>, float::pack_float::<2>)),
    floating(Format::Rgb32F, "RGB32F", N, 12, (float::unpack_float::<3>, float::pack_float::<3>)),
    floating(Format::Rgba32F, "RGBA32F", N, 16, (float::unpack_float::<4>, float::pack_float::<4>)),
    plain(Format::Depth16, "DEPTH16", FormatType::DEPTH, 2),
    plain(Format::Depth24, "DEPTH24", FormatType::DEPTH, 3),
    plain(Format::Depth24Stencil8, "DEPTH24_STENCIL8", FormatType::DEPTH.union(FormatType::STENCIL), 4),
    plain(Format::Depth32F, "DEPTH32F", FormatType::DEPTH.union(FormatType::FLOAT), 4),
    compressed(Format::Dxt1, "DXT1", 8, (4, 4), 1, BlockFamily::Bc1),
    compressed(Format::Dxt3, "DXT3", 16, (4, 4), 1, BlockFamily::Bc2),
    compressed(Format::Dxt5, "DXT5", 16, (4, 4), 1, BlockFamily::Bc3),
    compressed(Format::XgbrDxt5, "XGBR_DXT5", 16, (4, 4), 1, BlockFamily::Bc3Xgbr),
    compressed(Format::Dxn2, "DXN2", 16, (4, 4), 1, BlockFamily::Bc5),
    compressed(Format::Etc1Rgb8, "ETC1_RGB8", 8, (4, 4), 1, BlockFamily::Etc1),
    compressed(Format::Etc2Rgb8, "ETC2_RGB8", 8, (4, 4), 1, BlockFamily::Etc2Rgb),
    compressed(Format::Etc2Rgb8A1, "ETC2_RGB8A1", 8, (4, 4), 1, BlockFamily::Etc2PunchThrough),
    compressed(Format::Etc2Rgba8, "ETC2_RGBA8", 16, (4, 4), 1, BlockFamily::Etc2Rgba),
    compressed(Format::EacRg11, "EAC_RG11", 16, (4, 4), 1, BlockFamily::EacRg11),
    compressed(Format::EacSignedRg11, "EAC_SIGNED_RG11", 16, (4, 4), 1, BlockFamily::EacSignedRg11),
    compressed(Format::PvrtcRgb2Bpp, "PVRTC_RGB_2BPP", 8, (8, 4), 2, BlockFamily::Pvrtc2Bpp),
    compressed(Format::PvrtcRgb4Bpp, "PVRTC_RGB_4BPP", 8, (4, 4), 2, BlockFamily::Pvrtc4Bpp),
    compressed(Format::PvrtcRgba2Bpp, "PVRTC_RGBA_2BPP", 8, (8, 4), 2, BlockFamily::Pvrtc2Bpp),
    compressed(Format::PvrtcRgba4Bpp, "PVRTC_RGBA_4BPP", 8, (4, 4), 2, BlockFamily::Pvrtc4Bpp),
    compressed(Format::Pvrtc2Rgba2Bpp, "PVRTC2_RGBA_2BPP", 8, (8, 4), 2, BlockFamily::Pvrtc2Bpp),
    compressed(Format::Pvrtc2Rgba4Bpp, "PVRTC2_RGBA_4BPP", 8, (4, 4), 2, BlockFamily::Pvrtc4Bpp),
];

// The table is indexed by discriminant; a misordered entry fails the build.
const _: () = {
    let mut i = 0;
    while i < Format::COUNT {
        assert!(DESCRIPTORS[i].format as usize == i);
        assert!(Format::ALL[i] as usize == i);
        i += 1;
    }
};

static REGISTRY: [FormatDescriptor; Format::COUNT] = DESCRIPTORS;

impl Format {
    pub const COUNT: usize = 48;

    /// Every format, in declaration order.
    pub const ALL: [Format; Format::COUNT] = [
        Format::L8,
        Format::A8,
        Format::La8,
        Format::R8,
        Format::Rg8,
        Format::Rgb8,
        Format::Bgr8,
        Format::Rgba8,
        Format::Bgra8,
        Format::Argb8,
        Format::Abgr8,
        Format::Rgbx8,
        Format::Bgrx8,
        Format::Rgba4444,
        Format::Rgba5551,
        Format::Rgb565,
        Format::La16,
        Format::Rgba16,
        Format::R16F,
        Format::Rg16F,
        Format::Rgb16F,
        Format::Rgba16F,
        Format::L32F,
        Format::R32F,
        Format::Rg32F,
        Format::Rgb32F,
        Format::Rgba32F,
        Format::Depth16,
        Format::Depth24,
        Format::Depth24Stencil8,
        Format::Depth32F,
        Format::Dxt1,
        Format::Dxt3,
        Format::Dxt5,
        Format::XgbrDxt5,
        Format::Dxn2,
        Format::Etc1Rgb8,
        Format::Etc2Rgb8,
        Format::Etc2Rgb8A1,
        Format::Etc2Rgba8,
        Format::EacRg11,
        Format::EacSignedRg11,
        Format::PvrtcRgb2Bpp,
        Format::PvrtcRgb4Bpp,
        Format::PvrtcRgba2Bpp,
        Format::PvrtcRgba4Bpp,
        Format::Pvrtc2Rgba2Bpp,
        Format::Pvrtc2Rgba4Bpp,
    ];

    /// The registry entry for this format.
    #[inline]
    pub fn descriptor(self) -> &'static FormatDescriptor {
        &REGISTRY[self as usize]
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    #[inline]
    pub fn is_compressed(self) -> bool {
        self.descriptor().is_compressed()
    }

    #[inline]
    pub fn is_float(self) -> bool {
        self.descriptor().is_float()
    }

    #[inline]
    pub fn is_depth(self) -> bool {
        self.descriptor().kind.contains(FormatType::DEPTH)
    }

    /// Bytes per pixel, or bytes per block for compressed formats.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        self.descriptor().size
    }

    /// Look a format up by its descriptor name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Format> {
        Format::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
