//! # zentexconv
//!
//! Pixel-format conversion for GPU texture pipelines.
//!
//! An [`Image`] holds every mip level and array slice of a texture (2D,
//! cube map, array or volume) in one contiguous buffer. [`ConvertRequest`]
//! turns it into any other [`Format`]: uncompressed to block-compressed,
//! compressed to compressed through RGBA8, float HDR to 8-bit, and so on,
//! optionally rebuilding the mip chain on the way.
//!
//! ## Supported Formats
//!
//! - 8-bit: L8, A8, LA8, R8, RG8, RGB8, BGR8, RGBA8, BGRA8, ARGB8, ABGR8, RGBX8, BGRX8
//! - Packed 16-bit: RGBA4444, RGBA5551, RGB565
//! - 16-bit integer: LA16, RGBA16
//! - Half float: R16F, RG16F, RGB16F, RGBA16F
//! - Float: L32F, R32F, RG32F, RGB32F, RGBA32F
//! - Depth (identity copies only): Depth16, Depth24, Depth24Stencil8, Depth32F
//! - Block-compressed: DXT1/3/5, XGBR_DXT5, DXN2, ETC1, ETC2 (RGB, RGB8A1, RGBA),
//!   EAC RG11 (unsigned and signed), PVRTC 2/4 bpp
//!
//! XGBR_DXT5, EAC_RG11 and the PVRTC formats decode but cannot be produced.
//!
//! ## Gamma
//!
//! Images are sRGB-encoded unless flagged [`ImageFlags::LINEAR_SPACE`].
//! Conversions that pass through float precision, and mip regeneration,
//! linearize 8-bit and 16-bit color channels first. Alpha is always linear.
//!
//! ## Usage
//!
//! ```
//! use zentexconv::{CompressionQuality, ConvertRequest, Format, Image, ImageFlags, Shape};
//!
//! let pixels = vec![255u8; 64 * 64 * 4];
//! let src = Image::from_bytes(Shape::new_2d(64, 64), Format::Rgba8, ImageFlags::NONE, &pixels)?;
//!
//! let etc = ConvertRequest::new(&src, Format::Etc2Rgba8)
//!     .regenerate_mipmaps(true)
//!     .with_quality(CompressionQuality::HighQuality)
//!     .convert()?;
//! assert_eq!(etc.num_mipmaps(), 7);
//!
//! // Back to something a CPU can read.
//! let rgba = etc.convert_format(Format::Rgba8)?;
//! assert_eq!(rgba.level_data(6, 0), &[255, 255, 255, 255]);
//! # Ok::<(), zentexconv::ConvertError>(())
//! ```
//!
//! ## Non-Goals
//!
//! - Container formats (DDS, KTX, PVR) and file I/O
//! - GPU upload or any graphics API surface
//! - ASTC and BC6H/BC7

#![forbid(unsafe_code)]

mod codec;
mod convert;
mod error;
mod format;
mod image;
mod limits;
mod mipmap;
mod pack;
mod pixel;
mod scanline;

// Re-exports
pub use codec::{
    BlockFamily, CompressionQuality, Compressor, Decompressor, compressor, decompressor,
};
pub use convert::ConvertRequest;
pub use error::ConvertError;
pub use format::{
    Format, FormatDescriptor, FormatType, PackRgba8Fn, PackRgba32fFn, UnpackRgba8Fn,
    UnpackRgba32fFn,
};
pub use image::{Image, ImageFlags, Shape};
pub use limits::Limits;
pub use mipmap::{generate_mipmaps, supports as supports_mipmaps};
pub use pixel::TexelPixel;
