use crate::format::Format;

/// Errors from format conversion, mip regeneration and image construction.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// The source is block-compressed and no decompressor exists for its family.
    #[error("no decompressor for source format {0}")]
    UnsupportedSourceFormat(Format),

    /// The destination is block-compressed and no compressor exists for its family.
    #[error("no compressor for destination format {0}")]
    UnsupportedDestinationFormat(Format),

    /// Both formats are uncompressed but one side lacks the unpack/pack pair
    /// for the required precision.
    #[error("unsupported conversion from {src} to {dst}")]
    UnsupportedConversionPair { src: Format, dst: Format },

    /// Mip regeneration needs a float unpack/pack pair on the working format.
    #[error("cannot regenerate mipmaps for format {0}")]
    UnsupportedMipmapFormat(Format),

    #[error("invalid image shape: {0}")]
    InvalidShape(String),

    #[error("dimensions too large: {width}x{height}x{depth}")]
    DimensionsTooLarge { width: u32, height: u32, depth: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("pixel layout mismatch: expected {expected}, got {actual}")]
    LayoutMismatch { expected: Format, actual: Format },
}
