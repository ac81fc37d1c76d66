//! Conversion orchestration: plan, normalize, transcode, compress.

use std::borrow::Cow;

use log::{debug, warn};

use crate::codec::{self, CompressionQuality, Compressor, Decompressor};
use crate::error::ConvertError;
use crate::format::Format;
use crate::image::{Image, Shape};
use crate::limits::Limits;
use crate::mipmap;
use crate::scanline::{self, Transcoder};

/// A conversion of one image to another format.
///
/// ```
/// use zentexconv::{ConvertRequest, Format, Image, ImageFlags, Shape};
///
/// let src = Image::new(Shape::new_2d(64, 64), Format::Rgba8, ImageFlags::NONE)?;
/// let dxt = ConvertRequest::new(&src, Format::Dxt1)
///     .regenerate_mipmaps(true)
///     .convert()?;
/// assert_eq!(dxt.num_mipmaps(), 7);
/// # Ok::<(), zentexconv::ConvertError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ConvertRequest<'a> {
    src: &'a Image,
    dst_format: Format,
    regenerate_mipmaps: bool,
    quality: CompressionQuality,
    limits: Option<&'a Limits>,
}

/// Everything a run needs, resolved before any pixel is written.
#[derive(Clone, Copy, Debug)]
struct Plan {
    shape: Shape,
    decompress: Option<Decompressor>,
    /// Format after normalization: RGBA8 for compressed sources.
    working: Format,
    /// Working to destination, or working to RGBA8 ahead of compression.
    transcoder: Option<Transcoder>,
    compress: Option<Compressor>,
}

impl<'a> ConvertRequest<'a> {
    pub fn new(src: &'a Image, dst_format: Format) -> Self {
        Self {
            src,
            dst_format,
            regenerate_mipmaps: false,
            quality: CompressionQuality::default(),
            limits: None,
        }
    }

    /// Rebuild a full mip chain from level 0 instead of converting the
    /// source's levels.
    pub fn regenerate_mipmaps(mut self, regenerate: bool) -> Self {
        self.regenerate_mipmaps = regenerate;
        self
    }

    pub fn with_quality(mut self, quality: CompressionQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Run the conversion.
    ///
    /// Every capability and limit is checked before the first allocation, so
    /// an error never leaves a half-written image behind.
    pub fn convert(&self) -> Result<Image, ConvertError> {
        let result = if self.is_identity() {
            self.copy()
        } else {
            self.plan().and_then(|plan| self.run(&plan))
        };
        if let Err(e) = &result {
            warn!(
                "conversion from {} to {} failed: {e}",
                self.src.format(),
                self.dst_format
            );
        }
        result
    }

    /// Run the conversion into `dst`. On failure `dst` is cleared to the
    /// empty image.
    pub fn convert_into(&self, dst: &mut Image) -> Result<(), ConvertError> {
        match self.convert() {
            Ok(image) => {
                *dst = image;
                Ok(())
            }
            Err(e) => {
                dst.clear();
                Err(e)
            }
        }
    }

    fn is_identity(&self) -> bool {
        self.src.format() == self.dst_format && !self.regenerate_mipmaps
    }

    fn copy(&self) -> Result<Image, ConvertError> {
        if let Some(limits) = self.limits {
            limits.check(&self.src.shape())?;
            limits.check_memory(&self.src.shape(), self.dst_format)?;
        }
        debug!("{} is already the requested format, copying", self.dst_format);
        Ok(self.src.clone())
    }

    fn plan(&self) -> Result<Plan, ConvertError> {
        let src_format = self.src.format();
        let dst_format = self.dst_format;

        let mut shape = self.src.shape();
        if self.regenerate_mipmaps {
            shape.num_mipmaps = shape.max_mip_levels();
        }
        shape.validate()?;

        let decompress = if src_format.is_compressed() {
            Some(
                codec::decompressor(src_format)
                    .ok_or(ConvertError::UnsupportedSourceFormat(src_format))?,
            )
        } else {
            None
        };
        let working = if decompress.is_some() {
            Format::Rgba8
        } else {
            src_format
        };

        let compress = if dst_format.is_compressed() {
            Some(
                codec::compressor(dst_format)
                    .ok_or(ConvertError::UnsupportedDestinationFormat(dst_format))?,
            )
        } else {
            None
        };

        if self.regenerate_mipmaps && !mipmap::supports(working) {
            return Err(ConvertError::UnsupportedMipmapFormat(working));
        }

        let target = if compress.is_some() {
            Format::Rgba8
        } else {
            dst_format
        };
        let transcoder = if working == target {
            None
        } else {
            Some(Transcoder::select(working, target).ok_or(
                ConvertError::UnsupportedConversionPair {
                    src: working,
                    dst: target,
                },
            )?)
        };

        if let Some(limits) = self.limits {
            limits.check(&shape)?;
            limits.check_memory(&shape, dst_format)?;
            if decompress.is_some() || self.regenerate_mipmaps {
                limits.check_memory(&shape, working)?;
            }
            if compress.is_some() && transcoder.is_some() {
                limits.check_memory(&shape, Format::Rgba8)?;
            }
        } else {
            // Overflow surfaces here rather than at allocation.
            shape.memory_required(dst_format)?;
        }

        debug!(
            "converting {src_format} to {dst_format}: {} mips, decompress={}, regenerate={}, transcode={}, compress={}",
            shape.num_mipmaps,
            decompress.is_some(),
            self.regenerate_mipmaps,
            transcoder.map_or("none", |t| if t.is_float() { "float" } else { "8-bit" }),
            compress.is_some(),
        );
        Ok(Plan {
            shape,
            decompress,
            working,
            transcoder,
            compress,
        })
    }

    fn run(&self, plan: &Plan) -> Result<Image, ConvertError> {
        let src = self.src;
        let flags = src.flags();

        let mut working: Cow<'_, Image> = if let Some(decompress) = plan.decompress {
            let mut image = Image::new(plan.shape, plan.working, flags)?;
            decompress(src, &mut image)?;
            Cow::Owned(image)
        } else if self.regenerate_mipmaps {
            let mut image = Image::new(plan.shape, plan.working, flags)?;
            image.copy_levels_from(src, 0, 1)?;
            Cow::Owned(image)
        } else {
            Cow::Borrowed(src)
        };
        if self.regenerate_mipmaps {
            mipmap::generate_mipmaps(working.to_mut())?;
        }

        if working.format() == self.dst_format {
            return Ok(working.into_owned());
        }

        if let Some(transcoder) = plan.transcoder {
            let target = if plan.compress.is_some() {
                Format::Rgba8
            } else {
                self.dst_format
            };
            let mut out = Image::new(plan.shape, target, flags)?;
            scanline::transcode(&working, &mut out, transcoder, src.is_gamma());
            working = Cow::Owned(out);
        }

        if let Some(compress) = plan.compress {
            let mut out = Image::new(plan.shape, self.dst_format, flags)?;
            compress(&working, &mut out, self.quality)?;
            return Ok(out);
        }
        Ok(working.into_owned())
    }
}
