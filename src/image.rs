use core::ops::BitOr;

#[cfg(feature = "imgref")]
use rgb::AsPixels as _;

use crate::codec::CompressionQuality;
use crate::convert::ConvertRequest;
use crate::error::ConvertError;
use crate::format::Format;
use crate::pixel::TexelPixel;

/// Dimensions of an image: top-level size, array slices and mip levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    pub width: u32,
    pub height: u32,
    /// Volume depth; 1 for 2D images.
    pub depth: u32,
    /// Array slices (6 for a cube map).
    pub num_slices: u32,
    pub num_mipmaps: u32,
}

impl Shape {
    /// A single-slice 2D image with one mip level.
    pub const fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
            num_slices: 1,
            num_mipmaps: 1,
        }
    }

    pub const fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub const fn with_slices(mut self, num_slices: u32) -> Self {
        self.num_slices = num_slices;
        self
    }

    pub const fn with_mipmaps(mut self, num_mipmaps: u32) -> Self {
        self.num_mipmaps = num_mipmaps;
        self
    }

    /// Width, height and depth of mip level `mip`.
    pub fn level_dims(&self, mip: u32) -> (u32, u32, u32) {
        let shrink = |v: u32| v.checked_shr(mip).unwrap_or(0).max(1);
        (shrink(self.width), shrink(self.height), shrink(self.depth))
    }

    /// Length of a full mip chain: `floor(log2(max(w, h, d))) + 1`.
    pub fn max_mip_levels(&self) -> u32 {
        let largest = self.width.max(self.height).max(self.depth).max(1);
        u32::BITS - largest.leading_zeros()
    }

    /// Reject zero sizes and mip counts longer than the full chain.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(ConvertError::InvalidShape(format!(
                "zero dimension {}x{}x{}",
                self.width, self.height, self.depth
            )));
        }
        if self.num_slices == 0 {
            return Err(ConvertError::InvalidShape("zero slices".into()));
        }
        let max_mips = self.max_mip_levels();
        if self.num_mipmaps == 0 || self.num_mipmaps > max_mips {
            return Err(ConvertError::InvalidShape(format!(
                "{} mip levels, expected 1..={max_mips}",
                self.num_mipmaps
            )));
        }
        Ok(())
    }

    fn too_large(&self) -> ConvertError {
        ConvertError::DimensionsTooLarge {
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }

    /// Bytes of one slice of mip level `mip` in `format`.
    pub fn level_size(&self, format: Format, mip: u32) -> Result<usize, ConvertError> {
        let (w, h, d) = self.level_dims(mip);
        format
            .descriptor()
            .level_size(w, h, d)
            .ok_or_else(|| self.too_large())
    }

    /// Total bytes of an image of this shape in `format`.
    pub fn memory_required(&self, format: Format) -> Result<usize, ConvertError> {
        self.validate()?;
        let mut total = 0usize;
        for mip in 0..self.num_mipmaps {
            let level = self
                .level_size(format, mip)?
                .checked_mul(self.num_slices as usize)
                .ok_or_else(|| self.too_large())?;
            total = total.checked_add(level).ok_or_else(|| self.too_large())?;
        }
        Ok(total)
    }
}

/// Image attribute bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageFlags(u32);

impl ImageFlags {
    pub const NONE: Self = Self(0);
    /// Color samples are linear; integer formats skip the sRGB transfer.
    pub const LINEAR_SPACE: Self = Self(1 << 0);
    /// The six slices are cube faces.
    pub const CUBE_MAP: Self = Self(1 << 1);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ImageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A texture image: mip chain x slices x depth layers in one owned buffer.
///
/// The buffer holds mip 0 of every slice, then mip 1 of every slice, and so
/// on. Inside one slice of one level, depth layers follow each other and
/// rows are tightly packed (block rows for compressed formats).
///
/// [`Image::default()`] is the empty image; it is also what a failed
/// [`ConvertRequest::convert_into`] leaves behind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Image {
    shape: Shape,
    format: Format,
    flags: ImageFlags,
    data: Vec<u8>,
}

impl Image {
    /// Allocate a zero-filled image.
    pub fn new(shape: Shape, format: Format, flags: ImageFlags) -> Result<Self, ConvertError> {
        let size = shape.memory_required(format)?;
        Ok(Self {
            shape,
            format,
            flags,
            data: vec![0; size],
        })
    }

    /// Copy caller bytes into a new image. Extra trailing bytes are ignored.
    pub fn from_bytes(
        shape: Shape,
        format: Format,
        flags: ImageFlags,
        bytes: &[u8],
    ) -> Result<Self, ConvertError> {
        let needed = shape.memory_required(format)?;
        if bytes.len() < needed {
            return Err(ConvertError::BufferTooSmall {
                needed,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            shape,
            format,
            flags,
            data: bytes[..needed].to_vec(),
        })
    }

    /// Reset to the empty image, releasing the buffer.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn flags(&self) -> ImageFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: ImageFlags) {
        self.flags = flags;
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.shape.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.shape.height
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.shape.depth
    }

    #[inline]
    pub fn num_slices(&self) -> u32 {
        self.shape.num_slices
    }

    #[inline]
    pub fn num_mipmaps(&self) -> u32 {
        self.shape.num_mipmaps
    }

    /// Width, height and depth of mip level `mip`.
    pub fn level_dims(&self, mip: u32) -> (u32, u32, u32) {
        self.shape.level_dims(mip)
    }

    /// Whether color samples are sRGB-encoded (no [`ImageFlags::LINEAR_SPACE`]).
    pub fn is_gamma(&self) -> bool {
        !self.flags.contains(ImageFlags::LINEAR_SPACE)
    }

    /// Bytes of one slice of mip level `mip`.
    pub fn level_size(&self, mip: u32) -> usize {
        // Construction proved every level size fits.
        self.shape.level_size(self.format, mip).unwrap_or(0)
    }

    /// Byte offset of slice `slice` of mip level `mip`.
    pub fn level_offset(&self, mip: u32, slice: u32) -> usize {
        let slices = self.shape.num_slices as usize;
        let before: usize = (0..mip).map(|k| self.level_size(k) * slices).sum();
        before + slice as usize * self.level_size(mip)
    }

    /// Bytes of slice `slice` of mip level `mip`.
    ///
    /// # Panics
    ///
    /// Panics if `mip` or `slice` is out of range.
    pub fn level_data(&self, mip: u32, slice: u32) -> &[u8] {
        self.check_level(mip, slice);
        let start = self.level_offset(mip, slice);
        &self.data[start..start + self.level_size(mip)]
    }

    /// Mutable bytes of slice `slice` of mip level `mip`.
    ///
    /// # Panics
    ///
    /// Panics if `mip` or `slice` is out of range.
    pub fn level_data_mut(&mut self, mip: u32, slice: u32) -> &mut [u8] {
        self.check_level(mip, slice);
        let start = self.level_offset(mip, slice);
        let len = self.level_size(mip);
        &mut self.data[start..start + len]
    }

    fn check_level(&self, mip: u32, slice: u32) {
        assert!(
            mip < self.shape.num_mipmaps && slice < self.shape.num_slices,
            "level ({mip}, {slice}) out of range for {} mips x {} slices",
            self.shape.num_mipmaps,
            self.shape.num_slices
        );
    }

    /// The whole buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Take ownership of the buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Copy `count` mip levels starting at `first_mip` from `src` into the
    /// same levels of `self`, for every slice.
    ///
    /// Both images must share the format, slice count and the dimensions of
    /// the copied levels.
    pub fn copy_levels_from(
        &mut self,
        src: &Image,
        first_mip: u32,
        count: u32,
    ) -> Result<(), ConvertError> {
        if src.format != self.format {
            return Err(ConvertError::LayoutMismatch {
                expected: self.format,
                actual: src.format,
            });
        }
        let end = first_mip.saturating_add(count);
        if end > src.num_mipmaps() || end > self.num_mipmaps() {
            return Err(ConvertError::InvalidShape(format!(
                "mip levels {first_mip}..{end} exceed {} (source) or {} (destination)",
                src.num_mipmaps(),
                self.num_mipmaps()
            )));
        }
        if src.num_slices() != self.num_slices() {
            return Err(ConvertError::InvalidShape(format!(
                "slice count {} does not match {}",
                src.num_slices(),
                self.num_slices()
            )));
        }
        for mip in first_mip..end {
            if src.level_dims(mip) != self.level_dims(mip) {
                return Err(ConvertError::InvalidShape(format!(
                    "mip {mip} is {:?} in the source and {:?} in the destination",
                    src.level_dims(mip),
                    self.level_dims(mip)
                )));
            }
            for slice in 0..self.num_slices() {
                self.level_data_mut(mip, slice)
                    .copy_from_slice(src.level_data(mip, slice));
            }
        }
        Ok(())
    }

    /// Reinterpret one slice of one 2D mip level as typed pixels.
    ///
    /// Returns [`ConvertError::LayoutMismatch`] if the format doesn't match `P`.
    pub fn as_pixels<P: TexelPixel>(&self, mip: u32, slice: u32) -> Result<&[P], ConvertError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        self.check_pixel_format::<P>()?;
        Ok(rgb::AsPixels::as_pixels(self.level_data(mip, slice)))
    }

    /// Mutable variant of [`Image::as_pixels`].
    pub fn as_pixels_mut<P: TexelPixel>(
        &mut self,
        mip: u32,
        slice: u32,
    ) -> Result<&mut [P], ConvertError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        self.check_pixel_format::<P>()?;
        Ok(rgb::AsPixels::as_pixels_mut(self.level_data_mut(mip, slice)))
    }

    fn check_pixel_format<P: TexelPixel>(&self) -> Result<(), ConvertError> {
        if self.format != P::format() {
            return Err(ConvertError::LayoutMismatch {
                expected: P::format(),
                actual: self.format,
            });
        }
        Ok(())
    }

    /// Zero-copy [`imgref::ImgRef`] of one slice of a mip level.
    ///
    /// Depth layers of a volume are stacked vertically.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: TexelPixel>(
        &self,
        mip: u32,
        slice: u32,
    ) -> Result<imgref::ImgRef<'_, P>, ConvertError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        self.check_pixel_format::<P>()?;
        let (w, h, d) = self.level_dims(mip);
        let pixels: &[P] = self.level_data(mip, slice).as_pixels();
        Ok(imgref::ImgRef::new(
            pixels,
            w as usize,
            h as usize * d as usize,
        ))
    }

    /// Convert to `format`, keeping the mip count.
    ///
    /// Shorthand for [`ConvertRequest::new`]`(self, format).convert()`.
    pub fn convert_format(&self, format: Format) -> Result<Image, ConvertError> {
        ConvertRequest::new(self, format).convert()
    }

    /// Convert to `format` and replace `self` with the result.
    ///
    /// Shorthand for [`convert_in_place`](Self::convert_in_place) without
    /// regeneration at the default quality.
    pub fn convert_format_in_place(&mut self, format: Format) -> Result<(), ConvertError> {
        self.convert_in_place(format, false, CompressionQuality::default())
    }

    /// Convert to `format`, optionally rebuilding the mip chain, and replace
    /// `self` with the result.
    ///
    /// The result is computed in full before `self` is replaced, so on failure
    /// `self` is left untouched. Converting to the current format without
    /// regeneration is a no-op.
    pub fn convert_in_place(
        &mut self,
        format: Format,
        regenerate_mipmaps: bool,
        quality: CompressionQuality,
    ) -> Result<(), ConvertError> {
        if self.format == format && !regenerate_mipmaps {
            return Ok(());
        }
        let converted = ConvertRequest::new(self, format)
            .regenerate_mipmaps(regenerate_mipmaps)
            .with_quality(quality)
            .convert()?;
        *self = converted;
        Ok(())
    }
}
