use crate::error::ConvertError;
use crate::format::Format;
use crate::image::Shape;

/// Resource limits for the images a conversion allocates.
///
/// All fields default to `None` (no limit). Limits are checked against the
/// destination and every intermediate image before anything is allocated.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count of the top mip level (width * height * depth).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for any single image allocation.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Check dimensions against limits. Returns Ok(()) or LimitExceeded error.
    pub(crate) fn check(&self, shape: &Shape) -> Result<(), ConvertError> {
        if let Some(max_w) = self.max_width {
            if u64::from(shape.width) > max_w {
                return Err(ConvertError::LimitExceeded(format!(
                    "width {} exceeds limit {max_w}",
                    shape.width
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(shape.height) > max_h {
                return Err(ConvertError::LimitExceeded(format!(
                    "height {} exceeds limit {max_h}",
                    shape.height
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels =
                u64::from(shape.width) * u64::from(shape.height) * u64::from(shape.depth);
            if pixels > max_px {
                return Err(ConvertError::LimitExceeded(format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check that an image of `shape` in `format` fits the memory limit.
    pub(crate) fn check_memory(&self, shape: &Shape, format: Format) -> Result<(), ConvertError> {
        let bytes = shape.memory_required(format)?;
        if let Some(max_mem) = self.max_memory_bytes {
            if bytes as u64 > max_mem {
                return Err(ConvertError::LimitExceeded(format!(
                    "{format} image of {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}
