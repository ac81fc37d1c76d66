use crate::format::Format;

/// 8-bit pixel types that can view mip levels of a matching [`Format`].
///
/// Implemented for the `rgb` crate's 8-bit types: `Rgba<u8>` ([`Format::Rgba8`]),
/// `Rgb<u8>` ([`Format::Rgb8`]), `BGRA<u8>` ([`Format::Bgra8`]),
/// `BGR<u8>` ([`Format::Bgr8`]) and `Gray<u8>` ([`Format::L8`]).
pub trait TexelPixel: Copy + 'static + private::Sealed {
    /// The format whose memory layout matches this pixel type.
    fn format() -> Format;
}

mod private {
    pub trait Sealed {}
}

macro_rules! texel_pixel {
    ($($ty:ty => $format:ident),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}
            impl TexelPixel for $ty {
                #[inline]
                fn format() -> Format {
                    Format::$format
                }
            }
        )*
    };
}

texel_pixel! {
    rgb::Rgba<u8> => Rgba8,
    rgb::Rgb<u8> => Rgb8,
    rgb::alt::BGRA<u8> => Bgra8,
    rgb::alt::BGR<u8> => Bgr8,
    rgb::Gray<u8> => L8,
}
