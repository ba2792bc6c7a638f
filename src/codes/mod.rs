//! # Code Generators
//!
//! Deterministic barcode and QR rasters. Symbol encoding is delegated to the
//! `barcoders` and `qrcode` crates; this module owns input checking, layout
//! (quiet zones, module scaling, caption) and the PNG export.
//!
//! Identical `(data, options)` always give byte-identical pixels, so a label
//! renders the same in the designer, in preview and on paper.
//!
//! | Entry point | Encodes |
//! |-------------|---------|
//! | [`generate_barcode`] | the string, as a 1D symbol |
//! | [`generate_qr_code`] | the string |
//! | [`generate_tracking_qr_code`] | `base URL + tracking number` |
//!
//! [`CodeRequest`] bundles one generation so it can be compared, cached and
//! run off the pointer-handling path by the [`regenerate`] driver.

mod barcode;
mod font;
mod qr;
pub mod regenerate;

pub use barcode::{
    BarcodeOptions, DEFAULT_BAR_HEIGHT, MAX_RASTER_SIDE, QUIET_ZONE_MODULES, generate_barcode,
};
pub use qr::{
    DEFAULT_MODULE_SIZE, DEFAULT_QUIET_ZONE, DEFAULT_TRACKING_BASE_URL, QrOptions,
    generate_qr_code, generate_tracking_qr_code, tracking_url,
};
pub use regenerate::{CodeRegenerator, GenerationLedger};

use image::{GrayImage, ImageEncoder};
use std::fmt;

use crate::error::{EncodingError, EtiquetaError};
use crate::template::BarcodeFormat;

/// Symbol family named in an [`EncodingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbology {
    Barcode(BarcodeFormat),
    Qr,
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Barcode(format) => write!(f, "{}", format),
            Self::Qr => f.write_str("QR"),
        }
    }
}

/// 8-bit grayscale raster of a generated symbol. 0 is ink, 255 is paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeImage {
    img: GrayImage,
}

impl CodeImage {
    pub(crate) fn new(img: GrayImage) -> Self {
        Self { img }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    /// Row-major luma bytes.
    pub fn pixels(&self) -> &[u8] {
        self.img.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.img.get_pixel(x, y).0[0]
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.img
    }

    /// Encode as an 8-bit grayscale PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, EtiquetaError> {
        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                self.img.as_raw(),
                self.width(),
                self.height(),
                image::ExtendedColorType::L8,
            )
            .map_err(|e| EtiquetaError::Image(e.to_string()))?;
        Ok(png_bytes)
    }
}

/// One code generation: what to encode and how.
///
/// Two equal requests produce equal images, which is what lets the
/// regenerator skip fields whose request did not change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeRequest {
    Barcode { data: String, options: BarcodeOptions },
    Qr { data: String, options: QrOptions },
}

impl CodeRequest {
    pub fn symbology(&self) -> Symbology {
        match self {
            Self::Barcode { options, .. } => Symbology::Barcode(options.format),
            Self::Qr { .. } => Symbology::Qr,
        }
    }

    /// The exact string that gets encoded.
    pub fn data(&self) -> &str {
        match self {
            Self::Barcode { data, .. } | Self::Qr { data, .. } => data,
        }
    }

    pub fn generate(&self) -> Result<CodeImage, EncodingError> {
        match self {
            Self::Barcode { data, options } => generate_barcode(data, options),
            Self::Qr { data, options } => generate_qr_code(data, options),
        }
    }
}
