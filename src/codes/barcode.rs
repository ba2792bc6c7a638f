//! 1D barcode generation.
//!
//! Symbol encoding is delegated to `barcoders`. This module checks the input
//! against the format's character set first, so a rejected input comes back
//! as an [`EncodingError`] that names the actual problem.
//!
//! ## Raster layout
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ quiet │ ▌▌ ▌▌▌ ▌ ▌▌ ▌ ▌▌▌ ▌▌ │ quiet      │  bar height
//! │ zone  │                      │ zone       │
//! ├──────────────────────────────────────────┤
//! │             TRK-20250128-001             │  caption (optional)
//! └──────────────────────────────────────────┘
//! ```

use barcoders::sym::code39::Code39;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::ean13::EAN13;
use image::{GrayImage, Luma};

use super::font::{self, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::{CodeImage, Symbology};
use crate::error::EncodingError;
use crate::template::{BarcodeData, BarcodeFormat};

/// Bar height when a field does not set one.
pub const DEFAULT_BAR_HEIGHT: u32 = 50;

/// Blank modules on each side of the bars.
pub const QUIET_ZONE_MODULES: u32 = 10;

/// Largest raster edge, in px.
pub const MAX_RASTER_SIDE: u32 = 16_384;

/// Padding above and below the caption, in px.
const CAPTION_PADDING: u32 = 2;

/// Characters Code 39 can carry besides digits and uppercase letters.
const CODE39_EXTRA: &str = "-. $/+%";

/// Barcode generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BarcodeOptions {
    pub format: BarcodeFormat,
    /// Narrowest bar width, px.
    pub module_width: u8,
    pub height: u32,
    pub display_value: bool,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self::from(&BarcodeData::default())
    }
}

impl From<&BarcodeData> for BarcodeOptions {
    fn from(data: &BarcodeData) -> Self {
        Self {
            format: data.format,
            module_width: data.width,
            height: data.height.unwrap_or(DEFAULT_BAR_HEIGHT),
            display_value: data.display_value,
        }
    }
}

/// Encode `data` as a barcode raster.
///
/// ```
/// use etiqueta::codes::{generate_barcode, BarcodeOptions};
///
/// let a = generate_barcode("TRK-001", &BarcodeOptions::default()).unwrap();
/// let b = generate_barcode("TRK-001", &BarcodeOptions::default()).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn generate_barcode(data: &str, opts: &BarcodeOptions) -> Result<CodeImage, EncodingError> {
    let modules = encode_modules(data, opts.format)?;
    let (width, height) = raster_size(modules.len(), data, opts).ok_or_else(|| {
        EncodingError::new(
            Symbology::Barcode(opts.format),
            data,
            format!("raster would exceed {} px on a side", MAX_RASTER_SIDE),
        )
    })?;
    Ok(CodeImage::new(rasterize(&modules, data, opts, width, height)))
}

/// Encode to a module sequence (1 = bar, 0 = space).
fn encode_modules(data: &str, format: BarcodeFormat) -> Result<Vec<u8>, EncodingError> {
    let reject = |reason: &str| EncodingError::new(Symbology::Barcode(format), data, reason);

    if data.is_empty() {
        return Err(reject("input is empty"));
    }

    let encoded = match format {
        BarcodeFormat::Code128 => {
            if let Some(bad) = data.chars().find(|c| !(' '..='~').contains(c)) {
                return Err(reject(&format!("{:?} is not printable ASCII", bad)));
            }
            // Character set B covers all printable ASCII.
            Code128::new(format!("\u{0181}{}", data)).map(|b| b.encode())
        }
        BarcodeFormat::Code39 => {
            if let Some(bad) = data.chars().find(|c| {
                !(c.is_ascii_digit() || c.is_ascii_uppercase() || CODE39_EXTRA.contains(*c))
            }) {
                return Err(reject(&format!(
                    "{:?} is not in the Code 39 set (0-9, A-Z, {:?})",
                    bad, CODE39_EXTRA
                )));
            }
            Code39::new(data).map(|b| b.encode())
        }
        BarcodeFormat::Ean13 => {
            let payload = check_digits(data, 12).map_err(|r| reject(&r))?;
            EAN13::new(payload).map(|b| b.encode())
        }
        BarcodeFormat::Ean8 => {
            let payload = check_digits(data, 7).map_err(|r| reject(&r))?;
            EAN8::new(payload).map(|b| b.encode())
        }
        BarcodeFormat::Upc => {
            // UPC-A is EAN-13 with a leading zero.
            let payload = check_digits(data, 11).map_err(|r| reject(&r))?;
            EAN13::new(format!("0{}", payload)).map(|b| b.encode())
        }
    };

    encoded.map_err(|e| reject(&e.to_string()))
}

/// Accept `len` digits, or `len + 1` digits whose last one is the correct
/// check digit. Returns the digits without the check digit.
fn check_digits(data: &str, len: usize) -> Result<&str, String> {
    if !data.chars().all(|c| c.is_ascii_digit()) {
        return Err("only digits are allowed".into());
    }
    if data.len() == len {
        return Ok(data);
    }
    if data.len() != len + 1 {
        return Err(format!("expected {} or {} digits, got {}", len, len + 1, data.len()));
    }

    let (payload, given) = data.split_at(len);
    let expected = gs1_check_digit(payload);
    if given.as_bytes()[0] - b'0' != expected {
        return Err(format!("check digit should be {}, got {}", expected, given));
    }
    Ok(payload)
}

/// GS1 mod-10 check digit. The rightmost payload digit carries weight 3.
fn gs1_check_digit(payload: &str) -> u8 {
    let sum: u32 = payload
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = (b - b'0') as u32;
            if i % 2 == 0 { digit * 3 } else { digit }
        })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Image size for `modules` bars plus caption, or `None` past [`MAX_RASTER_SIDE`].
fn raster_size(modules: usize, caption: &str, opts: &BarcodeOptions) -> Option<(u32, u32)> {
    let module_width = opts.module_width.max(1) as u32;
    let total_modules = u32::try_from(modules)
        .ok()?
        .checked_add(2 * QUIET_ZONE_MODULES)?;

    let mut width = total_modules.checked_mul(module_width)?;
    let mut height = opts.height.max(1);
    if opts.display_value {
        let caption_width = u32::try_from(caption.chars().count())
            .ok()?
            .checked_mul(GLYPH_WIDTH)?
            .checked_add(2 * CAPTION_PADDING)?;
        width = width.max(caption_width);
        height = height.checked_add(GLYPH_HEIGHT + 2 * CAPTION_PADDING)?;
    }

    (width <= MAX_RASTER_SIDE && height <= MAX_RASTER_SIDE).then_some((width, height))
}

fn rasterize(
    modules: &[u8],
    caption: &str,
    opts: &BarcodeOptions,
    width: u32,
    height: u32,
) -> GrayImage {
    let module_width = opts.module_width.max(1) as u32;
    let bar_height = opts.height.max(1);
    let total_modules = modules.len() as u32 + 2 * QUIET_ZONE_MODULES;

    let mut img = GrayImage::from_pixel(width, height, Luma([255]));
    let left = (width - total_modules * module_width) / 2 + QUIET_ZONE_MODULES * module_width;

    for (i, &module) in modules.iter().enumerate() {
        if module != 1 {
            continue;
        }
        let x0 = left + i as u32 * module_width;
        for x in x0..x0 + module_width {
            for y in 0..bar_height {
                img.put_pixel(x, y, Luma([0]));
            }
        }
    }

    if opts.display_value {
        font::draw_caption(&mut img, caption, bar_height + CAPTION_PADDING);
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(format: BarcodeFormat) -> BarcodeOptions {
        BarcodeOptions {
            format,
            ..Default::default()
        }
    }

    #[test]
    fn test_code128_is_deterministic() {
        let a = generate_barcode("TRK-001", &opts(BarcodeFormat::Code128)).unwrap();
        let b = generate_barcode("TRK-001", &opts(BarcodeFormat::Code128)).unwrap();
        assert_eq!(a.pixels(), b.pixels());
        assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
    }

    #[test]
    fn test_display_value_does_not_change_bars() {
        let with_text = generate_barcode("TRK-001", &opts(BarcodeFormat::Code128)).unwrap();
        let bare = generate_barcode(
            "TRK-001",
            &BarcodeOptions {
                display_value: false,
                ..opts(BarcodeFormat::Code128)
            },
        )
        .unwrap();

        assert_eq!(bare.height(), DEFAULT_BAR_HEIGHT);
        assert!(with_text.height() > bare.height());
        assert_eq!(with_text.width(), bare.width());
        let bar_rows = (bare.width() * bare.height()) as usize;
        assert_eq!(&with_text.pixels()[..bar_rows], bare.pixels());
    }

    #[test]
    fn test_module_width_scales_image() {
        let narrow = BarcodeOptions {
            module_width: 1,
            display_value: false,
            ..opts(BarcodeFormat::Code39)
        };
        let wide = BarcodeOptions {
            module_width: 3,
            ..narrow
        };
        let a = generate_barcode("ABC-123", &narrow).unwrap();
        let b = generate_barcode("ABC-123", &wide).unwrap();
        assert_eq!(b.width(), a.width() * 3);
    }

    #[test]
    fn test_quiet_zone_is_blank() {
        let img = generate_barcode(
            "12345",
            &BarcodeOptions {
                module_width: 2,
                display_value: false,
                ..opts(BarcodeFormat::Code128)
            },
        )
        .unwrap();
        let quiet_px = (QUIET_ZONE_MODULES * 2) as usize;
        let row = &img.pixels()[..img.width() as usize];
        assert!(row[..quiet_px].iter().all(|&p| p == 255));
        assert!(row[row.len() - quiet_px..].iter().all(|&p| p == 255));
        assert_eq!(row[quiet_px], 0);
    }

    #[test]
    fn test_ean13_accepts_payload_and_correct_check_digit() {
        let a = generate_barcode("400638133393", &opts(BarcodeFormat::Ean13)).unwrap();
        let b = generate_barcode("4006381333931", &opts(BarcodeFormat::Ean13)).unwrap();
        assert_eq!(a.width(), b.width());
    }

    #[test]
    fn test_ean13_rejects_bad_input() {
        let err = generate_barcode("TRK-001", &opts(BarcodeFormat::Ean13)).unwrap_err();
        assert_eq!(err.symbology, Symbology::Barcode(BarcodeFormat::Ean13));
        assert_eq!(err.input, "TRK-001");

        let err = generate_barcode("4006381333932", &opts(BarcodeFormat::Ean13)).unwrap_err();
        assert!(err.reason.contains("check digit"), "{}", err.reason);

        let err = generate_barcode("12345", &opts(BarcodeFormat::Ean13)).unwrap_err();
        assert!(err.reason.contains("12 or 13"), "{}", err.reason);
    }

    #[test]
    fn test_ean8_and_upc() {
        assert!(generate_barcode("9638507", &opts(BarcodeFormat::Ean8)).is_ok());
        assert!(generate_barcode("96385074", &opts(BarcodeFormat::Ean8)).is_ok());
        assert!(generate_barcode("03600029145", &opts(BarcodeFormat::Upc)).is_ok());
        assert!(generate_barcode("036000291452", &opts(BarcodeFormat::Upc)).is_ok());
        assert!(generate_barcode("036000291453", &opts(BarcodeFormat::Upc)).is_err());
    }

    #[test]
    fn test_code39_rejects_lowercase() {
        let err = generate_barcode("abc", &opts(BarcodeFormat::Code39)).unwrap_err();
        assert!(err.reason.contains("Code 39"), "{}", err.reason);
        assert!(generate_barcode("ABC 12/3", &opts(BarcodeFormat::Code39)).is_ok());
    }

    #[test]
    fn test_empty_input_fails() {
        for format in BarcodeFormat::ALL {
            assert!(generate_barcode("", &opts(format)).is_err(), "{}", format);
        }
    }

    #[test]
    fn test_code128_rejects_non_ascii() {
        assert!(generate_barcode("caf\u{e9}", &opts(BarcodeFormat::Code128)).is_err());
    }

    #[test]
    fn test_oversized_raster_is_an_encoding_error() {
        for height in [u32::MAX - 5, 10_000_000] {
            let err = generate_barcode(
                "TRK-001",
                &BarcodeOptions {
                    height,
                    ..opts(BarcodeFormat::Code128)
                },
            )
            .unwrap_err();
            assert_eq!(err.symbology, Symbology::Barcode(BarcodeFormat::Code128));
            assert!(err.reason.contains("px on a side"), "{}", err.reason);
        }

        let long = "A".repeat(5_000);
        assert!(generate_barcode(&long, &opts(BarcodeFormat::Code39)).is_err());
    }

    #[test]
    fn test_gs1_check_digit() {
        assert_eq!(gs1_check_digit("400638133393"), 1);
        assert_eq!(gs1_check_digit("9638507"), 4);
        assert_eq!(gs1_check_digit("003600029145"), 2);
    }
}
