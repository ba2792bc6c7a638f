//! QR code generation and tracking-URL composition.

use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};

use super::barcode::MAX_RASTER_SIDE;
use super::{CodeImage, Symbology};
use crate::error::EncodingError;
use crate::template::{ErrorCorrection, QrCodeData};

/// Base URL prepended to tracking numbers when none is configured.
pub const DEFAULT_TRACKING_BASE_URL: &str = "https://track.etiqueta.dev/t/";

pub const DEFAULT_MODULE_SIZE: u32 = 4;
pub const DEFAULT_QUIET_ZONE: u32 = 4;

/// QR generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QrOptions {
    pub level: ErrorCorrection,
    /// Pixels per module side.
    pub module_size: u32,
    /// Blank modules around the symbol.
    pub quiet_zone: u32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            level: ErrorCorrection::M,
            module_size: DEFAULT_MODULE_SIZE,
            quiet_zone: DEFAULT_QUIET_ZONE,
        }
    }
}

impl QrOptions {
    pub fn for_field(data: &QrCodeData, module_size: u32) -> Self {
        Self {
            level: data.error_correction_level,
            module_size,
            ..Default::default()
        }
    }
}

fn ec_level(level: ErrorCorrection) -> EcLevel {
    match level {
        ErrorCorrection::L => EcLevel::L,
        ErrorCorrection::M => EcLevel::M,
        ErrorCorrection::Q => EcLevel::Q,
        ErrorCorrection::H => EcLevel::H,
    }
}

/// `base + tracking`, with [`DEFAULT_TRACKING_BASE_URL`] when `base` is unset.
pub fn tracking_url(tracking: &str, base: Option<&str>) -> String {
    format!("{}{}", base.unwrap_or(DEFAULT_TRACKING_BASE_URL), tracking)
}

/// Encode `data` as a QR raster.
pub fn generate_qr_code(data: &str, opts: &QrOptions) -> Result<CodeImage, EncodingError> {
    if data.is_empty() {
        return Err(EncodingError::new(Symbology::Qr, data, "input is empty"));
    }

    let code = QrCode::with_error_correction_level(data, ec_level(opts.level))
        .map_err(|e| EncodingError::new(Symbology::Qr, data, e.to_string()))?;

    let cell = opts.module_size.max(1);
    let modules = code.width() as u32;
    let side = opts
        .quiet_zone
        .checked_mul(2)
        .and_then(|q| q.checked_add(modules))
        .and_then(|m| m.checked_mul(cell))
        .filter(|side| *side <= MAX_RASTER_SIDE)
        .ok_or_else(|| {
            EncodingError::new(
                Symbology::Qr,
                data,
                format!("raster would exceed {} px on a side", MAX_RASTER_SIDE),
            )
        })?;
    let offset = opts.quiet_zone * cell;

    let mut img = GrayImage::from_pixel(side, side, Luma([255]));
    for qy in 0..modules {
        for qx in 0..modules {
            if code[(qx as usize, qy as usize)] != qrcode::Color::Dark {
                continue;
            }
            for cy in 0..cell {
                for cx in 0..cell {
                    img.put_pixel(offset + qx * cell + cx, offset + qy * cell + cy, Luma([0]));
                }
            }
        }
    }

    Ok(CodeImage::new(img))
}

/// Encode the tracking URL for `tracking` rather than the bare number.
pub fn generate_tracking_qr_code(
    tracking: &str,
    base_url: Option<&str>,
    opts: &QrOptions,
) -> Result<CodeImage, EncodingError> {
    generate_qr_code(&tracking_url(tracking, base_url), opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_url() {
        assert_eq!(
            tracking_url("TRK-20250128-001", None),
            "https://track.etiqueta.dev/t/TRK-20250128-001"
        );
        assert_eq!(
            tracking_url("TRK-1", Some("https://example.com/track?id=")),
            "https://example.com/track?id=TRK-1"
        );
    }

    #[test]
    fn test_tracking_qr_matches_url_qr() {
        let opts = QrOptions::default();
        let tracked = generate_tracking_qr_code("TRK-20250128-001", None, &opts).unwrap();
        let direct = generate_qr_code(
            "https://track.etiqueta.dev/t/TRK-20250128-001",
            &opts,
        )
        .unwrap();
        let bare = generate_qr_code("TRK-20250128-001", &opts).unwrap();
        assert_eq!(tracked, direct);
        assert_ne!(tracked, bare);
    }

    #[test]
    fn test_qr_geometry() {
        let img = generate_qr_code("hello", &QrOptions::default()).unwrap();
        // Version 1 is 21 modules; plus 4 quiet modules each side, 4 px each.
        assert_eq!(img.width(), (21 + 8) * 4);
        assert_eq!(img.width(), img.height());
        // Quiet zone is blank, finder pattern corner is dark.
        assert_eq!(img.pixel(0, 0), 255);
        assert_eq!(img.pixel(16, 16), 0);
    }

    #[test]
    fn test_qr_is_deterministic() {
        let opts = QrOptions {
            level: ErrorCorrection::H,
            ..Default::default()
        };
        let a = generate_qr_code("TRK-001", &opts).unwrap();
        let b = generate_qr_code("TRK-001", &opts).unwrap();
        assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
    }

    #[test]
    fn test_qr_rejects_oversized_raster() {
        let opts = QrOptions {
            module_size: u32::MAX / 4,
            ..Default::default()
        };
        let err = generate_qr_code("TRK-001", &opts).unwrap_err();
        assert_eq!(err.symbology, Symbology::Qr);
        assert!(err.reason.contains("px on a side"), "{}", err.reason);
    }

    #[test]
    fn test_qr_rejects_oversized_input() {
        let huge = "X".repeat(8000);
        let err = generate_qr_code(&huge, &QrOptions::default()).unwrap_err();
        assert_eq!(err.symbology, Symbology::Qr);
    }
}
