//! # Designer Configuration
//!
//! Knobs shared by the renderer, the drag controller and the session.
//!
//! | Key | Default | Used by |
//! |-----|---------|---------|
//! | `viewport.maxWidth` / `viewport.maxHeight` | 800 / 600 | fit-to-viewport scale |
//! | `trackingBaseUrl` | `https://track.etiqueta.dev/t/` | QR fields with `includeTrackingURL` |
//! | `duplicateOffset` | 20 | duplicate field placement |
//! | `gridSpacing` | 10 | design-mode grid |
//! | `qrModuleSize` | 4 | px per QR module |
//!
//! ## Usage
//!
//! ```
//! use etiqueta::config::DesignerConfig;
//!
//! let config: DesignerConfig = serde_json::from_str(r#"{"gridSpacing": 8}"#).unwrap();
//! assert_eq!(config.grid_spacing, 8.0);
//! assert_eq!(config.duplicate_offset, 20.0);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codes::{DEFAULT_MODULE_SIZE, DEFAULT_TRACKING_BASE_URL};
use crate::error::EtiquetaError;
use crate::render::Viewport;

/// Environment variable that overrides `trackingBaseUrl`.
pub const TRACKING_BASE_URL_ENV: &str = "ETIQUETA_TRACKING_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignerConfig {
    pub viewport: Viewport,
    pub tracking_base_url: String,
    /// Offset applied on both axes to a duplicated field.
    pub duplicate_offset: f32,
    pub grid_spacing: f32,
    pub qr_module_size: u32,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            tracking_base_url: DEFAULT_TRACKING_BASE_URL.to_string(),
            duplicate_offset: 20.0,
            grid_spacing: 10.0,
            qr_module_size: DEFAULT_MODULE_SIZE,
        }
    }
}

impl DesignerConfig {
    /// Load from a JSON file, then apply environment overrides.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EtiquetaError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config.with_env_overrides())
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_tracking_override(std::env::var(TRACKING_BASE_URL_ENV).ok())
    }

    fn with_tracking_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            tracing::debug!(url = %url, "tracking base URL overridden from environment");
            self.tracking_base_url = url;
        }
        self
    }
}
