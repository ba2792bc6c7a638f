//! # Template Model
//!
//! A [`Template`] is a named label design: a physical [`LabelSize`], an
//! [`Orientation`], and an ordered list of [`TemplateField`]s. List order is
//! paint order, so later fields draw on top of earlier ones.
//!
//! The same types are the Rust API and the persistence wire format:
//!
//! ```
//! use etiqueta::template::{FieldType, LabelSize, Orientation, Template, TemplateField};
//!
//! let mut template = Template::new("Parcel", LabelSize::Label4x6, Orientation::Portrait);
//! template
//!     .push_field(TemplateField::with_defaults("tracking_barcode", FieldType::Barcode))
//!     .unwrap();
//!
//! let json = serde_json::to_string(&template).unwrap();
//! let back: Template = serde_json::from_str(&json).unwrap();
//! assert_eq!(back, template);
//! ```
//!
//! ## Canvas units
//!
//! Canvas coordinates are CSS-style pixels at 96 px/inch. Label sizes are
//! declared in millimetres (portrait) and converted once:
//!
//! ```text
//! px = round(mm × 96 / 25.4)
//!
//! A4   210 × 297 mm  →  794 × 1123 px
//! 4x6  101.6 × 152.4 →  384 × 576 px
//! ```

mod field;
mod patch;
mod wire;

pub use field::{
    BarcodeData, BarcodeFormat, Border, BorderStyle, ErrorCorrection, FieldData, FieldStyle,
    FieldType, FontWeight, Position, QrCodeData, Size, TemplateField, TextAlign,
    BAR_HEIGHT_RANGE, BARCODE_WIDTH_RANGE, FONT_SIZE_RANGE,
};
pub use patch::{
    BarcodePatch, BorderPatch, DataPatch, FieldPatch, PositionPatch, QrCodePatch, SizePatch,
    StylePatch,
};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::FieldError;

/// Canvas pixels per inch.
pub const PX_PER_INCH: f32 = 96.0;

const MM_PER_INCH: f32 = 25.4;

/// Convert millimetres to whole canvas pixels.
#[inline]
pub fn mm_to_px(mm: f32) -> f32 {
    (mm * PX_PER_INCH / MM_PER_INCH).round()
}

/// Effective drawing surface of a template, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The same surface turned a quarter turn.
    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Physical paper or label stock.
///
/// | Size | Portrait mm | Portrait px |
/// |------|-------------|-------------|
/// | A4 | 210 × 297 | 794 × 1123 |
/// | A5 | 148 × 210 | 559 × 794 |
/// | A6 | 105 × 148 | 397 × 559 |
/// | 4x6 | 101.6 × 152.4 | 384 × 576 |
/// | 4x4 | 101.6 × 101.6 | 384 × 384 |
/// | 2x1 | 50.8 × 25.4 | 192 × 96 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LabelSize {
    A4,
    A5,
    A6,
    /// 4×6 inch shipping label.
    #[default]
    #[serde(rename = "4x6")]
    Label4x6,
    #[serde(rename = "4x4")]
    Label4x4,
    #[serde(rename = "2x1")]
    Label2x1,
}

impl LabelSize {
    pub const ALL: [LabelSize; 6] = [
        Self::A4,
        Self::A5,
        Self::A6,
        Self::Label4x6,
        Self::Label4x4,
        Self::Label2x1,
    ];

    /// Portrait dimensions in millimetres (width, height).
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::A5 => (148.0, 210.0),
            Self::A6 => (105.0, 148.0),
            Self::Label4x6 => (101.6, 152.4),
            Self::Label4x4 => (101.6, 101.6),
            Self::Label2x1 => (50.8, 25.4),
        }
    }

    /// Portrait dimensions in canvas pixels.
    pub fn dimensions(self) -> CanvasSize {
        let (w, h) = self.dimensions_mm();
        CanvasSize::new(mm_to_px(w), mm_to_px(h))
    }

    /// Wire name, as used in JSON and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::A5 => "A5",
            Self::A6 => "A6",
            Self::Label4x6 => "4x6",
            Self::Label4x4 => "4x4",
            Self::Label2x1 => "2x1",
        }
    }
}

impl fmt::Display for LabelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown label size '{}' (expected one of: {})",
                    s,
                    Self::ALL.map(|size| size.as_str()).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Deserialize the field list, rejecting repeated ids.
fn deserialize_unique_fields<'de, D>(deserializer: D) -> Result<Vec<TemplateField>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let fields: Vec<TemplateField> = Vec::deserialize(deserializer)?;
    check_unique_ids(&fields).map_err(serde::de::Error::custom)?;
    Ok(fields)
}

pub(crate) fn check_unique_ids(fields: &[TemplateField]) -> Result<(), FieldError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.id()) {
            return Err(FieldError::DuplicateId(field.id().to_string()));
        }
    }
    Ok(())
}

/// A named, reusable label design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub label_size: LabelSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default, deserialize_with = "deserialize_unique_fields")]
    fields: Vec<TemplateField>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new("Untitled label", LabelSize::default(), Orientation::default())
    }
}

impl Template {
    /// Create an empty template.
    pub fn new(name: impl Into<String>, label_size: LabelSize, orientation: Orientation) -> Self {
        Self {
            name: name.into(),
            label_size,
            orientation,
            fields: Vec::new(),
        }
    }

    /// Effective canvas: the label size, turned for landscape.
    pub fn canvas_size(&self) -> CanvasSize {
        let portrait = self.label_size.dimensions();
        match self.orientation {
            Orientation::Portrait => portrait,
            Orientation::Landscape => portrait.swapped(),
        }
    }

    /// Fields in paint order.
    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.id() == id)
    }

    pub(crate) fn position_of(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id() == id)
    }

    /// Append a field on top of the others.
    pub fn push_field(&mut self, field: TemplateField) -> Result<(), FieldError> {
        self.insert_field(self.fields.len(), field)
    }

    pub(crate) fn insert_field(&mut self, index: usize, field: TemplateField) -> Result<(), FieldError> {
        if self.field(field.id()).is_some() {
            return Err(FieldError::DuplicateId(field.id().to_string()));
        }
        let index = index.min(self.fields.len());
        self.fields.insert(index, field);
        Ok(())
    }

    pub(crate) fn replace_field(&mut self, index: usize, field: TemplateField) {
        self.fields[index] = field;
    }

    pub(crate) fn remove_field(&mut self, id: &str) -> Option<TemplateField> {
        let index = self.position_of(id)?;
        Some(self.fields.remove(index))
    }

    /// Fields that take part in rendering, hit-testing and required checks.
    pub fn enabled_fields(&self) -> impl Iterator<Item = &TemplateField> {
        self.fields.iter().filter(|f| f.enabled())
    }
}
