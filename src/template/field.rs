//! Field entity and its type-specific payloads.
//!
//! The field type is not stored next to the payload: it *is* the variant of
//! [`FieldData`], so a barcode field can only ever carry barcode options.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FieldError;

/// Allowed font sizes, in canvas px.
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<f32> = 6.0..=72.0;

/// Allowed barcode module widths, in canvas px.
pub const BARCODE_WIDTH_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Allowed explicit bar heights, in canvas px.
pub const BAR_HEIGHT_RANGE: std::ops::RangeInclusive<u32> = 1..=1000;

/// Where a new field lands on the canvas.
const DEFAULT_POSITION: Position = Position { x: 20.0, y: 20.0 };

// ============================================================================
// GEOMETRY
// ============================================================================

/// Top-left corner in canvas px.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Field extent in canvas px. Both sides are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

// ============================================================================
// STYLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Border {
    pub width: f32,
    pub style: BorderStyle,
    pub color: String,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: 1.0,
            style: BorderStyle::Solid,
            color: "#000000".into(),
        }
    }
}

/// Optional presentation attributes. Unset members fall back to renderer
/// defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
}

impl FieldStyle {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn check(&self) -> Result<(), FieldError> {
        if let Some(size) = self.font_size
            && !FONT_SIZE_RANGE.contains(&size)
        {
            return Err(FieldError::InvalidValue {
                name: "style.fontSize",
                reason: format!(
                    "{} is outside {}..={}",
                    size,
                    FONT_SIZE_RANGE.start(),
                    FONT_SIZE_RANGE.end()
                ),
            });
        }
        if let Some(border) = &self.border
            && !(border.width >= 0.0 && border.width.is_finite())
        {
            return Err(FieldError::InvalidValue {
                name: "style.border.width",
                reason: format!("{} is not a non-negative width", border.width),
            });
        }
        Ok(())
    }
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// 1D symbologies a barcode field can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BarcodeFormat {
    #[default]
    Code128,
    Code39,
    Ean13,
    Ean8,
    /// UPC-A.
    Upc,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 5] = [
        Self::Code128,
        Self::Code39,
        Self::Ean13,
        Self::Ean8,
        Self::Upc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code128 => "CODE128",
            Self::Code39 => "CODE39",
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::Upc => "UPC",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BarcodeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.replace(['-', '_', ' '], "");
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown barcode format '{}'", s))
    }
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl std::str::FromStr for ErrorCorrection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(format!("unknown error correction level '{}'", s)),
        }
    }
}

fn default_barcode_width() -> u8 {
    2
}

fn default_true() -> bool {
    true
}

/// Barcode options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BarcodeData {
    pub format: BarcodeFormat,
    /// Module (narrowest bar) width in px, 1–5.
    #[serde(default = "default_barcode_width")]
    pub width: u8,
    /// Draw the human-readable text under the bars.
    #[serde(default = "default_true")]
    pub display_value: bool,
    /// Bar height in px. Unset means the generator default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Default for BarcodeData {
    fn default() -> Self {
        Self {
            format: BarcodeFormat::Code128,
            width: default_barcode_width(),
            display_value: true,
            height: None,
        }
    }
}

impl BarcodeData {
    fn check(&self) -> Result<(), FieldError> {
        if !BARCODE_WIDTH_RANGE.contains(&self.width) {
            return Err(FieldError::InvalidValue {
                name: "data.width",
                reason: format!(
                    "{} is outside {}..={}",
                    self.width,
                    BARCODE_WIDTH_RANGE.start(),
                    BARCODE_WIDTH_RANGE.end()
                ),
            });
        }
        if let Some(height) = self.height
            && !BAR_HEIGHT_RANGE.contains(&height)
        {
            return Err(FieldError::InvalidValue {
                name: "data.height",
                reason: format!(
                    "{} is outside {}..={}",
                    height,
                    BAR_HEIGHT_RANGE.start(),
                    BAR_HEIGHT_RANGE.end()
                ),
            });
        }
        Ok(())
    }
}

/// QR code options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QrCodeData {
    #[serde(default)]
    pub error_correction_level: ErrorCorrection,
    /// Encode `tracking base URL + value` instead of the bare value.
    #[serde(default, rename = "includeTrackingURL")]
    pub include_tracking_url: bool,
}

/// Field kind together with its payload.
///
/// Barcode and QR fields hold an `Option` because templates coming back from
/// persistence may lack the payload; the session's save gate reports that.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Text,
    Barcode(Option<BarcodeData>),
    QrCode(Option<QrCodeData>),
    Image,
    Line,
    Rectangle,
}

impl FieldData {
    /// Starter payload for a freshly added field.
    pub fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => Self::Text,
            FieldType::Barcode => Self::Barcode(Some(BarcodeData::default())),
            FieldType::QrCode => Self::QrCode(Some(QrCodeData::default())),
            FieldType::Image => Self::Image,
            FieldType::Line => Self::Line,
            FieldType::Rectangle => Self::Rectangle,
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text => FieldType::Text,
            Self::Barcode(_) => FieldType::Barcode,
            Self::QrCode(_) => FieldType::QrCode,
            Self::Image => FieldType::Image,
            Self::Line => FieldType::Line,
            Self::Rectangle => FieldType::Rectangle,
        }
    }

    /// True for code-bearing fields whose payload is absent.
    pub fn is_missing_payload(&self) -> bool {
        matches!(self, Self::Barcode(None) | Self::QrCode(None))
    }
}

/// The six kinds of label field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Barcode,
    QrCode,
    Image,
    Line,
    Rectangle,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        Self::Text,
        Self::Barcode,
        Self::QrCode,
        Self::Image,
        Self::Line,
        Self::Rectangle,
    ];

    /// Human-readable name, also used as the placeholder caption.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Barcode => "Barcode",
            Self::QrCode => "QR Code",
            Self::Image => "Image",
            Self::Line => "Line",
            Self::Rectangle => "Rectangle",
        }
    }

    /// Wire name (`"qr_code"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Barcode => "barcode",
            Self::QrCode => "qr_code",
            Self::Image => "image",
            Self::Line => "line",
            Self::Rectangle => "rectangle",
        }
    }

    fn default_label(self) -> &'static str {
        match self {
            Self::Text => "Text Field",
            other => other.display_name(),
        }
    }

    fn default_size(self) -> Size {
        match self {
            Self::Text => Size::new(200.0, 30.0),
            Self::Barcode => Size::new(200.0, 50.0),
            Self::QrCode => Size::new(100.0, 100.0),
            Self::Image => Size::new(100.0, 100.0),
            Self::Line => Size::new(200.0, 2.0),
            Self::Rectangle => Size::new(150.0, 100.0),
        }
    }

    /// True for barcode and QR fields.
    pub fn is_code(self) -> bool {
        matches!(self, Self::Barcode | Self::QrCode)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FIELD
// ============================================================================

/// One positionable element on a label.
///
/// `id` and type are fixed for the field's lifetime; every other attribute
/// changes through [`TemplateField::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateField {
    pub(super) id: String,
    pub(super) label: String,
    pub(super) enabled: bool,
    pub(super) required: bool,
    pub(super) position: Position,
    pub(super) size: Size,
    pub(super) style: FieldStyle,
    pub(super) data: FieldData,
}

impl TemplateField {
    /// Build a field, checking size, style and payload ranges.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        data: FieldData,
        position: Position,
        size: Size,
    ) -> Result<Self, FieldError> {
        let field = Self {
            id: id.into(),
            label: label.into(),
            enabled: true,
            required: false,
            position,
            size,
            style: FieldStyle::default(),
            data,
        };
        field.check()?;
        Ok(field)
    }

    /// Build a field with the starter label, size and payload for its type.
    pub fn with_defaults(id: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: field_type.default_label().into(),
            enabled: true,
            required: false,
            position: DEFAULT_POSITION,
            size: field_type.default_size(),
            style: FieldStyle::default(),
            data: FieldData::default_for(field_type),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field_type(&self) -> FieldType {
        self.data.field_type()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn style(&self) -> &FieldStyle {
        &self.style
    }

    pub fn data(&self) -> &FieldData {
        &self.data
    }

    /// Does the field's bounding box contain the canvas point?
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.position.x
            && y >= self.position.y
            && x <= self.position.x + self.size.width
            && y <= self.position.y + self.size.height
    }

    /// Same field under another id (used by duplication).
    pub(crate) fn clone_with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    pub(super) fn check(&self) -> Result<(), FieldError> {
        let Size { width, height } = self.size;
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(FieldError::InvalidValue {
                name: "size",
                reason: format!("{}×{} is not strictly positive", width, height),
            });
        }
        if !(self.position.x.is_finite() && self.position.y.is_finite()) {
            return Err(FieldError::InvalidValue {
                name: "position",
                reason: "coordinates must be finite".into(),
            });
        }
        self.style.check()?;
        if let FieldData::Barcode(Some(barcode)) = &self.data {
            barcode.check()?;
        }
        Ok(())
    }
}
