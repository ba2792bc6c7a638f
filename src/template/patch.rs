//! Partial updates for a [`TemplateField`].
//!
//! A patch never carries `id` or type: those are fixed once the field exists.
//! Every member is optional and only set members are applied.

use serde::Deserialize;

use super::field::{
    BarcodeFormat, Border, BorderStyle, ErrorCorrection, FieldData, FontWeight,
    Position, QrCodeData, Size, TemplateField, TextAlign,
};
use crate::error::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizePatch {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BorderPatch {
    pub width: Option<f32>,
    pub style: Option<BorderStyle>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StylePatch {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub text_align: Option<TextAlign>,
    pub border: Option<BorderPatch>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BarcodePatch {
    pub format: Option<BarcodeFormat>,
    pub width: Option<u8>,
    pub display_value: Option<bool>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QrCodePatch {
    pub error_correction_level: Option<ErrorCorrection>,
    #[serde(rename = "includeTrackingURL")]
    pub include_tracking_url: Option<bool>,
}

/// Payload patch. Must match the field's type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DataPatch {
    Barcode(BarcodePatch),
    QrCode(QrCodePatch),
}

impl DataPatch {
    fn kind(&self) -> &'static str {
        match self {
            Self::Barcode(_) => "barcode",
            Self::QrCode(_) => "qr_code",
        }
    }
}

/// Partial field update, merged by [`TemplateField::update`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldPatch {
    pub label: Option<String>,
    pub enabled: Option<bool>,
    pub required: Option<bool>,
    pub position: Option<PositionPatch>,
    pub size: Option<SizePatch>,
    pub style: Option<StylePatch>,
    pub data: Option<DataPatch>,
}

impl FieldPatch {
    /// Patch that only moves the field.
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            position: Some(PositionPatch {
                x: Some(x),
                y: Some(y),
            }),
            ..Default::default()
        }
    }
}

fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn merge_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

impl TemplateField {
    /// Apply a patch, returning the updated field.
    ///
    /// The receiver is untouched, so a rejected patch leaves nothing
    /// half-applied.
    pub fn update(&self, patch: &FieldPatch) -> Result<TemplateField, FieldError> {
        let mut next = self.clone();

        merge(&mut next.label, &patch.label);
        merge(&mut next.enabled, &patch.enabled);
        merge(&mut next.required, &patch.required);

        if let Some(PositionPatch { x, y }) = patch.position {
            next.position = Position {
                x: x.unwrap_or(next.position.x),
                y: y.unwrap_or(next.position.y),
            };
        }
        if let Some(SizePatch { width, height }) = patch.size {
            next.size = Size {
                width: width.unwrap_or(next.size.width),
                height: height.unwrap_or(next.size.height),
            };
        }

        if let Some(style) = &patch.style {
            let target = &mut next.style;
            merge_opt(&mut target.font_family, &style.font_family);
            merge_opt(&mut target.font_size, &style.font_size);
            merge_opt(&mut target.font_weight, &style.font_weight);
            merge_opt(&mut target.color, &style.color);
            merge_opt(&mut target.background_color, &style.background_color);
            merge_opt(&mut target.text_align, &style.text_align);
            if let Some(border_patch) = &style.border {
                let border = target.border.get_or_insert_with(Border::default);
                merge(&mut border.width, &border_patch.width);
                merge(&mut border.style, &border_patch.style);
                merge(&mut border.color, &border_patch.color);
            }
        }

        if let Some(data) = &patch.data {
            next.data = apply_data(&next.data, data)?;
        }

        next.check()?;
        Ok(next)
    }
}

fn apply_data(current: &FieldData, patch: &DataPatch) -> Result<FieldData, FieldError> {
    match (current, patch) {
        (FieldData::Barcode(existing), DataPatch::Barcode(p)) => {
            let mut data = existing.clone().unwrap_or_default();
            merge(&mut data.format, &p.format);
            merge(&mut data.width, &p.width);
            merge(&mut data.display_value, &p.display_value);
            merge_opt(&mut data.height, &p.height);
            Ok(FieldData::Barcode(Some(data)))
        }
        // `{}` deserializes as the first untagged variant.
        (FieldData::QrCode(_), DataPatch::Barcode(p)) if *p == BarcodePatch::default() => {
            Ok(current.clone())
        }
        (FieldData::QrCode(existing), DataPatch::QrCode(p)) => {
            let mut data: QrCodeData = existing.clone().unwrap_or_default();
            merge(&mut data.error_correction_level, &p.error_correction_level);
            merge(&mut data.include_tracking_url, &p.include_tracking_url);
            Ok(FieldData::QrCode(Some(data)))
        }
        (current, patch) => Err(FieldError::PayloadMismatch {
            field_type: current.field_type().as_str(),
            payload: patch.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{BarcodeData, FieldType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_merges_only_set_members() {
        let field = TemplateField::with_defaults("t", FieldType::Text).with_position(5.0, 6.0);
        let next = field
            .update(&FieldPatch {
                position: Some(PositionPatch {
                    x: Some(40.0),
                    y: None,
                }),
                label: Some("Receiver".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(next.position(), Position::new(40.0, 6.0));
        assert_eq!(next.label(), "Receiver");
        assert_eq!(next.size(), field.size());
        assert_eq!(next.id(), "t");
    }

    #[test]
    fn test_update_barcode_payload() {
        let field = TemplateField::with_defaults("b", FieldType::Barcode);
        let next = field
            .update(&FieldPatch {
                data: Some(DataPatch::Barcode(BarcodePatch {
                    format: Some(BarcodeFormat::Ean13),
                    display_value: Some(false),
                    ..Default::default()
                })),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            next.data(),
            &FieldData::Barcode(Some(BarcodeData {
                format: BarcodeFormat::Ean13,
                width: 2,
                display_value: false,
                height: None,
            }))
        );
    }

    #[test]
    fn test_style_patch_merges_into_nested_border() {
        let mut field = TemplateField::with_defaults("t", FieldType::Text);
        field.style.font_size = Some(14.0);
        field.style.color = Some("#000000".into());
        field.style.border = Some(Border {
            width: 2.0,
            style: BorderStyle::Dashed,
            color: "#333333".into(),
        });

        let patch: FieldPatch = serde_json::from_str(
            r##"{"style": {"color": "#ff0000", "border": {"color": "#00ff00"}}}"##,
        )
        .unwrap();
        let next = field.update(&patch).unwrap();

        let style = next.style();
        assert_eq!(style.font_size, Some(14.0));
        assert_eq!(style.color.as_deref(), Some("#ff0000"));
        assert_eq!(
            style.border,
            Some(Border {
                width: 2.0,
                style: BorderStyle::Dashed,
                color: "#00ff00".into(),
            })
        );
        assert_eq!(style.font_family, field.style().font_family);
        assert_eq!(style.text_align, field.style().text_align);
    }

    #[test]
    fn test_update_rejects_mismatched_payload() {
        let field = TemplateField::with_defaults("t", FieldType::Text);
        let err = field
            .update(&FieldPatch {
                data: Some(DataPatch::QrCode(QrCodePatch::default())),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            FieldError::PayloadMismatch {
                field_type: "text",
                payload: "qr_code",
            }
        );
    }

    #[test]
    fn test_update_fills_missing_payload_with_defaults() {
        let mut field = TemplateField::with_defaults("q", FieldType::QrCode);
        field.data = FieldData::QrCode(None);
        let next = field
            .update(&FieldPatch {
                data: Some(DataPatch::QrCode(QrCodePatch {
                    include_tracking_url: Some(true),
                    ..Default::default()
                })),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            next.data(),
            &FieldData::QrCode(Some(QrCodeData {
                error_correction_level: ErrorCorrection::M,
                include_tracking_url: true,
            }))
        );
    }

    #[test]
    fn test_update_rejects_out_of_range_font_size() {
        let field = TemplateField::with_defaults("t", FieldType::Text);
        let result = field.update(&FieldPatch {
            style: Some(StylePatch {
                font_size: Some(200.0),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(FieldError::InvalidValue {
                name: "style.fontSize",
                ..
            })
        ));
    }

    #[test]
    fn test_patch_from_json() {
        let patch: FieldPatch = serde_json::from_str(
            r#"{"size": {"width": 120}, "data": {"includeTrackingURL": true}}"#,
        )
        .unwrap();
        assert_eq!(
            patch.data,
            Some(DataPatch::QrCode(QrCodePatch {
                error_correction_level: None,
                include_tracking_url: Some(true),
            }))
        );
        assert_eq!(patch.size.and_then(|s| s.width), Some(120.0));
    }
}
