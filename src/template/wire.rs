//! JSON shape of a [`TemplateField`].
//!
//! On the wire `type` and `data` are sibling keys:
//!
//! ```json
//! {
//!   "id": "tracking_barcode",
//!   "type": "barcode",
//!   "label": "Barcode",
//!   "enabled": true,
//!   "required": false,
//!   "position": { "x": 20, "y": 20 },
//!   "size": { "width": 200, "height": 50 },
//!   "data": { "format": "CODE128", "width": 2, "displayValue": true }
//! }
//! ```
//!
//! Deserialization reads a [`RawField`] first and converts it, so a payload
//! can never end up on a field of the wrong type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::field::{
    BarcodeData, FieldData, FieldStyle, FieldType, Position, QrCodeData, Size, TemplateField,
};
use crate::error::FieldError;

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawField {
    id: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    label: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    required: bool,
    position: Position,
    size: Size,
    #[serde(default)]
    style: FieldStyle,
    #[serde(default)]
    data: Option<Value>,
}

impl TryFrom<RawField> for TemplateField {
    type Error = FieldError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let data = payload(&raw.id, raw.field_type, raw.data)?;
        let field = TemplateField {
            id: raw.id,
            label: raw.label,
            enabled: raw.enabled,
            required: raw.required,
            position: raw.position,
            size: raw.size,
            style: raw.style,
            data,
        };
        field.check().map_err(|e| FieldError::Wire {
            id: field.id.clone(),
            reason: e.to_string(),
        })?;
        Ok(field)
    }
}

/// Match the raw payload against the declared type.
fn payload(id: &str, field_type: FieldType, data: Option<Value>) -> Result<FieldData, FieldError> {
    let wire_err = |reason: String| FieldError::Wire {
        id: id.to_string(),
        reason,
    };

    match field_type {
        FieldType::Barcode => match data {
            None => Ok(FieldData::Barcode(None)),
            Some(value) => serde_json::from_value::<BarcodeData>(value)
                .map(|d| FieldData::Barcode(Some(d)))
                .map_err(|e| wire_err(format!("bad barcode data: {}", e))),
        },
        FieldType::QrCode => match data {
            None => Ok(FieldData::QrCode(None)),
            Some(value) => serde_json::from_value::<QrCodeData>(value)
                .map(|d| FieldData::QrCode(Some(d)))
                .map_err(|e| wire_err(format!("bad qr_code data: {}", e))),
        },
        other => match data {
            None => Ok(FieldData::default_for(other)),
            Some(Value::Object(map)) if map.is_empty() => Ok(FieldData::default_for(other)),
            Some(_) => Err(wire_err(format!("{} fields carry no data", other))),
        },
    }
}

impl<'de> Deserialize<'de> for TemplateField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawField::deserialize(deserializer)?;
        TemplateField::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum PayloadRef<'a> {
    Barcode(&'a BarcodeData),
    QrCode(&'a QrCodeData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireField<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    field_type: FieldType,
    label: &'a str,
    enabled: bool,
    required: bool,
    position: Position,
    size: Size,
    #[serde(skip_serializing_if = "style_is_empty")]
    style: &'a FieldStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<PayloadRef<'a>>,
}

fn style_is_empty(style: &&FieldStyle) -> bool {
    style.is_empty()
}

impl Serialize for TemplateField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = match &self.data {
            FieldData::Barcode(Some(d)) => Some(PayloadRef::Barcode(d)),
            FieldData::QrCode(Some(d)) => Some(PayloadRef::QrCode(d)),
            _ => None,
        };
        WireField {
            id: &self.id,
            field_type: self.field_type(),
            label: &self.label,
            enabled: self.enabled,
            required: self.required,
            position: self.position,
            size: self.size,
            style: &self.style,
            data,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{BarcodeFormat, ErrorCorrection};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: Value) -> Result<TemplateField, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_parse_barcode_with_defaults() {
        let field = parse(json!({
            "id": "tracking_barcode",
            "type": "barcode",
            "label": "Tracking",
            "position": {"x": 10, "y": 20},
            "size": {"width": 200, "height": 60},
            "data": {"format": "EAN13"}
        }))
        .unwrap();
        assert!(field.enabled());
        assert!(!field.required());
        assert_eq!(
            field.data(),
            &FieldData::Barcode(Some(BarcodeData {
                format: BarcodeFormat::Ean13,
                width: 2,
                display_value: true,
                height: None,
            }))
        );
    }

    #[test]
    fn test_parse_code_field_without_payload() {
        let field = parse(json!({
            "id": "tracking_qr",
            "type": "qr_code",
            "label": "QR",
            "position": {"x": 0, "y": 0},
            "size": {"width": 100, "height": 100},
            "data": null
        }))
        .unwrap();
        assert_eq!(field.data(), &FieldData::QrCode(None));
        assert!(field.data().is_missing_payload());
    }

    #[test]
    fn test_rejects_payload_of_other_type() {
        let err = parse(json!({
            "id": "tracking_qr",
            "type": "qr_code",
            "label": "QR",
            "position": {"x": 0, "y": 0},
            "size": {"width": 100, "height": 100},
            "data": {"format": "CODE128", "width": 2, "displayValue": true}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("bad qr_code data"), "{}", err);
    }

    #[test]
    fn test_rejects_payload_on_text_field() {
        let err = parse(json!({
            "id": "sender",
            "type": "text",
            "label": "Sender",
            "position": {"x": 0, "y": 0},
            "size": {"width": 100, "height": 30},
            "data": {"errorCorrectionLevel": "H"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("text fields carry no data"), "{}", err);
    }

    #[test]
    fn test_rejects_oversized_bar_height() {
        let err = parse(json!({
            "id": "tracking_barcode",
            "type": "barcode",
            "label": "Tracking",
            "position": {"x": 0, "y": 0},
            "size": {"width": 200, "height": 50},
            "data": {"format": "CODE128", "height": 4294967290u32}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("data.height"), "{}", err);
    }

    #[test]
    fn test_rejects_zero_size() {
        let err = parse(json!({
            "id": "rule",
            "type": "line",
            "label": "Line",
            "position": {"x": 0, "y": 0},
            "size": {"width": 100, "height": 0}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("rule"), "{}", err);
    }

    #[test]
    fn test_serialize_omits_empty_style_and_data() {
        let field = TemplateField::with_defaults("sender", FieldType::Text);
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "sender",
                "type": "text",
                "label": "Text Field",
                "enabled": true,
                "required": false,
                "position": {"x": 20.0, "y": 20.0},
                "size": {"width": 200.0, "height": 30.0}
            })
        );
    }

    #[test]
    fn test_serialize_qr_payload_key_names() {
        let field = TemplateField::with_defaults("tracking_qr", FieldType::QrCode);
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value["data"],
            json!({"errorCorrectionLevel": "M", "includeTrackingURL": false})
        );
        let back: TemplateField = serde_json::from_value(value).unwrap();
        assert_eq!(back, field);
        assert!(matches!(
            back.data(),
            FieldData::QrCode(Some(QrCodeData {
                error_correction_level: ErrorCorrection::M,
                ..
            }))
        ));
    }
}
