//! # Data Binding
//!
//! Maps a field to the string it displays. The field `id` doubles as its
//! semantic key: a field with id `receiver` shows the receiver block of the
//! bound [`ShipmentRecord`].
//!
//! Resolution never fails. It walks three tiers and stops at the first that
//! yields text:
//!
//! 1. the bound record's attribute, formatted per key
//! 2. a fixed sample for the key, so design mode always has something to draw
//! 3. the field label, for ids that are not binding keys

mod record;

pub use record::{Dimensions, Package, Party, ShipmentRecord, Shipping};

use chrono::{DateTime, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::template::{FieldType, TemplateField};

/// Sample tracking number shown when no record is bound.
pub const SAMPLE_TRACKING_NUMBER: &str = "TRK-20250128-001";

/// Semantic ids the resolver knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKey {
    Sender,
    Receiver,
    TrackingNumber,
    ServiceLevel,
    Weight,
    Dimensions,
    EstimatedDelivery,
    Reference,
    ShipDate,
    /// Tracking number, for barcode fields.
    TrackingBarcode,
    /// Tracking number, for QR fields.
    TrackingQr,
}

impl BindingKey {
    pub const ALL: [BindingKey; 11] = [
        Self::Sender,
        Self::Receiver,
        Self::TrackingNumber,
        Self::ServiceLevel,
        Self::Weight,
        Self::Dimensions,
        Self::EstimatedDelivery,
        Self::Reference,
        Self::ShipDate,
        Self::TrackingBarcode,
        Self::TrackingQr,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Receiver => "receiver",
            Self::TrackingNumber => "tracking_number",
            Self::ServiceLevel => "service_level",
            Self::Weight => "weight",
            Self::Dimensions => "dimensions",
            Self::EstimatedDelivery => "estimated_delivery",
            Self::Reference => "reference",
            Self::ShipDate => "ship_date",
            Self::TrackingBarcode => "tracking_barcode",
            Self::TrackingQr => "tracking_qr",
        }
    }

    /// Deterministic stand-in value.
    pub fn sample(self) -> &'static str {
        match self {
            Self::Sender => "Acme Fulfillment\n100 Warehouse Way\nSpringfield, IL 62701",
            Self::Receiver => "Jane Doe\n742 Evergreen Terrace\nSpringfield, OR 97403",
            Self::TrackingNumber | Self::TrackingBarcode | Self::TrackingQr => {
                SAMPLE_TRACKING_NUMBER
            }
            Self::ServiceLevel => "Express",
            Self::Weight => "2.5 kg",
            Self::Dimensions => "30×20×15 cm",
            Self::EstimatedDelivery => "1/31/2025",
            Self::Reference => "REF-0001",
            Self::ShipDate => "1/28/2025",
        }
    }

    /// Value from the record, formatted. `None` when absent or empty.
    fn lookup(self, record: &ShipmentRecord) -> Option<String> {
        let value = match self {
            Self::Sender => join_party(record.sender.as_ref()?),
            Self::Receiver => join_party(record.receiver.as_ref()?),
            Self::TrackingNumber | Self::TrackingBarcode | Self::TrackingQr => {
                record.tracking_number()?.trim().to_string()
            }
            Self::ServiceLevel => record.service_level()?.trim().to_string(),
            Self::Weight => format_weight(record.weight()?),
            Self::Dimensions => format_dimensions(record.dimensions()?)?,
            Self::EstimatedDelivery => format_date(record.estimated_delivery()?),
            Self::ShipDate => format_date(record.ship_date()?),
            Self::Reference => record.reference.as_deref()?.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|k| k.as_str() == s).ok_or(())
    }
}

fn join_party(party: &Party) -> String {
    party.lines().collect::<Vec<_>>().join("\n")
}

fn format_weight(kg: f64) -> String {
    format!("{} kg", kg)
}

fn format_dimensions(d: Dimensions) -> Option<String> {
    Some(format!("{}×{}×{} cm", d.length?, d.width?, d.height?))
}

/// `2025-01-31` or an RFC 3339 timestamp → `1/31/2025`. Anything else is
/// shown as given.
fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));
    match date {
        Some(date) => date.format("%-m/%-d/%Y").to_string(),
        None => raw.to_string(),
    }
}

/// The binding key a field id names, if any.
pub fn binding_key(field: &TemplateField) -> Option<BindingKey> {
    field.id().parse().ok()
}

/// Display value for a field.
///
/// Tiers: bound record, then the key's sample, then the field label.
pub fn resolve(field: &TemplateField, record: Option<&ShipmentRecord>) -> String {
    let Some(key) = binding_key(field) else {
        return field.label().to_string();
    };
    record
        .and_then(|r| key.lookup(r))
        .unwrap_or_else(|| key.sample().to_string())
}

/// Can this field show something meaningful without live data?
pub fn has_resolvable_value(field: &TemplateField) -> bool {
    match field.field_type() {
        FieldType::Line | FieldType::Rectangle | FieldType::Image => true,
        FieldType::Text | FieldType::Barcode | FieldType::QrCode => {
            binding_key(field).is_some() || !field.label().trim().is_empty()
        }
    }
}
