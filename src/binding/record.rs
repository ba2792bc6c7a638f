//! Shipment record: the live data a label is bound to.
//!
//! Every member is optional. A partial record is normal input, not an error.

use serde::{Deserialize, Serialize};

/// A sender or receiver.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub name: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Party {
    /// Non-empty parts in display order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        [
            &self.name,
            &self.company,
            &self.address,
            &self.phone,
            &self.email,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
    }
}

/// Package dimensions in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    /// Kilograms.
    pub weight: Option<f64>,
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Shipping {
    pub tracking_number: Option<String>,
    pub service_level: Option<String>,
    /// ISO date or RFC 3339 timestamp.
    pub estimated_delivery: Option<String>,
    pub ship_date: Option<String>,
}

/// Live shipment data bound to a label.
///
/// ```json
/// {
///   "sender": { "name": "Ana Ruiz", "address": "Calle 5, Madrid" },
///   "package": { "weight": 2.5, "dimensions": { "length": 30, "width": 20, "height": 10 } },
///   "shipping": { "trackingNumber": "TRK-1", "estimatedDelivery": "2025-02-01" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipmentRecord {
    pub sender: Option<Party>,
    pub receiver: Option<Party>,
    pub package: Option<Package>,
    pub shipping: Option<Shipping>,
    pub reference: Option<String>,
}

impl ShipmentRecord {
    pub fn tracking_number(&self) -> Option<&str> {
        self.shipping.as_ref()?.tracking_number.as_deref()
    }

    pub fn service_level(&self) -> Option<&str> {
        self.shipping.as_ref()?.service_level.as_deref()
    }

    pub fn estimated_delivery(&self) -> Option<&str> {
        self.shipping.as_ref()?.estimated_delivery.as_deref()
    }

    pub fn ship_date(&self) -> Option<&str> {
        self.shipping.as_ref()?.ship_date.as_deref()
    }

    pub fn weight(&self) -> Option<f64> {
        self.package.as_ref()?.weight
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.package.as_ref()?.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_party_lines_skip_blanks() {
        let party = Party {
            name: Some("Ana Ruiz".into()),
            company: Some("  ".into()),
            address: None,
            phone: Some("+34 600 000 000".into()),
            email: Some(String::new()),
        };
        assert_eq!(party.lines().collect::<Vec<_>>(), ["Ana Ruiz", "+34 600 000 000"]);
    }

    #[test]
    fn test_partial_record_parses() {
        let record: ShipmentRecord =
            serde_json::from_str(r#"{"shipping": {"trackingNumber": "TRK-9"}}"#).unwrap();
        assert_eq!(record.tracking_number(), Some("TRK-9"));
        assert_eq!(record.weight(), None);
        assert_eq!(record.sender, None);
    }
}
