//! Save gate.
//!
//! Reasons are reported in a fixed order:
//!
//! 1. no enabled field at all
//! 2. enabled, required fields with nothing to show
//! 3. barcode / QR fields (enabled or not) without their payload
//!
//! Checking never modifies the template.

use crate::binding::has_resolvable_value;
use crate::error::ValidationError;
use crate::template::Template;

pub const NO_ENABLED_FIELD: &str = "template must contain at least one enabled field";

/// Check whether `template` may be saved.
pub fn validate(template: &Template) -> Result<(), ValidationError> {
    let mut reasons = Vec::new();

    if template.enabled_fields().next().is_none() {
        reasons.push(NO_ENABLED_FIELD.to_string());
    }

    for field in template.enabled_fields() {
        if field.required() && !has_resolvable_value(field) {
            reasons.push(format!(
                "required field {:?} has no value to display",
                field.id()
            ));
        }
    }

    for field in template.fields() {
        if field.data().is_missing_payload() {
            reasons.push(format!(
                "{} field {:?} is missing its {} data",
                field.field_type().display_name(),
                field.id(),
                field.field_type()
            ));
        }
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        tracing::warn!(template = %template.name, count = reasons.len(), "template failed validation");
        Err(ValidationError { reasons })
    }
}
