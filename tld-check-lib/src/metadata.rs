//! Registration metadata extraction from RDAP records.
//!
//! Registries disagree on which RDAP members they send and sometimes send
//! them in odd shapes, so every lookup here is optional. Whatever cannot
//! be read is left at its zero value; extraction never fails.

use crate::protocols::rdap::RdapRecord;
use crate::types::RegistrationMetadata;
use serde_json::Value;

/// Extract registrar, dates, status codes and nameservers from a record.
///
/// # Arguments
///
/// * `record` - Parsed body of a successful RDAP response
///
/// # Returns
///
/// The extracted metadata. `registrar` is `"Unknown"` when no entity with
/// the `registrar` role carries a usable name.
pub fn extract_metadata(record: &RdapRecord) -> RegistrationMetadata {
    let json = record.as_json();
    let mut metadata = RegistrationMetadata::default();

    if let Some(registrar) = extract_registrar(json) {
        metadata.registrar = registrar;
    }

    // Later events with the same action overwrite earlier ones
    if let Some(events) = json.get("events").and_then(Value::as_array) {
        for event in events {
            let action = event.get("eventAction").and_then(Value::as_str);
            let date = event.get("eventDate").and_then(Value::as_str);

            if let (Some(action), Some(date)) = (action, date) {
                match action {
                    "registration" => metadata.registration_date = Some(date.to_string()),
                    "expiration" => metadata.expiration_date = Some(date.to_string()),
                    "last changed" => metadata.last_changed_date = Some(date.to_string()),
                    _ => {}
                }
            }
        }
    }

    if let Some(statuses) = json.get("status").and_then(Value::as_array) {
        metadata.status = statuses
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();
    }

    if let Some(nameservers) = json.get("nameservers").and_then(Value::as_array) {
        metadata.nameservers = nameservers
            .iter()
            .filter_map(|ns| ns.get("ldhName").and_then(Value::as_str))
            .map(String::from)
            .collect();
    }

    metadata
}

/// Name of the first registrar-role entity that has one.
fn extract_registrar(json: &Value) -> Option<String> {
    json.get("entities")
        .and_then(Value::as_array)?
        .iter()
        .filter(|entity| has_role(entity, "registrar"))
        .find_map(vcard_name)
}

fn has_role(entity: &Value, role: &str) -> bool {
    entity
        .get("roles")
        .and_then(Value::as_array)
        .map(|roles| roles.iter().any(|r| r.as_str() == Some(role)))
        .unwrap_or(false)
}

/// First `fn` or `org` vCard property with a non-empty text value.
///
/// vCards arrive as jCard: `["vcard", [[name, params, type, value], ...]]`.
fn vcard_name(entity: &Value) -> Option<String> {
    entity
        .get("vcardArray")
        .and_then(Value::as_array)
        .and_then(|card| card.get(1))
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_array)
        .find_map(|property| {
            let tag = property.first().and_then(Value::as_str)?;
            if tag != "fn" && tag != "org" {
                return None;
            }
            property.get(3).and_then(jcard_text)
        })
}

/// Text of a jCard value.
///
/// Structured values such as `org` (`["Org", "Unit"]`) are joined with
/// `", "`, skipping empty components.
fn jcard_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(jcard_text)
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    Some(text).filter(|text| !text.is_empty())
}
