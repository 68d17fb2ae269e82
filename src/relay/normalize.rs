//! Conversion of provider payloads into relay records.

use log::debug;
use serde_json::{Map, Value};

use crate::error_handling::{BuildError, BuildErrorKind};

use super::types::{Relay, RelayDraft, SourcePayload};

/// Normalizes payloads into relays, sources concatenated in the given order.
///
/// # Errors
///
/// Returns a `Structure` error naming the first payload that lacks
/// `wireguard.relays` or `locations`.
pub fn normalize(payloads: &[SourcePayload]) -> Result<Vec<Relay>, BuildError> {
    let mut relays = Vec::new();
    for payload in payloads {
        relays.extend(normalize_payload(payload)?);
    }
    Ok(relays)
}

/// Normalizes a single source payload, preserving relay order.
///
/// Relays without a `location` or `hostname` are skipped.
pub fn normalize_payload(source: &SourcePayload) -> Result<Vec<Relay>, BuildError> {
    let structure_error = || {
        BuildError::new(
            BuildErrorKind::Structure,
            format!(
                "Unexpected relay payload structure from source '{}'",
                source.name
            ),
        )
    };

    let raw_relays = source
        .payload
        .get("wireguard")
        .and_then(|wireguard| wireguard.get("relays"))
        .and_then(Value::as_array)
        .ok_or_else(structure_error)?;
    let locations = source
        .payload
        .get("locations")
        .and_then(Value::as_object)
        .ok_or_else(structure_error)?;

    let mut relays = Vec::with_capacity(raw_relays.len());
    let mut skipped = 0usize;
    for raw in raw_relays {
        match relay_from_raw(raw, locations, &source.name) {
            Some(relay) => relays.push(relay),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(
            "Skipped {} relay(s) without location or hostname from {}",
            skipped, source.name
        );
    }
    Ok(relays)
}

fn relay_from_raw(raw: &Value, locations: &Map<String, Value>, source: &str) -> Option<Relay> {
    let location_id = non_empty_str(raw.get("location"))?;
    let hostname = non_empty_str(raw.get("hostname"))?;
    let location = locations.get(location_id);
    let location_field = |key: &str| {
        location
            .and_then(|loc| loc.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let draft = RelayDraft {
        hostname: hostname.to_string(),
        location_id: location_id.to_string(),
        city: location_field("city"),
        country: location_field("country"),
        provider: string_field(raw.get("provider")),
        ipv4: string_field(raw.get("ipv4_addr_in")),
        ipv6: raw
            .get("ipv6_addr_in")
            .and_then(Value::as_str)
            .map(str::to_string),
        weight: coerce_weight(raw.get("weight")),
        owned: truthy(raw.get("owned")),
        active: truthy(raw.get("active")),
        include_in_country: truthy(raw.get("include_in_country")),
        source: source.to_string(),
    };
    Some(Relay::from(draft))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn string_field(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Coerces a weight to a non-negative integer; anything unusable becomes 0.
fn coerce_weight(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        Some(Value::Bool(true)) => 1,
        _ => 0,
    }
}

/// Truthiness of a loosely typed JSON value; missing and `null` are false.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}
