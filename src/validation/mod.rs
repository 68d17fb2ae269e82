//! Structural validation of relays.

use crate::relay::Relay;

/// Relay fields that must be non-empty for a relay to be published.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "hostname",
    "socks5_endpoint",
    "provider",
    "location_id",
    "ipv4",
];

/// A relay rejected during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub relay: Relay,
    pub reason: String,
}

/// Outcome of validating a batch of relays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub valid_relays: Vec<Relay>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Splits relays into valid ones (input order kept) and itemized issues.
pub fn validate_relays(relays: &[Relay]) -> ValidationResult {
    let mut result = ValidationResult::default();
    for relay in relays {
        let missing = missing_fields(relay);
        if missing.is_empty() {
            result.valid_relays.push(relay.clone());
        } else {
            result.issues.push(ValidationIssue {
                relay: relay.clone(),
                reason: format!("missing fields: {}", missing.join(", ")),
            });
        }
    }
    result
}

fn missing_fields(relay: &Relay) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|field| {
            let value = match *field {
                "hostname" => relay.hostname(),
                "socks5_endpoint" => relay.socks5_endpoint(),
                "provider" => relay.provider(),
                "location_id" => relay.location_id(),
                _ => relay.ipv4(),
            };
            value.is_empty()
        })
        .collect()
}
