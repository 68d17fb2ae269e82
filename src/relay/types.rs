//! Relay record types.

use serde::Serialize;
use serde_json::Value;

use crate::config::SOCKS5_SUFFIX;

/// One deployed SOCKS5 proxy endpoint.
///
/// Built once from a [`RelayDraft`] and read-only afterwards. The SOCKS5
/// hostname and endpoint are derived from `hostname` at construction, so the
/// fields are private and exposed through accessors.
///
/// ```compile_fail
/// use relay_list::relay::{Relay, RelayDraft};
///
/// let mut relay = Relay::from(RelayDraft::default());
/// relay.hostname = "at-vie-wg-002".to_string();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relay {
    hostname: String,
    socks5_hostname: String,
    socks5_endpoint: String,
    location_id: String,
    city: String,
    country: String,
    provider: String,
    ipv4: String,
    ipv6: Option<String>,
    weight: u64,
    owned: bool,
    active: bool,
    include_in_country: bool,
    source: String,
}

/// Relay fields that are set directly; everything else is derived.
#[derive(Debug, Clone, Default)]
pub struct RelayDraft {
    pub hostname: String,
    pub location_id: String,
    pub city: String,
    pub country: String,
    pub provider: String,
    pub ipv4: String,
    pub ipv6: Option<String>,
    pub weight: u64,
    pub owned: bool,
    pub active: bool,
    pub include_in_country: bool,
    pub source: String,
}

impl From<RelayDraft> for Relay {
    fn from(draft: RelayDraft) -> Self {
        let socks5_hostname = derive_socks5_hostname(&draft.hostname);
        let socks5_endpoint = format!("{socks5_hostname}{SOCKS5_SUFFIX}");
        Self {
            hostname: draft.hostname,
            socks5_hostname,
            socks5_endpoint,
            location_id: draft.location_id,
            city: draft.city,
            country: draft.country,
            provider: draft.provider,
            ipv4: draft.ipv4,
            ipv6: draft.ipv6,
            weight: draft.weight,
            owned: draft.owned,
            active: draft.active,
            include_in_country: draft.include_in_country,
            source: draft.source,
        }
    }
}

impl Relay {
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn socks5_hostname(&self) -> &str {
        &self.socks5_hostname
    }

    /// `host:1080` endpoint of the relay's SOCKS5 service.
    pub fn socks5_endpoint(&self) -> &str {
        &self.socks5_endpoint
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn ipv4(&self) -> &str {
        &self.ipv4
    }

    pub fn ipv6(&self) -> Option<&str> {
        self.ipv6.as_deref()
    }

    /// Selection bias published by the provider.
    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Operated by Mullvad itself rather than a rented server.
    pub fn owned(&self) -> bool {
        self.owned
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn include_in_country(&self) -> bool {
        self.include_in_country
    }

    /// Name of the source the relay was normalized from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// `"<city>, <country> (<provider>)"`
    pub fn display_label(&self) -> String {
        format!("{}, {} ({})", self.city, self.country, self.provider)
    }
}

/// Derives the SOCKS5 hostname from a WireGuard hostname.
///
/// The first `-wg-` becomes `-wg-socks5-`; hostnames without it get a
/// `-socks5` suffix.
pub fn derive_socks5_hostname(hostname: &str) -> String {
    if hostname.contains("-wg-") {
        hostname.replacen("-wg-", "-wg-socks5-", 1)
    } else {
        format!("{hostname}-socks5")
    }
}

/// Full `host:port` endpoint for a WireGuard hostname.
pub fn derive_socks5_endpoint(hostname: &str) -> String {
    format!("{}{SOCKS5_SUFFIX}", derive_socks5_hostname(hostname))
}

/// Raw payload fetched from one named source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePayload {
    pub name: String,
    pub payload: Value,
}

impl SourcePayload {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}
