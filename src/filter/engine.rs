//! Relay filtering.

use std::collections::BTreeSet;

use crate::config::MAX_EXCLUSION_SAMPLES;
use crate::relay::Relay;

use super::types::{ExclusionSample, FilterCategory, FilterConfig, FilterReport};

/// Filters relays according to `config`.
///
/// Admission checks run in order and stop at the first rejection: inactive or
/// excluded-from-country relays, owned relays (unless `include_owned`), then
/// the country, city, provider-block and provider-allow token filters.
/// Survivors are sorted by `(country, city, hostname, source)`, with country
/// and city compared case-insensitively, and then truncated to `limit`.
///
/// A token category is reported as unmatched when no relay that reached that
/// category's check satisfied it; every token of the category is then listed.
/// The provider-block filter has no matched state and is never reported.
pub fn filter_relays(relays: &[Relay], config: &FilterConfig) -> (Vec<Relay>, FilterReport) {
    let countries = lowered(config.countries.as_ref());
    let cities = lowered(config.cities.as_ref());
    let allow = lowered(config.providers_allow.as_ref());
    let block = lowered(config.providers_block.as_ref());

    let mut report = FilterReport::default();
    let mut countries_matched = false;
    let mut cities_matched = false;
    let mut allow_matched = false;

    let mut sample = |reason: FilterCategory, relay: &Relay| {
        if report.excluded_samples.len() < MAX_EXCLUSION_SAMPLES {
            report.excluded_samples.push(ExclusionSample {
                reason,
                relay: relay.clone(),
            });
        }
    };

    let mut filtered: Vec<Relay> = Vec::new();
    for relay in relays {
        if !relay.active() || !relay.include_in_country() {
            continue;
        }
        if relay.owned() && !config.include_owned {
            continue;
        }
        if let Some(tokens) = &countries {
            if !matches_country(relay, tokens) {
                sample(FilterCategory::Countries, relay);
                continue;
            }
            countries_matched = true;
        }
        if let Some(tokens) = &cities {
            if !matches_city(relay, tokens) {
                sample(FilterCategory::Cities, relay);
                continue;
            }
            cities_matched = true;
        }
        let provider = relay.provider().to_lowercase();
        if block.as_ref().is_some_and(|tokens| tokens.contains(&provider)) {
            sample(FilterCategory::ProvidersBlock, relay);
            continue;
        }
        if let Some(tokens) = &allow {
            if !tokens.contains(&provider) {
                sample(FilterCategory::ProvidersAllow, relay);
                continue;
            }
            allow_matched = true;
        }
        filtered.push(relay.clone());
    }

    filtered.sort_by_cached_key(|relay| {
        (
            relay.country().to_lowercase(),
            relay.city().to_lowercase(),
            relay.hostname().to_string(),
            relay.source().to_string(),
        )
    });

    if let Some(limit) = config.limit {
        filtered.truncate(limit);
    }

    for (category, tokens, matched) in [
        (FilterCategory::Countries, &countries, countries_matched),
        (FilterCategory::Cities, &cities, cities_matched),
        (FilterCategory::ProvidersAllow, &allow, allow_matched),
    ] {
        if let (Some(tokens), false) = (tokens, matched) {
            report
                .unmatched_filters
                .extend(tokens.iter().map(|token| format!("{category}:{token}")));
        }
    }

    (filtered, report)
}

/// Lower-cased copy of a token set; empty sets count as unset.
fn lowered(tokens: Option<&BTreeSet<String>>) -> Option<BTreeSet<String>> {
    tokens
        .map(|set| set.iter().map(|token| token.to_lowercase()).collect::<BTreeSet<_>>())
        .filter(|set| !set.is_empty())
}

/// Country name, full location id, or a two-letter location-id prefix.
pub(crate) fn matches_country(relay: &Relay, tokens: &BTreeSet<String>) -> bool {
    let location_id = relay.location_id().to_lowercase();
    let country = relay.country().to_lowercase();
    let prefix = location_id.split('-').next().unwrap_or_default();
    tokens.iter().any(|token| {
        *token == country || *token == location_id || (token.chars().count() == 2 && token.as_str() == prefix)
    })
}

/// City name or full location id.
pub(crate) fn matches_city(relay: &Relay, tokens: &BTreeSet<String>) -> bool {
    let location_id = relay.location_id().to_lowercase();
    let city = relay.city().to_lowercase();
    tokens
        .iter()
        .any(|token| *token == city || *token == location_id)
}
