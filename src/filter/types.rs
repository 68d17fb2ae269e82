//! Filter configuration and report types.

use std::collections::BTreeSet;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::relay::Relay;

/// Filter policy applied to normalized relays.
///
/// Token sets are expected in lower case; the engine lower-cases them again
/// before matching. `None` means the filter is not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub countries: Option<BTreeSet<String>>,
    pub cities: Option<BTreeSet<String>>,
    pub include_owned: bool,
    pub providers_allow: Option<BTreeSet<String>>,
    pub providers_block: Option<BTreeSet<String>>,
    pub limit: Option<usize>,
}

/// Filter category a relay was rejected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FilterCategory {
    Countries,
    Cities,
    ProvidersBlock,
    ProvidersAllow,
}

/// A relay rejected by one of the token filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExclusionSample {
    pub reason: FilterCategory,
    pub relay: Relay,
}

/// Diagnostics produced alongside the filtered relays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterReport {
    /// Tokens that matched nothing, formatted `"<category>:<token>"`.
    pub unmatched_filters: Vec<String>,
    /// First rejections by a token filter, capped at `MAX_EXCLUSION_SAMPLES`.
    pub excluded_samples: Vec<ExclusionSample>,
}
