//! Relay records and the normalizer that builds them.
//!
//! A [`Relay`] is created once, here, from a provider payload and never mutated
//! afterwards; later stages wrap relays instead of changing them.

mod normalize;
mod types;

pub use normalize::{normalize, normalize_payload};
pub(crate) use normalize::truthy;
pub use types::{derive_socks5_endpoint, derive_socks5_hostname, Relay, RelayDraft, SourcePayload};
