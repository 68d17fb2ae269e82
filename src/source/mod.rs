//! Relay metadata sources.
//!
//! The primary source is Mullvad's public API ([`MullvadApi`]); any number of
//! supplemental [`SourceAdapter`]s can be added. [`SourceManager`] fetches all
//! of them with retries and reports one [`SourceResult`] per source.

mod api;
mod cache;
mod file;
mod manager;
mod types;

pub use api::MullvadApi;
pub use cache::ResponseCache;
pub use file::FileSourceAdapter;
pub use manager::SourceManager;
pub use types::{SourceAdapter, SourceResult};
