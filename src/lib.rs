//! relay_list library: curated SOCKS5 relay lists from Mullvad's relay API
//!
//! This library fetches relay metadata from Mullvad's public API (and any
//! supplemental sources), normalizes it into [`Relay`] records, filters and
//! validates them, optionally enriches them with proxy-checker metadata and
//! live-verifies a sample through each SOCKS5 endpoint, then writes JSON,
//! text, PAC and CSV artifacts together with a timed run summary.
//!
//! # Example
//!
//! ```no_run
//! use relay_list::{run_pipeline, Collaborators, PipelineOptions, RunOutcome};
//! use relay_list::initialization::init_api_client;
//! use relay_list::source::{MullvadApi, SourceManager};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let api = MullvadApi::new(init_api_client()?);
//! let collaborators = Collaborators::new(SourceManager::new(Box::new(api), Vec::new()));
//!
//! match run_pipeline(&PipelineOptions::default(), &collaborators).await? {
//!     RunOutcome::Built { relay_count, .. } => println!("Wrote {relay_count} relays"),
//!     RunOutcome::NoMatches { message, .. } => eprintln!("{message}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Verification uses rustls with the
//! `ring` provider; call [`initialization::init_crypto_provider`] once at
//! startup.

pub mod config;
pub mod enrich;
mod error_handling;
pub mod export;
pub mod filter;
pub mod initialization;
pub mod relay;
mod run;
pub mod source;
mod utils;
pub mod validation;
pub mod verify;

// Re-export public API
pub use error_handling::{BuildError, BuildErrorKind, InitializationError};
pub use relay::Relay;
pub use run::{
    run_pipeline, run_pipeline_until, Artifacts, Collaborators, ExclusionSummary, IssueSummary, PipelineOptions,
    PipelineStats, RunCounts, RunOutcome, RunStatus, RunSummary, SourceSummary, StageMeasurement, StageTimer,
};
