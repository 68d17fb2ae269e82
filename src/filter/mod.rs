//! Filter engine.
//!
//! Applies the inclusion/exclusion policy to normalized relays and reports
//! which filter tokens matched nothing, along with a bounded sample of
//! rejected relays.

mod diagnostics;
mod engine;
mod types;

pub use diagnostics::format_filter_diagnostics;
pub use engine::filter_relays;
pub use types::{ExclusionSample, FilterCategory, FilterConfig, FilterReport};
