//! Human-readable rendering of a [`FilterReport`].

use super::types::FilterReport;

/// Builds the summary message and up to `limit` exclusion sample lines.
///
/// The message always states how many relays remain and lists unmatched
/// filter tokens when there are any.
pub fn format_filter_diagnostics(
    report: &FilterReport,
    remaining: usize,
    limit: usize,
) -> (String, Vec<String>) {
    let mut message = format!("Remaining {remaining} relays after filtering");
    if !report.unmatched_filters.is_empty() {
        message.push_str("; unmatched filters: ");
        message.push_str(&report.unmatched_filters.join(", "));
    }

    let samples = report
        .excluded_samples
        .iter()
        .take(limit)
        .map(|sample| {
            let relay = &sample.relay;
            format!(
                "Excluded ({}): {} ({}, {}; provider {})",
                sample.reason, relay.hostname(), relay.city(), relay.country(), relay.provider()
            )
        })
        .collect();

    (message, samples)
}
