//! JSON ranking reports.
//!
//! The document carries the best match (or `null`), the ranked entries,
//! the skipped candidates and the cancellation flag. Infinite Hausdorff
//! distances are written as `null`, since JSON has no infinity.

use plotmatch_pipeline::embedding::{EmbeddedCandidate, EmbeddingRanking};
use plotmatch_pipeline::rank::SkippedCandidate;
use plotmatch_pipeline::{BestMatch, RankedCandidate, Ranking};
use serde::Serialize;

#[derive(Serialize)]
struct StandardReport<'a> {
    method: &'static str,
    best_match: Option<BestMatch>,
    entries: &'a [RankedCandidate],
    skipped: &'a [SkippedCandidate],
    cancelled: bool,
}

#[derive(Serialize)]
struct EmbeddingReport<'a> {
    method: &'static str,
    best_match: Option<BestMatch>,
    entries: &'a [EmbeddedCandidate],
    cancelled: bool,
}

/// Serialize a standard ranking as pretty-printed JSON.
///
/// # Errors
///
/// Returns a `serde_json` error if serialization fails.
pub fn to_json(ranking: &Ranking) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&StandardReport {
        method: "standard",
        best_match: ranking.best_match(),
        entries: &ranking.entries,
        skipped: &ranking.skipped,
        cancelled: ranking.cancelled,
    })
}

/// Serialize an embedding ranking as pretty-printed JSON.
///
/// # Errors
///
/// Returns a `serde_json` error if serialization fails.
pub fn embedding_to_json(ranking: &EmbeddingRanking) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&EmbeddingReport {
        method: "embedding",
        best_match: ranking.best_match(),
        entries: &ranking.entries,
        cancelled: ranking.cancelled,
    })
}
