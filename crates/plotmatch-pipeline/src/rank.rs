//! Ranking engine: score every candidate against one reference mask.
//!
//! Candidates are decoded lazily and compared strictly in order. A
//! candidate that cannot be read or decoded is recorded as skipped and the
//! batch continues. The result is sorted by IoU descending, then by
//! Hausdorff distance ascending, with a stable sort so equal entries keep
//! their encounter order.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use serde::Serialize;

use crate::decode::{RasterSource, decode_raster};
use crate::mask::Mask;
use crate::score::{ComparisonResult, compare};
use crate::types::MatchConfig;

/// One candidate raster together with its identifying labels.
#[derive(Debug, Clone)]
pub struct Candidate<S> {
    /// File name (or other identifier) of the candidate.
    pub name: String,
    /// Grouping label, e.g. the sub-village the raster belongs to.
    pub group: String,
    /// Where the raster bytes come from.
    pub source: S,
}

impl<S> Candidate<S> {
    /// Create a new candidate.
    pub fn new(name: impl Into<String>, group: impl Into<String>, source: S) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            source,
        }
    }
}

/// A scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// Candidate identifier.
    pub name: String,
    /// Grouping label.
    pub group: String,
    /// Best scores over the four transforms.
    #[serde(flatten)]
    pub comparison: ComparisonResult,
}

/// A candidate that could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCandidate {
    /// Candidate identifier.
    pub name: String,
    /// Grouping label.
    pub group: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of a ranking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    /// Scored candidates, best first.
    pub entries: Vec<RankedCandidate>,
    /// Candidates whose raster could not be decoded, in encounter order.
    pub skipped: Vec<SkippedCandidate>,
    /// Whether the run stopped early because it was cancelled.
    pub cancelled: bool,
}

/// The top-ranked candidate as handed to reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestMatch {
    /// Candidate identifier without its extension.
    pub stem: String,
    /// Grouping label.
    pub group: String,
    /// Human-readable score summary, e.g. `IoU: 0.912 (group: north)`.
    ///
    /// The grouping label (a sub-village in a survey tree) is always
    /// written as `group:`.
    pub summary: String,
}

/// Whether a run found anything at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// At least one candidate was scored.
    Found(BestMatch),
    /// No candidate could be scored. Not an error.
    NoMatch,
}

impl Ranking {
    /// The top-ranked entry, if any candidate was scored.
    #[must_use]
    pub fn best_match(&self) -> Option<BestMatch> {
        self.entries.first().map(|best| BestMatch {
            stem: file_stem(&best.name),
            group: best.group.clone(),
            summary: format!(
                "IoU: {:.3} (group: {})",
                best.comparison.iou, best.group
            ),
        })
    }

    /// [`best_match`](Self::best_match) as an explicit found / not-found
    /// outcome.
    #[must_use]
    pub fn outcome(&self) -> MatchOutcome {
        self.best_match()
            .map_or(MatchOutcome::NoMatch, MatchOutcome::Found)
    }
}

/// Strip the extension from a candidate name.
pub(crate) fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map_or_else(|| name.to_owned(), |s| s.to_string_lossy().into_owned())
}

/// Cooperative cancellation signal shared between a caller and a run.
///
/// Clones share the same flag. The engine checks it before each
/// candidate, so cancelling takes effect at the next candidate boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// Total order used for ranking: IoU descending, then Hausdorff ascending.
///
/// `+∞` distances sort after every finite one.
#[must_use]
pub fn ranking_order(a: &ComparisonResult, b: &ComparisonResult) -> Ordering {
    b.iou
        .total_cmp(&a.iou)
        .then_with(|| a.hausdorff.total_cmp(&b.hausdorff))
}

/// Stable-sort entries into ranking order.
pub fn sort_ranked(entries: &mut [RankedCandidate]) {
    entries.sort_by(|a, b| ranking_order(&a.comparison, &b.comparison));
}

/// Score every candidate against `reference` and return them ranked.
///
/// Each candidate is read, decoded at `config.image_size`, and compared
/// with the configured tolerances. Read and decode failures are recorded
/// in [`Ranking::skipped`]. If `cancel` is raised the run stops before the
/// next candidate and returns what it has so far, still sorted, with
/// [`Ranking::cancelled`] set.
pub fn rank<S: RasterSource>(
    reference: &Mask,
    candidates: &[Candidate<S>],
    config: &MatchConfig,
    cancel: &CancelFlag,
) -> Ranking {
    let mut ranking = Ranking::default();

    for candidate in candidates {
        if cancel.is_cancelled() {
            tracing::info!(
                scored = ranking.entries.len(),
                remaining = candidates.len() - ranking.entries.len() - ranking.skipped.len(),
                "ranking cancelled"
            );
            ranking.cancelled = true;
            break;
        }

        let mask = candidate
            .source
            .read()
            .and_then(|input| decode_raster(&input, config.image_size));
        let mask = match mask {
            Ok(mask) => mask,
            Err(e) => {
                tracing::warn!(
                    name = %candidate.name,
                    group = %candidate.group,
                    error = %e,
                    "skipping candidate"
                );
                ranking.skipped.push(SkippedCandidate {
                    name: candidate.name.clone(),
                    group: candidate.group.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let comparison = compare(
            reference,
            &mask,
            config.iou_tolerance,
            config.hausdorff_tolerance,
        );
        tracing::debug!(
            name = %candidate.name,
            group = %candidate.group,
            iou = comparison.iou,
            hausdorff = comparison.hausdorff,
            "scored candidate"
        );
        ranking.entries.push(RankedCandidate {
            name: candidate.name.clone(),
            group: candidate.group.clone(),
            comparison,
        });
    }

    sort_ranked(&mut ranking.entries);
    tracing::info!(
        scored = ranking.entries.len(),
        skipped = ranking.skipped.len(),
        "ranking finished"
    );
    ranking
}
