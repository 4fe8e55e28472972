//! Human-readable ranking reports.
//!
//! One block per ranked candidate, best first, followed by the best
//! match summary:
//!
//! ```text
//! --- Top 2 Standard Matches ---
//! 1. File: plot_17.dat (group: south)
//!    IoU: 0.9412 (Transform: Flipped Vertically)
//!    Hausdorff Distance: 2.24 (Transform: Flipped Vertically)
//! ----------
//! 2. File: rect.dat (group: north)
//!    IoU: 0.5000 (Transform: Flipped Vertically)
//!    Hausdorff Distance: Inf/Error (Transform: N/A)
//! ----------
//! Skipped 1 unreadable candidate(s)
//! Best match: plot_17 -- IoU: 0.941 (group: south)
//! ```
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use plotmatch_pipeline::embedding::EmbeddingRanking;
use plotmatch_pipeline::{MatchOutcome, Ranking, Transform};

const SEPARATOR: &str = "----------";
const NO_MATCH: &str = "No match found";

/// Render the top `top_n` entries of a standard ranking.
///
/// # Examples
///
/// ```
/// use plotmatch_export::to_text_report;
/// use plotmatch_pipeline::Ranking;
///
/// let report = to_text_report(&Ranking::default(), 5);
/// assert!(report.ends_with("No match found\n"));
/// ```
#[must_use]
pub fn to_text_report(ranking: &Ranking, top_n: usize) -> String {
    let mut out = String::new();
    let shown = top_n.min(ranking.entries.len());

    let _ = writeln!(out, "--- Top {shown} Standard Matches ---");
    for (i, entry) in ranking.entries.iter().take(top_n).enumerate() {
        let c = &entry.comparison;
        let _ = writeln!(out, "{}. File: {} (group: {})", i + 1, entry.name, entry.group);
        let _ = writeln!(
            out,
            "   IoU: {:.4} (Transform: {})",
            c.iou,
            transform_label(c.iou_transform)
        );
        let _ = writeln!(
            out,
            "   Hausdorff Distance: {} (Transform: {})",
            distance_label(c.hausdorff),
            transform_label(c.hausdorff_transform)
        );
        let _ = writeln!(out, "{SEPARATOR}");
    }

    if !ranking.skipped.is_empty() {
        let _ = writeln!(
            out,
            "Skipped {} unreadable candidate(s)",
            ranking.skipped.len()
        );
    }
    if ranking.cancelled {
        let _ = writeln!(out, "Ranking was cancelled; results are partial");
    }
    write_outcome(&mut out, ranking.outcome());
    out
}

/// Render the top `top_n` entries of an embedding ranking.
#[must_use]
pub fn to_embedding_text_report(ranking: &EmbeddingRanking, top_n: usize) -> String {
    let mut out = String::new();
    let shown = top_n.min(ranking.entries.len());

    let _ = writeln!(out, "--- Top {shown} Embedding Matches ---");
    for (i, entry) in ranking.entries.iter().take(top_n).enumerate() {
        let _ = writeln!(out, "{}. Image: {} (group: {})", i + 1, entry.name, entry.group);
        let _ = writeln!(out, "   Similarity: {:.4}", entry.similarity);
        if let Some(error) = &entry.error {
            let _ = writeln!(out, "   Error: {error}");
        }
        let _ = writeln!(out, "{SEPARATOR}");
    }

    if ranking.cancelled {
        let _ = writeln!(out, "Ranking was cancelled; results are partial");
    }
    write_outcome(&mut out, ranking.outcome());
    out
}

fn write_outcome(out: &mut String, outcome: MatchOutcome) {
    match outcome {
        MatchOutcome::Found(best) => {
            let _ = writeln!(out, "Best match: {} -- {}", best.stem, best.summary);
        }
        MatchOutcome::NoMatch => {
            let _ = writeln!(out, "{NO_MATCH}");
        }
    }
}

fn transform_label(transform: Option<Transform>) -> &'static str {
    transform.map_or("N/A", Transform::label)
}

fn distance_label(distance: f64) -> String {
    if distance.is_finite() {
        format!("{distance:.2}")
    } else {
        "Inf/Error".to_owned()
    }
}
