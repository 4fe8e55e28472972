//! Embedding-based ranking, the alternate scorer.
//!
//! An [`Embedder`] maps a grayscale image to a fixed-length feature
//! vector. Each candidate image is flipped vertically, embedded, and
//! scored by cosine similarity against the reference embedding. Unlike
//! the mask scorer there is no tie-break: the vertical flip is always
//! applied.
//!
//! Per-image failures score `0.0` and never abort the batch. A service
//! that is unavailable as a whole is reported as
//! [`EmbeddingError::Unavailable`] instead of a ranking of zeros.

use image::imageops::{self, FilterType};
use serde::Serialize;

use crate::decode::{RasterSource, decode_gray};
use crate::rank::{BestMatch, Candidate, CancelFlag, MatchOutcome, file_stem};
use crate::types::{EmbeddingError, GrayImage};

/// Number of candidate images handed to [`Embedder::embed_batch`] at once.
pub const EMBEDDING_BATCH_SIZE: usize = 32;

/// Produces a fixed-length feature vector for an image.
pub trait Embedder {
    /// Embed one image.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Unavailable`] if the service cannot be
    /// used at all, or [`EmbeddingError::Failed`] if only this image
    /// failed.
    fn embed(&self, image: &GrayImage) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several images, returning one result per image in order.
    ///
    /// The default calls [`embed`](Self::embed) for each image.
    fn embed_batch(&self, images: &[GrayImage]) -> Vec<Result<Vec<f32>, EmbeddingError>> {
        images.iter().map(|image| self.embed(image)).collect()
    }
}

/// Cosine similarity of two embeddings.
///
/// Returns `0.0` when the vectors differ in length, are empty, either is
/// all zeros, or the result is not finite.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot = x.mul_add(y, dot);
        norm_a = x.mul_add(x, norm_a);
        norm_b = y.mul_add(y, norm_b);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// One candidate scored by embedding similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedCandidate {
    /// Candidate identifier.
    pub name: String,
    /// Grouping label.
    pub group: String,
    /// Cosine similarity to the reference; `0.0` on failure.
    pub similarity: f64,
    /// Why the similarity defaulted to `0.0`, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of an embedding ranking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbeddingRanking {
    /// Candidates, most similar first.
    pub entries: Vec<EmbeddedCandidate>,
    /// Whether the run stopped early because it was cancelled.
    pub cancelled: bool,
}

impl EmbeddingRanking {
    /// The top-ranked entry, if there is one.
    #[must_use]
    pub fn best_match(&self) -> Option<BestMatch> {
        self.entries.first().map(|best| BestMatch {
            stem: file_stem(&best.name),
            group: best.group.clone(),
            summary: format!(
                "Similarity: {:.3} (group: {})",
                best.similarity, best.group
            ),
        })
    }

    /// [`best_match`](Self::best_match) as an explicit outcome.
    #[must_use]
    pub fn outcome(&self) -> MatchOutcome {
        self.best_match()
            .map_or(MatchOutcome::NoMatch, MatchOutcome::Found)
    }
}

/// Rank candidate images by embedding similarity to `reference`.
///
/// Candidates are read, flipped vertically, and embedded in batches of
/// [`EMBEDDING_BATCH_SIZE`]. Results are collected in candidate order and
/// then stable-sorted by similarity, highest first.
///
/// # Errors
///
/// Returns [`EmbeddingError::Unavailable`] if the reference cannot be
/// embedded, or if every candidate that reached the embedder was rejected
/// as unavailable.
pub fn rank_by_embedding<S, E>(
    reference: &GrayImage,
    candidates: &[Candidate<S>],
    embedder: &E,
    cancel: &CancelFlag,
) -> Result<EmbeddingRanking, EmbeddingError>
where
    S: RasterSource,
    E: Embedder + ?Sized,
{
    let reference_vector = embedder.embed(reference).map_err(|e| match e {
        EmbeddingError::Unavailable(msg) => EmbeddingError::Unavailable(msg),
        EmbeddingError::Failed(msg) => {
            EmbeddingError::Unavailable(format!("reference image could not be embedded: {msg}"))
        }
    })?;

    let mut ranking = EmbeddingRanking::default();
    let mut attempted = 0usize;
    let mut unavailable: Option<String> = None;
    let mut unavailable_count = 0usize;

    for batch in candidates.chunks(EMBEDDING_BATCH_SIZE) {
        if cancel.is_cancelled() {
            tracing::info!(scored = ranking.entries.len(), "embedding ranking cancelled");
            ranking.cancelled = true;
            break;
        }

        // Slot per candidate: the decoded image's index in `images`, or
        // the read/decode error.
        let mut images: Vec<GrayImage> = Vec::with_capacity(batch.len());
        let slots: Vec<Result<usize, String>> = batch
            .iter()
            .map(|candidate| {
                candidate
                    .source
                    .read()
                    .and_then(|input| decode_gray(&input))
                    .map(|gray| {
                        images.push(imageops::flip_vertical(&gray));
                        images.len() - 1
                    })
                    .map_err(|e| e.to_string())
            })
            .collect();

        let mut vectors = embedder.embed_batch(&images).into_iter();
        let mut results: Vec<Result<Vec<f32>, EmbeddingError>> = Vec::with_capacity(images.len());
        for _ in 0..images.len() {
            results.push(vectors.next().unwrap_or_else(|| {
                Err(EmbeddingError::Failed(
                    "embedder returned fewer results than images".to_owned(),
                ))
            }));
        }
        attempted += images.len();

        for (candidate, slot) in batch.iter().zip(slots) {
            let (similarity, error) = match slot {
                Err(reason) => (0.0, Some(reason)),
                Ok(index) => match &results[index] {
                    Ok(vector) => (cosine_similarity(&reference_vector, vector), None),
                    Err(e) => {
                        if let EmbeddingError::Unavailable(msg) = e {
                            unavailable_count += 1;
                            unavailable.get_or_insert_with(|| msg.clone());
                        }
                        (0.0, Some(e.to_string()))
                    }
                },
            };
            if let Some(reason) = &error {
                tracing::warn!(
                    name = %candidate.name,
                    group = %candidate.group,
                    error = %reason,
                    "candidate similarity defaulted to 0"
                );
            }
            ranking.entries.push(EmbeddedCandidate {
                name: candidate.name.clone(),
                group: candidate.group.clone(),
                similarity,
                error,
            });
        }
    }

    if attempted > 0
        && unavailable_count == attempted
        && let Some(msg) = unavailable
    {
        return Err(EmbeddingError::Unavailable(msg));
    }

    ranking
        .entries
        .sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    tracing::info!(
        candidates = ranking.entries.len(),
        embedded = attempted,
        "embedding ranking finished"
    );
    Ok(ranking)
}

/// Built-in embedder based on darkness projection profiles.
///
/// The image is resized to `resolution × resolution`, and the vector is
/// the mean darkness of every row followed by that of every column. The
/// profiles are non-negative, so similarities fall in `[0, 1]`. An
/// all-white image embeds to the zero vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileEmbedder {
    resolution: u32,
}

impl ProfileEmbedder {
    /// Default profile resolution.
    pub const DEFAULT_RESOLUTION: u32 = 64;

    /// Create an embedder that samples images at `resolution` pixels per
    /// side. A resolution of zero is raised to one.
    #[must_use]
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution: resolution.max(1),
        }
    }

    /// Length of every vector this embedder produces.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        2 * self.resolution as usize
    }
}

impl Default for ProfileEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RESOLUTION)
    }
}

impl Embedder for ProfileEmbedder {
    #[allow(clippy::cast_possible_truncation)]
    fn embed(&self, image: &GrayImage) -> Result<Vec<f32>, EmbeddingError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(EmbeddingError::Failed("image has no pixels".to_owned()));
        }

        let n = self.resolution;
        let sampled = imageops::resize(image, n, n, FilterType::Triangle);
        let mut rows = vec![0.0f64; n as usize];
        let mut cols = vec![0.0f64; n as usize];
        for (x, y, pixel) in sampled.enumerate_pixels() {
            let darkness = f64::from(255 - pixel.0[0]) / 255.0;
            rows[y as usize] += darkness;
            cols[x as usize] += darkness;
        }

        let scale = f64::from(n);
        Ok(rows
            .into_iter()
            .chain(cols)
            .map(|sum| (sum / scale) as f32)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::decode::RasterInput;
    use crate::types::DecodeError;

    fn text(s: &str) -> RasterInput {
        RasterInput::Text(s.as_bytes().to_vec())
    }

    /// Black-on-white image with a filled block.
    fn block_image(size: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let inside = (x0..=x1).contains(&x) && (y0..=y1).contains(&y);
            image::Luma([if inside { 0 } else { 255 }])
        })
    }

    /// Embeds every image as its darkness in the top half vs bottom half.
    struct HalvesEmbedder;

    impl Embedder for HalvesEmbedder {
        fn embed(&self, image: &GrayImage) -> Result<Vec<f32>, EmbeddingError> {
            let half = image.height() / 2;
            let (mut top, mut bottom) = (0.0f32, 0.0f32);
            for (_, y, p) in image.enumerate_pixels() {
                let dark = f32::from(255 - p.0[0]);
                if y < half {
                    top += dark;
                } else {
                    bottom += dark;
                }
            }
            Ok(vec![top, bottom])
        }
    }

    struct Offline;

    impl Embedder for Offline {
        fn embed(&self, _image: &GrayImage) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Unavailable("model not loaded".to_owned()))
        }
    }

    /// Works for the reference, then reports the service down.
    struct DropsAfterFirst {
        calls: Cell<usize>,
    }

    impl Embedder for DropsAfterFirst {
        fn embed(&self, _image: &GrayImage) -> Result<Vec<f32>, EmbeddingError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            if n == 0 {
                Ok(vec![1.0, 0.0])
            } else {
                Err(EmbeddingError::Unavailable("connection lost".to_owned()))
            }
        }
    }

    /// Fails on images with any dark pixel in the first row.
    struct PickyEmbedder;

    impl Embedder for PickyEmbedder {
        fn embed(&self, image: &GrayImage) -> Result<Vec<f32>, EmbeddingError> {
            if (0..image.width()).any(|x| image.get_pixel(x, 0).0[0] < 128) {
                return Err(EmbeddingError::Failed("cannot embed".to_owned()));
            }
            Ok(vec![1.0, 1.0])
        }
    }

    struct Unreadable;

    impl RasterSource for Unreadable {
        fn read(&self) -> Result<RasterInput, DecodeError> {
            Err(DecodeError::EmptyRaster)
        }
    }

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-12);
    }

    #[test]
    fn cosine_degenerate_inputs_are_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f64::EPSILON);
        assert!(cosine_similarity(&[1.0], &[1.0, 1.0]).abs() < f64::EPSILON);
        assert!(cosine_similarity(&[], &[]).abs() < f64::EPSILON);
        assert!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn candidates_are_flipped_vertically_before_embedding() {
        // Reference is dark at the top. The upright candidate is dark at
        // the bottom, so only after the vertical flip does it match.
        let reference = block_image(8, 0, 0, 7, 3);
        let candidates = vec![
            Candidate::new("bottom.dat", "g", text("0 0\n1 1\n")),
            Candidate::new("top.dat", "g", text("1 1\n0 0\n")),
        ];
        let ranking =
            rank_by_embedding(&reference, &candidates, &HalvesEmbedder, &CancelFlag::new()).unwrap();

        assert_eq!(ranking.entries[0].name, "bottom.dat");
        assert!((ranking.entries[0].similarity - 1.0).abs() < 1e-9);
        assert!(ranking.entries[1].similarity.abs() < 1e-9);
        assert_eq!(ranking.best_match().unwrap().stem, "bottom");
    }

    #[test]
    fn unavailable_reference_fails_the_run() {
        let candidates = vec![Candidate::new("a.dat", "g", text("1\n"))];
        let result = rank_by_embedding(
            &block_image(4, 0, 0, 1, 1),
            &candidates,
            &Offline,
            &CancelFlag::new(),
        );
        assert!(matches!(result, Err(EmbeddingError::Unavailable(_))));
    }

    #[test]
    fn service_lost_for_every_candidate_is_unavailable() {
        let candidates = vec![
            Candidate::new("a.dat", "g", text("1\n")),
            Candidate::new("b.dat", "g", text("0\n")),
        ];
        let embedder = DropsAfterFirst {
            calls: Cell::new(0),
        };
        let result = rank_by_embedding(
            &block_image(4, 0, 0, 1, 1),
            &candidates,
            &embedder,
            &CancelFlag::new(),
        );
        assert_eq!(
            result,
            Err(EmbeddingError::Unavailable("connection lost".to_owned()))
        );
    }

    fn boxed(source: impl RasterSource + 'static) -> Box<dyn RasterSource> {
        Box::new(source)
    }

    #[test]
    fn per_image_failures_score_zero_and_keep_order() {
        // Once flipped, "0 0 / 1 1" has dark pixels in row 0 and fails.
        let candidates = vec![
            Candidate::new("fails.dat", "g", boxed(text("0 0\n1 1\n"))),
            Candidate::new("missing.dat", "g", boxed(Unreadable)),
            Candidate::new("ok.dat", "g", boxed(text("1 1\n0 0\n"))),
        ];
        let ranking = rank_by_embedding(
            &block_image(4, 0, 3, 3, 3),
            &candidates,
            &PickyEmbedder,
            &CancelFlag::new(),
        )
        .unwrap();

        let names: Vec<&str> = ranking.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["ok.dat", "fails.dat", "missing.dat"]);
        assert!(ranking.entries[0].error.is_none());
        assert!(ranking.entries[1].similarity.abs() < f64::EPSILON);
        assert!(ranking.entries[1].error.is_some());
        assert!(ranking.entries[2].error.is_some());
    }

    #[test]
    fn empty_candidate_list_is_no_match() {
        let candidates: Vec<Candidate<RasterInput>> = Vec::new();
        let ranking = rank_by_embedding(
            &block_image(4, 0, 0, 1, 1),
            &candidates,
            &ProfileEmbedder::default(),
            &CancelFlag::new(),
        )
        .unwrap();
        assert_eq!(ranking.outcome(), MatchOutcome::NoMatch);
    }

    #[test]
    fn profile_embedder_dimension_and_blank_image() {
        let embedder = ProfileEmbedder::new(16);
        let blank = GrayImage::from_pixel(10, 10, image::Luma([255]));
        let vector = embedder.embed(&blank).unwrap();
        assert_eq!(vector.len(), embedder.dimension());
        assert!(vector.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn profile_embedder_matches_identical_shapes() {
        let embedder = ProfileEmbedder::new(16);
        let a = embedder.embed(&block_image(40, 5, 5, 20, 30)).unwrap();
        let b = embedder.embed(&block_image(40, 5, 5, 20, 30)).unwrap();
        let c = embedder.embed(&block_image(40, 25, 2, 38, 10)).unwrap();
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c) < 0.9);
    }

    #[test]
    fn profile_embedder_rejects_empty_image() {
        let result = ProfileEmbedder::default().embed(&GrayImage::new(0, 0));
        assert!(matches!(result, Err(EmbeddingError::Failed(_))));
    }
}
