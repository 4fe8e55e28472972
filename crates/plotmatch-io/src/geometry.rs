//! Reading reference features from disk.
//!
//! A features file is a JSON array of geometries in `geo`'s serde
//! representation, one entry per parcel:
//!
//! ```json
//! [
//!   { "Polygon": { "exterior": [{ "x": 0.0, "y": 0.0 }, { "x": 4.0, "y": 0.0 },
//!                               { "x": 4.0, "y": 3.0 }],
//!                  "interiors": [] } },
//!   { "Point": { "x": 2.0, "y": 1.0 } }
//! ]
//! ```
//!
//! The caller picks one entry with
//! [`select_feature`](plotmatch_pipeline::geometry::select_feature).

use std::path::Path;

use geo::Geometry;

/// Errors that can occur while reading a features file.
#[derive(Debug, thiserror::Error)]
pub enum GeometryFileError {
    /// The file could not be read.
    #[error("failed to read features file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a JSON array of geometries.
    #[error("invalid features file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse features from JSON text.
///
/// # Errors
///
/// Returns [`GeometryFileError::Json`] if the text is not a JSON array of
/// geometries.
pub fn parse_features(json: &str) -> Result<Vec<Geometry<f64>>, GeometryFileError> {
    Ok(serde_json::from_str(json)?)
}

/// Read all features from a JSON file.
///
/// # Errors
///
/// Returns [`GeometryFileError::Io`] if the file cannot be read and
/// [`GeometryFileError::Json`] if it cannot be parsed.
pub fn read_features(path: &Path) -> Result<Vec<Geometry<f64>>, GeometryFileError> {
    let text = std::fs::read_to_string(path)?;
    let features = parse_features(&text)?;
    tracing::debug!(path = %path.display(), count = features.len(), "read features");
    Ok(features)
}
