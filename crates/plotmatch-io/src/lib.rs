//! plotmatch-io: Filesystem collaborators for plotmatch.
//!
//! Everything that touches the disk lives here so `plotmatch-pipeline`
//! stays sans-IO:
//!
//! - [`candidates`]: discover candidate rasters in a survey tree and read
//!   them lazily as [`RasterSource`](plotmatch_pipeline::RasterSource)s.
//! - [`geometry`]: read reference features from a JSON file.
//! - [`raster`]: encode masks and grayscale images as PNG.

pub mod candidates;
pub mod geometry;
pub mod raster;

pub use candidates::{RasterFile, RasterFormat, discover};
pub use geometry::{GeometryFileError, parse_features, read_features};
pub use raster::{RasterError, encode_png, write_png};
