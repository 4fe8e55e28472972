//! Candidate discovery in a survey directory tree.
//!
//! The tree is laid out one directory per group (e.g. sub-village), each
//! holding its rasters in a fixed subdirectory:
//!
//! ```text
//! <root>/<group>/<subdir>/<name>.<extension>
//! ```
//!
//! Groups without the subdirectory are skipped. Groups and files are
//! returned sorted by name so rankings are reproducible across
//! filesystems.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plotmatch_pipeline::{Candidate, DecodeError, RasterInput, RasterSource};

/// How the bytes of a raster file are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// Whitespace-delimited numeric text.
    Text,
    /// Encoded image (PNG, JPEG, BMP, WebP).
    Image,
}

impl RasterFormat {
    /// Guess the format from a file extension: common image extensions
    /// are [`Image`](Self::Image), anything else is [`Text`](Self::Text).
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "bmp" | "webp" => Self::Image,
            _ => Self::Text,
        }
    }
}

/// A raster on disk, read only when the ranking engine asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFile {
    /// Location of the file.
    pub path: PathBuf,
    /// How to interpret its bytes.
    pub format: RasterFormat,
}

impl RasterSource for RasterFile {
    fn read(&self) -> Result<RasterInput, DecodeError> {
        let bytes = fs::read(&self.path)?;
        Ok(match self.format {
            RasterFormat::Text => RasterInput::Text(bytes),
            RasterFormat::Image => RasterInput::Image(bytes),
        })
    }
}

/// List every `<root>/<group>/<subdir>/*.<extension>` file as a
/// candidate named by its file name and labelled with its group.
///
/// The extension match is case-insensitive and given without the dot.
///
/// # Errors
///
/// Returns an I/O error if `root` or a group's raster directory cannot be
/// listed.
pub fn discover(
    root: &Path,
    subdir: &str,
    extension: &str,
) -> io::Result<Vec<Candidate<RasterFile>>> {
    let format = RasterFormat::from_extension(extension);
    let mut candidates = Vec::new();

    for group_dir in sorted_entries(root)? {
        if !group_dir.is_dir() {
            continue;
        }
        let raster_dir = group_dir.join(subdir);
        if !raster_dir.is_dir() {
            tracing::debug!(group = %group_dir.display(), subdir, "no raster directory; skipping group");
            continue;
        }
        let group = file_name(&group_dir);

        for path in sorted_entries(&raster_dir)? {
            let matches = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
            if matches {
                candidates.push(Candidate::new(
                    file_name(&path),
                    group.clone(),
                    RasterFile { path, format },
                ));
            }
        }
    }

    tracing::info!(
        root = %root.display(),
        count = candidates.len(),
        "discovered candidates"
    );
    Ok(candidates)
}

/// Paths of a directory's entries, sorted by file name.
fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(RasterFormat::from_extension("png"), RasterFormat::Image);
        assert_eq!(RasterFormat::from_extension("JPG"), RasterFormat::Image);
        assert_eq!(RasterFormat::from_extension("dat"), RasterFormat::Text);
        assert_eq!(RasterFormat::from_extension("txt"), RasterFormat::Text);
    }

    #[test]
    fn raster_file_reads_tagged_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.dat");
        fs::write(&path, "1 0\n").unwrap();

        let file = RasterFile {
            path,
            format: RasterFormat::Text,
        };
        assert_eq!(file.read().unwrap(), RasterInput::Text(b"1 0\n".to_vec()));
    }

    #[test]
    fn missing_raster_file_is_io_error() {
        let file = RasterFile {
            path: PathBuf::from("/nonexistent/plotmatch/a.dat"),
            format: RasterFormat::Text,
        };
        assert!(matches!(file.read(), Err(DecodeError::Io(_))));
    }

    #[test]
    fn missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("nope"), "dat", "dat").is_err());
    }
}
