//! Input discovery and record loading

use crate::record::ImageRecord;
use crate::types::*;
use std::path::{Path, PathBuf};

/// Raster formats accepted as input, compared case-insensitively
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// A file left out of the session, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading a batch of files
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub records: Vec<ImageRecord>,
    pub skipped: Vec<SkippedFile>,
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|k| ext.eq_ignore_ascii_case(k)))
}

/// List the image files directly inside `dir`, ordered by file name
pub async fn list_images(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir.as_ref()).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_image_path(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Expand directories into their image files; explicit files pass through
pub async fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if tokio::fs::metadata(input).await?.is_dir() {
            paths.extend(list_images(input).await?);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

/// Create records for `paths`, skipping files that cannot be read
pub async fn load_records(paths: Vec<PathBuf>) -> Result<LoadReport> {
    let report = tokio::task::spawn_blocking(move || {
        let mut report = LoadReport::default();
        for path in paths {
            match ImageRecord::open(&path) {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    report.skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    })
    .await?;

    log::info!(
        "Loaded {} images ({} skipped)",
        report.records.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Expand `inputs` and load every image found
pub async fn load_inputs(inputs: &[PathBuf]) -> Result<LoadReport> {
    let paths = expand_inputs(inputs).await?;
    load_records(paths).await
}
