//! # P-Mode Loader
//!
//! Reads every `*.json` document of a directory as a P-Mode and admits it
//! through the validating manager. A broken document is logged and skipped;
//! it never prevents the others from loading.

use ebms_01_pmodes::{PModeManagementApi, ProcessingMode};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to list P-Mode directory {path}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of loading a directory.
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Ids of the admitted P-Modes
    pub loaded: Vec<String>,
    /// Documents that were skipped, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

pub fn load_pmodes(
    manager: &dyn PModeManagementApi,
    directory: &Path,
) -> Result<LoadSummary, LoadError> {
    let entries = std::fs::read_dir(directory).map_err(|source| LoadError::Directory {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut documents: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    documents.sort();

    let mut summary = LoadSummary::default();
    for path in documents {
        match load_document(manager, &path) {
            Ok(id) => {
                debug!(path = %path.display(), pmode_id = %id, "Loaded P-Mode document");
                summary.loaded.push(id);
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "Skipped P-Mode document");
                summary.failed.push((path, reason));
            }
        }
    }

    info!(
        directory = %directory.display(),
        loaded = summary.loaded.len(),
        failed = summary.failed.len(),
        "Loaded P-Modes"
    );
    Ok(summary)
}

fn load_document(manager: &dyn PModeManagementApi, path: &Path) -> Result<String, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let pmode: ProcessingMode = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    manager.add(pmode).map_err(|e| e.to_string())
}
