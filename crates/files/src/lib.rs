//! bidsify file materialization
//!
//! This crate owns every write bidsify makes below the output directory:
//!
//! - placing a source image at its destination, by byte copy or by symlink
//! - the per-image JSON sidecar and the per-session `_scans.json` / `_scans.tsv`
//! - the dataset-level artifacts written once at the end of a run
//!
//! It knows nothing about templates or naming. Callers decide *where* a scan goes (see
//! [`ScanPaths`]) and this crate decides *how* it gets there.
//!
//! ## Output layout
//!
//! ```text
//! <output_dir>/
//! ├── dataset_description.json
//! ├── participants.json
//! ├── participants.tsv
//! ├── README
//! └── sub-<subject>/
//!     └── ses-<session>/
//!         ├── sub-<subject>_ses-<session>_scans.json
//!         ├── sub-<subject>_ses-<session>_scans.tsv
//!         └── anat/
//!             ├── sub-<subject>_ses-<session>_run-001_T1w.nii.gz
//!             └── sub-<subject>_ses-<session>_run-001_T1w.json
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use bidsify_files::{Materializer, Placement};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let materializer = Materializer::new(Path::new("/output"), Placement::Symlink)?;
//! materializer.write_dataset_artifacts(&[])?;
//! # Ok(())
//! # }
//! ```

mod constants;
mod dataset;
mod digest;
mod materializer;

pub use constants::{
    DATASET_DESCRIPTION_FILENAME, PARTICIPANTS_JSON_FILENAME, PARTICIPANTS_TSV_FILENAME,
    README_FILENAME, UNKNOWN_VALUE,
};
pub use dataset::DatasetDescription;
pub use digest::{file_digest, same_content};
pub use materializer::{placeholder_acq_time, Materializer, Placement, ScanPaths};

use std::path::{Path, PathBuf};

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// A destination already holds a file; placement never overwrites
    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a tab-separated table failed
    #[error("TSV error: {0}")]
    Tsv(#[from] csv::Error),

    /// Serialising a JSON artifact failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wraps an I/O error with the action and path it relates to, keeping its kind.
pub(crate) fn io_context(action: &str, path: &Path, e: std::io::Error) -> FilesError {
    FilesError::Io(std::io::Error::new(
        e.kind(),
        format!("Failed to {} {}: {}", action, path.display(), e),
    ))
}
