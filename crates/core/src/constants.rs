//! Constants used throughout the bidsify core crate.
//!
//! Path fragments and limits that form the output naming contract live here so the
//! resolver, the pipeline and the tests agree on them.

/// Default output directory when no explicit directory is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "/output";

/// Only source paths ending with this suffix are converted.
pub const NIFTI_SUFFIX: &str = ".nii.gz";

/// Extension of the per-image sidecar.
pub const SIDECAR_EXTENSION: &str = ".json";

/// Directory holding anatomical scans inside a session directory.
pub const ANAT_DIR_NAME: &str = "anat";

/// Largest run index that still fits the three-digit `run-NNN` entity.
pub const MAX_RUN_INDEX: u32 = 999;
