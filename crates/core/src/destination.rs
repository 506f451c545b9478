//! Destination naming and run-index collision handling.

use crate::constants::{ANAT_DIR_NAME, MAX_RUN_INDEX, NIFTI_SUFFIX, SIDECAR_EXTENSION};
use crate::modality::Modality;
use crate::{BidsError, BidsResult};
use bidsify_files::ScanPaths;
use bidsify_types::Label;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Where one scan lives in the output dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRecord {
    pub subject: Label,
    pub session: Label,
    pub modality: Modality,
    pub run: u32,
    pub target: PathBuf,
    session_dir: PathBuf,
}

impl DestinationRecord {
    fn new(
        output_dir: &Path,
        subject: &Label,
        session: &Label,
        modality: Modality,
        run: u32,
    ) -> Self {
        let session_dir = session_dir(output_dir, subject, session);
        let target = session_dir
            .join(ANAT_DIR_NAME)
            .join(format!("{}{}", file_stem(subject, session, run, modality), NIFTI_SUFFIX));

        Self {
            subject: subject.clone(),
            session: session.clone(),
            modality,
            run,
            target,
            session_dir,
        }
    }

    /// `sub-<s>_ses-<e>_run-<NNN>_<modality>`, shared by the image and its sidecar.
    pub fn file_stem(&self) -> String {
        file_stem(&self.subject, &self.session, self.run, self.modality)
    }

    /// `<output>/sub-<s>/ses-<e>`
    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    /// All paths the materializer writes for this record.
    pub fn scan_paths(&self) -> ScanPaths {
        let stem = self.file_stem();
        let scans_stem = format!("sub-{}_ses-{}_scans", self.subject, self.session);

        ScanPaths {
            image: self.target.clone(),
            sidecar: self
                .session_dir
                .join(ANAT_DIR_NAME)
                .join(format!("{}{}", stem, SIDECAR_EXTENSION)),
            scans_json: self.session_dir.join(format!("{}.json", scans_stem)),
            scans_tsv: self.session_dir.join(format!("{}.tsv", scans_stem)),
            scans_entry: format!("{}/{}{}", ANAT_DIR_NAME, stem, NIFTI_SUFFIX),
        }
    }
}

fn session_dir(output_dir: &Path, subject: &Label, session: &Label) -> PathBuf {
    output_dir
        .join(format!("sub-{}", subject))
        .join(format!("ses-{}", session))
}

fn file_stem(subject: &Label, session: &Label, run: u32, modality: Modality) -> String {
    format!("sub-{}_ses-{}_run-{:03}_{}", subject, session, run, modality)
}

/// Outcome of resolving a destination for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing exists at the record's target yet.
    Vacant(DestinationRecord),
    /// The record's target already holds this source; nothing to do.
    Idempotent(DestinationRecord),
}

impl Resolution {
    pub fn record(&self) -> &DestinationRecord {
        match self {
            Resolution::Vacant(record) | Resolution::Idempotent(record) => record,
        }
    }
}

/// Finds the destination for `source`, starting at run 1.
///
/// An occupied candidate is this source's earlier materialization if it resolves (through
/// any symlinks) to the canonical source path, or if it is a regular file whose content is
/// identical to the source. Any other occupant is a collision and the run index is bumped.
///
/// # Errors
///
/// - `BidsError::CollisionExhausted` once runs up to `MAX_RUN_INDEX` are all taken
/// - `BidsError::DestinationRead` if the source or a candidate cannot be inspected
/// - `BidsError::Files` if comparing contents fails
pub fn resolve(
    output_dir: &Path,
    subject: &Label,
    session: &Label,
    modality: Modality,
    source: &Path,
) -> BidsResult<Resolution> {
    let canonical_source = source
        .canonicalize()
        .map_err(|e| BidsError::DestinationRead {
            path: source.to_path_buf(),
            source: e,
        })?;

    for run in 1..=MAX_RUN_INDEX {
        let record = DestinationRecord::new(output_dir, subject, session, modality, run);

        let metadata = match fs::symlink_metadata(&record.target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Resolution::Vacant(record)),
            Err(e) => {
                return Err(BidsError::DestinationRead {
                    path: record.target,
                    source: e,
                })
            }
        };

        if holds_source(&record.target, &metadata, &canonical_source)? {
            return Ok(Resolution::Idempotent(record));
        }

        tracing::debug!(
            "run {:03} already taken at {}, trying next run",
            run,
            record.target.display()
        );
    }

    Err(BidsError::CollisionExhausted {
        path: source.to_path_buf(),
        max: MAX_RUN_INDEX,
    })
}

fn holds_source(
    candidate: &Path,
    metadata: &fs::Metadata,
    canonical_source: &Path,
) -> BidsResult<bool> {
    if metadata.file_type().is_symlink() {
        // A dangling link cannot be this source.
        return Ok(candidate
            .canonicalize()
            .map(|target| target == canonical_source)
            .unwrap_or(false));
    }

    if !metadata.is_file() {
        return Ok(false);
    }

    if candidate.canonicalize().ok().as_deref() == Some(canonical_source) {
        return Ok(true);
    }

    Ok(bidsify_files::same_content(candidate, canonical_source)?)
}
