//! The `create` run: discover sources, convert each one, write dataset artifacts.
//!
//! Files are processed strictly one after another. A failure while converting a file is
//! logged, recorded in the [`RunSummary`] and the run moves on; only configuration
//! problems and failures writing the dataset-level artifacts abort the run.

use crate::config::CreateConfig;
use crate::constants::NIFTI_SUFFIX;
use crate::destination::{resolve, DestinationRecord, Resolution};
use crate::discover::discover;
use crate::extract::extract;
use crate::pattern::{compile, CompiledPattern};
use crate::registry::SubjectRegistry;
use crate::{BidsError, BidsResult};
use bidsify_files::Materializer;
use bidsify_types::Label;
use std::path::{Path, PathBuf};

/// What happened to one successfully processed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The source was placed at a new destination.
    Materialized(DestinationRecord),
    /// The source was already in place from an earlier run.
    Idempotent(DestinationRecord),
}

impl FileOutcome {
    pub fn record(&self) -> &DestinationRecord {
        match self {
            FileOutcome::Materialized(record) | FileOutcome::Idempotent(record) => record,
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Paths matched by the template's glob.
    pub matched: usize,
    pub materialized: usize,
    pub idempotent: usize,
    /// Matched paths without the NIfTI suffix.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, BidsError)>,
    /// Subjects written to `participants.tsv`, in first-seen order.
    pub subjects: Vec<Label>,
}

impl RunSummary {
    /// True if no file failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs a full conversion as described by `config`.
///
/// # Errors
///
/// Returns configuration errors from template compilation before any file is touched,
/// and `BidsError::Files` if the output directory or dataset artifacts cannot be written.
/// Per-file errors are reported in [`RunSummary::failures`] instead.
pub fn run(config: &CreateConfig) -> BidsResult<RunSummary> {
    let pattern = compile(config.template(), &config.overrides().overridden())?;
    let sources = discover(pattern.glob())?;
    let materializer = Materializer::new(config.output_dir(), config.placement())?;

    tracing::info!(
        "found {} candidate file(s) for '{}'",
        sources.len(),
        pattern.glob()
    );

    let mut registry = SubjectRegistry::new();
    let mut summary = RunSummary::default();

    for source in sources {
        summary.matched += 1;

        if !has_nifti_suffix(&source) {
            tracing::warn!(
                "{} does not end with {}; skipping",
                source.display(),
                NIFTI_SUFFIX
            );
            summary.skipped.push(source);
            continue;
        }

        match process_file(&source, &pattern, config, &materializer) {
            Ok(outcome) => {
                registry.register(&outcome.record().subject);
                match outcome {
                    FileOutcome::Materialized(_) => summary.materialized += 1,
                    FileOutcome::Idempotent(_) => summary.idempotent += 1,
                }
            }
            Err(e) => {
                tracing::error!("failed to convert {}: {}", source.display(), e);
                summary.failures.push((source, e));
            }
        }
    }

    materializer.write_dataset_artifacts(registry.subjects())?;
    summary.subjects = registry.into_subjects();

    tracing::info!(
        "converted {} file(s), {} already in place, {} skipped, {} failed",
        summary.materialized,
        summary.idempotent,
        summary.skipped.len(),
        summary.failures.len()
    );

    Ok(summary)
}

/// Converts one source: extract, normalize, resolve, materialize.
///
/// # Errors
///
/// Any extraction, normalization, resolution or filesystem error for this source.
pub fn process_file(
    source: &Path,
    pattern: &CompiledPattern,
    config: &CreateConfig,
    materializer: &Materializer,
) -> BidsResult<FileOutcome> {
    let identity = extract(source, pattern, config.overrides())?;
    let modality = config
        .modality_rules()
        .normalize(&identity.modality_raw)
        .ok_or_else(|| BidsError::UnrecognizedModality(identity.modality_raw.clone()))?;

    let resolution = resolve(
        config.output_dir(),
        &identity.subject,
        &identity.session,
        modality,
        source,
    )?;

    match resolution {
        Resolution::Vacant(record) => {
            materializer.materialize(source, &record.scan_paths())?;
            tracing::info!("{} -> {}", source.display(), record.target.display());
            Ok(FileOutcome::Materialized(record))
        }
        Resolution::Idempotent(record) => {
            tracing::info!(
                "{} already materialized at {}",
                source.display(),
                record.target.display()
            );
            Ok(FileOutcome::Idempotent(record))
        }
    }
}

fn has_nifti_suffix(path: &Path) -> bool {
    path.to_string_lossy().ends_with(NIFTI_SUFFIX)
}
