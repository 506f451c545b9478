//! Core runtime configuration.
//!
//! Everything a `create` run needs is resolved once at process startup into a
//! [`CreateConfig`] and passed into [`crate::pipeline::run`]. The library never reads
//! environment variables itself; the binary does that and hands the result in.

use crate::constants::DEFAULT_OUTPUT_DIR;
use crate::extract::FieldOverrides;
use crate::modality::ModalityRules;
use crate::{BidsError, BidsResult};
use bidsify_files::Placement;
use std::path::{Path, PathBuf};

/// Configuration for one `create` run.
#[derive(Clone, Debug)]
pub struct CreateConfig {
    template: String,
    overrides: FieldOverrides,
    output_dir: PathBuf,
    placement: Placement,
    modality_rules: ModalityRules,
}

impl CreateConfig {
    /// Create a new `CreateConfig`.
    ///
    /// # Errors
    ///
    /// - `BidsError::EmptyTemplate` if `template` is blank
    /// - `BidsError::InvalidInput` if a modality override matches no rule, since every
    ///   file of the run would then fail
    pub fn new(
        template: String,
        overrides: FieldOverrides,
        output_dir: PathBuf,
        placement: Placement,
        modality_rules: ModalityRules,
    ) -> BidsResult<Self> {
        if template.trim().is_empty() {
            return Err(BidsError::EmptyTemplate);
        }

        if let Some(modality) = &overrides.modality {
            if modality_rules.normalize(modality).is_none() {
                return Err(BidsError::InvalidInput(format!(
                    "modality override '{}' does not match any modality rule",
                    modality
                )));
            }
        }

        Ok(Self {
            template,
            overrides,
            output_dir,
            placement,
            modality_rules,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn overrides(&self) -> &FieldOverrides {
        &self.overrides
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn modality_rules(&self) -> &ModalityRules {
        &self.modality_rules
    }
}

/// Resolve the output directory, falling back to [`DEFAULT_OUTPUT_DIR`].
pub fn resolve_output_dir(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}
