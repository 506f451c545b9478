//! # bidsify core
//!
//! Core logic for converting a tree of NIfTI files into a BIDS dataset.
//!
//! A run is driven by a path template such as
//! `/data/{subject}/{session}/{modality}_raw.nii.gz`:
//!
//! - [`pattern`] compiles the template into a glob and per-field extraction boundaries
//! - [`discover`] expands the glob into source paths
//! - [`extract`] reads subject, session and raw modality from each path
//! - [`modality`] normalizes the raw modality to T1w, T2w, FLAIR or PD
//! - [`destination`] picks the `run-NNN` destination and detects earlier runs
//! - [`pipeline`] ties it together and hands placement to `bidsify_files`
//!
//! **No CLI concerns**: argument parsing, environment loading and log setup belong in
//! `bidsify-cli`.

pub mod config;
pub mod constants;
pub mod destination;
pub mod discover;
pub mod error;
pub mod extract;
pub mod modality;
pub mod pattern;
pub mod pipeline;
pub mod registry;

pub use bidsify_files::Placement;
pub use bidsify_types::{Label, LabelError};
pub use config::{resolve_output_dir, CreateConfig};
pub use destination::{DestinationRecord, Resolution};
pub use error::{BidsError, BidsResult};
pub use extract::{ExtractedIdentity, FieldOverrides};
pub use modality::{Modality, ModalityRule, ModalityRules};
pub use pattern::{CompiledPattern, ExtractionBoundary, Field, Segment};
pub use pipeline::{run, FileOutcome, RunSummary};
pub use registry::SubjectRegistry;
