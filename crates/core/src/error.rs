use crate::pattern::Field;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BidsError {
    #[error("invalid configuration: {0}")]
    InvalidInput(String),
    #[error("path template is empty")]
    EmptyTemplate,
    #[error("{0} must be given as a {{{0}}} placeholder in the path template or as an explicit override")]
    MissingPlaceholder(Field),
    #[error("{{{0}}} appears more than once in the path template")]
    DuplicatePlaceholder(Field),
    #[error("{{{0}}} needs literal text separating it from the neighbouring placeholder")]
    AdjacentPlaceholders(Field),
    #[error("failed to compile glob pattern '{pattern}': {source}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(
        "cannot extract {field} from {path}: boundary '{boundary}' not found",
        path = path.display()
    )]
    Extraction {
        path: PathBuf,
        field: Field,
        boundary: String,
    },
    #[error("invalid {field} value: {source}")]
    InvalidLabel {
        field: Field,
        #[source]
        source: bidsify_types::LabelError,
    },
    #[error("unrecognized modality '{0}'")]
    UnrecognizedModality(String),
    #[error(
        "no free run index up to {max} for {path}",
        path = path.display()
    )]
    CollisionExhausted { path: PathBuf, max: u32 },

    #[error("failed to inspect {path}: {source}", path = path.display())]
    DestinationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file operation failed: {0}")]
    Files(#[from] bidsify_files::FilesError),
}

impl BidsError {
    /// Returns true for errors that invalidate the whole run rather than a single file.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BidsError::InvalidInput(_)
                | BidsError::EmptyTemplate
                | BidsError::MissingPlaceholder(_)
                | BidsError::DuplicatePlaceholder(_)
                | BidsError::AdjacentPlaceholders(_)
                | BidsError::GlobPattern { .. }
        )
    }
}

pub type BidsResult<T> = std::result::Result<T, BidsError>;
