/// Errors that can occur when creating validated label types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// The input text was empty or contained only whitespace
    #[error("label cannot be empty")]
    Empty,

    /// The input text contained a path separator
    #[error("label '{0}' must not contain a path separator")]
    PathSeparator(String),
}

/// A subject or session identifier safe to embed in a BIDS file name.
///
/// The value is otherwise opaque: it is kept exactly as given (no trimming or case
/// folding), but it must contain at least one non-whitespace character and no `/` or `\`,
/// since it becomes both a directory name (`sub-<label>/`) and part of a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    /// Creates a new `Label` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::Empty` if the input is empty or whitespace only, and
    /// `LabelError::PathSeparator` if it contains `/` or `\`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, LabelError> {
        let input = input.as_ref();
        if input.trim().is_empty() {
            return Err(LabelError::Empty);
        }
        if input.contains(['/', '\\']) {
            return Err(LabelError::PathSeparator(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::new(s)
    }
}
