//! Path template compilation.
//!
//! A template such as `/data/{subject}/{session}/{modality}_raw.nii.gz` is tokenized into
//! a typed [`Segment`] sequence. From that sequence the compiler derives:
//!
//! - a glob in which every bracketed token is replaced by `*`
//! - an [`ExtractionBoundary`] per field that still has to be read from the path
//!
//! Bracketed names other than `subject`, `session` and `modality` are anonymous
//! wildcards. They match like any placeholder but nothing is recorded for them.

use crate::{BidsError, BidsResult};

/// Glob wildcard substituted for every bracketed token.
const GLOB_WILDCARD: &str = "*";

/// An identifier that can be read from a source path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Subject,
    Session,
    Modality,
}

impl Field {
    /// All fields, in the order they are resolved.
    pub const ALL: [Field; 3] = [Field::Subject, Field::Session, Field::Modality];

    /// The name used inside braces in a template.
    pub fn token(&self) -> &'static str {
        match self {
            Field::Subject => "subject",
            Field::Session => "session",
            Field::Modality => "modality",
        }
    }

    fn from_token(name: &str) -> Option<Self> {
        Field::ALL.into_iter().find(|field| field.token() == name)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// One piece of a tokenized template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that must appear verbatim in a matching path.
    Literal(String),
    /// A recognized `{subject}`, `{session}` or `{modality}` token.
    Field(Field),
    /// Any other bracketed token; holds the text between the braces.
    Wildcard(String),
}

impl Segment {
    fn is_token(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }
}

/// Literal text delimiting a field's value in a concrete path.
///
/// Either side is empty when the field sits at the very start or end of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionBoundary {
    pub before: String,
    pub after: String,
}

/// A template ready for globbing and extraction.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    segments: Vec<Segment>,
    glob: String,
    boundaries: Vec<(Field, ExtractionBoundary)>,
}

impl CompiledPattern {
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The glob matching every candidate source path.
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// The boundary pair for `field`, or `None` if the field was overridden.
    pub fn boundary(&self, field: Field) -> Option<&ExtractionBoundary> {
        self.boundaries
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, boundary)| boundary)
    }

    /// True if `field` has to be read from each path.
    pub fn extracts(&self, field: Field) -> bool {
        self.boundary(field).is_some()
    }
}

/// Splits a template into literal text and bracketed tokens.
///
/// Consecutive literal text is always merged, so two literals are never adjacent and no
/// literal is empty. An unclosed `{` is kept as literal text.
pub fn tokenize(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open + 1..].find('}').map(|i| open + 1 + i) else {
            break;
        };

        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }

        let name = &rest[open + 1..close];
        segments.push(match Field::from_token(name) {
            Some(field) => Segment::Field(field),
            None => Segment::Wildcard(name.to_string()),
        });

        rest = &rest[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    segments
}

/// Compiles `template`, requiring a placeholder for every field not in `overridden`.
///
/// # Errors
///
/// - `BidsError::EmptyTemplate` if the template is empty
/// - `BidsError::DuplicatePlaceholder` if a recognized token appears twice
/// - `BidsError::MissingPlaceholder` if a non-overridden field has no token
/// - `BidsError::AdjacentPlaceholders` if a non-overridden field touches another token
pub fn compile(template: &str, overridden: &[Field]) -> BidsResult<CompiledPattern> {
    if template.trim().is_empty() {
        return Err(BidsError::EmptyTemplate);
    }

    let segments = tokenize(template);

    for field in Field::ALL {
        let occurrences = segments
            .iter()
            .filter(|segment| **segment == Segment::Field(field))
            .count();
        if occurrences > 1 {
            return Err(BidsError::DuplicatePlaceholder(field));
        }
    }

    let mut boundaries = Vec::new();
    for field in Field::ALL {
        if overridden.contains(&field) {
            continue;
        }

        let index = segments
            .iter()
            .position(|segment| *segment == Segment::Field(field))
            .ok_or(BidsError::MissingPlaceholder(field))?;

        // The template is treated as if framed by empty tokens at both ends.
        let before = match index.checked_sub(1).map(|i| &segments[i]) {
            None => String::new(),
            Some(Segment::Literal(text)) => text.clone(),
            Some(_) => return Err(BidsError::AdjacentPlaceholders(field)),
        };
        let after = match segments.get(index + 1) {
            None => String::new(),
            Some(Segment::Literal(text)) => text.clone(),
            Some(_) => return Err(BidsError::AdjacentPlaceholders(field)),
        };

        boundaries.push((field, ExtractionBoundary { before, after }));
    }

    let glob = segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => text.as_str(),
            _ => GLOB_WILDCARD,
        })
        .collect::<String>();

    tracing::debug!(
        "compiled template '{}' to glob '{}' ({} token(s))",
        template,
        glob,
        segments.iter().filter(|segment| segment.is_token()).count()
    );

    Ok(CompiledPattern {
        template: template.to_string(),
        segments,
        glob,
        boundaries,
    })
}
