//! Reading subject, session and modality values out of one source path.

use crate::pattern::{CompiledPattern, Field, Segment};
use crate::{BidsError, BidsResult};
use bidsify_types::Label;
use std::path::Path;

/// Values supplied explicitly instead of being read from paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOverrides {
    pub subject: Option<Label>,
    pub session: Option<Label>,
    /// Raw modality text; still normalized like an extracted value.
    pub modality: Option<String>,
}

impl FieldOverrides {
    /// Fields that need no placeholder in the template.
    pub fn overridden(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.subject.is_some() {
            fields.push(Field::Subject);
        }
        if self.session.is_some() {
            fields.push(Field::Session);
        }
        if self.modality.is_some() {
            fields.push(Field::Modality);
        }
        fields
    }
}

/// Identity of one source file before modality normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedIdentity {
    pub subject: Label,
    pub session: Label,
    pub modality_raw: String,
}

/// Extracts the identity of `path`, which is expected to match `pattern`'s glob.
///
/// Segments are matched left to right with a moving cursor: each literal is searched for
/// from where the previous segment ended, and a field's value is the text between its
/// `before` match and the first `after` match found strictly past it. A field at the end
/// of the template runs to the end of the path.
///
/// # Errors
///
/// - `BidsError::Extraction` if a boundary of a field being read is not found
/// - `BidsError::InvalidLabel` if a subject or session value is not a valid label
pub fn extract(
    path: &Path,
    pattern: &CompiledPattern,
    overrides: &FieldOverrides,
) -> BidsResult<ExtractedIdentity> {
    let text = path.to_string_lossy();
    let values = scan(&text, pattern).map_err(|(field, boundary)| BidsError::Extraction {
        path: path.to_path_buf(),
        field,
        boundary,
    })?;

    let subject = match &overrides.subject {
        Some(subject) => subject.clone(),
        None => to_label(Field::Subject, value_of(&values, Field::Subject)?)?,
    };
    let session = match &overrides.session {
        Some(session) => session.clone(),
        None => to_label(Field::Session, value_of(&values, Field::Session)?)?,
    };
    let modality_raw = match &overrides.modality {
        Some(modality) => modality.clone(),
        None => value_of(&values, Field::Modality)?.to_string(),
    };

    Ok(ExtractedIdentity {
        subject,
        session,
        modality_raw,
    })
}

fn value_of<'a>(values: &[(Field, &'a str)], field: Field) -> BidsResult<&'a str> {
    values
        .iter()
        .find(|(candidate, _)| *candidate == field)
        .map(|(_, value)| *value)
        .ok_or(BidsError::MissingPlaceholder(field))
}

fn to_label(field: Field, value: &str) -> BidsResult<Label> {
    Label::new(value).map_err(|source| BidsError::InvalidLabel { field, source })
}

/// Walks the segments over `text`, returning the value of every extracted field.
///
/// On failure returns the field whose boundary is missing and that boundary's text.
fn scan<'a>(
    text: &'a str,
    pattern: &CompiledPattern,
) -> Result<Vec<(Field, &'a str)>, (Field, String)> {
    let segments = pattern.segments();
    let mut values = Vec::new();
    let mut cursor = 0;
    // Token currently consuming text: the field being read (None for a wildcard or an
    // overridden field) and where its value starts.
    let mut open: Option<(Option<Field>, usize)> = None;

    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(literal) => {
                let Some(start) = text[cursor..].find(literal.as_str()).map(|i| cursor + i)
                else {
                    let blamed = open
                        .and_then(|(field, _)| field)
                        .or_else(|| next_extracted_field(pattern, &segments[index..]));
                    return match blamed {
                        Some(field) => Err((field, literal.clone())),
                        // No field left to read, everything needed is already known.
                        None => Ok(values),
                    };
                };

                if let Some((Some(field), from)) = open.take() {
                    values.push((field, &text[from..start]));
                }
                cursor = start + literal.len();
            }
            Segment::Field(field) => {
                let field = pattern.extracts(*field).then_some(*field);
                open = Some((field, cursor));
            }
            Segment::Wildcard(_) => open = Some((None, cursor)),
        }
    }

    if let Some((Some(field), from)) = open {
        values.push((field, &text[from..]));
    }

    Ok(values)
}

fn next_extracted_field(pattern: &CompiledPattern, segments: &[Segment]) -> Option<Field> {
    segments.iter().find_map(|segment| match segment {
        Segment::Field(field) if pattern.extracts(*field) => Some(*field),
        _ => None,
    })
}
