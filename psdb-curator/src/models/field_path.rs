//! Bracketed form field names
//!
//! Form fields address a position in the submission document with names like
//! `song[title]`, `songImg` or `synths[2][presets][0][audio]`. A name parses
//! into a root key followed by bracketed segments; all-digit segments are
//! list indices, everything else is a map key.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest list index a field name may address
///
/// Lists grow on demand up to the addressed index, so the index is bounded.
pub const MAX_LIST_INDEX: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldPathError {
    #[error("field name is empty")]
    Empty,

    #[error("unexpected '{found}' at byte {position}")]
    UnexpectedCharacter { found: char, position: usize },

    #[error("unclosed '[' at byte {0}")]
    UnclosedBracket(usize),

    #[error("empty segment at byte {0}")]
    EmptySegment(usize),

    #[error("list index {0} is out of range")]
    IndexOutOfRange(usize),
}

/// Parsed field name: a root key followed by zero or more segments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(name: &str) -> Result<Self, FieldPathError> {
        if name.is_empty() {
            return Err(FieldPathError::Empty);
        }

        let root_end = name.find(is_bracket).unwrap_or(name.len());
        if root_end == 0 {
            let found = name.chars().next().unwrap_or('[');
            return Err(FieldPathError::UnexpectedCharacter { found, position: 0 });
        }

        let mut segments = vec![Segment::Key(name[..root_end].to_string())];
        let mut position = root_end;

        while position < name.len() {
            let rest = &name[position..];
            if !rest.starts_with('[') {
                let found = rest.chars().next().unwrap_or(']');
                return Err(FieldPathError::UnexpectedCharacter { found, position });
            }

            let body_start = position + 1;
            let close = name[body_start..]
                .find(is_bracket)
                .map(|offset| body_start + offset)
                .ok_or(FieldPathError::UnclosedBracket(position))?;

            if name.as_bytes()[close] == b'[' {
                return Err(FieldPathError::UnexpectedCharacter {
                    found: '[',
                    position: close,
                });
            }

            let body = &name[body_start..close];
            if body.is_empty() {
                return Err(FieldPathError::EmptySegment(position));
            }

            segments.push(parse_segment(body)?);
            position = close + 1;
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

fn is_bracket(c: char) -> bool {
    c == '[' || c == ']'
}

fn parse_segment(body: &str) -> Result<Segment, FieldPathError> {
    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Segment::Key(body.to_string()));
    }

    // Digit strings too long for usize are out of range as well
    let index = body.parse::<usize>().unwrap_or(usize::MAX);
    if index > MAX_LIST_INDEX {
        return Err(FieldPathError::IndexOutOfRange(index));
    }
    Ok(Segment::Index(index))
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segments = self.segments.iter();
        if let Some(root) = segments.next() {
            write!(f, "{}", root)?;
        }
        for segment in segments {
            write!(f, "[{}]", segment)?;
        }
        Ok(())
    }
}
