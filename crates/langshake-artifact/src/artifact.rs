//! Published artifact content
//!
//! An [`Artifact`] is the ordered list of structured records (JSON-LD objects)
//! published under one slug. The crate treats records as opaque key/value
//! data; it never inspects their meaning beyond what site-metadata inference
//! asks for through [`Artifact::first_of_type`].

use crate::canonical::{self, CHECKSUM_FIELD};
use crate::checksum::{Checksum, ChecksumError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured content record
pub type Record = Map<String, Value>;

/// Errors related to artifact shape
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Value is neither an object nor an array of objects
    #[error("artifact must be an object or an array of objects, found {found}")]
    UnexpectedShape { found: &'static str },

    /// Sequence element is not an object
    #[error("record {index} is not an object (found {found})")]
    NotAnObject { index: usize, found: &'static str },

    /// Published document has no trailing checksum record
    #[error("published document has no trailing checksum record")]
    MissingSentinel,

    /// Checksum computation or parsing failed
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
}

/// Ordered sequence of content records for one slug
///
/// # Invariants
/// - Immutable once built; publishing layers the checksum on a copy
/// - Serializes as a plain JSON array of records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact {
    records: Vec<Record>,
}

impl Artifact {
    /// Create from records
    #[inline]
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Artifact with a single record
    #[inline]
    #[must_use]
    pub fn single(record: Record) -> Self {
        Self {
            records: vec![record],
        }
    }

    /// Build from an arbitrary JSON value
    ///
    /// Accepts one object or an array of objects.
    ///
    /// # Errors
    /// Returns error for scalars, or arrays containing non-objects
    pub fn from_value(value: Value) -> Result<Self, ArtifactError> {
        match value {
            Value::Object(record) => Ok(Self::single(record)),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(ArtifactError::NotAnObject {
                        index,
                        found: kind_of(&other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::new),
            other => Err(ArtifactError::UnexpectedShape {
                found: kind_of(&other),
            }),
        }
    }

    /// Records in publication order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checksum of the canonical content
    ///
    /// # Errors
    /// Returns [`ChecksumError::Malformed`] if the records cannot be serialized
    pub fn checksum(&self) -> Result<Checksum, ChecksumError> {
        canonical::checksum(&self.records)
    }

    /// First record whose `@type` equals `type_name`
    ///
    /// `@type` may be a string or an array of strings.
    #[must_use]
    pub fn first_of_type(&self, type_name: &str) -> Option<&Record> {
        self.records.iter().find(|r| match r.get("@type") {
            Some(Value::String(t)) => t == type_name,
            Some(Value::Array(ts)) => ts.iter().any(|t| t.as_str() == Some(type_name)),
            _ => false,
        })
    }

    /// Published document: records followed by the checksum sentinel
    ///
    /// Does not mutate `self`.
    #[must_use]
    pub fn to_document(&self, checksum: &Checksum) -> Value {
        let mut sentinel = Map::new();
        sentinel.insert(
            CHECKSUM_FIELD.to_string(),
            Value::String(checksum.to_string()),
        );
        let items = self
            .records
            .iter()
            .cloned()
            .map(Value::Object)
            .chain(std::iter::once(Value::Object(sentinel)))
            .collect();
        Value::Array(items)
    }

    /// Split a published document into content and its declared checksum
    ///
    /// # Errors
    /// Returns error if the document is not an array ending with a sentinel
    pub fn from_document(document: Value) -> Result<(Self, Checksum), ArtifactError> {
        let mut items = match document {
            Value::Array(items) => items,
            other => {
                return Err(ArtifactError::UnexpectedShape {
                    found: kind_of(&other),
                })
            }
        };
        let declared = match items.pop() {
            Some(last) if canonical::is_sentinel(&last) => last
                .get(CHECKSUM_FIELD)
                .and_then(Value::as_str)
                .ok_or(ArtifactError::MissingSentinel)?
                .parse::<Checksum>()?,
            _ => return Err(ArtifactError::MissingSentinel),
        };
        let artifact = Self::from_value(Value::Array(items))?;
        Ok((artifact, declared))
    }
}

impl FromIterator<Record> for Artifact {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Record> for Artifact {
    fn from(record: Record) -> Self {
        Self::single(record)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
