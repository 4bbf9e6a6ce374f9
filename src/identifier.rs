//! Dataset reference parsing and validation
//!
//! Implements the platform-qualified reference format: `owner/name`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dataset reference using the format `owner/name`
///
/// The reference is the globally unique identifier for a dataset on its
/// platform and is used to derive storage paths and metadata filenames.
///
/// # Examples
///
/// ```
/// use dataset_ingest::identifier::DatasetRef;
///
/// let r = DatasetRef::parse("alice/global-weather").unwrap();
/// assert_eq!(r.owner(), "alice");
/// assert_eq!(r.name(), "global-weather");
/// assert_eq!(r.to_string(), "alice/global-weather");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetRef {
    owner: String,
    name: String,
}

impl DatasetRef {
    /// Parse a reference string into a DatasetRef
    ///
    /// # Format
    ///
    /// `owner/name`, where both components are non-empty and consist of
    /// alphanumerics, `_`, `-`, or `.`.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid or any component is empty.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let mut parts = s.split('/');
        let (owner, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => (owner.trim(), name.trim()),
            _ => {
                return Err(IdentifierError::InvalidFormat(format!(
                    "invalid dataset reference '{s}': expected owner/name"
                )))
            }
        };

        if owner.is_empty() || name.is_empty() {
            return Err(IdentifierError::InvalidFormat(format!(
                "invalid dataset reference '{s}': owner and name cannot be empty"
            )));
        }

        for component in [owner, name] {
            if let Some(c) = component
                .chars()
                .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.'))
            {
                return Err(IdentifierError::InvalidCharacter {
                    reference: s.to_string(),
                    character: c,
                });
            }
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Get the owner component
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the dataset name component
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convert the reference to a flat, filesystem-safe stem
    ///
    /// The `/` separator is replaced with a double underscore so metadata
    /// files for all datasets can live in a single flat directory without
    /// collisions.
    ///
    /// # Examples
    ///
    /// ```
    /// use dataset_ingest::identifier::DatasetRef;
    ///
    /// let r = DatasetRef::parse("alice/global-weather").unwrap();
    /// assert_eq!(r.to_file_stem(), "alice__global-weather");
    /// ```
    pub fn to_file_stem(&self) -> String {
        format!("{}__{}", self.owner, self.name)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl TryFrom<String> for DatasetRef {
    type Error = IdentifierError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DatasetRef> for String {
    fn from(r: DatasetRef) -> Self {
        r.to_string()
    }
}

/// Errors that can occur during reference parsing
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    /// Invalid reference format
    #[error("identifier error: {0}")]
    InvalidFormat(String),

    /// Reference contains a character outside the allowed set
    #[error("identifier error: '{reference}' contains invalid character '{character}'")]
    InvalidCharacter {
        /// The offending reference string
        reference: String,
        /// The first invalid character found
        character: char,
    },
}
