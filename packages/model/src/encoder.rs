//! Fitted category label encoder.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Maps category ids back to the labels seen at training time. The id is
/// the label's position in `classes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Returns the label for a category id.
    #[must_use]
    pub fn decode(&self, id: i64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the encoder has no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Checks the encoder is non-empty and its labels are unique.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidArtifact`] otherwise.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.is_empty() {
            return Err(ModelError::InvalidArtifact {
                message: "category encoder has no classes".to_string(),
            });
        }
        let unique: BTreeSet<&str> = self.classes.iter().map(String::as_str).collect();
        if unique.len() != self.classes.len() {
            return Err(ModelError::InvalidArtifact {
                message: "category encoder has duplicate classes".to_string(),
            });
        }
        Ok(())
    }
}
