//! Short free-text names such as an income's source or a goal's name.

use std::fmt::Display;

use serde::Serialize;

use crate::Error;

/// The maximum number of characters in a [Label].
pub const MAX_LABEL_LENGTH: usize = 200;

/// A validated, non-empty piece of text of at most [MAX_LABEL_LENGTH] characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Create a label for the request field `field`.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidField] if `text` is blank or too long.
    pub fn new(field: &'static str, text: &str) -> Result<Self, Error> {
        let text = text.trim();

        if text.is_empty() {
            return Err(Error::InvalidField {
                field,
                message: "This field may not be blank.".to_owned(),
            });
        }

        if text.chars().count() > MAX_LABEL_LENGTH {
            return Err(Error::InvalidField {
                field,
                message: format!("Ensure this field has no more than {MAX_LABEL_LENGTH} characters."),
            });
        }

        Ok(Self(text.to_owned()))
    }

    /// Create a label without validation.
    ///
    /// Used for text read back from the database, which was validated on the way in.
    pub fn new_unchecked(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
