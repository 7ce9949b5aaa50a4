//! Typed ID wrappers for document and owner identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers keep document IDs and owner IDs from being swapped.
/// Plain strings underneath; the backend decides what a valid ID looks like.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(DocumentId, "Stable identifier of a stored document. Immutable after creation.");
typed_id!(OwnerId, "Tenant/user scope every query is implicitly filtered by.");

impl DocumentId {
    /// Generate a fresh random identifier for a document about to be created.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn display_is_the_raw_string() {
        assert_eq!(OwnerId::new("user-1").to_string(), "user-1");
        assert_eq!(DocumentId::from("deck-7").as_str(), "deck-7");
    }
}
