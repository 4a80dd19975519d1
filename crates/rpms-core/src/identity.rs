//! # Domain Identity Newtypes
//!
//! Every row the workflow touches is keyed by a UUID. Wrapping each
//! namespace in its own type keeps a `UserId` from being handed to a
//! lookup that expects a `PaperId`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidId {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_newtype!(
    /// Unique identifier for a submitted paper.
    PaperId,
    "paper"
);

uuid_newtype!(
    /// Unique identifier for a registered user (author, editor, admin, coordinator).
    UserId,
    "user"
);

uuid_newtype!(
    /// Unique identifier for a review row.
    ReviewId,
    "review"
);

uuid_newtype!(
    /// Unique identifier for a notification row.
    NotificationId,
    "notification"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(PaperId::new(), PaperId::new());
    }

    #[test]
    fn parse_accepts_surrounding_whitespace() {
        let raw = "7f1c2a9e-4a8b-4d3e-9a61-0b5d9c3e2f10";
        let id: UserId = format!(" {raw}\n").parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn parse_error_names_the_namespace() {
        let err = "not-a-uuid".parse::<ReviewId>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidId {
                kind: "review",
                value: "not-a-uuid".to_string()
            }
        );
    }

    #[test]
    fn serializes_as_bare_uuid_string() {
        let id = NotificationId(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
