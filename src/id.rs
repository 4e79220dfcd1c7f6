//! Stable identifiers for sketch entities, constraints and features

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Error, Result};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| Error::parse_error_with_context($what, s, "UUID"))
            }
        }
    };
}

entity_id!(
    /// Identifier of a geometry entity, unique within its sketch
    GeometryId,
    "geometry id"
);

entity_id!(
    /// Identifier of a constraint, unique within its sketch
    ConstraintId,
    "constraint id"
);

entity_id!(
    /// Identifier of a feature, unique within its container
    FeatureId,
    "feature id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_round_trip() {
        let id = GeometryId::new();
        let parsed: GeometryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_invalid_id_text() {
        let err = "not-a-uuid".parse::<FeatureId>().unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
        assert!(err.to_string().contains("feature id"));
    }

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(ConstraintId::new(), ConstraintId::new());
    }
}
