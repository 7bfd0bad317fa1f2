//! Identifier types used throughout Concord.
//!
//! All identifiers wrap a UUID v7, so freshly minted ids sort roughly by
//! creation time. Ordering on every id is the UUID byte order, which is the
//! total order used for deterministic tie-breaking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mints a new, globally unique identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an identifier from its hyphenated string form.
            pub fn parse(s: &str) -> crate::Result<Self> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                Self::parse(s)
            }
        }
    };
}

uuid_id! {
    /// Identity of a replica. Only its total order is ever inspected.
    NodeId
}

uuid_id! {
    /// A unique witness minted for a single add to a tagged set.
    ///
    /// Two adds of the same value carry different tags, so a remove only
    /// cancels the adds its issuer actually observed.
    Tag
}

uuid_id! {
    /// Identity of a patch-based register element.
    ElementId
}

uuid_id! {
    /// Identity of a single replicated operation, used to drop replays.
    OperationId
}
