//! Entity identifiers.
//!
//! Every entity in the engine is keyed by a UUID v7 wrapped in its own
//! newtype, so an [`AccountId`] can never be passed where an [`EntryId`] is
//! expected. V7 ids are time-ordered, which keeps `(date, id)` sort keys
//! stable for records created at the same date.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new time-ordered id (UUID v7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Returns `true` for the all-zero UUID, the "absent" marker in
            /// caller-supplied input.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Short representation (first 8 characters of the UUID).
            pub fn short_id(&self) -> String {
                self.0.to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id! {
    /// Identifier of the user who owns accounts and entries.
    UserId
}

define_id! {
    /// Identifier of a bookkeeping account.
    AccountId
}

define_id! {
    /// Identifier of a journal entry.
    EntryId
}

define_id! {
    /// Identifier of a single line within a journal entry.
    LineId
}
