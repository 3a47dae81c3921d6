//! Group identifiers.
//!
//! User groups are keyed by a name-derived UUID v5, so the same name maps to
//! the same id on every machine and a rename always yields a new id.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for user-created groups.
const GROUP_NAMESPACE: Uuid = Uuid::from_u128(0x3c6e_7f2a_9d41_4b8e_a1f0_52d7_c6b9_e803);

/// Namespace for synthetic groups produced by the dynamic provider, kept apart
/// so a computed group never shadows a user group of the same name.
const DYNAMIC_NAMESPACE: Uuid = Uuid::from_u128(0x8a25_0d1c_64f3_4e7b_9b2e_f1c4_37a0_5d96);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for GroupId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for GroupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Derive the id of a user group from its name.
#[must_use]
pub fn make_group_id(name: &str) -> GroupId {
    GroupId(Uuid::new_v5(&GROUP_NAMESPACE, name.as_bytes()).to_string())
}

/// Derive the id of a synthetic (dynamic) group from its rule name.
#[must_use]
pub fn make_dynamic_group_id(name: &str) -> GroupId {
    GroupId(Uuid::new_v5(&DYNAMIC_NAMESPACE, name.as_bytes()).to_string())
}
