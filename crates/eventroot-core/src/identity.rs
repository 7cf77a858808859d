//! Aggregate identity.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentityError;

/// Identity of one aggregate instance across its lifetime.
///
/// The canonical form of an identity is its `Display` output, so
/// `to_string()` doubles as the string conversion. Equality is defined on the
/// canonical form and holds across concrete identity types.
pub trait Identity: fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Returns `true` when both identities have the same canonical form.
    fn equals(&self, other: &dyn Identity) -> bool {
        self.to_string() == other.to_string()
    }
}

/// UUID-backed aggregate identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for AggregateId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<AggregateId> for Uuid {
    fn from(value: AggregateId) -> Self {
        value.0
    }
}

impl FromStr for AggregateId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s).map_err(|e| IdentityError::InvalidId(format!("{s}: {e}")))?;
        Ok(Self(uuid))
    }
}

impl Identity for AggregateId {}
