//! Test identity — string-backed `Identity` implementation for tests.

use std::fmt;

use eventroot_core::identity::Identity;

/// An identity wrapping an arbitrary string, e.g. `MockGuid::new("mock-guid")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MockGuid(String);

impl MockGuid {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MockGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Identity for MockGuid {}
