//! Domain primitive types used across the ms workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// External lookup name of a service.
///
/// Equal to the service's directory name unless `SERVICE_MAPPING` renames it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Creates a service name from a string value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_name_displays_inner_value() {
        assert_eq!(ServiceName::new("billing").to_string(), "billing");
    }

    #[test]
    fn service_names_order_lexically() {
        let mut names = vec![ServiceName::from("b"), ServiceName::from("a")];
        names.sort();
        assert_eq!(names[0].as_str(), "a");
    }
}
