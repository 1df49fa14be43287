//! Host/port-shaped properties exposed by providers.

use std::collections::HashMap;

/// Property key holding the host identifier.
pub const PROPERTY_HOST: &str = "host";
/// Property key holding the port.
pub const PROPERTY_PORT: &str = "port";

/// Virtual interfaces have no ports; generic client code still expects one.
pub(crate) const PLACEHOLDER_PORT: &str = "0";

/// A small string-to-string property set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
