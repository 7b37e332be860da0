//! Layer publication

use serde::{Deserialize, Serialize};

/// Metadata for publishing a layer version.
///
/// The layer's content is an object already staged in the store; building
/// that archive from a dependency manifest is outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub description: String,
    /// SPDX identifier, a URL, or the full license text.
    pub license: String,
    /// Runtime tags the layer is compatible with.
    pub compatible_runtimes: Vec<String>,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            license: String::new(),
            compatible_runtimes: vec![crate::function::DEFAULT_RUNTIME.to_string()],
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    pub fn with_compatible_runtimes(mut self, runtimes: Vec<String>) -> Self {
        self.compatible_runtimes = runtimes;
        self
    }
}
