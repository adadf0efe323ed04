//! Core Types - descriptor data shared across layers

use serde::{Deserialize, Serialize};

// ============================================================================
// Metadata - logical command descriptor
// ============================================================================

/// Descriptor of a logical command, supplied by the workflow system.
///
/// Opaque to the runner beyond the fields it reads: `name` feeds the output
/// directory name and `container_image_tag` selects the image to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Unique identifier of the command
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Package the command belongs to, if any
    #[serde(default)]
    pub package: Option<String>,
    /// Container image tag the command expects to run in
    #[serde(default)]
    pub container_image_tag: Option<String>,
}

impl Metadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            package: None,
            container_image_tag: None,
        }
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn container_image_tag(mut self, tag: impl Into<String>) -> Self {
        self.container_image_tag = Some(tag.into());
        self
    }
}
