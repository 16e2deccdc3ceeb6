//! Manifest model.
//!
//! The manifest is the backend-supplied `index.json`:
//!
//! ```json
//! {
//!   "resources": [{ "name": "code-standards", "path": "code-standards.md", "description": "Code Standards" }],
//!   "prompts": [{ "name": "code-review", "path": "code-review.md", "description": "Code Review", "schema": {} }]
//! }
//! ```
//!
//! A manifest that is not an object, or whose `resources`/`prompts` are not
//! arrays, is rejected as a whole. Individual entries are parsed leniently so a
//! single bad entry cannot take the rest of the catalog down with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::catalog::ItemKind;
use crate::error::{Error, Result};

/// One catalog entry as declared by the backend. Nothing is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ManifestEntry {
    /// Entry with a name, path and description.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            path: Some(path.into()),
            description: Some(description.into()),
            schema: None,
        }
    }

    /// Attach an argument schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Ordered, kind-grouped catalog index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manifest {
    pub resources: Vec<ManifestEntry>,
    pub prompts: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    resources: Vec<Value>,
    #[serde(default)]
    prompts: Vec<Value>,
}

impl Manifest {
    /// Parse manifest text.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(text)
            .map_err(|e| Error::Manifest(format!("invalid manifest: {}", e)))?;

        Ok(Self {
            resources: Self::entries_from(ItemKind::Resource, raw.resources),
            prompts: Self::entries_from(ItemKind::Prompt, raw.prompts),
        })
    }

    fn entries_from(kind: ItemKind, values: Vec<Value>) -> Vec<ManifestEntry> {
        values
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                serde_json::from_value(value).unwrap_or_else(|e| {
                    warn!("Malformed {} entry at position {}: {}", kind, position, e);
                    ManifestEntry::default()
                })
            })
            .collect()
    }

    /// Entries of one kind, in manifest order.
    pub fn entries(&self, kind: ItemKind) -> &[ManifestEntry] {
        match kind {
            ItemKind::Resource => &self.resources,
            ItemKind::Prompt => &self.prompts,
        }
    }
}
