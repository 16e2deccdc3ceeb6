//! The in-memory catalog of resources and prompts.
//!
//! The catalog is built once at startup from the repository manifest and is
//! read-only afterwards.

pub mod manifest;
pub mod schema;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::repository::ContentRepository;

pub use manifest::{Manifest, ManifestEntry};
pub use schema::{ArgumentSchema, ArgumentSet};

/// Kind of catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Resource,
    Prompt,
}

impl ItemKind {
    /// Directory segment used when addressing items of this kind.
    pub fn segment(self) -> &'static str {
        match self {
            ItemKind::Resource => "resources",
            ItemKind::Prompt => "prompts",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Resource => write!(f, "resource"),
            ItemKind::Prompt => write!(f, "prompt"),
        }
    }
}

/// A validated catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub kind: ItemKind,
    /// Unique per kind.
    pub name: String,
    /// Backend-relative locator; opaque to the catalog.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw argument schema (prompts only); parsed at registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl CatalogItem {
    fn from_entry(kind: ItemKind, entry: &ManifestEntry) -> Option<Self> {
        let name = entry.name.as_deref().filter(|n| !n.is_empty())?;
        let path = entry.path.as_deref().filter(|p| !p.is_empty())?;
        Some(Self {
            kind,
            name: name.to_string(),
            path: path.to_string(),
            description: entry.description.clone(),
            schema: match kind {
                ItemKind::Prompt => entry.schema.clone(),
                ItemKind::Resource => None,
            },
        })
    }
}

/// Catalog of one server instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    resources: Vec<CatalogItem>,
    prompts: Vec<CatalogItem>,
}

impl Catalog {
    /// Build the catalog from an initialised repository.
    ///
    /// Entries without a name or path, and repeated names within a kind, are
    /// skipped with a warning. This never fails: manifest-wide problems are
    /// reported by `ContentRepository::init`.
    pub fn load(repository: &dyn ContentRepository) -> Self {
        Self {
            resources: Self::load_kind(ItemKind::Resource, repository.resources()),
            prompts: Self::load_kind(ItemKind::Prompt, repository.prompts()),
        }
    }

    fn load_kind<'a>(
        kind: ItemKind,
        entries: impl Iterator<Item = &'a ManifestEntry>,
    ) -> Vec<CatalogItem> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for (position, entry) in entries.enumerate() {
            let Some(item) = CatalogItem::from_entry(kind, entry) else {
                warn!(
                    "Skipping {} entry at position {}: missing name or path",
                    kind, position
                );
                continue;
            };
            if !seen.insert(item.name.clone()) {
                warn!("Skipping duplicate {} '{}'", kind, item.name);
                continue;
            }
            debug!("Loaded {} '{}' ({})", kind, item.name, item.path);
            items.push(item);
        }

        items
    }

    /// Resources in manifest order.
    pub fn resources(&self) -> &[CatalogItem] {
        &self.resources
    }

    /// Prompts in manifest order.
    pub fn prompts(&self) -> &[CatalogItem] {
        &self.prompts
    }

    /// All items, resources first.
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.resources.iter().chain(self.prompts.iter())
    }

    pub fn len(&self) -> usize {
        self.resources.len() + self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
