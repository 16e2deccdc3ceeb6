//! In-memory repository.
//!
//! Holds the manifest and content in process. Addresses take the form
//! `memory://<kind>/<path>`.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::catalog::{ItemKind, Manifest, ManifestEntry};
use crate::error::{Error, FetchError, Result};
use crate::repository::ContentRepository;

/// Repository whose manifest and content live in memory.
///
/// ```
/// use prompt_catalog::catalog::ManifestEntry;
/// use prompt_catalog::repository::{ContentRepository, InMemoryRepository};
///
/// # tokio_test::block_on(async {
/// let mut repository = InMemoryRepository::new();
/// let address = repository.put_resource(
///     ManifestEntry::new("code-standards", "code-standards.md", "Code Standards"),
///     "Code Standards Yay!",
/// );
/// repository.init().await.unwrap();
/// assert_eq!(repository.fetch(&address).await.unwrap(), "Code Standards Yay!");
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    manifest_text: Option<String>,
    manifest: Manifest,
    contents: HashMap<String, std::result::Result<String, FetchError>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository whose `init` parses `text` as the manifest.
    pub fn from_manifest_text(text: impl Into<String>) -> Self {
        Self {
            manifest_text: Some(text.into()),
            ..Self::default()
        }
    }

    fn address_of(kind: ItemKind, path: &str) -> String {
        format!("memory://{}/{}", kind.segment(), path)
    }

    /// Declare a resource and store its content. Returns its address.
    pub fn put_resource(&mut self, entry: ManifestEntry, content: impl Into<String>) -> String {
        self.put(ItemKind::Resource, entry, content)
    }

    /// Declare a prompt and store its template. Returns its address.
    pub fn put_prompt(&mut self, entry: ManifestEntry, template: impl Into<String>) -> String {
        self.put(ItemKind::Prompt, entry, template)
    }

    fn put(&mut self, kind: ItemKind, entry: ManifestEntry, content: impl Into<String>) -> String {
        let address = Self::address_of(kind, entry.path.as_deref().unwrap_or_default());
        self.contents.insert(address.clone(), Ok(content.into()));
        self.declare(kind, entry);
        address
    }

    /// Declare an entry without any content behind it.
    pub fn declare(&mut self, kind: ItemKind, entry: ManifestEntry) {
        match kind {
            ItemKind::Resource => self.manifest.resources.push(entry),
            ItemKind::Prompt => self.manifest.prompts.push(entry),
        }
    }

    /// Make every fetch of `kind`/`path` fail with `error`.
    pub fn fail(&mut self, kind: ItemKind, path: &str, error: FetchError) {
        self.contents
            .insert(Self::address_of(kind, path), Err(error));
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn init(&mut self) -> Result<()> {
        if let Some(text) = &self.manifest_text {
            self.manifest = Manifest::parse(text)?;
        }
        Ok(())
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    async fn fetch(&self, address: &str) -> Result<String> {
        match self.contents.get(address) {
            Some(Ok(content)) => Ok(content.clone()),
            Some(Err(error)) => Err(Error::Fetch(error.clone())),
            None => Err(Error::not_found(address)),
        }
    }

    fn build_resource_url(&self, path: &str) -> Result<String> {
        Ok(Self::address_of(ItemKind::Resource, path))
    }

    fn build_prompt_url(&self, path: &str) -> Result<String> {
        Ok(Self::address_of(ItemKind::Prompt, path))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
