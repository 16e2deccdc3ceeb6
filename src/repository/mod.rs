//! Content repositories.
//!
//! A repository supplies the manifest and the raw text of every catalog item.
//!
//! - `filesystem` - a local directory tree
//! - `github` - a remote versioned tree fetched over HTTPS
//! - `memory` - an in-process map, for tests and embedding

pub mod filesystem;
pub mod github;
pub mod memory;

use async_trait::async_trait;
use std::slice::Iter;

use crate::catalog::{ItemKind, Manifest, ManifestEntry};
use crate::config::RepositoryConfig;
use crate::error::Result;

pub use filesystem::FileSystemRepository;
pub use github::GitHubRepository;
pub use memory::InMemoryRepository;

/// Source of the manifest and of item content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetch and parse the manifest. Fails with `Error::Manifest`.
    async fn init(&mut self) -> Result<()>;

    /// The manifest loaded by `init` (empty before).
    fn manifest(&self) -> &Manifest;

    /// Fetch the raw text at `address`. Fails with `Error::Fetch`.
    async fn fetch(&self, address: &str) -> Result<String>;

    /// Address of a resource at `path`.
    fn build_resource_url(&self, path: &str) -> Result<String>;

    /// Address of a prompt at `path`.
    fn build_prompt_url(&self, path: &str) -> Result<String>;

    /// Human-readable location, for logging.
    fn location(&self) -> String;

    /// Resource entries in manifest order.
    fn resources(&self) -> Iter<'_, ManifestEntry> {
        self.manifest().resources.iter()
    }

    /// Prompt entries in manifest order.
    fn prompts(&self) -> Iter<'_, ManifestEntry> {
        self.manifest().prompts.iter()
    }

    /// Address of an item of either kind.
    fn build_url(&self, kind: ItemKind, path: &str) -> Result<String> {
        match kind {
            ItemKind::Resource => self.build_resource_url(path),
            ItemKind::Prompt => self.build_prompt_url(path),
        }
    }
}

/// Construct the repository selected by `config`.
pub fn create(config: &RepositoryConfig) -> Result<Box<dyn ContentRepository>> {
    Ok(match config {
        RepositoryConfig::Filesystem(fs) => Box::new(FileSystemRepository::new(fs)?),
        RepositoryConfig::Github(github) => Box::new(GitHubRepository::new(github)?),
    })
}
