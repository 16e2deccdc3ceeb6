//! Local directory repository.
//!
//! Layout under the catalog root:
//!
//! ```text
//! index.json
//! resources/<path>
//! prompts/<path>
//! ```

use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, info};

use crate::address::LocalAddresses;
use crate::catalog::{ItemKind, Manifest};
use crate::config::FilesystemConfig;
use crate::error::{Error, Result};
use crate::repository::ContentRepository;

/// Repository backed by a local directory.
#[derive(Debug)]
pub struct FileSystemRepository {
    addresses: LocalAddresses,
    manifest: Manifest,
}

impl FileSystemRepository {
    pub fn new(config: &FilesystemConfig) -> Result<Self> {
        Ok(Self {
            addresses: LocalAddresses::new(&config.path)?,
            manifest: Manifest::default(),
        })
    }
}

#[async_trait]
impl ContentRepository for FileSystemRepository {
    async fn init(&mut self) -> Result<()> {
        let path = self.addresses.manifest_path();
        info!("Loading manifest from {}", path.display());

        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Manifest(format!("cannot read {}: {}", path.display(), e)))?;
        self.manifest = Manifest::parse(&text)?;
        Ok(())
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    async fn fetch(&self, address: &str) -> Result<String> {
        let path = self
            .addresses
            .resolve(address)
            .ok_or_else(|| Error::not_found(address))?;
        debug!("Reading {}", path.display());

        fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::not_found(address),
            _ => Error::transport(address, e.to_string()),
        })
    }

    fn build_resource_url(&self, path: &str) -> Result<String> {
        self.addresses.address(ItemKind::Resource, path)
    }

    fn build_prompt_url(&self, path: &str) -> Result<String> {
        self.addresses.address(ItemKind::Prompt, path)
    }

    fn location(&self) -> String {
        self.addresses.root().display().to_string()
    }
}
