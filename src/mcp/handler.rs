//! Catalog dispatch table.
//!
//! Every catalog item is registered once, at startup, with its address and
//! (for prompts) its parsed argument schema. Requests are served by one handler
//! per kind that looks the item up, fetches its content and, for prompts,
//! renders it.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{ArgumentSchema, ArgumentSet, Catalog, CatalogItem, ItemKind};
use crate::error::{Error, Result};
use crate::mcp::prompts::{describe_arguments, GetPromptResult, Prompt, PromptMessage};
use crate::mcp::resources::{guess_mime_type, ReadResourceResult, Resource, ResourceContents};
use crate::repository::ContentRepository;
use crate::template;

/// One dispatch table row.
#[derive(Debug, Clone)]
pub struct Registration {
    pub item: CatalogItem,
    /// Address handed to clients and passed to `fetch`.
    pub address: String,
    /// Parsed schema; prompts without one accept no arguments.
    pub schema: ArgumentSchema,
}

impl Registration {
    fn build(repository: &dyn ContentRepository, item: &CatalogItem) -> Result<Self> {
        let address = repository
            .build_url(item.kind, &item.path)
            .map_err(|e| Error::registration(&item.name, e.to_string()))?;

        let schema = match &item.schema {
            Some(raw) => ArgumentSchema::parse(&item.name, raw)?,
            None => ArgumentSchema::default(),
        };

        Ok(Self {
            item: item.clone(),
            address,
            schema,
        })
    }
}

/// Outcome of registering a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub registered: usize,
    pub skipped: usize,
}

/// Items of one kind, in registration order, with a lookup key per item.
#[derive(Debug, Default)]
struct Table {
    rows: Vec<Registration>,
    index: HashMap<String, usize>,
}

impl Table {
    fn insert(&mut self, key: String, registration: Registration) -> Result<()> {
        if self.index.contains_key(&key) {
            return Err(Error::registration(
                &registration.item.name,
                format!("'{}' is already registered", key),
            ));
        }
        self.index.insert(key, self.rows.len());
        self.rows.push(registration);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&Registration> {
        self.index.get(key).map(|&i| &self.rows[i])
    }
}

/// Serves resources and prompts registered from the catalog.
pub struct CatalogHandler {
    repository: Arc<dyn ContentRepository>,
    /// Keyed by address.
    resources: Table,
    /// Keyed by name.
    prompts: Table,
}

impl CatalogHandler {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self {
            repository,
            resources: Table::default(),
            prompts: Table::default(),
        }
    }

    /// Register one item. On error nothing is registered.
    pub fn register(&mut self, item: &CatalogItem) -> Result<()> {
        let registration = Registration::build(self.repository.as_ref(), item)?;
        debug!(
            "Registered {} '{}' at {}",
            item.kind, item.name, registration.address
        );
        match item.kind {
            ItemKind::Resource => self
                .resources
                .insert(registration.address.clone(), registration),
            ItemKind::Prompt => self.prompts.insert(item.name.clone(), registration),
        }
    }

    /// Register every catalog item, skipping the ones that fail.
    pub fn register_catalog(&mut self, catalog: &Catalog) -> RegistrationSummary {
        let mut summary = RegistrationSummary::default();
        for item in catalog.items() {
            match self.register(item) {
                Ok(()) => summary.registered += 1,
                Err(e) => {
                    warn!("Skipping {} '{}': {}", item.kind, item.name, e);
                    summary.skipped += 1;
                }
            }
        }
        info!(
            "Registered {} resources and {} prompts ({} skipped)",
            self.resource_count(),
            self.prompt_count(),
            summary.skipped
        );
        summary
    }

    pub fn resource_count(&self) -> usize {
        self.resources.rows.len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.rows.len()
    }

    /// Registered resources, in manifest order.
    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources
            .rows
            .iter()
            .map(|r| Resource {
                uri: r.address.clone(),
                name: r.item.name.clone(),
                title: r.item.name.clone(),
                description: r.item.description.clone(),
                mime_type: guess_mime_type(&r.item.path),
            })
            .collect()
    }

    /// Fetch a registered resource by the uri it was listed under.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        let registration = self
            .resources
            .get(uri)
            .ok_or_else(|| Error::ResourceNotFound(uri.to_string()))?;

        let text = self.repository.fetch(&registration.address).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: registration.address.clone(),
                text,
            }],
        })
    }

    /// Registered prompts, in manifest order.
    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.prompts
            .rows
            .iter()
            .map(|r| Prompt {
                name: r.item.name.clone(),
                title: r.item.name.clone(),
                description: r.item.description.clone(),
                arguments: describe_arguments(&r.schema),
            })
            .collect()
    }

    /// Validate arguments, fetch the template and render it.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: &HashMap<String, Value>,
    ) -> Result<GetPromptResult> {
        let registration = self
            .prompts
            .get(name)
            .ok_or_else(|| Error::PromptNotFound(name.to_string()))?;

        let arguments: ArgumentSet = registration.schema.apply(arguments)?;
        let source = self.repository.fetch(&registration.address).await?;
        let text = template::render(&source, &arguments);

        Ok(GetPromptResult {
            description: registration.item.description.clone(),
            messages: vec![PromptMessage::user_text(text)],
        })
    }
}
