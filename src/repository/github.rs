//! Remote repository served as raw files over HTTPS.
//!
//! Content lives at
//! `https://raw.githubusercontent.com/<owner>/<repository>/refs/<ref>[/<path>]/...`
//! with the manifest at `index.json` under that base.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use crate::address::RemoteAddresses;
use crate::catalog::{ItemKind, Manifest};
use crate::config::GithubConfig;
use crate::error::{Error, FetchError, Result};
use crate::repository::ContentRepository;
use crate::VERSION;

/// Request timeout for a single fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent string for content requests.
fn user_agent() -> String {
    format!("prompt-catalog/{} (rust)", VERSION)
}

/// Repository backed by a remote versioned tree.
#[derive(Debug, Clone)]
pub struct GitHubRepository {
    client: Client,
    addresses: RemoteAddresses,
    manifest: Manifest,
}

impl GitHubRepository {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            addresses: RemoteAddresses::new(config)?,
            manifest: Manifest::default(),
        })
    }
}

#[async_trait]
impl ContentRepository for GitHubRepository {
    async fn init(&mut self) -> Result<()> {
        let url = self.addresses.manifest_url();
        info!("Loading manifest from {}", url);

        let text = self.fetch(&url).await.map_err(|e| match e {
            Error::Fetch(FetchError::NotFound { address }) => {
                Error::Manifest(format!("{} not found", address))
            }
            other => Error::Manifest(other.to_string()),
        })?;
        self.manifest = Manifest::parse(&text)?;
        Ok(())
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    async fn fetch(&self, address: &str) -> Result<String> {
        debug!("GET {}", address);

        let response = self
            .client
            .get(address)
            .send()
            .await
            .map_err(|e| Error::transport(address, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(address));
        }
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or("Unknown");
            return Err(Error::transport(
                address,
                format!("{} {}", status.as_u16(), status_text),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| Error::transport(address, e.to_string()))
    }

    fn build_resource_url(&self, path: &str) -> Result<String> {
        self.addresses.address(ItemKind::Resource, path)
    }

    fn build_prompt_url(&self, path: &str) -> Result<String> {
        self.addresses.address(ItemKind::Prompt, path)
    }

    fn location(&self) -> String {
        self.addresses.base_url().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::get;
    use axum::Router;

    const BASE: &str = "/testuser/testrepo/refs/heads/main/testpath";

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(host: String) -> GithubConfig {
        GithubConfig {
            host,
            git_ref: "heads/main".to_string(),
            path: Some("testpath".to_string()),
            ..GithubConfig::new("testuser", "testrepo")
        }
    }

    fn catalog_router() -> Router {
        Router::new()
            .route(
                &format!("{}/index.json", BASE),
                get(|| async {
                    r#"{
                        "resources": [{ "name": "code-standards", "path": "code-standards.md", "description": "Code Standards" }],
                        "prompts": [{ "name": "code-review", "path": "code-standards.md", "description": "Code Review" }]
                    }"#
                }),
            )
            .route(
                &format!("{}/resources/code-standards.md", BASE),
                get(|| async { "# Code Standards\n\nThese are the test code standards." }),
            )
            .route(
                &format!("{}/resources/broken.md", BASE),
                get(|| async { (HttpStatus::INTERNAL_SERVER_ERROR, "boom") }),
            )
    }

    #[tokio::test]
    async fn test_iterates_manifest_entries() {
        let host = serve(catalog_router()).await;
        let mut repository = GitHubRepository::new(&config(host)).unwrap();
        repository.init().await.unwrap();

        let resources: Vec<_> = repository.resources().collect();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name.as_deref(), Some("code-standards"));
        assert_eq!(resources[0].path.as_deref(), Some("code-standards.md"));
        assert_eq!(resources[0].description.as_deref(), Some("Code Standards"));

        let prompts: Vec<_> = repository.prompts().collect();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].name.as_deref(), Some("code-review"));
    }

    #[tokio::test]
    async fn test_fetch_content() {
        let host = serve(catalog_router()).await;
        let repository = GitHubRepository::new(&config(host)).unwrap();

        let url = repository.build_resource_url("code-standards.md").unwrap();
        let content = repository.fetch(&url).await.unwrap();
        assert!(content.contains("# Code Standards"));
        assert!(content.contains("These are the test code standards."));
    }

    #[tokio::test]
    async fn test_fetch_404_is_not_found() {
        let host = serve(catalog_router()).await;
        let repository = GitHubRepository::new(&config(host)).unwrap();

        let url = repository.build_resource_url("missing.md").unwrap();
        let err = repository.fetch(&url).await.unwrap_err();
        match err {
            Error::Fetch(FetchError::NotFound { address }) => assert!(address.ends_with("missing.md")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_transport() {
        let host = serve(catalog_router()).await;
        let repository = GitHubRepository::new(&config(host)).unwrap();

        let url = repository.build_resource_url("broken.md").unwrap();
        let err = repository.fetch(&url).await.unwrap_err();
        match err {
            Error::Fetch(FetchError::Transport { reason, .. }) => assert!(reason.contains("500")),
            other => panic!("Expected Transport, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let repository = GitHubRepository::new(&config(host)).unwrap();
        let url = repository.build_prompt_url("a.md").unwrap();
        let err = repository.fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_missing_manifest_is_fatal() {
        let host = serve(Router::new()).await;
        let mut repository = GitHubRepository::new(&config(host)).unwrap();
        let err = repository.init().await.unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
        assert!(err.to_string().contains("index.json not found"));
    }

    #[test]
    fn test_build_urls() {
        let repository =
            GitHubRepository::new(&config("https://raw.githubusercontent.com".to_string()))
                .unwrap();
        assert_eq!(
            repository.build_prompt_url("code-review.md").unwrap(),
            "https://raw.githubusercontent.com/testuser/testrepo/refs/heads/main/testpath/prompts/code-review.md"
        );
        assert_eq!(
            repository.location(),
            "https://raw.githubusercontent.com/testuser/testrepo/refs/heads/main/testpath"
        );
    }
}
