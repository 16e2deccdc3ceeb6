//! End-to-end catalog flows over an in-process stream pair.

use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::collections::HashMap;
use tokio::task::JoinHandle;

use prompt_catalog::catalog::{ItemKind, ManifestEntry};
use prompt_catalog::config::GithubConfig;
use prompt_catalog::error::{Error, FetchError};
use prompt_catalog::mcp::client::McpClient;
use prompt_catalog::mcp::prompts::PromptContent;
use prompt_catalog::mcp::server::McpServer;
use prompt_catalog::mcp::transport::{StreamTransport, Transport};
use prompt_catalog::repository::{ContentRepository, GitHubRepository, InMemoryRepository};

/// Bootstrap a server over `repository` and connect a client to it.
async fn connect(repository: Box<dyn ContentRepository>) -> (McpClient, JoinHandle<()>) {
    let server = McpServer::bootstrap(repository)
        .await
        .expect("bootstrap should succeed");

    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let (client_read, client_write) = tokio::io::split(client_io);

    let session = tokio::spawn(async move {
        let mut transport = StreamTransport::new(server_read, server_write);
        server.run(&mut transport).await.expect("server run failed");
        transport.close().await.expect("transport close failed");
    });

    let client = McpClient::connect(client_read, client_write);
    client.initialize().await.expect("initialize failed");
    (client, session)
}

fn review_catalog() -> InMemoryRepository {
    let mut repository = InMemoryRepository::new();
    repository.put_resource(
        ManifestEntry::new("code-standards", "code-standards.md", "Code Standards"),
        "Code Standards Yay!",
    );
    repository.put_resource(
        ManifestEntry::new("architecture", "architecture.md", "Architecture Notes"),
        "# Architecture",
    );
    repository.put_prompt(
        ManifestEntry::new("code-review", "code-review.md", "Requests a code review").with_schema(
            json!({
                "type": "object",
                "properties": {
                    "scope": {
                        "enum": ["all", "staged", "unstaged"],
                        "default": "all",
                        "description": "Which changes to review"
                    }
                }
            }),
        ),
        "Code Review (<%= it.scope %>)",
    );
    repository
}

fn text_of(result: &prompt_catalog::mcp::prompts::GetPromptResult) -> &str {
    match &result.messages[0].content {
        PromptContent::Text { text } => text,
    }
}

#[tokio::test]
async fn test_code_standards_end_to_end() {
    let mut repository = InMemoryRepository::new();
    repository.put_resource(
        ManifestEntry::new("code-standards", "code-standards.md", "Code Standards"),
        "Code Standards Yay!",
    );
    let (client, _session) = connect(Box::new(repository)).await;

    let listed = client.list_resources().await.unwrap();
    assert_eq!(listed.resources.len(), 1);
    let resource = &listed.resources[0];
    assert_eq!(resource.name, "code-standards");
    assert_eq!(resource.description.as_deref(), Some("Code Standards"));
    assert_eq!(resource.mime_type, "text/markdown");

    let read = client.read_resource(&resource.uri).await.unwrap();
    assert_eq!(read.contents.len(), 1);
    assert_eq!(read.contents[0].uri, resource.uri);
    assert_eq!(read.contents[0].text, "Code Standards Yay!");
}

#[tokio::test]
async fn test_listing_order_and_idempotence() {
    let (client, _session) = connect(Box::new(review_catalog())).await;

    let first = client.list_resources().await.unwrap();
    let names: Vec<_> = first.resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["code-standards", "architecture"]);
    assert_eq!(
        first.resources[1].uri,
        review_catalog()
            .build_url(ItemKind::Resource, "architecture.md")
            .unwrap()
    );

    let second = client.list_resources().await.unwrap();
    assert_eq!(first, second);

    let prompts = client.list_prompts().await.unwrap();
    assert_eq!(prompts, client.list_prompts().await.unwrap());
    assert_eq!(prompts.prompts[0].title, "code-review");
    assert_eq!(
        prompts.prompts[0].arguments[0].description.as_deref(),
        Some("Which changes to review")
    );
}

#[tokio::test]
async fn test_prompt_defaulting() {
    let (client, _session) = connect(Box::new(review_catalog())).await;

    let result = client.get_prompt("code-review", HashMap::new()).await.unwrap();
    assert_eq!(text_of(&result), "Code Review (all)");
    assert_eq!(result.messages[0].role, "user");

    let mut arguments = HashMap::new();
    arguments.insert("scope".to_string(), json!("unstaged"));
    let result = client.get_prompt("code-review", arguments).await.unwrap();
    assert_eq!(text_of(&result), "Code Review (unstaged)");

    let mut arguments = HashMap::new();
    arguments.insert("scope".to_string(), json!(""));
    let result = client.get_prompt("code-review", arguments).await.unwrap();
    assert_eq!(text_of(&result), "Code Review (all)");
}

#[tokio::test]
async fn test_defective_entries_do_not_block_startup() {
    let mut repository = review_catalog();
    repository.declare(
        ItemKind::Resource,
        ManifestEntry {
            path: Some("orphan.md".to_string()),
            ..ManifestEntry::default()
        },
    );
    repository.put_prompt(
        ManifestEntry::new("broken", "broken.md", "Broken").with_schema(json!({
            "properties": { "level": { "enum": ["a"], "default": "b" } }
        })),
        "never served",
    );
    let (client, _session) = connect(Box::new(repository)).await;

    assert_eq!(client.list_resources().await.unwrap().resources.len(), 2);
    let prompts = client.list_prompts().await.unwrap();
    let names: Vec<_> = prompts.prompts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["code-review"]);
    assert!(client.get_prompt("code-review", HashMap::new()).await.is_ok());
}

#[tokio::test]
async fn test_fetch_failure_is_correlated_error() {
    let mut repository = review_catalog();
    repository.fail(
        ItemKind::Resource,
        "architecture.md",
        FetchError::NotFound {
            address: "memory://resources/architecture.md".to_string(),
        },
    );
    let (client, _session) = connect(Box::new(repository)).await;

    let err = client
        .read_resource("memory://resources/architecture.md")
        .await
        .unwrap_err();
    match err {
        Error::Rpc { code, message } => {
            assert_eq!(code, -32002);
            assert!(message.contains("architecture.md"));
        }
        other => panic!("Expected rpc error, got {:?}", other),
    }

    let read = client
        .read_resource("memory://resources/code-standards.md")
        .await
        .unwrap();
    assert_eq!(read.contents[0].text, "Code Standards Yay!");
}

#[tokio::test]
async fn test_malformed_frame_then_recovery() {
    let (client, _session) = connect(Box::new(review_catalog())).await;

    let err = client.send_raw("{\"jsonrpc\":\"2.0\",").await.unwrap_err();
    assert!(matches!(err, Error::Rpc { code: -32700, .. }));

    client.ping().await.unwrap();
    assert_eq!(client.pending_count().await, 0);
}

#[tokio::test]
async fn test_session_ends_with_stream() {
    let (client, session) = connect(Box::new(review_catalog())).await;
    drop(client);
    session.await.unwrap();
}

#[tokio::test]
async fn test_remote_catalog_with_missing_content() {
    let base = "/acme/prompts/refs/heads/main/catalog";
    let router = Router::new()
        .route(
            &format!("{}/index.json", base),
            get(|| async {
                axum::Json(json!({
                    "resources": [
                        { "name": "code-standards", "path": "code-standards.md", "description": "Code Standards" },
                        { "name": "gone", "path": "gone.md", "description": "Deleted upstream" }
                    ],
                    "prompts": []
                }))
            }),
        )
        .route(
            &format!("{}/resources/code-standards.md", base),
            get(|| async { "Code Standards Yay!" }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = GithubConfig {
        host,
        path: Some("catalog".to_string()),
        ..GithubConfig::new("acme", "prompts")
    };
    let repository = GitHubRepository::new(&config).unwrap();
    let (client, _session) = connect(Box::new(repository)).await;

    let listed = client.list_resources().await.unwrap();
    assert_eq!(listed.resources.len(), 2);
    assert!(listed.resources[1].uri.ends_with("/catalog/resources/gone.md"));

    let err = client.read_resource(&listed.resources[1].uri).await.unwrap_err();
    assert!(matches!(err, Error::Rpc { code: -32002, .. }));

    let read = client.read_resource(&listed.resources[0].uri).await.unwrap();
    assert_eq!(read.contents[0].text, "Code Standards Yay!");
}
