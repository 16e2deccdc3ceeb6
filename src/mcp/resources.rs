//! MCP resource payloads.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// MIME type used when the item path gives no better hint.
pub const DEFAULT_MIME_TYPE: &str = "text/markdown";

/// A resource exposed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub mime_type: String,
}

/// Resource contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContents {
    pub uri: String,
    pub text: String,
}

/// Result of resources/list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesResult {
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Result of resources/read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

/// Infer a MIME type from the item path's extension.
pub fn guess_mime_type(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let mime = match ext.as_deref() {
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("yaml") | Some("yml") => "text/yaml",
        Some("toml") => "text/x-toml",
        Some("html") | Some("htm") => "text/html",
        Some("xml") => "application/xml",
        Some("csv") => "text/csv",
        _ => DEFAULT_MIME_TYPE,
    };
    mime.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("code-standards.md"), "text/markdown");
        assert_eq!(guess_mime_type("docs/README.MD"), "text/markdown");
        assert_eq!(guess_mime_type("schema.json"), "application/json");
        assert_eq!(guess_mime_type("notes.txt"), "text/plain");
        assert_eq!(guess_mime_type("no_extension"), "text/markdown");
    }

    #[test]
    fn test_resource_serialization() {
        let resource = Resource {
            uri: "file:///catalog/resources/code-standards.md".to_string(),
            name: "code-standards".to_string(),
            title: "code-standards".to_string(),
            description: Some("Code Standards".to_string()),
            mime_type: "text/markdown".to_string(),
        };

        let json = serde_json::to_string(&resource).unwrap();
        assert!(json.contains("\"mimeType\":\"text/markdown\""));
        assert!(json.contains("\"title\":\"code-standards\""));

        let parsed: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resource);
    }

    #[test]
    fn test_list_resources_result_serialization() {
        let result = ListResourcesResult {
            resources: vec![],
            next_cursor: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"resources":[]}"#);
    }
}
