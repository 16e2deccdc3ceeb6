//! MCP prompt payloads.

use serde::{Deserialize, Serialize};

use crate::catalog::schema::ArgumentSchema;

/// A prompt argument definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// A prompt listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<PromptArgument>,
}

/// A prompt message (the actual content).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: PromptContent,
}

impl PromptMessage {
    /// A user-role text message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: PromptContent::Text { text: text.into() },
        }
    }
}

/// Prompt content types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    Text { text: String },
}

/// Result of prompts/list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPromptsResult {
    pub prompts: Vec<Prompt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Result of prompts/get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPromptResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

/// Argument list advertised for a schema.
pub fn describe_arguments(schema: &ArgumentSchema) -> Vec<PromptArgument> {
    schema
        .parameters()
        .iter()
        .map(|p| PromptArgument {
            name: p.name.clone(),
            description: p.description.clone(),
            required: p.required,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_message_shape() {
        let message = PromptMessage::user_text("Code Review (all)");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({ "role": "user", "content": { "type": "text", "text": "Code Review (all)" } })
        );
    }

    #[test]
    fn test_prompt_without_arguments_omits_them() {
        let prompt = Prompt {
            name: "code-review".to_string(),
            title: "code-review".to_string(),
            description: Some("Requests a code review".to_string()),
            arguments: vec![],
        };
        let json = serde_json::to_string(&prompt).unwrap();
        assert!(!json.contains("arguments"));
    }

    #[test]
    fn test_describe_arguments() {
        let schema = ArgumentSchema::parse(
            "code-review",
            &json!({
                "properties": { "scope": { "enum": ["all", "staged"], "description": "What to review" } },
                "required": ["scope"]
            }),
        )
        .unwrap();

        assert_eq!(
            describe_arguments(&schema),
            vec![PromptArgument {
                name: "scope".to_string(),
                description: Some("What to review".to_string()),
                required: true,
            }]
        );
    }
}
