//! Types for the tool-calling surface.
//!
//! Each tool is identified by a unique name and a typed input schema; the
//! registry validates and parses arguments before the tool function runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Input schema for a tool, in JSON-schema object form.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolInputSchema {
    /// Schema type (always "object").
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property schemas keyed by argument name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, serde_json::Value>>,
    /// Names of required arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolInputSchema {
    /// An empty object schema (tool takes no arguments).
    #[must_use]
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: Some(HashMap::new()),
            required: None,
        }
    }

    /// Add a property schema.
    #[must_use]
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        schema: serde_json::Value,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties
            .get_or_insert_with(HashMap::new)
            .insert(name.clone(), schema);
        if required {
            self.required.get_or_insert_with(Vec::new).push(name);
        }
        self
    }
}

/// Descriptor for a registered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// What the tool does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Input schema validated before invocation.
    #[serde(rename = "inputSchema")]
    pub input_schema: ToolInputSchema,
}

impl ToolDescriptor {
    /// Create a descriptor with an empty object schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: ToolInputSchema::object(),
        }
    }

    /// Replace the input schema.
    #[must_use]
    pub fn with_schema(mut self, schema: ToolInputSchema) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Identifier for one in-flight tool invocation.
///
/// Sampling and elicitation requests are correlated to the invocation that
/// issued them through this id; they cannot outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(uuid::Uuid);

impl InvocationId {
    /// Generate a fresh invocation id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One call from a client to a named tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Name of the tool to invoke.
    pub name: String,
    /// Input arguments, typed per tool.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub arguments: serde_json::Value,
}

impl CallToolRequest {
    /// Create a call request.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Final value a tool returns to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Primary text content.
    pub text: String,
    /// Structured content, when the tool has a machine-readable form.
    #[serde(
        rename = "structuredContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub structured: Option<serde_json::Value>,
}

impl ToolOutput {
    /// Plain-text output.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }

    /// Output with both a text rendering and a structured form.
    #[must_use]
    pub fn structured(text: impl Into<String>, structured: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            structured: Some(structured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn schema_builder_tracks_required() {
        let schema = ToolInputSchema::object()
            .with_property("query", serde_json::json!({"type": "string"}), true)
            .with_property("limit", serde_json::json!({"type": "integer"}), false);
        assert_eq!(schema.required, Some(vec!["query".to_string()]));
        assert_eq!(schema.properties.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn descriptor_wire_form_uses_input_schema_key() {
        let descriptor = ToolDescriptor::new("search_wikipedia", "Search articles");
        let json = serde_json::to_value(&descriptor).unwrap();
        assert!(json.get("inputSchema").is_some());
    }

    #[test]
    fn call_request_defaults_arguments_to_null() {
        let request: CallToolRequest =
            serde_json::from_str(r#"{"name":"get_article_info"}"#).unwrap();
        assert!(request.arguments.is_null());
    }
}
