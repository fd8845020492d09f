//! LLM sampling types.
//!
//! A tool may request a text completion from the client's LLM mid-execution.
//! These types describe that request and its result; the client runtime that
//! actually owns a model lives on the other side of the callback channel.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tool's request for LLM text completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingRequest {
    /// Prompt text to complete.
    pub prompt: String,
    /// System prompt hint (optional).
    #[serde(rename = "systemPrompt", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Maximum size of the generated text, in characters. The client runtime
    /// enforces this bound; consumers may verify it on the result.
    #[serde(rename = "maxOutputChars")]
    pub max_output_chars: u32,
    /// Sampling temperature (optional, 0.0 to 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Optional request metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl SamplingRequest {
    /// Create a request with a prompt and an output bound.
    #[must_use]
    pub fn new(prompt: impl Into<String>, max_output_chars: u32) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            max_output_chars,
            temperature: None,
            metadata: None,
        }
    }

    /// Set a system prompt hint.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// The LLM's response to a [`SamplingRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingResult {
    /// Generated text.
    pub text: String,
    /// Name of the model that produced the text, when the client reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SamplingResult {
    /// Create a result from generated text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Length accounting: number of characters generated.
    #[must_use]
    pub fn output_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the result respects the bound the request asked for.
    #[must_use]
    pub fn within_bound(&self, request: &SamplingRequest) -> bool {
        self.output_chars() <= request.max_output_chars as usize
    }
}
