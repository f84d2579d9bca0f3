//! Per-model output adapters
//!
//! Some providers return message content as an array of typed blocks rather
//! than a string. An adapter turns the content into the text the sentence
//! parser sees; the registry picks one by model identifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One block of structured message content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block type, e.g. `text` or `reasoning`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Text payload, when the block carries one
    #[serde(default)]
    pub text: Option<String>,
}

impl ContentBlock {
    /// Text block
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some("text".to_string()),
            text: Some(text.into()),
        }
    }

    fn is_text(&self) -> bool {
        self.kind.as_deref() == Some("text")
    }
}

/// Message content as logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain string
    Text(String),
    /// Provider-specific block array
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Strategy for extracting answer text from message content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputAdapter {
    /// String content as-is; block arrays yield the first block with text
    #[default]
    Plain,
    /// Text of the first block, whatever its type
    FirstBlockText,
    /// Text of the first block typed `text`, skipping reasoning blocks
    TypedTextBlock,
}

impl OutputAdapter {
    /// Answer text, or `None` when the content has no usable text
    #[must_use]
    pub fn extract(self, content: &MessageContent) -> Option<String> {
        let blocks = match content {
            MessageContent::Text(text) => return Some(text.clone()),
            MessageContent::Blocks(blocks) => blocks,
        };
        let block = match self {
            Self::Plain => blocks.iter().find(|b| b.text.is_some()),
            Self::FirstBlockText => blocks.first(),
            Self::TypedTextBlock => blocks.iter().find(|b| b.is_text()),
        };
        block.and_then(|b| b.text.clone())
    }
}

/// Model identifier → adapter lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterRegistry {
    adapters: HashMap<String, OutputAdapter>,
}

impl AdapterRegistry {
    /// Create empty registry; every model uses [`OutputAdapter::Plain`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the known block-returning providers
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("grok/grok-3-mini", OutputAdapter::TypedTextBlock);
        registry.register("google/gemini-1.5-flash", OutputAdapter::FirstBlockText);
        registry.register("google/gemini-2.5-flash-lite", OutputAdapter::FirstBlockText);
        registry.register("anthropic/claude-3-haiku-20240307", OutputAdapter::FirstBlockText);
        registry
    }

    /// Register or replace the adapter for a model
    pub fn register(&mut self, model: impl Into<String>, adapter: OutputAdapter) {
        self.adapters.insert(model.into(), adapter);
    }

    /// Adapter for a model, falling back to plain
    #[must_use]
    pub fn adapter_for(&self, model: &str) -> OutputAdapter {
        self.adapters.get(model).copied().unwrap_or_default()
    }

    /// Extract answer text for a model
    #[must_use]
    pub fn extract(&self, model: &str, content: &MessageContent) -> Option<String> {
        self.adapter_for(model).extract(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reasoning_then_text() -> MessageContent {
        MessageContent::Blocks(vec![
            ContentBlock {
                kind: Some("reasoning".to_string()),
                text: None,
            },
            ContentBlock::text("[\"a\"]"),
        ])
    }

    #[test]
    fn string_content_passes_through() {
        let content = MessageContent::Text("[\"a\"]".to_string());
        for adapter in [
            OutputAdapter::Plain,
            OutputAdapter::FirstBlockText,
            OutputAdapter::TypedTextBlock,
        ] {
            assert_eq!(adapter.extract(&content).as_deref(), Some("[\"a\"]"));
        }
    }

    #[test]
    fn typed_adapter_skips_reasoning() {
        let content = reasoning_then_text();
        assert_eq!(
            OutputAdapter::TypedTextBlock.extract(&content).as_deref(),
            Some("[\"a\"]")
        );
        assert_eq!(OutputAdapter::FirstBlockText.extract(&content), None);
        assert_eq!(OutputAdapter::Plain.extract(&content).as_deref(), Some("[\"a\"]"));
    }

    #[test]
    fn registry_defaults_and_fallback() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(registry.adapter_for("grok/grok-3-mini"), OutputAdapter::TypedTextBlock);
        assert_eq!(
            registry.adapter_for("anthropic/claude-3-haiku-20240307"),
            OutputAdapter::FirstBlockText
        );
        assert_eq!(registry.adapter_for("openai/gpt-4o"), OutputAdapter::Plain);
    }

    #[test]
    fn content_deserializes_both_shapes() {
        let text: MessageContent = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(text, MessageContent::Text("hello".to_string()));
        let blocks: MessageContent =
            serde_json::from_str(r#"[{"type": "text", "text": "hi", "refusal": null}]"#).unwrap();
        assert_eq!(blocks, MessageContent::Blocks(vec![ContentBlock::text("hi")]));
    }

    #[test]
    fn empty_blocks_yield_nothing() {
        let content = MessageContent::Blocks(Vec::new());
        assert_eq!(AdapterRegistry::with_defaults().extract("x", &content), None);
    }
}
