//! Idea generation through a generative-language API
//!
//! Works with the `generateContent` endpoint of the Gemini API (or anything
//! that speaks the same JSON). The model is asked for a JSON array of strings;
//! each string becomes an AI-generated child node.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AiConfig;
use crate::tree::{LogicTree, NodeId, TreeError};

/// Anything that can break a topic down into sub-topics
pub trait IdeaSource: Send + Sync {
    fn suggest(&self, topic: &str) -> Result<Vec<String>, AiError>;
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("API key not set: export {0} first")]
    MissingApiKey(String),

    #[error("request to the model failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("invalid response from the model: {0}")]
    InvalidResponse(String),

    #[error("the model did not return any ideas")]
    NoIdeas,
}

/// How new ideas combine with a node's existing children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandMode {
    /// Previous AI children (and their subtrees) are replaced
    #[default]
    Replace,
    /// New ideas are appended after whatever is there
    Append,
}

/// Build the decomposition prompt for a topic
pub fn build_prompt(topic: &str, language: &str, min_ideas: usize, max_ideas: usize) -> String {
    format!(
        "Break the topic \"{topic}\" down into more specific elements. \
         Answer with {min_ideas} to {max_ideas} elements as a JSON array of strings, \
         like [\"element 1\", \"element 2\", ...], written in {language}."
    )
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Schema,
}

#[derive(Debug, Serialize)]
struct Schema {
    #[serde(rename = "type")]
    schema_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Box<Schema>>,
}

impl GenerateRequest {
    fn for_prompt(prompt: String) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: Schema {
                    schema_type: "ARRAY",
                    items: Some(Box::new(Schema {
                        schema_type: "STRING",
                        items: None,
                    })),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Pull the idea list out of a raw `generateContent` response body
pub fn parse_ideas(body: &str, max_ideas: usize) -> Result<Vec<String>, AiError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| AiError::InvalidResponse(e.to_string()))?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| AiError::InvalidResponse("no candidate text".to_string()))?;

    ideas_from_text(&text, max_ideas)
}

/// Parse the model's text payload: a JSON array of strings, possibly
/// wrapped in a Markdown code fence
pub fn ideas_from_text(text: &str, max_ideas: usize) -> Result<Vec<String>, AiError> {
    let raw: Vec<String> = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AiError::InvalidResponse(format!("expected a JSON array of strings: {}", e)))?;

    let ideas: Vec<String> = raw
        .into_iter()
        .map(|idea| idea.trim().to_string())
        .filter(|idea| !idea.is_empty())
        .take(max_ideas)
        .collect();

    if ideas.is_empty() {
        Err(AiError::NoIdeas)
    } else {
        Ok(ideas)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            // drop a language tag such as ```json
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
            rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

/// Keep error bodies readable in a status line
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

// ============================================================================
// Gemini client
// ============================================================================

/// Blocking client for the `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    language: String,
    min_ideas: usize,
    max_ideas: usize,
}

impl GeminiClient {
    /// Build a client, reading the API key from the configured env var
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &AiConfig, api_key: impl Into<String>) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            language: config.language.clone(),
            min_ideas: config.min_ideas,
            max_ideas: config.max_ideas,
        })
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    pub fn prompt_for(&self, topic: &str) -> String {
        build_prompt(topic, &self.language, self.min_ideas, self.max_ideas)
    }
}

impl IdeaSource for GeminiClient {
    fn suggest(&self, topic: &str) -> Result<Vec<String>, AiError> {
        let request = GenerateRequest::for_prompt(self.prompt_for(topic));
        tracing::debug!(model = %self.model, topic, "requesting ideas");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "model API error");
            return Err(AiError::Status {
                code: status.as_u16(),
                body: truncate(body.trim(), 200),
            });
        }

        let ideas = parse_ideas(&body, self.max_ideas)?;
        tracing::info!(count = ideas.len(), "received ideas");
        Ok(ideas)
    }
}

/// Ask `source` for ideas about node `id` and attach them as AI children.
/// On any failure the tree is left untouched.
pub fn expand_node(
    tree: &mut LogicTree,
    id: &NodeId,
    source: &dyn IdeaSource,
    mode: ExpandMode,
) -> crate::Result<Vec<NodeId>> {
    let topic = tree
        .find(id)
        .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?
        .text
        .clone();

    let ideas = source.suggest(&topic)?;
    let ids = apply_ideas(tree, id, &ideas, mode)?;
    tracing::info!(node = %id, added = ids.len(), ?mode, "expanded node");
    Ok(ids)
}

/// Attach already-fetched ideas to a node. Fails with `NoIdeas`, leaving the
/// tree alone, when every idea is blank.
pub fn apply_ideas(tree: &mut LogicTree, id: &NodeId, ideas: &[String], mode: ExpandMode) -> crate::Result<Vec<NodeId>> {
    if !tree.contains(id) {
        return Err(TreeError::NodeNotFound(id.clone()).into());
    }
    if ideas.iter().all(|idea| idea.trim().is_empty()) {
        return Err(AiError::NoIdeas.into());
    }
    let ids = match mode {
        ExpandMode::Replace => tree.replace_ai_children(id, ideas)?,
        ExpandMode::Append => tree.append_ai_children(id, ideas)?,
    };
    Ok(ids)
}
