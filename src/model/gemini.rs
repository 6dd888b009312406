//! Google Gemini chat over the `generateContent` REST endpoint.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ChatModel, ChatModelFactory, ModelResponse, TurnInput};
use crate::error::{CompassError, Result};
use crate::http::{shared_client, status_to_error};
use crate::tools::ToolDeclaration;
use crate::types::ToolInvocationRequest;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Response recorded for a function call whose turn ended before it was answered.
pub const ABANDONED_CALL_TEXT: &str = "Turn ended before this call was answered.";

/// Builds [`GeminiChat`]s sharing one API key and model.
#[derive(Debug, Clone)]
pub struct GeminiChatFactory {
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatFactory {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatModelFactory for GeminiChatFactory {
    fn create_chat(
        &self,
        instructions: &str,
        tools: &[ToolDeclaration],
    ) -> Result<Arc<dyn ChatModel>> {
        if self.api_key.trim().is_empty() {
            return Err(CompassError::Configuration(
                "Gemini API key is not set".to_string(),
            ));
        }
        Ok(Arc::new(GeminiChat {
            factory: self.clone(),
            instructions: instructions.to_string(),
            declarations: tools
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<_, _>>()?,
            history: Mutex::new(Vec::new()),
        }))
    }
}

/// One Gemini conversation. History is kept client-side and resent each turn.
pub struct GeminiChat {
    factory: GeminiChatFactory,
    instructions: String,
    declarations: Vec<serde_json::Value>,
    history: Mutex<Vec<serde_json::Value>>,
}

impl std::fmt::Debug for GeminiChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiChat")
            .field("model", &self.factory.model)
            .field("history_len", &self.history_snapshot().len())
            .finish()
    }
}

impl GeminiChat {
    fn history_snapshot(&self) -> Vec<serde_json::Value> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn user_parts(input: &TurnInput) -> Vec<serde_json::Value> {
        match input {
            TurnInput::Text(text) => vec![json!({ "text": text })],
            TurnInput::ToolResults(results) => results
                .iter()
                .map(|r| function_response(Some(&r.id), &r.name, r.response_payload()))
                .collect(),
        }
    }

    /// Request contents for `input` on top of `history`.
    ///
    /// An aborted turn can leave history ending in function calls nobody
    /// answered, or in function responses the model never replied to. Gemini
    /// rejects both shapes followed by a new user content, so unanswered calls
    /// get an error response and the new parts join a trailing user content.
    fn compose_contents(
        history: &[serde_json::Value],
        input: &TurnInput,
    ) -> Vec<serde_json::Value> {
        let mut contents = history.to_vec();
        let mut parts = Self::user_parts(input);

        if let Some(last) = contents.last().filter(|c| role_of(c) == Some("model")) {
            let answered: Vec<&str> = parts
                .iter()
                .filter_map(|p| p["functionResponse"]["id"].as_str())
                .collect();
            let mut filled: Vec<serde_json::Value> = function_calls(last)
                .filter(|(id, _)| id.map_or(true, |id| !answered.contains(&id)))
                .map(|(id, name)| {
                    function_response(id, name, json!({ "result": { "error": ABANDONED_CALL_TEXT } }))
                })
                .collect();
            if !filled.is_empty() {
                debug!(unanswered = filled.len(), "answering abandoned function calls");
                filled.append(&mut parts);
                parts = filled;
            }
        }

        match contents.last_mut() {
            Some(last) if role_of(last) == Some("user") => {
                if let Some(existing) = last["parts"].as_array_mut() {
                    existing.append(&mut parts);
                } else {
                    last["parts"] = json!(parts);
                }
            }
            _ => contents.push(json!({ "role": "user", "parts": parts })),
        }
        contents
    }

    fn build_request_body(&self, contents: &[serde_json::Value]) -> serde_json::Value {
        let mut body = json!({
            "contents": contents,
            "systemInstruction": { "parts": [{ "text": self.instructions }] },
        });
        if !self.declarations.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": self.declarations }]);
        }
        body
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn send(&self, input: TurnInput) -> Result<ModelResponse> {
        let contents = Self::compose_contents(&self.history_snapshot(), &input);
        let result = self.generate(&contents).await;

        let mut history = self
            .history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match result {
            Ok((response, content)) => {
                *history = contents;
                history.push(content);
                Ok(response)
            }
            Err(err) => {
                // Tool results may report committed mutations; keep them so
                // the next turn tells the model what already happened.
                if matches!(input, TurnInput::ToolResults(_)) {
                    *history = contents;
                }
                Err(err)
            }
        }
    }
}

impl GeminiChat {
    async fn generate(
        &self,
        contents: &[serde_json::Value],
    ) -> Result<(ModelResponse, serde_json::Value)> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.factory.base_url, self.factory.model, self.factory.api_key
        );
        debug!(model = %self.factory.model, turns = contents.len(), "Gemini generateContent");

        let resp = shared_client()
            .post(&url)
            .json(&self.build_request_body(contents))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: GeminiResponse = resp.json().await?;
        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| CompassError::api(200, "No candidates in Gemini response"))?;
        let response = parse_candidate(&candidate.content)?;
        Ok((response, candidate.content))
    }
}

fn role_of(content: &serde_json::Value) -> Option<&str> {
    content.get("role").and_then(serde_json::Value::as_str)
}

/// `(id, name)` of every function call part in a model content.
fn function_calls(
    content: &serde_json::Value,
) -> impl Iterator<Item = (Option<&str>, &str)> + '_ {
    content["parts"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|part| {
            let call = part.get("functionCall")?;
            Some((call["id"].as_str(), call["name"].as_str()?))
        })
}

fn function_response(
    id: Option<&str>,
    name: &str,
    response: serde_json::Value,
) -> serde_json::Value {
    let mut body = json!({ "name": name, "response": response });
    if let Some(id) = id {
        body["id"] = json!(id);
    }
    json!({ "functionResponse": body })
}

fn parse_candidate(content: &serde_json::Value) -> Result<ModelResponse> {
    let parts: Vec<GeminiPart> = match content.get("parts") {
        Some(parts) => serde_json::from_value(parts.clone())?,
        None => Vec::new(),
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(fc) = part.function_call {
            tool_calls.push(ToolInvocationRequest::new(
                fc.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                fc.name,
                fc.args.unwrap_or_else(|| json!({})),
            ));
        }
    }

    Ok(ModelResponse {
        text: (!text.trim().is_empty()).then_some(text),
        tool_calls,
    })
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    id: Option<String>,
    name: String,
    args: Option<serde_json::Value>,
}
