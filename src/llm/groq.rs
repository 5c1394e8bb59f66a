use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::{FragmentReceiver, LlmProvider};
use super::types::ChatRequest;
use crate::core::errors::ApiError;

const PROVIDER: &str = "groq";
const STREAM_BUFFER: usize = 32;

/// OpenAI-compatible chat completions client (Groq by default).
#[derive(Clone)]
pub struct GroqProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GroqProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    async fn post_completion(&self, body: &Value) -> Result<reqwest::Response, ApiError> {
        let res = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::provider(PROVIDER, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::provider(
                PROVIDER,
                format!("chat completion failed ({}): {}", status, text),
            ));
        }
        Ok(res)
    }
}

fn completion_body(request: &ChatRequest, model_id: &str, stream: bool) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
        "stream": stream,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(temperature) = request.temperature {
            obj.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            obj.insert("max_tokens".to_string(), json!(max_tokens));
        }
        if let Some(stop) = &request.stop {
            obj.insert("stop".to_string(), json!(stop));
        }
    }
    body
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let body = completion_body(&request, model_id, false);
        let res = self.post_completion(&body).await?;

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::provider(PROVIDER, e))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ApiError::provider(PROVIDER, "response carried no message content"))
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
        model_id: &str,
    ) -> Result<FragmentReceiver, ApiError> {
        let body = completion_body(&request, model_id, true);
        let res = self.post_completion(&body).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(item) = stream.next().await {
                let bytes = match item {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(ApiError::provider(PROVIDER, e))).await;
                        return;
                    }
                };
                buffer.extend_from_slice(&bytes);
                let events = match drain_sse_events(&mut buffer) {
                    Ok(events) => events,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                };
                for event in events {
                    match event {
                        SseEvent::Done => return,
                        SseEvent::Delta(content) => {
                            // receiver gone: stop reading and drop the connection
                            if tx.send(Ok(content)).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum SseEvent {
    Delta(String),
    Done,
}

/// Consumes every complete line in `buffer`, leaving a trailing partial line
/// in place for the next network chunk. Lines are decoded only once complete,
/// so a multi-byte character split between chunks survives intact.
pub(crate) fn drain_sse_events(buffer: &mut Vec<u8>) -> Result<Vec<SseEvent>, ApiError> {
    let mut events = Vec::new();
    while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=newline).collect();
        let line = String::from_utf8(raw).map_err(|e| ApiError::provider(PROVIDER, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            events.push(SseEvent::Done);
            break;
        }
        if let Ok(json) = serde_json::from_str::<Value>(data) {
            if let Some(content) = json["choices"][0]["delta"]["content"].as_str() {
                if !content.is_empty() {
                    events.push(SseEvent::Delta(content.to_string()));
                }
            }
        }
    }
    Ok(events)
}
