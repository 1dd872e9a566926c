use crate::error::{ConsoleError, Result};
use crate::prediction::{EntityMatch, Prediction};
use async_trait::async_trait;

/// Seam to the external NLU server. The batch evaluator only sees this trait,
/// so tests inject a scripted predictor instead of a live server.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, text: &str) -> Result<Prediction>;
}

/// HTTP client for a Rasa-style NLU server (`POST {base_url}/model/parse`).
pub struct HttpPredictor {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPredictor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Pull the prediction fields out of the server's parse response.
    ///
    /// Expected shape:
    /// `{"intent": {"name": ..., "confidence": ...}, "entities": [...]}`.
    /// Missing confidence is treated as 0; an unexpected shape is a predictor
    /// error, not a panic.
    fn parse_response(payload: serde_json::Value) -> Result<Prediction> {
        let intent = payload.get("intent").ok_or_else(|| {
            ConsoleError::Predictor("parse response has no 'intent' field".to_string())
        })?;

        let intent_label = intent
            .get("name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let confidence = intent
            .get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        let entities = payload
            .get("entities")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|e| {
                        Some(EntityMatch {
                            entity_type: e.get("entity")?.as_str()?.to_string(),
                            value: e
                                .get("value")
                                .map(|v| match v {
                                    serde_json::Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                })
                                .unwrap_or_default(),
                            start_offset: e.get("start")?.as_u64()? as usize,
                            end_offset: e.get("end")?.as_u64()? as usize,
                            confidence: e
                                .get("confidence_entity")
                                .or_else(|| e.get("confidence"))
                                .and_then(|v| v.as_f64())
                                .unwrap_or(0.0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Prediction {
            intent_label,
            confidence,
            entities,
            raw_payload: payload,
        })
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, text: &str) -> Result<Prediction> {
        let url = format!("{}/model/parse", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "text": text }));
        if let Some(token) = &self.token {
            request = request.query(&[("token", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConsoleError::Predictor(format!("NLU server call failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ConsoleError::Predictor(format!(
                "NLU server returned {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ConsoleError::Predictor(format!("invalid parse response: {}", e)))?;

        Self::parse_response(payload)
    }
}
