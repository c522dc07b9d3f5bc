use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::Trend;

/// The analyzer's scoring fields, all optional on the wire. Defaults are
/// filled in by `normalize_analysis`, never here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisPayload {
    pub engagement_score: Option<f64>,
    pub raw_score: Option<f64>,
    pub component_scores: Option<HashMap<String, f64>>,
    pub trend: Option<Trend>,
    pub history: Option<Vec<f64>>,
}

/// Tagged result of an analyze call. Transport errors, HTTP errors, and
/// `success: false` bodies all collapse into `Failure` so callers have a
/// single fallback path.
#[derive(Debug, Clone)]
pub enum AnalyzeOutcome {
    Success(AnalysisPayload),
    Failure { message: String },
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    success: bool,
    #[serde(flatten)]
    payload: AnalysisPayload,
    #[serde(default)]
    message: Option<String>,
}

/// Boundary to the external engagement analyzer. The polling loop only
/// sees this trait; tests substitute mocks.
#[async_trait]
pub trait AnalyzerApi: Send + Sync {
    /// Probe service availability. Never fails, only reports.
    async fn check_status(&self) -> bool;

    /// Initialize an analyzer session for the given classroom context
    /// ("lecture", "interactive", "exam").
    async fn initialize(&self, context: &str) -> Result<(), String>;

    /// Score one captured frame (a `data:image/jpeg;base64,...` URI).
    async fn analyze(&self, image: &str) -> AnalyzeOutcome;
}

/// reqwest-backed client for the analyzer HTTP API.
#[derive(Debug, Clone)]
pub struct AnalyzerClient {
    base_url: String,
    http: reqwest::Client,
}

impl AnalyzerClient {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:5000/api`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AnalyzerApi for AnalyzerClient {
    async fn check_status(&self) -> bool {
        match self.http.get(self.url("/status")).send().await {
            Ok(response) => match response.json::<StatusResponse>().await {
                Ok(status) => status.success,
                Err(e) => {
                    warn!("Analyzer status response unreadable: {}", e);
                    false
                }
            },
            Err(e) => {
                warn!("Analyzer status check failed: {}", e);
                false
            }
        }
    }

    async fn initialize(&self, context: &str) -> Result<(), String> {
        let response = self
            .http
            .post(self.url("/initialize"))
            .json(&serde_json::json!({ "context": context }))
            .send()
            .await
            .map_err(|e| format!("Initialize request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Initialize returned HTTP {}", response.status()));
        }

        let body: InitializeResponse = response
            .json()
            .await
            .map_err(|e| format!("Initialize response unreadable: {}", e))?;

        if body.success {
            Ok(())
        } else {
            Err(body
                .message
                .unwrap_or_else(|| "Analyzer rejected initialization".to_string()))
        }
    }

    async fn analyze(&self, image: &str) -> AnalyzeOutcome {
        let response = match self
            .http
            .post(self.url("/analyze"))
            .json(&serde_json::json!({ "image": image }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return AnalyzeOutcome::Failure {
                    message: format!("Analyze request failed: {}", e),
                }
            }
        };

        if !response.status().is_success() {
            return AnalyzeOutcome::Failure {
                message: format!("API error: {}", response.status()),
            };
        }

        let body: AnalyzeResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return AnalyzeOutcome::Failure {
                    message: format!("Analyze response unreadable: {}", e),
                }
            }
        };

        if body.success {
            AnalyzeOutcome::Success(body.payload)
        } else {
            AnalyzeOutcome::Failure {
                message: body
                    .message
                    .unwrap_or_else(|| "Analyzer returned failure".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_response_tolerates_missing_fields() {
        let body: AnalyzeResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(body.success);
        assert!(body.payload.engagement_score.is_none());
        assert!(body.payload.component_scores.is_none());
        assert!(body.payload.history.is_none());
    }

    #[test]
    fn analyze_response_parses_full_shape() {
        let body: AnalyzeResponse = serde_json::from_str(
            r#"{
                "success": true,
                "engagement_score": 82,
                "raw_score": 79.5,
                "component_scores": {"attention": 0.9, "gaze": 0.6},
                "trend": "increasing",
                "history": [70, 74, 82]
            }"#,
        )
        .unwrap();
        assert_eq!(body.payload.engagement_score, Some(82.0));
        assert_eq!(body.payload.trend, Some(Trend::Increasing));
        assert_eq!(body.payload.history.as_deref(), Some(&[70.0, 74.0, 82.0][..]));
    }

    #[test]
    fn failure_body_carries_its_message() {
        let body: AnalyzeResponse =
            serde_json::from_str(r#"{"success": false, "message": "no face detected"}"#).unwrap();
        assert!(!body.success);
        assert_eq!(body.message.as_deref(), Some("no face detected"));
    }

    #[test]
    fn empty_body_defaults_to_failure() {
        let body: StatusResponse = serde_json::from_str("{}").unwrap();
        assert!(!body.success);
    }
}
