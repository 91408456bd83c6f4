//! Dialogflow ES (v2) NLU backend
//!
//! The leading personality trait is sent as a one-turn input context, so the
//! agent can keep a persona-specific set of intents per trait.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{status_error, transport_error, Error, HttpConfig, IntentDetector, Result};

const DIALOGFLOW_API_BASE: &str = "https://dialogflow.googleapis.com/v2";
const SERVICE: &str = "Dialogflow";

/// Dialogflow API client bound to one agent session
pub struct DialogflowClient {
    client: reqwest::Client,
    access_token: String,
    project_id: String,
    session_id: String,
    base_url: String,
}

impl DialogflowClient {
    /// Create for a project with an OAuth access token
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(project_id, access_token, DIALOGFLOW_API_BASE)
    }

    /// Create from `DIALOGFLOW_PROJECT_ID` and `GOOGLE_ACCESS_TOKEN`
    pub fn from_env() -> Result<Self> {
        let project_id = std::env::var("DIALOGFLOW_PROJECT_ID")
            .map_err(|_| Error::config("DIALOGFLOW_PROJECT_ID not set"))?;
        let access_token = std::env::var("GOOGLE_ACCESS_TOKEN")
            .map_err(|_| Error::ProviderAuth("GOOGLE_ACCESS_TOKEN not set".to_string()))?;
        Self::new(project_id, access_token)
    }

    /// Create against a custom endpoint
    pub fn with_base_url(
        project_id: impl Into<String>,
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = HttpConfig::default().build_client()?;
        Ok(Self {
            client,
            access_token: access_token.into(),
            project_id: project_id.into(),
            session_id: emotive_core::affect::DEFAULT_SESSION.to_string(),
            base_url: base_url.into(),
        })
    }

    /// Use a specific Dialogflow session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// `projects/<project>/agent/sessions/<session>`
    pub fn session_path(&self) -> String {
        format!(
            "projects/{}/agent/sessions/{}",
            self.project_id, self.session_id
        )
    }

    /// Input context name for a personality trait
    pub fn context_path(&self, context: &str) -> String {
        format!("{}/contexts/{}", self.session_path(), context)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.access_token))
                .map_err(|_| Error::ProviderAuth("access token is not a valid header value".to_string()))?,
        );
        Ok(headers)
    }

    /// Display names of every intent defined in the agent
    pub async fn list_intents(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!(
                    "{}/projects/{}/agent/intents",
                    self.base_url, self.project_id
                ))
                .headers(self.build_headers()?);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await.map_err(|e| transport_error(SERVICE, e))?;
            if !response.status().is_success() {
                return Err(status_error(SERVICE, response).await);
            }

            let page: ListIntentsResponse = response
                .json()
                .await
                .map_err(|e| Error::Provider(format!("Failed to parse intent list: {}", e)))?;
            names.extend(page.intents.into_iter().map(|i| i.display_name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(names)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentRequest<'a> {
    query_input: QueryInput<'a>,
    query_params: QueryParams,
}

#[derive(Debug, Serialize)]
struct QueryInput<'a> {
    text: TextInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextInput<'a> {
    text: &'a str,
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
struct QueryParams {
    contexts: Vec<Context>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Context {
    name: String,
    lifespan_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentResponse {
    query_result: Option<QueryResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryResult {
    fulfillment_text: String,
    intent: Option<IntentRef>,
    intent_detection_confidence: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntentRef {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListIntentsResponse {
    #[serde(default)]
    intents: Vec<IntentRef>,
    next_page_token: Option<String>,
}

#[async_trait]
impl IntentDetector for DialogflowClient {
    async fn detect_intent(&self, text: &str, language: &str, context: &str) -> Result<String> {
        let request = DetectIntentRequest {
            query_input: QueryInput {
                text: TextInput {
                    text,
                    language_code: language,
                },
            },
            query_params: QueryParams {
                contexts: vec![Context {
                    name: self.context_path(context),
                    lifespan_count: 1,
                }],
            },
        };

        debug!(session = %self.session_path(), context, "Dialogflow detectIntent");
        let response = self
            .client
            .post(format!("{}/{}:detectIntent", self.base_url, self.session_path()))
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await);
        }

        let body: DetectIntentResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse detectIntent response: {}", e)))?;
        let result = body
            .query_result
            .ok_or_else(|| Error::Provider("detectIntent returned no query result".to_string()))?;

        info!(
            intent = result.intent.as_ref().map(|i| i.display_name.as_str()).unwrap_or(""),
            confidence = result.intent_detection_confidence,
            "Intent detected"
        );
        Ok(result.fulfillment_text)
    }

    fn name(&self) -> &'static str {
        "dialogflow"
    }
}
