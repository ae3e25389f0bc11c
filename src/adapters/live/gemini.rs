//! Live adapter for the Gemini `generateContent` API.

use reqwest::Client;
use serde::Serialize;

use crate::error::EditError;
use crate::ports::image_editor::{
    EditFuture, EditRequest, GenerateContentResponse, ImageEditor, Modality, Part,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 500;

/// Live Gemini image editor that calls the Google AI API.
///
/// Holds one `reqwest::Client` for the life of the process.
pub struct GeminiEditor {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiEditor {
    /// Create a new Gemini editor with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self { client: Client::new(), api_key, base_url: GEMINI_API_BASE.to_string() }
    }
}

impl ImageEditor for GeminiEditor {
    fn edit(&self, request: &EditRequest) -> EditFuture<'_> {
        let url = format!("{}/{}:generateContent", self.base_url, request.model);
        let body = WireRequest::from(request);
        let body = serde_json::to_value(&body)
            .map_err(|e| EditError::Generation(format!("Failed to encode request: {e}")));

        Box::pin(async move {
            let body = body?;
            tracing::debug!(%url, "sending generateContent request");

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let response_text = response.text().await?;

            if !status.is_success() {
                tracing::warn!(status = status.as_u16(), "generateContent returned an error");
                return Err(EditError::Generation(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    truncate(&response_text)
                )));
            }

            serde_json::from_str::<GenerateContentResponse>(&response_text).map_err(|e| {
                EditError::Generation(format!(
                    "Failed to parse response: {e}. Body: {}",
                    truncate(&response_text)
                ))
            })
        })
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

// --- Gemini API request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: [WireContent<'a>; 1],
    generation_config: WireGenerationConfig<'a>,
}

#[derive(Serialize)]
struct WireContent<'a> {
    parts: &'a [Part],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    response_modalities: &'a [Modality],
}

impl<'a> From<&'a EditRequest> for WireRequest<'a> {
    fn from(request: &'a EditRequest) -> Self {
        Self {
            contents: [WireContent { parts: &request.parts }],
            generation_config: WireGenerationConfig {
                response_modalities: &request.response_modalities,
            },
        }
    }
}
