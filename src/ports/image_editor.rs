//! Image editor port for multimodal generation APIs.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::ingest::ImageAsset;

/// Output modality requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    /// Image output.
    Image,
    /// Text output.
    Text,
}

/// Base64 payload tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the payload (e.g. `"image/png"`).
    pub mime_type: String,
    /// Standard base64 without any prefix.
    pub data: String,
}

/// One element of a content parts list, on requests and responses alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Inline binary image data.
    InlineImage {
        /// The image payload.
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// Any part kind this crate does not interpret.
    Other(serde_json::Value),
}

impl Part {
    /// The inline image payload, if this part carries one.
    #[must_use]
    pub fn as_inline_image(&self) -> Option<&InlineData> {
        match self {
            Self::InlineImage { inline_data } if !inline_data.data.is_empty() => Some(inline_data),
            _ => None,
        }
    }
}

/// A request to edit one image with one instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    /// The resolved model identifier (e.g. `"gemini-2.5-flash-image"`).
    pub model: String,
    /// Ordered content parts: the source image, then the prompt.
    pub parts: Vec<Part>,
    /// Output modalities requested from the service.
    pub response_modalities: Vec<Modality>,
}

impl EditRequest {
    /// Build the two-part request for `image` and `prompt`, asking for image output.
    #[must_use]
    pub fn new(model: impl Into<String>, image: &ImageAsset, prompt: &str) -> Self {
        Self {
            model: model.into(),
            parts: vec![
                Part::InlineImage {
                    inline_data: InlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    },
                },
                Part::Text { text: prompt.to_string() },
            ],
            response_modalities: vec![Modality::Image],
        }
    }
}

/// Content of a single candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One alternative output for a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The candidate content.
    #[serde(default)]
    pub content: Content,
    /// Why generation stopped (e.g. `"STOP"`, `"IMAGE_SAFETY"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// The service's answer to a `generateContent` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    /// Alternative outputs; only the first is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Boxed future type returned by [`ImageEditor::edit`].
pub type EditFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GenerateContentResponse, EditError>> + Send + 'a>>;

/// Sends edit requests to an external generation service.
pub trait ImageEditor: Send + Sync {
    /// Issue exactly one call for `request` and return the raw response.
    fn edit(&self, request: &EditRequest) -> EditFuture<'_>;
}
