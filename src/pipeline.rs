//! The edit request pipeline: one image, one instruction, one service call.

use std::time::{Duration, Instant};

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::EditError;
use crate::ingest::ImageAsset;
use crate::ports::image_editor::{EditRequest, GenerateContentResponse, ImageEditor, Part};
use crate::session::{Commit, RequestToken, SessionStore};

/// Default bound on a single service call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Every edited image is presented as PNG, whatever the service reports.
pub const EDITED_IMAGE_PREFIX: &str = "data:image/png;base64,";

/// A successfully generated edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    /// `data:image/png;base64,<payload>`.
    pub image_url: String,
    /// When the pipeline produced the result.
    pub created_at: DateTime<Utc>,
}

impl EditResult {
    /// The raw image bytes behind [`EditResult::image_url`].
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Decode`] if the payload is not valid base64.
    pub fn image_bytes(&self) -> Result<Vec<u8>, EditError> {
        let payload = self.image_url.strip_prefix(EDITED_IMAGE_PREFIX).unwrap_or(&self.image_url);
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| EditError::Decode(format!("Edited image is not valid base64: {e}")))
    }
}

/// Submits edits through an injected [`ImageEditor`].
pub struct EditPipeline {
    editor: Box<dyn ImageEditor>,
    model: String,
    timeout: Duration,
}

impl EditPipeline {
    /// Create a pipeline for `model` using the default timeout.
    pub fn new(editor: Box<dyn ImageEditor>, model: impl Into<String>) -> Self {
        Self { editor, model: model.into(), timeout: DEFAULT_TIMEOUT }
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The model identifier requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `image` and `prompt` to the service and wait for the edited image.
    ///
    /// The prompt is expected to be non-blank; callers check that before submitting.
    ///
    /// # Errors
    ///
    /// [`EditError::EmptyResponse`] if no candidates came back,
    /// [`EditError::NoImageInResponse`] if the first candidate has no inline image,
    /// and [`EditError::Generation`] for transport failures and timeouts.
    pub async fn submit_edit(
        &self,
        image: &ImageAsset,
        prompt: &str,
    ) -> Result<EditResult, EditError> {
        let request = EditRequest::new(&self.model, image, prompt);
        let start = Instant::now();

        let response = match tokio::time::timeout(self.timeout, self.editor.edit(&request)).await {
            Ok(response) => response?,
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "edit request timed out");
                return Err(EditError::Generation("timeout".into()));
            }
        };

        let image_url = extract_edited_image(&response)?;
        tracing::debug!(
            model = %self.model,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "edit complete"
        );
        Ok(EditResult { image_url, created_at: Utc::now() })
    }
}

/// Pull the edited image out of a response as a PNG data URL.
///
/// Only the first candidate is considered; within it, the first inline image part wins.
///
/// # Errors
///
/// [`EditError::EmptyResponse`] or [`EditError::NoImageInResponse`].
pub fn extract_edited_image(response: &GenerateContentResponse) -> Result<String, EditError> {
    let candidate = response.candidates.first().ok_or(EditError::EmptyResponse)?;
    let inline = candidate.content.parts.iter().find_map(Part::as_inline_image).ok_or_else(|| {
        if let Some(reason) = &candidate.finish_reason {
            tracing::debug!(finish_reason = %reason, "candidate carried no image");
        }
        EditError::NoImageInResponse
    })?;
    Ok(format!("{EDITED_IMAGE_PREFIX}{}", inline.data))
}

/// Run one edit from the session's current image and prompt and commit the outcome.
///
/// If a newer edit begins, or a new image is uploaded, before this one resolves,
/// the in-flight call is dropped and [`Commit::Stale`] is returned.
///
/// # Errors
///
/// Returns [`EditError::InvalidState`] if the session has no image or a blank prompt.
/// Pipeline failures are not returned here; they are committed to the session.
pub async fn run_tracked_edit(
    store: &SessionStore,
    pipeline: &EditPipeline,
) -> Result<Commit, EditError> {
    let mut ticket = store.begin_generation()?;
    tracing::info!(token = %ticket.token, model = pipeline.model(), "starting edit");

    let outcome = tokio::select! {
        outcome = pipeline.submit_edit(&ticket.image, &ticket.prompt) => outcome,
        () = superseded(&mut ticket.latest, ticket.token) => {
            tracing::info!(token = %ticket.token, "edit superseded, abandoning");
            return Ok(Commit::Stale);
        }
    };

    if let Err(e) = &outcome {
        tracing::warn!(token = %ticket.token, "edit failed: {e}");
    }
    Ok(store.complete(ticket.token, outcome))
}

/// Resolves once the latest token differs from `token`.
async fn superseded(latest: &mut watch::Receiver<RequestToken>, token: RequestToken) {
    loop {
        if *latest.borrow_and_update() != token {
            return;
        }
        if latest.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
