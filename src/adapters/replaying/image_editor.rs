//! Replaying adapter for the `ImageEditor` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::adapters::{EDIT_METHOD, IMAGE_EDITOR_PORT};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::EditError;
use crate::ports::image_editor::{EditFuture, EditRequest, GenerateContentResponse, ImageEditor};

/// Serves recorded edit responses from a cassette.
pub struct ReplayingImageEditor {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingImageEditor {
    /// Create a replaying editor backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl ImageEditor for ReplayingImageEditor {
    fn edit(&self, request: &EditRequest) -> EditFuture<'_> {
        tracing::debug!(model = %request.model, "replaying edit from cassette");
        let result = next_output(&self.replayer, IMAGE_EDITOR_PORT, EDIT_METHOD)
            .and_then(replay_result::<GenerateContentResponse>)
            .map_err(EditError::Generation);
        Box::pin(async move { result })
    }
}
