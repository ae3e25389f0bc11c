//! Recording adapter for the `ImageEditor` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::adapters::{EDIT_METHOD, IMAGE_EDITOR_PORT};
use crate::cassette::recorder::CassetteRecorder;
use crate::error::EditError;
use crate::ports::image_editor::{EditFuture, EditRequest, ImageEditor, Part};

/// Records edit interactions while delegating to an inner implementation.
pub struct RecordingImageEditor {
    inner: Box<dyn ImageEditor>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingImageEditor {
    /// Wrap `inner`, recording every call into `recorder`.
    pub fn new(inner: Box<dyn ImageEditor>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

/// What a cassette keeps of a request. The source image is summarized, not stored.
#[derive(Debug, Serialize)]
struct RecordedInput<'a> {
    model: &'a str,
    prompt: Option<&'a str>,
    image_mime_type: Option<&'a str>,
    image_base64_len: usize,
}

impl<'a> From<&'a EditRequest> for RecordedInput<'a> {
    fn from(request: &'a EditRequest) -> Self {
        let prompt = request.parts.iter().find_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        });
        let image = request.parts.iter().find_map(Part::as_inline_image);
        Self {
            model: &request.model,
            prompt,
            image_mime_type: image.map(|i| i.mime_type.as_str()),
            image_base64_len: image.map_or(0, |i| i.data.len()),
        }
    }
}

impl ImageEditor for RecordingImageEditor {
    fn edit(&self, request: &EditRequest) -> EditFuture<'_> {
        let request = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.edit(&request).await;
            let input = RecordedInput::from(&request);
            let recorded = result.as_ref().map_err(EditError::message);
            record_result(&recorder, IMAGE_EDITOR_PORT, EDIT_METHOD, &input, &recorded);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::image_editor::ReplayingImageEditor;
    use crate::cassette::config::load_cassette;
    use crate::ingest::ingest_bytes;
    use crate::ports::image_editor::GenerateContentResponse;

    struct Failing;

    impl ImageEditor for Failing {
        fn edit(&self, _request: &EditRequest) -> EditFuture<'_> {
            Box::pin(async { Err(EditError::Generation("ECONNRESET".into())) })
        }
    }

    struct Empty;

    impl ImageEditor for Empty {
        fn edit(&self, _request: &EditRequest) -> EditFuture<'_> {
            Box::pin(async { Ok(GenerateContentResponse::default()) })
        }
    }

    fn request() -> EditRequest {
        let asset = ingest_bytes(&[1, 2, 3, 4], "image/png").unwrap();
        EditRequest::new("gemini-2.5-flash-image", &asset, "remove background")
    }

    #[tokio::test]
    async fn records_ok_and_err_without_image_bytes() {
        let dir = std::env::temp_dir().join("pixelperfect_recording_adapter_test");
        let path = dir.join("rec.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "rec", "abc")));

        let ok = RecordingImageEditor::new(Box::new(Empty), Arc::clone(&recorder));
        let err = RecordingImageEditor::new(Box::new(Failing), Arc::clone(&recorder));
        assert!(ok.edit(&request()).await.is_ok());
        assert!(err.edit(&request()).await.is_err());
        drop((ok, err));

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        assert_eq!(recorder.interaction_count(), 2);
        recorder.finish().unwrap();

        let yaml = std::fs::read_to_string(&path).unwrap();
        assert!(yaml.contains("remove background"));
        assert!(yaml.contains("image_base64_len: 8"));
        assert!(yaml.contains("ECONNRESET"));
        assert!(!yaml.contains("AQIDBA=="));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn recorded_failure_replays_identically() {
        let dir = std::env::temp_dir().join("pixelperfect_record_then_replay_test");
        let path = dir.join("fail.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "fail", "abc")));

        let live = RecordingImageEditor::new(Box::new(Failing), Arc::clone(&recorder));
        let live_err = live.edit(&request()).await.unwrap_err();
        drop(live);
        Arc::try_unwrap(recorder).unwrap().into_inner().unwrap().finish().unwrap();

        let replayer = load_cassette(&path).unwrap();
        let replay = ReplayingImageEditor::new(Arc::new(Mutex::new(replayer)));
        let replay_err = replay.edit(&request()).await.unwrap_err();

        assert_eq!(replay_err.to_string(), live_err.to_string());
        assert_eq!(replay_err.to_string(), "Generation failed: ECONNRESET");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
