//! Service context: picks the live, recording or replaying editor for a run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::gemini::GeminiEditor;
use crate::adapters::recording::image_editor::RecordingImageEditor;
use crate::adapters::replaying::image_editor::ReplayingImageEditor;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::{Config, API_KEY_ENV_VARS};
use crate::error::EditError;
use crate::ports::ImageEditor;

/// Where recordings are written, relative to the working directory.
const CASSETTE_DIR: &str = ".pixelperfect/cassettes";

/// Bundles the port trait objects for one run.
pub struct ServiceContext {
    /// Image editor port.
    pub editor: Box<dyn ImageEditor>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write the cassette to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor still holds the recorder or the file
    /// cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        tracing::debug!(interactions = recorder.interaction_count(), "writing cassette");
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// A context that calls the Gemini API.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::MissingApiKey`] if no key is configured.
    pub fn live(config: &Config) -> Result<Self, EditError> {
        let key = config
            .gemini_key()
            .ok_or_else(|| EditError::MissingApiKey { env_var: API_KEY_ENV_VARS[0].into() })?;
        Ok(Self { editor: Box::new(GeminiEditor::new(key)) })
    }

    /// A live context whose calls are also written to a new cassette.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::MissingApiKey`] if no key is configured.
    pub fn recording(config: &Config) -> Result<(Self, RecordingSession), EditError> {
        let live = Self::live(config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(CASSETTE_DIR).join(&timestamp).join("image_editor.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-image_editor"),
            commit_hash(),
        )));

        let editor = RecordingImageEditor::new(live.editor, Arc::clone(&recorder));
        Ok((Self { editor: Box::new(editor) }, RecordingSession { recorder }))
    }

    /// A context that serves responses from a cassette file. No API key is needed.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Config`] if the cassette cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, EditError> {
        let replayer = load_cassette(path).map_err(EditError::Config)?;
        let editor = ReplayingImageEditor::new(Arc::new(Mutex::new(replayer)));
        Ok(Self { editor: Box::new(editor) })
    }
}

/// The current git commit, or `"unknown"` outside a repository.
fn commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
