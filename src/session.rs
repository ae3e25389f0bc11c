//! Application state store.
//!
//! [`SessionStore`] owns the single [`SessionState`] of a run. Every mutation
//! goes through its mutex, and edit outcomes are only committed for the most
//! recently issued [`RequestToken`].

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use crate::error::EditError;
use crate::ingest::{ingest_file, ImageAsset};
use crate::pipeline::EditResult;

/// Where the session is in its upload/edit cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RequestState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// An image is being read.
    Uploading,
    /// An edit request is in flight.
    Generating,
    /// The last edit produced a result.
    Succeeded,
    /// The last edit failed; see [`SessionState::last_error`].
    Failed,
}

/// Identifies one edit attempt. Later attempts get larger tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// The uploaded source image.
    pub current_image: Option<ImageAsset>,
    /// The most recent committed edit.
    pub last_result: Option<EditResult>,
    /// The editing instruction as typed.
    pub prompt: String,
    /// Current request state.
    pub request_state: RequestState,
    /// Message of the most recent failure, until superseded.
    pub last_error: Option<String>,
}

/// Whether an outcome was written to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The outcome belonged to the latest request and was stored.
    Applied,
    /// A newer request or upload had started; the outcome was discarded.
    Stale,
}

/// Snapshot handed to the pipeline when an edit begins.
#[derive(Debug)]
pub struct EditTicket {
    /// Token the outcome must be committed with.
    pub token: RequestToken,
    /// The image to edit.
    pub image: ImageAsset,
    /// The trimmed instruction.
    pub prompt: String,
    /// Watches the latest issued token.
    pub latest: watch::Receiver<RequestToken>,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    latest: RequestToken,
}

/// Shared, cheaply cloneable handle to the session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    latest_tx: Arc<watch::Sender<RequestToken>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// An empty, idle session.
    #[must_use]
    pub fn new() -> Self {
        let (latest_tx, _) = watch::channel(RequestToken::default());
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::default(),
                latest: RequestToken::default(),
            })),
            latest_tx: Arc::new(latest_tx),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a new token, invalidating whatever is in flight.
    fn bump(&self, inner: &mut Inner) -> RequestToken {
        inner.latest = RequestToken(inner.latest.0 + 1);
        self.latest_tx.send_replace(inner.latest);
        inner.latest
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Replace the prompt text.
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.lock().state.prompt = prompt.into();
    }

    /// Install a freshly ingested image.
    ///
    /// Clears the previous result and error, resets to [`RequestState::Idle`]
    /// and discards any edit still in flight for the old image.
    pub fn accept_upload(&self, image: ImageAsset) {
        let mut inner = self.lock();
        self.bump(&mut inner);
        let state = &mut inner.state;
        state.current_image = Some(image);
        state.last_result = None;
        state.last_error = None;
        state.request_state = RequestState::Idle;
    }

    /// Ingest `path` and install it.
    ///
    /// On failure the session is left as it was.
    ///
    /// # Errors
    ///
    /// Propagates [`EditError::UnsupportedInput`] and [`EditError::Decode`] from ingestion.
    pub async fn upload_file(&self, path: &Path) -> Result<(), EditError> {
        let previous = {
            let mut inner = self.lock();
            std::mem::replace(&mut inner.state.request_state, RequestState::Uploading)
        };

        match ingest_file(path).await {
            Ok(image) => {
                self.accept_upload(image);
                Ok(())
            }
            Err(e) => {
                let mut inner = self.lock();
                if inner.state.request_state == RequestState::Uploading {
                    inner.state.request_state = previous;
                }
                Err(e)
            }
        }
    }

    /// Drop the image and result, returning to an empty idle session.
    pub fn clear(&self) {
        let mut inner = self.lock();
        self.bump(&mut inner);
        let state = &mut inner.state;
        state.current_image = None;
        state.last_result = None;
        state.last_error = None;
        state.request_state = RequestState::Idle;
    }

    /// Start an edit of the current image with the current prompt.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidState`] if no image is loaded or the prompt is blank.
    pub fn begin_generation(&self) -> Result<EditTicket, EditError> {
        let mut inner = self.lock();
        let image = inner
            .state
            .current_image
            .clone()
            .ok_or_else(|| EditError::InvalidState("no image uploaded".into()))?;
        let prompt = inner.state.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(EditError::InvalidState("prompt is empty".into()));
        }

        let token = self.bump(&mut inner);
        inner.state.request_state = RequestState::Generating;
        inner.state.last_error = None;
        Ok(EditTicket { token, image, prompt, latest: self.latest_tx.subscribe() })
    }

    /// Commit the outcome of the edit started with `token`.
    ///
    /// Failures leave `last_result` untouched.
    pub fn complete(&self, token: RequestToken, outcome: Result<EditResult, EditError>) -> Commit {
        let mut inner = self.lock();
        if token != inner.latest {
            tracing::debug!(%token, latest = %inner.latest, "discarding stale edit outcome");
            return Commit::Stale;
        }

        let state = &mut inner.state;
        match outcome {
            Ok(result) => {
                state.last_result = Some(result);
                state.last_error = None;
                state.request_state = RequestState::Succeeded;
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                state.request_state = RequestState::Failed;
            }
        }
        Commit::Applied
    }
}
