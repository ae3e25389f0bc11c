//! Unified error type for pixelperfect.

use thiserror::Error;

/// Errors that can occur while ingesting an image or generating an edit.
#[derive(Debug, Error)]
pub enum EditError {
    /// The selected file does not declare an image content type.
    #[error("Unsupported input: expected an image file, got '{mime_type}'")]
    UnsupportedInput {
        /// The declared MIME type of the rejected file.
        mime_type: String,
    },

    /// The input could not be read or decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The generation service returned no candidates.
    #[error("The service returned no candidates")]
    EmptyResponse,

    /// The first candidate carried no inline image data.
    #[error("No image data found in the response")]
    NoImageInResponse,

    /// Transport or service failure, including timeouts.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// An edit was triggered without an image or prompt.
    #[error("Cannot start edit: {0}")]
    InvalidState(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// No API key configured.
    #[error("No Gemini API key. Set {env_var} or add it to the config file.")]
    MissingApiKey {
        /// The environment variable name.
        env_var: String,
    },
}

impl EditError {
    /// The bare message, without the variant's display prefix.
    ///
    /// Replaying a cassette rebuilds a [`EditError::Generation`] from this text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Generation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for EditError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Generation("timeout".into())
        } else {
            Self::Generation(err.to_string())
        }
    }
}
