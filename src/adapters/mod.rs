//! Adapter implementations for port traits.
//!
//! - `live/` - Real API implementations
//! - `recording/` - Record interactions to cassettes
//! - `replaying/` - Replay interactions from cassettes

pub mod live;
pub mod recording;
pub mod replaying;

/// Port name used for [`crate::ports::ImageEditor`] interactions in cassettes.
pub(crate) const IMAGE_EDITOR_PORT: &str = "image_editor";

/// Method name used for [`crate::ports::ImageEditor::edit`] in cassettes.
pub(crate) const EDIT_METHOD: &str = "edit";
