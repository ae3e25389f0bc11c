//! Prompt-driven image editing on top of Gemini image models.
//!
//! An image is ingested into an [`ingest::ImageAsset`], held in a
//! [`session::SessionStore`], and sent with an instruction through an
//! [`pipeline::EditPipeline`], which talks to the service via the
//! [`ports::ImageEditor`] port.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod ingest;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod ports;
pub mod session;

pub use error::EditError;
pub use ingest::ImageAsset;
pub use pipeline::{EditPipeline, EditResult};
pub use session::{RequestState, SessionState, SessionStore};
