//! Record/replay of editor interactions for network-free runs.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
