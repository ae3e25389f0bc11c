//! Live adapters that talk to real APIs.

pub mod gemini;
