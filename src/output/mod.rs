//! Structured output emission for JSON and streaming consumers.

mod writer;

pub use writer::{FragmentInfo, OutputWriter, RunOutput};
