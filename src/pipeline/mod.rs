//! Document pipeline decision layer.
//!
//! # Architecture
//!
//! ```text
//! HostEvent -> Agent -> EventClassifier --+--> DocumentConverter   (*.pdf, *.docx, ...)
//!                                         +--> ChunkCombiner       (chunk_NNN.output.md)
//!                                         +--> MarkdownChunker     (*.md)
//! ```
//!
//! The converter and chunker are collaborators behind traits. The combiner is
//! the fan-in half of the chunk workflow and decides readiness from file
//! modification times alone.

mod agent;
mod chunker;
mod classifier;
mod collaborators;
mod combiner;
mod error;
pub mod naming;

pub use agent::{Agent, RunStats};
pub use chunker::{ParagraphChunker, split_markdown};
pub use classifier::{EventClassifier, Route};
pub use collaborators::{ChunkPlan, CommandConverter, DocumentConverter, MarkdownChunker};
pub use combiner::{ChunkCombiner, Readiness, WaitReason, combine_job};
pub use error::CombineError;
