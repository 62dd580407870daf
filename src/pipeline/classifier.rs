//! Routes file-change events to exactly one pipeline stage.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::bridge::HostBridge;
use crate::config::ConversionConfig;
use crate::event::HostEvent;

use super::collaborators::{ChunkPlan, DocumentConverter, MarkdownChunker};
use super::combiner::ChunkCombiner;
use super::naming;

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Non-markdown document: hand to the converter.
    Convert,
    /// Chunk output arrived: evaluate the job.
    Combine,
    /// Markdown needing a look from the chunker.
    Chunk,
    /// Nothing to do.
    Ignore,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Route::Convert => "convert",
            Route::Combine => "combine",
            Route::Chunk => "chunk",
            Route::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

/// Stateless event router with injected collaborators.
pub struct EventClassifier {
    bridge: Arc<HostBridge>,
    conversion: ConversionConfig,
    converter: Box<dyn DocumentConverter>,
    chunker: Box<dyn MarkdownChunker>,
    combiner: ChunkCombiner,
}

impl EventClassifier {
    pub fn new(
        bridge: Arc<HostBridge>,
        conversion: ConversionConfig,
        converter: Box<dyn DocumentConverter>,
        chunker: Box<dyn MarkdownChunker>,
    ) -> Self {
        let combiner = ChunkCombiner::new(Arc::clone(&bridge));
        Self {
            bridge,
            conversion,
            converter,
            chunker,
            combiner,
        }
    }

    pub fn bridge(&self) -> &Arc<HostBridge> {
        &self.bridge
    }

    /// Decide the route for an event. First matching rule wins.
    pub fn classify(&self, event: &HostEvent) -> Route {
        if !event.is_file_added() {
            return Route::Ignore;
        }

        let path = event.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return Route::Ignore;
        };

        if self.conversion.is_convertible(path) {
            return Route::Convert;
        }

        if naming::is_chunk_output(file_name) {
            return Route::Combine;
        }

        // `is_output_markdown` covers combined outputs and chunk outputs.
        if file_name.ends_with(naming::MARKDOWN_EXT) && !naming::is_output_markdown(file_name) {
            if is_markdown_up_to_date(path) {
                crate::debug_event!("classifier", "already processed", "{}", path.display());
                return Route::Ignore;
            }
            return Route::Chunk;
        }

        Route::Ignore
    }

    /// Classify and run the matching stage.
    ///
    /// Stage failures are reported to the host and swallowed so the next
    /// event is processed normally.
    pub fn dispatch(&self, event: &HostEvent) -> Route {
        let route = self.classify(event);
        let path = event.path();

        match route {
            Route::Convert => self.convert(path),
            Route::Combine => {
                if let Some(readiness) = self.combiner.on_chunk_output_arrived(path) {
                    crate::debug_event!("classifier", "job", "{readiness}");
                }
            }
            Route::Chunk => self.chunk(path),
            Route::Ignore => {}
        }

        route
    }

    fn convert(&self, path: &Path) {
        crate::log_event!("classifier", "document detected", "{}", path.display());
        match self.converter.convert(path) {
            Ok(markdown) => {
                crate::log_event!(
                    "classifier",
                    "converted",
                    "{} -> {} ({})",
                    path.display(),
                    markdown.display(),
                    self.converter.name()
                );
            }
            Err(e) => self.report_failure(format!(
                "Conversion failed for {}: {e:#}",
                path.display()
            )),
        }
    }

    fn chunk(&self, path: &Path) {
        crate::log_event!("classifier", "markdown detected", "{}", path.display());
        match self.chunker.chunk_if_needed(path) {
            Ok(ChunkPlan::Written { job_dir, chunks }) => {
                crate::log_event!(
                    "classifier",
                    "chunked",
                    "{chunks} chunks in {}",
                    job_dir.display()
                );
            }
            Ok(ChunkPlan::Skipped { reason }) => {
                crate::debug_event!("classifier", "not chunked", "{}: {reason}", path.display());
            }
            Err(e) => self.report_failure(format!(
                "Markdown chunking failed for {}: {e:#}",
                path.display()
            )),
        }
    }

    fn report_failure(&self, message: String) {
        tracing::error!("[classifier] {message}");
        self.bridge.report_status(&message);
    }
}

/// A markdown file whose `<stem>.output.md` sibling is at least as new.
///
/// Any stat failure counts as not up to date.
fn is_markdown_up_to_date(markdown: &Path) -> bool {
    let Some(output) = naming::markdown_output_path(markdown) else {
        return false;
    };
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified());
    match (modified(&output), modified(markdown)) {
        (Ok(out), Ok(src)) => out >= src,
        _ => false,
    }
}
