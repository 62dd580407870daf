//! Default markdown chunker.
//!
//! Paragraph-based splitting with a size ceiling:
//! 1. Split by paragraphs (blank-line separated)
//! 2. Break paragraphs longer than `max_chunk_chars`, preferring whitespace
//! 3. Pack paragraphs greedily into chunks of at most `max_chunk_chars`
//!
//! Chunks are written as `<file>_chunks/chunk_000.md`, `chunk_001.md`, ...

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::ChunkingConfig;

use super::collaborators::{ChunkPlan, MarkdownChunker};
use super::naming;

const SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    config: ChunkingConfig,
}

impl ParagraphChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Remove chunk inputs numbered at or past `count` left by an earlier split.
    fn remove_stale_inputs(job_dir: &Path, count: usize) -> anyhow::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(job_dir)
            .with_context(|| format!("failed to list {}", job_dir.display()))?
        {
            let entry = entry?;
            let Some(index) = entry
                .file_name()
                .to_str()
                .and_then(naming::chunk_input_index)
            else {
                continue;
            };
            if index >= count as u64 {
                fs::remove_file(entry.path())
                    .with_context(|| format!("failed to remove {}", entry.path().display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl MarkdownChunker for ParagraphChunker {
    fn chunk_if_needed(&self, source: &Path) -> anyhow::Result<ChunkPlan> {
        let in_job_dir = source
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .is_some_and(naming::is_job_dir_name);
        if in_job_dir {
            return Ok(ChunkPlan::Skipped {
                reason: "file is inside a job directory".to_string(),
            });
        }

        let content = fs::read_to_string(source)
            .with_context(|| format!("failed to read {}", source.display()))?;
        let char_count = content.chars().count();
        if char_count <= self.config.threshold_chars {
            return Ok(ChunkPlan::Skipped {
                reason: format!(
                    "{char_count} chars, at or below threshold {}",
                    self.config.threshold_chars
                ),
            });
        }

        let job_dir: PathBuf = naming::job_dir_for(source)
            .with_context(|| format!("no usable file name in {}", source.display()))?;
        let chunks = split_markdown(&content, self.config.max_chunk_chars);

        fs::create_dir_all(&job_dir)
            .with_context(|| format!("failed to create {}", job_dir.display()))?;
        for (index, chunk) in chunks.iter().enumerate() {
            let path = job_dir.join(naming::chunk_input_name(index as u64));
            fs::write(&path, format!("{chunk}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        let removed = Self::remove_stale_inputs(&job_dir, chunks.len())?;
        if removed > 0 {
            crate::debug_event!("chunker", "removed stale inputs", "{removed}");
        }

        crate::log_event!(
            "chunker",
            "split",
            "{} into {} chunks",
            source.display(),
            chunks.len()
        );

        Ok(ChunkPlan::Written {
            job_dir,
            chunks: chunks.len(),
        })
    }
}

/// Split markdown into chunks of at most `max_chars` characters.
pub fn split_markdown(content: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let pieces = split_paragraphs(content)
        .into_iter()
        .flat_map(|para| split_oversized(&para, max_chars));

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for piece in pieces {
        let piece_chars = piece.chars().count();
        if current.is_empty() {
            current = piece;
            current_chars = piece_chars;
        } else if current_chars + SEPARATOR.len() + piece_chars <= max_chars {
            current.push_str(SEPARATOR);
            current.push_str(&piece);
            current_chars += SEPARATOR.len() + piece_chars;
        } else {
            chunks.push(std::mem::replace(&mut current, piece));
            current_chars = piece_chars;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split content into trimmed paragraphs (by double newline).
fn split_paragraphs(content: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut in_paragraph = false;
    let mut para_start = 0;

    let bytes = content.as_bytes();
    let len = bytes.len();

    let mut i = 0;
    while i < len {
        let is_newline = bytes[i] == b'\n';

        if !in_paragraph {
            // Skip leading whitespace
            if !is_newline && !bytes[i].is_ascii_whitespace() {
                in_paragraph = true;
                para_start = i;
            }
        } else if is_newline && i + 1 < len && bytes[i + 1] == b'\n' {
            let para = content[para_start..i].trim();
            if !para.is_empty() {
                paragraphs.push(para.to_string());
            }
            in_paragraph = false;
            i += 1; // Skip second newline
        }
        i += 1;
    }

    if in_paragraph {
        let para = content[para_start..].trim();
        if !para.is_empty() {
            paragraphs.push(para.to_string());
        }
    }

    paragraphs
}

/// Break a paragraph into pieces of at most `max_chars`, cutting at the last
/// whitespace inside each window when there is one.
fn split_oversized(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        let limit = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(i, _)| i);
        let cut = rest[..limit]
            .rfind(char::is_whitespace)
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        pieces.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}
