//! Collaborator seams: document conversion and markdown chunking.
//!
//! The classifier only knows these traits. Failures are opaque `anyhow`
//! errors that the classifier formats and reports.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, bail};

use crate::config::ConversionConfig;

/// Converts a non-markdown document into markdown.
pub trait DocumentConverter: Send + Sync {
    /// Converter name for logging.
    fn name(&self) -> &str;

    /// Convert `source`, returning the markdown file written.
    fn convert(&self, source: &Path) -> anyhow::Result<PathBuf>;
}

/// Result of asking the chunker to look at a markdown file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkPlan {
    /// Left whole; nothing written.
    Skipped { reason: String },
    /// Chunk inputs written into `job_dir`.
    Written { job_dir: PathBuf, chunks: usize },
}

/// Splits large markdown files into a job directory of chunk inputs.
pub trait MarkdownChunker: Send + Sync {
    fn chunk_if_needed(&self, source: &Path) -> anyhow::Result<ChunkPlan>;
}

/// Runs an external conversion program (markitdown by default).
///
/// The markdown target sits next to the source with its extension replaced by
/// `.md`.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg.as_str() {
                "{input}" => input.as_os_str().to_os_string(),
                "{output}" => output.as_os_str().to_os_string(),
                other => OsString::from(
                    other
                        .replace("{input}", &input.to_string_lossy())
                        .replace("{output}", &output.to_string_lossy()),
                ),
            })
            .collect()
    }
}

impl DocumentConverter for CommandConverter {
    fn name(&self) -> &str {
        &self.program
    }

    fn convert(&self, source: &Path) -> anyhow::Result<PathBuf> {
        let target = source.with_extension("md");
        let args = self.expand_args(source, &target);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to run '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        if !target.is_file() {
            bail!(
                "'{}' succeeded but did not produce {}",
                self.program,
                target.display()
            );
        }

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_args_substitutes_placeholders() {
        let converter = CommandConverter::new(
            "markitdown",
            vec![
                "{input}".to_string(),
                "-o".to_string(),
                "{output}".to_string(),
                "--label={input}".to_string(),
            ],
        );
        let args = converter.expand_args(Path::new("/in/a.pdf"), Path::new("/in/a.md"));
        assert_eq!(
            args,
            vec![
                OsString::from("/in/a.pdf"),
                OsString::from("-o"),
                OsString::from("/in/a.md"),
                OsString::from("--label=/in/a.pdf"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_convert_runs_program() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("slides.pptx");
        std::fs::write(&source, "deck").unwrap();

        let converter = CommandConverter::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"cp "$0" "$1""#.to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
        );

        let target = converter.convert(&source).unwrap();
        assert_eq!(target, temp.path().join("slides.md"));
        assert_eq!(std::fs::read_to_string(target).unwrap(), "deck");
    }

    #[cfg(unix)]
    #[test]
    fn test_convert_reports_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.pdf");
        std::fs::write(&source, "%PDF").unwrap();

        let converter = CommandConverter::new(
            "sh",
            vec!["-c".to_string(), "echo broken >&2; exit 3".to_string()],
        );

        let err = converter.convert(&source).unwrap_err().to_string();
        assert!(err.contains("broken"), "{err}");
    }

    #[test]
    fn test_convert_missing_program() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.docx");

        let converter = CommandConverter::new("docpipe-no-such-converter", Vec::new());
        let err = converter.convert(&source).unwrap_err();
        assert!(err.to_string().contains("docpipe-no-such-converter"));
    }
}
