//! Chunk readiness and combination.
//!
//! A job directory is combinable once every `chunk_<N>.md` has a
//! `chunk_<NNN>.output.md` whose mtime is strictly newer. Modification times
//! are the only coordination signal: no lock files, no state between calls.
//! Readiness is re-derived from the directory on every triggering event.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::bridge::HostBridge;

use super::CombineError;
use super::naming;

/// Why a job is still waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// No output file for this index yet.
    Missing,
    /// Output is not strictly newer than its input.
    Stale,
}

/// Outcome of evaluating a job directory. Every variant is a normal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// No chunk inputs: not a job directory.
    NotAJob,
    /// The first index (ascending) without a fresh output.
    Waiting { index: u64, reason: WaitReason },
    /// Combined output is already at least as new as every chunk output.
    UpToDate { combined: PathBuf },
    /// Combined output was (re)written.
    Combined { combined: PathBuf, chunks: usize },
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::NotAJob => write!(f, "not a job directory (no chunk inputs)"),
            Readiness::Waiting { index, reason } => {
                let why = match reason {
                    WaitReason::Missing => "missing",
                    WaitReason::Stale => "stale",
                };
                write!(f, "waiting: output for chunk {index} is {why}")
            }
            Readiness::UpToDate { combined } => {
                write!(f, "up to date: {}", combined.display())
            }
            Readiness::Combined { combined, chunks } => {
                write!(f, "combined {chunks} chunks into {}", combined.display())
            }
        }
    }
}

/// Decides when a job's chunk outputs are complete and writes the combined file.
pub struct ChunkCombiner {
    bridge: Arc<HostBridge>,
}

impl ChunkCombiner {
    pub fn new(bridge: Arc<HostBridge>) -> Self {
        Self { bridge }
    }

    /// Arrival hook for a chunk output file.
    ///
    /// Hard failures are logged and reported to the host here; the caller only
    /// sees `None`.
    pub fn on_chunk_output_arrived(&self, trigger: &Path) -> Option<Readiness> {
        match self.evaluate(trigger) {
            Ok(readiness) => Some(readiness),
            Err(e) => {
                tracing::error!("[combiner] {e}");
                self.bridge.report_status(&format!("ChunkCombiner: {e}"));
                None
            }
        }
    }

    /// Evaluate the job directory containing `trigger`.
    pub fn evaluate(&self, trigger: &Path) -> Result<Readiness, CombineError> {
        let job_dir = match trigger.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        combine_job(job_dir)
    }
}

/// Evaluate one job directory and combine it when due.
pub fn combine_job(job_dir: &Path) -> Result<Readiness, CombineError> {
    let inputs = scan_inputs(job_dir)?;
    if inputs.is_empty() {
        return Ok(Readiness::NotAJob);
    }

    let mut outputs: Vec<(PathBuf, SystemTime)> = Vec::with_capacity(inputs.len());
    for (&index, input) in &inputs {
        let output = job_dir.join(naming::chunk_output_name(index));

        let output_mtime = match modified(&output) {
            Ok(mtime) => mtime,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                crate::debug_event!("combiner", "waiting", "{} missing", output.display());
                return Ok(Readiness::Waiting {
                    index,
                    reason: WaitReason::Missing,
                });
            }
            Err(source) => return Err(CombineError::Timestamp { path: output, source }),
        };
        let input_mtime = modified(input).map_err(|source| CombineError::Timestamp {
            path: input.clone(),
            source,
        })?;

        // Equal timestamps are not fresh.
        if output_mtime <= input_mtime {
            crate::debug_event!("combiner", "waiting", "{} stale", output.display());
            return Ok(Readiness::Waiting {
                index,
                reason: WaitReason::Stale,
            });
        }

        outputs.push((output, output_mtime));
    }

    let combined = combined_output_path(job_dir)?;

    let newest_chunk = outputs.iter().map(|(_, mtime)| *mtime).max();
    match modified(&combined) {
        Ok(combined_mtime) if newest_chunk.is_some_and(|newest| newest <= combined_mtime) => {
            crate::debug_event!("combiner", "up to date", "{}", combined.display());
            return Ok(Readiness::UpToDate { combined });
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(CombineError::Timestamp {
                path: combined,
                source,
            });
        }
    }

    crate::log_event!(
        "combiner",
        "combining",
        "{} chunks into {}",
        outputs.len(),
        combined.display()
    );

    // Read everything before touching the target.
    let mut text = String::new();
    for (output, _) in &outputs {
        let content = fs::read_to_string(output).map_err(|source| CombineError::ReadChunk {
            path: output.clone(),
            source,
        })?;
        text.push_str(content.trim_end());
        text.push_str("\n\n");
    }

    write_replacing(&combined, &text).map_err(|source| CombineError::WriteCombined {
        path: combined.clone(),
        source,
    })?;

    crate::log_event!("combiner", "written", "{}", combined.display());

    Ok(Readiness::Combined {
        combined,
        chunks: outputs.len(),
    })
}

/// Chunk inputs by index, ascending.
fn scan_inputs(job_dir: &Path) -> Result<BTreeMap<u64, PathBuf>, CombineError> {
    let list_error = |source| CombineError::ListJob {
        dir: job_dir.to_path_buf(),
        source,
    };

    let mut inputs = BTreeMap::new();
    for entry in fs::read_dir(job_dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(index) = naming::chunk_input_index(name) else {
            continue;
        };

        // `chunk_1.md` and `chunk_001.md` share an index; the padded name wins.
        match inputs.entry(index) {
            Entry::Vacant(slot) => {
                slot.insert(entry.path());
            }
            Entry::Occupied(mut slot) => {
                if name == naming::chunk_input_name(index) {
                    slot.insert(entry.path());
                }
            }
        }
    }

    Ok(inputs)
}

fn combined_output_path(job_dir: &Path) -> Result<PathBuf, CombineError> {
    let dir_name = job_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| job_dir.display().to_string());

    let file_name = naming::combined_output_name(&dir_name)
        .ok_or(CombineError::JobNaming { dir_name })?;

    Ok(job_dir
        .parent()
        .map_or_else(|| PathBuf::from(&file_name), |parent| parent.join(&file_name)))
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Replace `target` via a temp file in the same directory and a rename, so
/// readers never observe a half-written combined output.
fn write_replacing(target: &Path, contents: &str) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".docpipe-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
