//! Fan-out / fan-in through the classifier: chunk a large markdown file, let
//! fake agents answer each chunk, and watch the job recombine.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use docpipe::bridge::{HostBridge, MemoryChannel};
use docpipe::config::{ChunkingConfig, ConversionConfig};
use docpipe::HostEvent;
use docpipe::pipeline::{DocumentConverter, EventClassifier, ParagraphChunker, Route, naming};
use tempfile::TempDir;

const BASE_SECS: u64 = 1_700_000_000;

fn at(offset_secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(BASE_SECS + offset_secs)
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

struct UnusedConverter;

impl DocumentConverter for UnusedConverter {
    fn name(&self) -> &str {
        "unused"
    }

    fn convert(&self, source: &Path) -> anyhow::Result<PathBuf> {
        anyhow::bail!("unexpected conversion of {}", source.display())
    }
}

fn classifier(channel: &MemoryChannel) -> EventClassifier {
    EventClassifier::new(
        Arc::new(HostBridge::with_channel(channel.clone())),
        ConversionConfig::default(),
        Box::new(UnusedConverter),
        Box::new(ParagraphChunker::new(ChunkingConfig {
            threshold_chars: 200,
            max_chunk_chars: 100,
        })),
    )
}

fn chunk_inputs(job_dir: &Path) -> Vec<u64> {
    let mut indices: Vec<u64> = fs::read_dir(job_dir)
        .unwrap()
        .filter_map(|entry| {
            let name = entry.unwrap().file_name();
            naming::chunk_input_index(name.to_str()?)
        })
        .collect();
    indices.sort();
    indices
}

#[test]
fn test_large_markdown_fans_out_and_back_in() {
    let temp = TempDir::new().unwrap();
    let channel = MemoryChannel::new();
    let classifier = classifier(&channel);

    let source = temp.path().join("report.md");
    let sections: Vec<String> = (0..6)
        .map(|i| format!("Section {i}: {}", "lorem ".repeat(5)).trim_end().to_string())
        .collect();
    fs::write(&source, sections.join("\n\n")).unwrap();
    set_mtime(&source, at(0));

    assert_eq!(
        classifier.dispatch(&HostEvent::file_added(&source)),
        Route::Chunk
    );

    let job_dir = temp.path().join("report.md_chunks");
    let indices = chunk_inputs(&job_dir);
    assert_eq!(indices, vec![0, 1, 2]);

    let combined = temp.path().join("report.output.md");
    for &index in &indices {
        let input = job_dir.join(naming::chunk_input_name(index));
        set_mtime(&input, at(1));

        let output = job_dir.join(naming::chunk_output_name(index));
        fs::write(&output, format!("OUT {index}   \n\n")).unwrap();
        set_mtime(&output, at(10 + index));

        assert!(!combined.exists(), "combined before chunk {index} arrived");
        assert_eq!(
            classifier.dispatch(&HostEvent::file_added(&output)),
            Route::Combine
        );
    }

    assert_eq!(
        fs::read_to_string(&combined).unwrap(),
        "OUT 0\n\nOUT 1\n\nOUT 2\n\n"
    );

    // The original is now older than its combined output.
    assert_eq!(
        classifier.dispatch(&HostEvent::file_added(&source)),
        Route::Ignore
    );
    assert!(channel.statuses().is_empty(), "{:?}", channel.statuses());
}

#[test]
fn test_outputs_arriving_out_of_order_combine_in_index_order() {
    let temp = TempDir::new().unwrap();
    let channel = MemoryChannel::new();
    let classifier = classifier(&channel);

    let job_dir = temp.path().join("notes.md_chunks");
    fs::create_dir(&job_dir).unwrap();
    for index in 0..3 {
        let input = job_dir.join(naming::chunk_input_name(index));
        fs::write(&input, "in").unwrap();
        set_mtime(&input, at(0));
    }

    for (step, index) in [2u64, 0, 1].into_iter().enumerate() {
        let output = job_dir.join(naming::chunk_output_name(index));
        fs::write(&output, format!("part {index}")).unwrap();
        set_mtime(&output, at(5 + step as u64));
        classifier.dispatch(&HostEvent::file_added(&output));
    }

    assert_eq!(
        fs::read_to_string(temp.path().join("notes.output.md")).unwrap(),
        "part 0\n\npart 1\n\npart 2\n\n"
    );
}

#[test]
fn test_stale_output_keeps_job_waiting() {
    let temp = TempDir::new().unwrap();
    let channel = MemoryChannel::new();
    let classifier = classifier(&channel);

    let job_dir = temp.path().join("report.md_chunks");
    fs::create_dir(&job_dir).unwrap();
    for index in 0..2 {
        let input = job_dir.join(naming::chunk_input_name(index));
        fs::write(&input, "in").unwrap();
        set_mtime(&input, at(10));
    }
    let first = job_dir.join(naming::chunk_output_name(0));
    let second = job_dir.join(naming::chunk_output_name(1));
    fs::write(&first, "A").unwrap();
    fs::write(&second, "B").unwrap();
    set_mtime(&first, at(20));
    // Same second as its input: not fresh.
    set_mtime(&second, at(10));

    classifier.dispatch(&HostEvent::file_added(&second));

    assert!(!temp.path().join("report.output.md").exists());
    assert!(channel.statuses().is_empty());
}
