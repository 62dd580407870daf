//! Filesystem naming contract shared by the chunker, the agents and the combiner.
//!
//! ```text
//! docs/report.md                      original markdown
//! docs/report.md_chunks/              job directory
//! docs/report.md_chunks/chunk_000.md          chunk input
//! docs/report.md_chunks/chunk_000.output.md   chunk output
//! docs/report.output.md               combined output
//! ```

use std::path::{Path, PathBuf};

pub const JOB_DIR_SUFFIX: &str = "_chunks";
pub const MARKDOWN_EXT: &str = ".md";
pub const OUTPUT_MARKDOWN_EXT: &str = ".output.md";

const CHUNK_PREFIX: &str = "chunk_";

/// Parse `chunk_<N>` followed by exactly `suffix`.
fn parse_chunk_index(file_name: &str, suffix: &str) -> Option<u64> {
    let digits = file_name.strip_prefix(CHUNK_PREFIX)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Index of a chunk input file name (`chunk_<N>.md`).
pub fn chunk_input_index(file_name: &str) -> Option<u64> {
    parse_chunk_index(file_name, MARKDOWN_EXT)
}

/// Index of a chunk output file name (`chunk_<N>.output.md`).
pub fn chunk_output_index(file_name: &str) -> Option<u64> {
    parse_chunk_index(file_name, OUTPUT_MARKDOWN_EXT)
}

pub fn is_chunk_output(file_name: &str) -> bool {
    chunk_output_index(file_name).is_some()
}

/// Any `*.output.md` file: chunk outputs and combined outputs alike.
pub fn is_output_markdown(file_name: &str) -> bool {
    file_name.ends_with(OUTPUT_MARKDOWN_EXT)
}

pub fn chunk_input_name(index: u64) -> String {
    format!("{CHUNK_PREFIX}{index:03}{MARKDOWN_EXT}")
}

pub fn chunk_output_name(index: u64) -> String {
    format!("{CHUNK_PREFIX}{index:03}{OUTPUT_MARKDOWN_EXT}")
}

/// Job directory for an original document: `<dir>/<file name>_chunks`.
pub fn job_dir_for(source: &Path) -> Option<PathBuf> {
    let name = source.file_name()?.to_str()?;
    Some(source.with_file_name(format!("{name}{JOB_DIR_SUFFIX}")))
}

pub fn is_job_dir_name(dir_name: &str) -> bool {
    dir_name.len() > JOB_DIR_SUFFIX.len() && dir_name.ends_with(JOB_DIR_SUFFIX)
}

/// Combined output file name for a job directory name.
///
/// `report.md_chunks` becomes `report.output.md`. Returns `None` unless the
/// name is `<something>.md_chunks`.
pub fn combined_output_name(job_dir_name: &str) -> Option<String> {
    let original = job_dir_name.strip_suffix(JOB_DIR_SUFFIX)?;
    let stem = original.strip_suffix(MARKDOWN_EXT)?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{stem}{OUTPUT_MARKDOWN_EXT}"))
}

/// Sibling output of a markdown file: `notes.md` becomes `notes.output.md`.
pub fn markdown_output_path(markdown: &Path) -> Option<PathBuf> {
    let name = markdown.file_name()?.to_str()?;
    let stem = name.strip_suffix(MARKDOWN_EXT)?;
    Some(markdown.with_file_name(format!("{stem}{OUTPUT_MARKDOWN_EXT}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_input_index() {
        assert_eq!(chunk_input_index("chunk_000.md"), Some(0));
        assert_eq!(chunk_input_index("chunk_7.md"), Some(7));
        assert_eq!(chunk_input_index("chunk_1234.md"), Some(1234));
        assert_eq!(chunk_input_index("chunk_.md"), None);
        assert_eq!(chunk_input_index("chunk_01a.md"), None);
        assert_eq!(chunk_input_index("chunk_001.output.md"), None);
        assert_eq!(chunk_input_index("xchunk_001.md"), None);
        assert_eq!(chunk_input_index("chunk_+1.md"), None);
    }

    #[test]
    fn test_chunk_output_index() {
        assert_eq!(chunk_output_index("chunk_002.output.md"), Some(2));
        assert_eq!(chunk_output_index("chunk_2.output.md"), Some(2));
        assert_eq!(chunk_output_index("chunk_002.md"), None);
        assert_eq!(chunk_output_index("report.output.md"), None);
    }

    #[test]
    fn test_emitted_names_are_zero_padded() {
        assert_eq!(chunk_input_name(3), "chunk_003.md");
        assert_eq!(chunk_output_name(42), "chunk_042.output.md");
        assert_eq!(chunk_output_name(1000), "chunk_1000.output.md");
    }

    #[test]
    fn test_combined_output_name() {
        assert_eq!(
            combined_output_name("report.md_chunks").as_deref(),
            Some("report.output.md")
        );
        assert_eq!(
            combined_output_name("my_chunks.md_chunks").as_deref(),
            Some("my_chunks.output.md")
        );
        assert_eq!(combined_output_name("report_data"), None);
        assert_eq!(combined_output_name("report.pdf_chunks"), None);
        assert_eq!(combined_output_name(".md_chunks"), None);
    }

    #[test]
    fn test_job_dir_for_keeps_extension() {
        assert_eq!(
            job_dir_for(Path::new("/docs/report.md")),
            Some(PathBuf::from("/docs/report.md_chunks"))
        );
    }

    #[test]
    fn test_markdown_output_path() {
        assert_eq!(
            markdown_output_path(Path::new("/docs/notes.md")),
            Some(PathBuf::from("/docs/notes.output.md"))
        );
        assert_eq!(markdown_output_path(Path::new("/docs/notes.txt")), None);
    }

    #[test]
    fn test_is_job_dir_name() {
        assert!(is_job_dir_name("report.md_chunks"));
        assert!(!is_job_dir_name("_chunks"));
        assert!(!is_job_dir_name("report_data"));
    }
}
