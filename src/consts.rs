//! Limits, defaults, and package metadata shared across the crate.

use std::path::PathBuf;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Default model for both stages when none is specified.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default OpenAI-compatible API base.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Character ceiling for text extracted from uploaded PDF/DOCX/unknown files.
pub const MAX_CHARS_PER_FILE_CONTENT: usize = 25_000;

/// Character ceiling for pasted text and plain-text uploads.
pub const MAX_CHARS_PER_PASTED_TEXT: usize = 35_000;

/// Appended after the kept prefix when a text hits its ceiling.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated due to length limitations]";

/// Largest request body the server accepts (uploads included).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// PDFs smaller than this are rejected before extraction.
pub const MIN_PDF_BYTES: usize = 1024;

pub const PLANNER_MAX_TOKENS: u32 = 3500;
pub const PLANNER_TEMPERATURE: f32 = 0.8;
pub const WRITER_MAX_TOKENS: u32 = 4096;
pub const WRITER_TEMPERATURE: f32 = 0.9;

/// Default blob directory: `~/.quill/blobs`.
pub fn default_blob_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".quill")
        .join("blobs")
}

/// Group digits in threes: `12345` becomes `12,345`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut groups = Vec::with_capacity(digits.len() / 3 + 1);
    if head > 0 {
        groups.push(&digits[..head]);
    }
    groups.extend(
        digits.as_bytes()[head..]
            .chunks(3)
            .filter_map(|c| std::str::from_utf8(c).ok()),
    );
    groups.join(",")
}
