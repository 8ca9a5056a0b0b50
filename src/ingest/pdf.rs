//! PDF text extraction with a chain of fallback strategies.

use std::cell::Cell;
use std::panic::{self, UnwindSafe};
use std::sync::{LazyLock, Once};

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use tracing::{debug, error, info};

use crate::consts::MIN_PDF_BYTES;

/// Cleaned output shorter than this is treated as a failed extraction.
const MIN_EXTRACTED_CHARS: usize = 10;

/// Literal-string scan must produce more than this to count.
const MIN_LITERAL_SCAN_CHARS: usize = 50;

/// Literal string operands, e.g. `(Hello) Tj`.
static LITERAL_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("literal string pattern is valid"));

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Run `f`, catching a panic. While it runs, a panic on this thread goes to
/// the debug log instead of the default hook's stderr message.
fn quietly<T>(f: impl FnOnce() -> T + UnwindSafe) -> std::thread::Result<T> {
    QUIET_HOOK.call_once(|| {
        let default = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if QUIET_PANICS.with(Cell::get) {
                debug!(%info, "panic inside PDF parser");
            } else {
                default(info);
            }
        }));
    });

    QUIET_PANICS.set(true);
    let result = panic::catch_unwind(f);
    QUIET_PANICS.set(false);
    result
}

type Strategy = fn(&[u8]) -> Result<String>;

/// Tried in order; the first non-empty result wins.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("pdf-extract", via_pdf_extract),
    ("lopdf", via_lopdf),
    ("literal scan", via_literal_scan),
];

/// Cheap structural checks run before any parser sees the bytes.
pub fn validate(bytes: &[u8]) -> Result<(), &'static str> {
    if bytes.is_empty() {
        return Err("Empty buffer");
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err("Invalid PDF header");
    }
    if bytes.len() < MIN_PDF_BYTES {
        return Err("PDF file too small");
    }
    Ok(())
}

/// Validate, extract, and clean. Errors carry the user-facing reason.
pub async fn extract_text(bytes: &[u8]) -> Result<String> {
    if let Err(reason) = validate(bytes) {
        bail!("Invalid PDF file: {reason}");
    }

    let owned = bytes.to_vec();
    let raw = tokio::task::spawn_blocking(move || extract_with_fallback(&owned))
        .await
        .context("PDF extraction task failed")?;

    raw.and_then(|text| {
        let cleaned = collapse_whitespace(&text);
        if cleaned.chars().count() < MIN_EXTRACTED_CHARS {
            bail!("Extracted text is too short or empty");
        }
        info!(chars = cleaned.chars().count(), "PDF text extracted");
        Ok(cleaned)
    })
    .map_err(|e| anyhow!("Failed to extract text from PDF: {e}"))
}

/// Run every strategy until one yields text.
pub fn extract_with_fallback(bytes: &[u8]) -> Result<String> {
    let mut failures = Vec::new();

    for (name, strategy) in STRATEGIES {
        debug!(strategy = name, "attempting PDF extraction");
        match strategy(bytes) {
            Ok(text) if !text.trim().is_empty() => {
                info!(strategy = name, chars = text.len(), "PDF strategy succeeded");
                return Ok(text.trim().to_string());
            }
            Ok(_) => failures.push(format!("{name} failed: returned empty text")),
            Err(e) => failures.push(format!("{name} failed: {e}")),
        }
        debug!(strategy = name, "PDF strategy failed");
    }

    error!(?failures, "all PDF extraction strategies failed");
    bail!(
        "PDF text extraction failed. Tried multiple methods: {}. This PDF may be image-based, corrupted, or use an unsupported format. Please try converting to Word document or copy-paste the text directly.",
        failures.join("; ")
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn via_pdf_extract(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs
    match quietly(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(anyhow!("{e}")),
        Err(_) => bail!("parser panicked"),
    }
}

fn via_lopdf(bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        bail!("document has no pages");
    }

    let mut text = String::new();
    for page in pages {
        match doc.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => debug!(page, error = %e, "lopdf could not read page"),
        }
    }
    Ok(text)
}

fn via_literal_scan(bytes: &[u8]) -> Result<String> {
    let raw = String::from_utf8_lossy(bytes);
    let joined = LITERAL_STRING
        .captures_iter(&raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| s.chars().count() > 2)
        .collect::<Vec<_>>()
        .join(" ");

    if joined.chars().count() > MIN_LITERAL_SCAN_CHARS {
        Ok(joined)
    } else {
        bail!("No readable text found in PDF structure")
    }
}
