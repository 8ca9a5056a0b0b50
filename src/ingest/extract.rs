//! Lane classification and per-format extraction.

use tracing::{info, warn};

use super::{docx, pdf, truncate_text};
use crate::consts::{MAX_CHARS_PER_FILE_CONTENT, MAX_CHARS_PER_PASTED_TEXT};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const PDF_REMEDIATION: &str = "Please try one of the following solutions:
1. Convert the PDF to a Word document (.docx) and upload that instead
2. Copy and paste the text directly using the 'Paste Text' option
3. If the PDF is a scan, run it through OCR software first so it has a text layer
4. Re-export the PDF from the application that created it and upload it again";

/// Text for one field, plus the raw error when the text is a failure note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub processing_error: Option<String>,
}

impl Extracted {
    fn ok(text: String) -> Self {
        Self {
            text,
            processing_error: None,
        }
    }

    /// A note that replaces the content without counting as an error.
    pub fn note(text: String) -> Self {
        Self::ok(text)
    }

    fn failed(note: String, error: String) -> Self {
        Self {
            text: note,
            processing_error: Some(error),
        }
    }
}

/// Which extractor a file goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Pdf,
    Docx,
    PlainText,
    Unknown,
}

impl Lane {
    pub fn classify(file_name: &str, mime_type: &str) -> Self {
        let mime = mime_type.to_lowercase();
        let name = file_name.to_lowercase();

        if mime == "application/pdf" || name.ends_with(".pdf") {
            Lane::Pdf
        } else if mime == DOCX_MIME || name.ends_with(".docx") {
            Lane::Docx
        } else if mime.starts_with("text/") || name.ends_with(".txt") || name.ends_with(".md") {
            Lane::PlainText
        } else {
            Lane::Unknown
        }
    }
}

/// Extract text from an uploaded file. Never fails: errors come back as notes.
pub async fn extract_content(bytes: &[u8], file_name: &str, mime_type: &str) -> Extracted {
    let lane = Lane::classify(file_name, mime_type);
    info!(file = file_name, ?lane, "extracting");

    match lane {
        Lane::Pdf => match pdf::extract_text(bytes).await {
            Ok(text) => Extracted::ok(truncate_text(&text, MAX_CHARS_PER_FILE_CONTENT)),
            Err(e) => {
                let message = e.to_string();
                warn!(file = file_name, error = %message, "PDF extraction failed");
                Extracted::failed(
                    format!(
                        "[System Note: Error reading PDF file '{file_name}'. {message}\n\n{PDF_REMEDIATION}]"
                    ),
                    message,
                )
            }
        },
        Lane::Docx => match docx::extract_text(bytes) {
            Ok(text) if text.trim().is_empty() => Extracted::note(format!(
                "[System Note: Content from DOCX file '{file_name}' was empty after extraction.]"
            )),
            Ok(text) => Extracted::ok(truncate_text(&text, MAX_CHARS_PER_FILE_CONTENT)),
            Err(e) => {
                let message = format!("{e:#}");
                warn!(file = file_name, error = %message, "DOCX extraction failed");
                Extracted::failed(
                    format!(
                        "[System Note: Error parsing DOCX file '{file_name}'. Error: {message}]"
                    ),
                    message,
                )
            }
        },
        Lane::PlainText => {
            let text = String::from_utf8_lossy(bytes);
            Extracted::ok(truncate_text(&text, MAX_CHARS_PER_PASTED_TEXT))
        }
        Lane::Unknown => {
            let text = String::from_utf8_lossy(bytes);
            Extracted::ok(format!(
                "{}\n\n[System Note: File '{file_name}' ({mime_type}) is not a standard text, PDF, or DOCX. Content extraction as plain text was attempted.]",
                truncate_text(&text, MAX_CHARS_PER_FILE_CONTENT)
            ))
        }
    }
}
