//! Field ingestion: turns the five submitted inputs into prompt-ready text.
//!
//! Every failure below this boundary is folded into the field's text as a
//! `[System Note: ...]` so a single unreadable upload never sinks a request.

pub mod docx;
pub mod extract;
pub mod pdf;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::consts::{MAX_CHARS_PER_PASTED_TEXT, TRUNCATION_MARKER};
use crate::storage::BlobSource;

pub use extract::{Extracted, Lane, extract_content};

/// The five named input slots, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    TaskSheet,
    AdditionalMaterial,
    Rubric,
    SpecificInstructions,
    PastWork,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::TaskSheet,
        FieldKind::AdditionalMaterial,
        FieldKind::Rubric,
        FieldKind::SpecificInstructions,
        FieldKind::PastWork,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            FieldKind::TaskSheet => "Task Sheet",
            FieldKind::AdditionalMaterial => "Additional Material",
            FieldKind::Rubric => "Rubric/Criteria",
            FieldKind::SpecificInstructions => "Specific Instructions",
            FieldKind::PastWork => "Past Work",
        }
    }

    /// Prefix of this field's keys in a submitted form (`<prefix>InputMode`, ...).
    pub fn form_prefix(self) -> &'static str {
        match self {
            FieldKind::TaskSheet => "taskSheet",
            FieldKind::AdditionalMaterial => "additionalMaterials",
            FieldKind::Rubric => "rubric",
            FieldKind::SpecificInstructions => "specificInstructions",
            FieldKind::PastWork => "pastWork",
        }
    }

    pub fn is_mandatory(self) -> bool {
        self == FieldKind::TaskSheet
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Upload,
    Text,
}

impl InputMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "upload" => Some(InputMode::Upload),
            "text" => Some(InputMode::Text),
            _ => None,
        }
    }
}

/// A reference to an uploaded object plus what the client said it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
}

/// One submitted slot before resolution.
#[derive(Debug, Clone)]
pub struct FieldInput {
    pub kind: FieldKind,
    pub mode: Option<InputMode>,
    pub blob: Option<BlobRef>,
    pub text: Option<String>,
}

impl FieldInput {
    pub fn empty(kind: FieldKind) -> Self {
        Self {
            kind,
            mode: None,
            blob: None,
            text: None,
        }
    }

    pub fn text(kind: FieldKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            mode: Some(InputMode::Text),
            blob: None,
            text: Some(text.into()),
        }
    }

    pub fn upload(kind: FieldKind, blob: BlobRef) -> Self {
        Self {
            kind,
            mode: Some(InputMode::Upload),
            blob: Some(blob),
            text: None,
        }
    }

    /// Read this field's keys out of a flat form. Blank values count as absent.
    pub fn from_form(kind: FieldKind, form: &HashMap<String, String>) -> Self {
        let prefix = kind.form_prefix();
        let get = |suffix: &str| {
            form.get(&format!("{prefix}{suffix}"))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let blob = match (get("FileUrl"), get("FileName"), get("FileType")) {
            (Some(url), Some(file_name), Some(mime_type)) => Some(BlobRef {
                url,
                file_name,
                mime_type,
            }),
            _ => None,
        };

        Self {
            kind,
            mode: get("InputMode").as_deref().and_then(InputMode::parse),
            blob,
            text: get("Text"),
        }
    }
}

/// All five fields from a submitted form, in field order.
pub fn inputs_from_form(form: &HashMap<String, String>) -> Vec<FieldInput> {
    FieldKind::ALL
        .iter()
        .map(|kind| FieldInput::from_form(*kind, form))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InputSource {
    File,
    Text,
    None,
}

/// A resolved field, ready for prompt assembly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedField {
    pub kind: FieldKind,
    pub provided: bool,
    pub source: InputSource,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub extracted_text: Option<String>,
    pub processing_error: Option<String>,
}

impl ProcessedField {
    pub fn not_provided(kind: FieldKind) -> Self {
        Self {
            kind,
            provided: false,
            source: InputSource::None,
            file_name: None,
            mime_type: None,
            extracted_text: None,
            processing_error: None,
        }
    }

    fn from_file(kind: FieldKind, blob: &BlobRef, extracted: Extracted) -> Self {
        Self {
            kind,
            provided: true,
            source: InputSource::File,
            file_name: Some(blob.file_name.clone()),
            mime_type: Some(blob.mime_type.clone()),
            extracted_text: Some(extracted.text),
            processing_error: extracted.processing_error,
        }
    }

    /// Label shown next to the field heading in the prompt.
    pub fn source_label(&self) -> &str {
        if !self.provided {
            return "N/A";
        }
        match (&self.file_name, self.source) {
            (Some(name), _) => name,
            (None, InputSource::Text) => "Pasted Text",
            (None, _) => "N/A",
        }
    }
}

/// Cut `text` to `max_chars` characters, appending the truncation marker
/// when anything was dropped. Truncating twice at the same ceiling is a no-op.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
    }
}

/// Resolve one field. Never fails: problems become notes in the text.
pub async fn resolve_field(input: &FieldInput, blobs: &dyn BlobSource) -> ProcessedField {
    let kind = input.kind;
    match (input.mode, &input.text, &input.blob) {
        (Some(InputMode::Text), Some(text), _) if !text.trim().is_empty() => {
            debug!(field = %kind, chars = text.chars().count(), "using pasted text");
            ProcessedField {
                kind,
                provided: true,
                source: InputSource::Text,
                file_name: Some("Pasted Text".to_string()),
                mime_type: Some("text/plain".to_string()),
                extracted_text: Some(truncate_text(text, MAX_CHARS_PER_PASTED_TEXT)),
                processing_error: None,
            }
        }
        (Some(InputMode::Upload), _, Some(blob)) => resolve_upload(kind, blob, blobs).await,
        _ => ProcessedField::not_provided(kind),
    }
}

async fn resolve_upload(kind: FieldKind, blob: &BlobRef, blobs: &dyn BlobSource) -> ProcessedField {
    let bytes = match blobs.fetch(&blob.url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let message = format!("{e:#}");
            warn!(field = %kind, file = %blob.file_name, error = %message, "failed to fetch upload");
            let note = format!(
                "[System Note: Error fetching file '{}' from storage. Error: {}]",
                blob.file_name, message
            );
            return ProcessedField::from_file(
                kind,
                blob,
                Extracted {
                    text: note,
                    processing_error: Some(message),
                },
            );
        }
    };

    if bytes.is_empty() {
        warn!(field = %kind, file = %blob.file_name, "upload is empty");
        let note = format!(
            "[System Note: File '{}' fetched from storage appears to be empty.]",
            blob.file_name
        );
        return ProcessedField::from_file(kind, blob, Extracted::note(note));
    }

    info!(field = %kind, file = %blob.file_name, bytes = bytes.len(), "fetched upload");
    let extracted = extract_content(&bytes, &blob.file_name, &blob.mime_type).await;
    ProcessedField::from_file(kind, blob, extracted)
}

/// Resolve every field concurrently. Output order follows input order,
/// whatever order the fetches complete in.
pub async fn resolve_all(inputs: &[FieldInput], blobs: &dyn BlobSource) -> Vec<ProcessedField> {
    let futures = inputs.iter().map(|input| resolve_field(input, blobs));
    futures::future::join_all(futures).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn field_order_is_fixed() {
        let names: Vec<_> = FieldKind::ALL.iter().map(|k| k.display_name()).collect();
        assert_eq!(
            names,
            [
                "Task Sheet",
                "Additional Material",
                "Rubric/Criteria",
                "Specific Instructions",
                "Past Work"
            ]
        );
    }

    #[test]
    fn only_task_sheet_is_mandatory() {
        let mandatory: Vec<_> = FieldKind::ALL.iter().filter(|k| k.is_mandatory()).collect();
        assert_eq!(mandatory, [&FieldKind::TaskSheet]);
    }

    #[test]
    fn parse_input_mode() {
        assert_eq!(InputMode::parse("upload"), Some(InputMode::Upload));
        assert_eq!(InputMode::parse("text"), Some(InputMode::Text));
        assert_eq!(InputMode::parse("paste"), None);
    }

    #[test]
    fn from_form_reads_text_field() {
        let f = form(&[("rubricInputMode", "text"), ("rubricText", "criteria")]);
        let input = FieldInput::from_form(FieldKind::Rubric, &f);
        assert_eq!(input.mode, Some(InputMode::Text));
        assert_eq!(input.text.as_deref(), Some("criteria"));
        assert!(input.blob.is_none());
    }

    #[test]
    fn from_form_reads_upload_field() {
        let f = form(&[
            ("additionalMaterialsInputMode", "upload"),
            ("additionalMaterialsFileUrl", "http://x/blobs/a.pdf"),
            ("additionalMaterialsFileName", "a.pdf"),
            ("additionalMaterialsFileType", "application/pdf"),
        ]);
        let input = FieldInput::from_form(FieldKind::AdditionalMaterial, &f);
        assert_eq!(input.mode, Some(InputMode::Upload));
        let blob = input.blob.unwrap();
        assert_eq!(blob.file_name, "a.pdf");
        assert_eq!(blob.mime_type, "application/pdf");
    }

    #[test]
    fn from_form_needs_all_blob_keys() {
        let f = form(&[
            ("pastWorkInputMode", "upload"),
            ("pastWorkFileUrl", "http://x/blobs/a.pdf"),
            ("pastWorkFileName", ""),
        ]);
        let input = FieldInput::from_form(FieldKind::PastWork, &f);
        assert!(input.blob.is_none());
    }

    #[test]
    fn inputs_from_form_yields_all_fields_in_order() {
        let inputs = inputs_from_form(&HashMap::new());
        let kinds: Vec<_> = inputs.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, FieldKind::ALL);
    }

    #[test]
    fn truncate_short_text_unchanged() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello", 5), "hello");
    }

    #[test]
    fn truncate_long_text_appends_marker() {
        let out = truncate_text("abcdefghij", 4);
        assert_eq!(out, format!("abcd{TRUNCATION_MARKER}"));
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let out = truncate_text("ééééé", 3);
        assert!(out.starts_with("ééé"));
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn truncate_is_idempotent() {
        let text = "x".repeat(100);
        let once = truncate_text(&text, 40);
        let twice = truncate_text(&once, 40);
        assert_eq!(once, twice);
    }

    #[test]
    fn source_label_variants() {
        let mut field = ProcessedField::not_provided(FieldKind::Rubric);
        assert_eq!(field.source_label(), "N/A");

        field.provided = true;
        field.source = InputSource::Text;
        assert_eq!(field.source_label(), "Pasted Text");

        field.file_name = Some("rubric.docx".to_string());
        assert_eq!(field.source_label(), "rubric.docx");
    }
}
