mod common;

use std::collections::HashMap;
use std::time::Duration;

use common::{MemoryBlobs, docx_with_paragraphs, task_sheet_pdf};
use quill::consts::{MAX_CHARS_PER_FILE_CONTENT, MAX_CHARS_PER_PASTED_TEXT, TRUNCATION_MARKER};
use quill::ingest::{
    BlobRef, FieldInput, FieldKind, InputSource, inputs_from_form, resolve_all, resolve_field,
};

fn upload(kind: FieldKind, url: &str, name: &str, mime: &str) -> FieldInput {
    FieldInput::upload(
        kind,
        BlobRef {
            url: url.to_string(),
            file_name: name.to_string(),
            mime_type: mime.to_string(),
        },
    )
}

#[tokio::test]
async fn pdf_upload_is_extracted() {
    let blobs = MemoryBlobs::new().with("mem://brief.pdf", task_sheet_pdf());
    let input = upload(FieldKind::TaskSheet, "mem://brief.pdf", "brief.pdf", "application/pdf");

    let field = resolve_field(&input, &blobs).await;
    assert!(field.provided);
    assert_eq!(field.source, InputSource::File);
    assert_eq!(field.processing_error, None);
    let text = field.extracted_text.unwrap();
    assert!(text.contains("photosynthesis"), "got: {text}");
    assert!(!text.contains("  "), "whitespace should be collapsed: {text}");
}

#[tokio::test]
async fn docx_upload_is_extracted_by_extension() {
    let docx = docx_with_paragraphs(&["Write 1500 words.", "Use APA referencing."]);
    let blobs = MemoryBlobs::new().with("mem://rubric", docx);
    let input = upload(
        FieldKind::Rubric,
        "mem://rubric",
        "Rubric.DOCX",
        "application/octet-stream",
    );

    let field = resolve_field(&input, &blobs).await;
    let text = field.extracted_text.unwrap();
    assert!(text.contains("Write 1500 words."));
    assert!(text.contains("Use APA referencing."));
    assert_eq!(field.processing_error, None);
}

#[tokio::test]
async fn empty_upload_gets_a_note() {
    let blobs = MemoryBlobs::new().with("mem://empty", Vec::new());
    let input = upload(FieldKind::PastWork, "mem://empty", "old.docx", "");

    let field = resolve_field(&input, &blobs).await;
    assert!(field.provided);
    assert_eq!(
        field.extracted_text.as_deref(),
        Some("[System Note: File 'old.docx' fetched from storage appears to be empty.]")
    );
}

#[tokio::test]
async fn fetch_failure_becomes_note_and_error() {
    let blobs = MemoryBlobs::new();
    let input = upload(FieldKind::TaskSheet, "mem://gone", "gone.pdf", "application/pdf");

    let field = resolve_field(&input, &blobs).await;
    assert!(field.provided);
    let text = field.extracted_text.unwrap();
    assert!(text.starts_with("[System Note: Error fetching file 'gone.pdf' from storage."));
    assert!(field.processing_error.unwrap().contains("404"));
}

#[tokio::test]
async fn broken_pdf_explains_how_to_recover() {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.extend(std::iter::repeat_n(b'\x00', 2048));
    let blobs = MemoryBlobs::new().with("mem://scan", bytes);
    let input = upload(FieldKind::TaskSheet, "mem://scan", "scan.pdf", "application/pdf");

    let field = resolve_field(&input, &blobs).await;
    let text = field.extracted_text.unwrap();
    assert!(text.starts_with("[System Note: Error reading PDF file 'scan.pdf'."));
    assert!(text.contains("Paste Text"));
    assert!(field.processing_error.is_some());
}

#[tokio::test]
async fn small_pdf_is_rejected_before_parsing() {
    let blobs = MemoryBlobs::new().with("mem://tiny", b"%PDF-1.4 tiny".to_vec());
    let input = upload(FieldKind::TaskSheet, "mem://tiny", "tiny.pdf", "application/pdf");

    let field = resolve_field(&input, &blobs).await;
    assert!(field.processing_error.unwrap().contains("PDF file too small"));
}

#[tokio::test]
async fn unknown_type_is_decoded_with_a_note() {
    let blobs = MemoryBlobs::new().with("mem://notes", b"plain words".to_vec());
    let input = upload(FieldKind::AdditionalMaterial, "mem://notes", "notes.xyz", "application/x-thing");

    let text = resolve_field(&input, &blobs).await.extracted_text.unwrap();
    assert!(text.contains("plain words"));
    assert!(text.contains("is not a standard text, PDF, or DOCX"));
}

#[tokio::test]
async fn unknown_type_uses_file_ceiling() {
    let body = "a".repeat(MAX_CHARS_PER_FILE_CONTENT + 10);
    let blobs = MemoryBlobs::new().with("mem://big", body.into_bytes());
    let input = upload(FieldKind::PastWork, "mem://big", "big.bin", "");

    let text = resolve_field(&input, &blobs).await.extracted_text.unwrap();
    assert!(text.contains(TRUNCATION_MARKER));
    assert!(!text.contains(&"a".repeat(MAX_CHARS_PER_FILE_CONTENT + 1)));
}

#[tokio::test]
async fn pasted_text_is_truncated_at_pasted_ceiling() {
    let input = FieldInput::text(FieldKind::TaskSheet, "x".repeat(MAX_CHARS_PER_PASTED_TEXT + 1));
    let field = resolve_field(&input, &MemoryBlobs::new()).await;

    assert_eq!(field.source, InputSource::Text);
    assert_eq!(field.source_label(), "Pasted Text");
    let text = field.extracted_text.unwrap();
    assert_eq!(
        text,
        format!("{}{}", "x".repeat(MAX_CHARS_PER_PASTED_TEXT), TRUNCATION_MARKER)
    );
}

#[tokio::test]
async fn blank_pasted_text_is_not_provided() {
    let input = FieldInput::text(FieldKind::Rubric, "   \n ");
    let field = resolve_field(&input, &MemoryBlobs::new()).await;
    assert!(!field.provided);
    assert_eq!(field.source_label(), "N/A");
}

#[tokio::test]
async fn output_order_matches_input_order() {
    let blobs = MemoryBlobs::new()
        .with_delay("mem://slow", b"slow".to_vec(), Duration::from_millis(150))
        .with("mem://fast", b"fast".to_vec());
    let inputs = vec![
        upload(FieldKind::TaskSheet, "mem://slow", "slow.txt", "text/plain"),
        FieldInput::empty(FieldKind::AdditionalMaterial),
        upload(FieldKind::Rubric, "mem://fast", "fast.txt", "text/plain"),
        FieldInput::text(FieldKind::SpecificInstructions, "be brief"),
        FieldInput::empty(FieldKind::PastWork),
    ];

    let fields = resolve_all(&inputs, &blobs).await;
    let kinds: Vec<_> = fields.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, FieldKind::ALL);
    assert_eq!(fields[0].extracted_text.as_deref(), Some("slow"));
    assert_eq!(fields[2].extracted_text.as_deref(), Some("fast"));
}

#[tokio::test]
async fn every_provided_field_has_text() {
    let blobs = MemoryBlobs::new().with("mem://empty", Vec::new());
    let inputs = vec![
        upload(FieldKind::TaskSheet, "mem://missing", "a.pdf", "application/pdf"),
        upload(FieldKind::AdditionalMaterial, "mem://empty", "b.docx", ""),
        FieldInput::text(FieldKind::Rubric, "criteria"),
    ];

    for field in resolve_all(&inputs, &blobs).await {
        assert!(field.provided);
        assert!(
            field.extracted_text.as_deref().is_some_and(|t| !t.is_empty())
                || field.processing_error.is_some()
        );
    }
}

#[tokio::test]
async fn form_inputs_resolve_end_to_end() {
    let form: HashMap<String, String> = [
        ("taskSheetInputMode", "upload"),
        ("taskSheetFileUrl", "mem://brief.pdf"),
        ("taskSheetFileName", "brief.pdf"),
        ("taskSheetFileType", "application/pdf"),
        ("rubricInputMode", "text"),
        ("rubricText", "Clarity 40%"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let blobs = MemoryBlobs::new().with("mem://brief.pdf", task_sheet_pdf());

    let fields = resolve_all(&inputs_from_form(&form), &blobs).await;
    assert_eq!(fields.len(), 5);
    assert!(fields[0].provided);
    assert!(!fields[1].provided);
    assert_eq!(fields[2].extracted_text.as_deref(), Some("Clarity 40%"));
}
