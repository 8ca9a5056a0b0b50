#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;

use quill::engine::{AssessmentEngine, EngineConfig};
use quill::generator::mock::MockGenerator;
use quill::storage::BlobSource;

/// A one-page PDF with one text line per entry, big enough to pass the
/// minimum-size check.
pub fn pdf_with_lines(lines: &[&str]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut content = String::from("BT /F1 11 Tf 72 740 Td 14 TL\n");
    for line in lines {
        content.push_str(&format!("({line}) Tj T*\n"));
    }
    content.push_str("ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });
    if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
        page.set("Parent", pages_id);
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A task sheet PDF comfortably over the size floor.
pub fn task_sheet_pdf() -> Vec<u8> {
    let lines: Vec<String> = (1..=40)
        .map(|i| format!("Criterion {i} Evaluate the photosynthesis hypothesis with evidence"))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let bytes = pdf_with_lines(&refs);
    assert!(bytes.len() >= 1024);
    bytes
}

/// A minimal DOCX holding one paragraph per entry.
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// An in-memory blob source. Each blob can be given a delay so tests can
/// make later fields finish first.
#[derive(Default)]
pub struct MemoryBlobs {
    blobs: HashMap<String, (Vec<u8>, Duration)>,
}

impl MemoryBlobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.blobs.insert(url.to_string(), (bytes, Duration::ZERO));
        self
    }

    pub fn with_delay(mut self, url: &str, bytes: Vec<u8>, delay: Duration) -> Self {
        self.blobs.insert(url.to_string(), (bytes, delay));
        self
    }
}

#[async_trait]
impl BlobSource for MemoryBlobs {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        match self.blobs.get(url) {
            Some((bytes, delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(bytes.clone())
            }
            None => bail!("Failed to fetch blob: 404 Not Found. URL: {url}"),
        }
    }
}

/// An engine over scripted generators. Keep the `Arc`s to inspect calls.
pub fn engine(
    planner: Arc<MockGenerator>,
    writer: Arc<MockGenerator>,
    blobs: Arc<dyn BlobSource>,
) -> AssessmentEngine {
    AssessmentEngine::new(planner, writer, blobs, EngineConfig::default())
}
