//! Raw text from DOCX packages: the runs of `word/document.xml`, one
//! paragraph per block.

use std::io::{Cursor, Read};

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("not a valid DOCX archive")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("missing word/document.xml")?
        .read_to_string(&mut xml)
        .context("failed to read word/document.xml")?;
    document_text(&xml)
}

fn document_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut output = String::new();
    let mut in_text = false;
    // `w:tab` also appears as a tab-stop definition under `w:pPr`; only
    // the ones inside a run are content.
    let mut in_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:r" => in_run = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if in_run => match e.name().as_ref() {
                b"w:tab" => output.push('\t'),
                b"w:br" | b"w:cr" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let value = e.unescape().map_err(|err| anyhow!(err))?;
                output.push_str(&value);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => in_run = false,
                b"w:p" => output.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => bail!(
                "failed to parse DOCX XML at position {}: {}",
                reader.buffer_position(),
                err
            ),
            _ => {}
        }
        buf.clear();
    }

    Ok(output.trim_end().to_string())
}
