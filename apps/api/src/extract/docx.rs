use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::{DocumentKind, ExtractError};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts paragraph text from a DOCX container, one paragraph per line.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let corrupt = |e: &dyn std::fmt::Display| ExtractError::corrupt(DocumentKind::Docx, e);

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(&e))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| corrupt(&format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(&e))?;

    let paragraphs = collect_paragraphs(&xml).map_err(|e| corrupt(&e))?;
    Ok(paragraphs.join("\n"))
}

/// Walks the WordprocessingML body. Only `w:t` content is text; whitespace
/// between elements is markup noise.
///
/// Paragraphs nest (text boxes carry their own `w:p` inside a run), so open
/// paragraphs are kept on a stack and a nested one is emitted before its parent.
/// Tabs and breaks count only inside a `w:r` run; the `w:tab` elements under
/// `w:pPr/w:tabs` are tab-stop definitions.
fn collect_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match (e.name().as_ref(), open.last_mut()) {
                (b"w:p", _) => paragraphs.push(String::new()),
                (b"w:tab", Some(current)) if run_depth > 0 => current.push('\t'),
                (b"w:br" | b"w:cr", Some(current)) if run_depth > 0 => current.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => {
                if let Some(current) = open.last_mut() {
                    current.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:p" => {
                    if let Some(done) = open.pop() {
                        paragraphs.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    pub(crate) fn build_docx_from_xml(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
            .collect();
        build_docx_from_xml(&format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        ))
    }

    #[test]
    fn test_paragraphs_joined_with_newlines() {
        let bytes = build_docx(&["Scope", "Kubernetes cluster: 30 days", "Total: 90 000 EUR"]);
        let text = extract_docx_text(&bytes).unwrap();
        assert_eq!(text, "Scope\nKubernetes cluster: 30 days\nTotal: 90 000 EUR");
    }

    #[test]
    fn test_runs_within_paragraph_are_concatenated() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
            <w:p><w:r><w:t>Senior </w:t></w:r><w:r><w:t>architect</w:t></w:r><w:r><w:tab/><w:t>1 200 EUR/day</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>R&amp;D</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_docx_text(&build_docx_from_xml(xml)).unwrap();
        assert_eq!(text, "Senior architect\t1 200 EUR/day\n\nR&D");
    }

    #[test]
    fn test_tab_stop_definitions_are_not_text() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
            <w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/><w:tab w:val="right" w:pos="9000"/></w:tabs></w:pPr><w:r><w:t>Total</w:t></w:r><w:r><w:tab/><w:t>48 000 EUR</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_docx_text(&build_docx_from_xml(xml)).unwrap();
        assert_eq!(text, "Total\t48 000 EUR");
    }

    #[test]
    fn test_text_box_paragraph_keeps_outer_paragraph_text() {
        let xml = r#"<w:document xmlns:w="w" xmlns:v="v"><w:body>
            <w:p><w:r><w:t>Hosting</w:t></w:r><w:r><w:pict><v:textbox><w:txbxContent><w:p><w:r><w:t>Optional</w:t></w:r></w:p></w:txbxContent></v:textbox></w:pict></w:r><w:r><w:t> 200 EUR/month</w:t></w:r></w:p>
            <w:p><w:r><w:t>Support</w:t><w:br/><w:t>12 months</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_docx_text(&build_docx_from_xml(xml)).unwrap();
        assert_eq!(text, "Optional\nHosting 200 EUR/month\nSupport\n12 months");
    }

    #[test]
    fn test_zip_without_document_part_is_corrupt() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("content.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_docx_text(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::CorruptDocument {
                kind: DocumentKind::Docx,
                ..
            }
        ));
    }

    #[test]
    fn test_non_zip_bytes_are_corrupt() {
        assert!(extract_docx_text(b"PK? no").is_err());
    }
}
