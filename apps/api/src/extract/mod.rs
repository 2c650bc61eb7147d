//! Content Extractor: turns an uploaded file into a single normalized content unit.
//!
//! Format dispatch is a closed mapping from file extension to `DocumentKind`.
//! Anything outside the enumerated set is rejected with `UnsupportedFormat`
//! before a single byte is parsed.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

pub mod docx;
pub mod pdf;
pub mod sheet;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: '{extension}'")]
    UnsupportedFormat { extension: String },

    #[error("failed to parse {kind} document: {reason}")]
    CorruptDocument { kind: DocumentKind, reason: String },
}

impl ExtractError {
    pub(crate) fn corrupt(kind: DocumentKind, reason: impl fmt::Display) -> Self {
        ExtractError::CorruptDocument {
            kind,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn canonical_mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Every document format the auditor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    /// `.xlsx` and legacy `.xls` workbooks.
    Spreadsheet,
    Csv,
    PlainText,
    Image(ImageFormat),
}

impl DocumentKind {
    /// Resolves the format from the declared filename. Case-insensitive.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "xlsx" | "xls" => Ok(DocumentKind::Spreadsheet),
            "csv" => Ok(DocumentKind::Csv),
            "txt" => Ok(DocumentKind::PlainText),
            "png" => Ok(DocumentKind::Image(ImageFormat::Png)),
            "jpg" | "jpeg" => Ok(DocumentKind::Image(ImageFormat::Jpeg)),
            _ => Err(ExtractError::UnsupportedFormat { extension }),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "DOCX",
            DocumentKind::Spreadsheet => "spreadsheet",
            DocumentKind::Csv => "CSV",
            DocumentKind::PlainText => "text",
            DocumentKind::Image(ImageFormat::Png) => "PNG",
            DocumentKind::Image(ImageFormat::Jpeg) => "JPEG",
        };
        f.write_str(name)
    }
}

/// The unified representation handed to the prompt assembler.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedContent {
    Text(String),
    Image { bytes: Bytes, mime_type: String },
}

impl NormalizedContent {
    /// Trimmed character count of a text unit. `None` for images.
    pub fn text_len(&self) -> Option<usize> {
        match self {
            NormalizedContent::Text(body) => Some(body.trim().chars().count()),
            NormalizedContent::Image { .. } => None,
        }
    }
}

/// Resolves the format from `filename`, then extracts `bytes`.
///
/// CPU-bound and synchronous: async callers should run it on the blocking pool.
pub fn extract(
    filename: &str,
    mime_hint: Option<&str>,
    bytes: Bytes,
) -> Result<NormalizedContent, ExtractError> {
    let kind = DocumentKind::from_filename(filename)?;
    extract_kind(kind, mime_hint, bytes)
}

fn extract_kind(
    kind: DocumentKind,
    mime_hint: Option<&str>,
    bytes: Bytes,
) -> Result<NormalizedContent, ExtractError> {
    match kind {
        DocumentKind::Image(format) => Ok(NormalizedContent::Image {
            mime_type: image_mime(format, mime_hint),
            bytes,
        }),
        DocumentKind::Pdf => pdf::extract_pdf_text(&bytes).map(NormalizedContent::Text),
        DocumentKind::Docx => docx::extract_docx_text(&bytes).map(NormalizedContent::Text),
        DocumentKind::Spreadsheet => {
            sheet::extract_workbook_text(bytes.to_vec()).map(NormalizedContent::Text)
        }
        DocumentKind::Csv => sheet::extract_csv_text(&bytes).map(NormalizedContent::Text),
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())
            .map(NormalizedContent::Text)
            .map_err(|e| ExtractError::corrupt(kind, e)),
    }
}

/// Keeps the declared MIME type when it is an image type, otherwise falls back
/// to the canonical type for the extension.
fn image_mime(format: ImageFormat, mime_hint: Option<&str>) -> String {
    match mime_hint.map(str::trim) {
        Some(declared) if declared.to_ascii_lowercase().starts_with("image/") => {
            declared.to_string()
        }
        _ => format.canonical_mime().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename_maps_every_supported_extension() {
        let cases = [
            ("estimate.pdf", DocumentKind::Pdf),
            ("estimate.docx", DocumentKind::Docx),
            ("estimate.xlsx", DocumentKind::Spreadsheet),
            ("estimate.xls", DocumentKind::Spreadsheet),
            ("estimate.csv", DocumentKind::Csv),
            ("notes.txt", DocumentKind::PlainText),
            ("shot.png", DocumentKind::Image(ImageFormat::Png)),
            ("shot.jpg", DocumentKind::Image(ImageFormat::Jpeg)),
            ("shot.jpeg", DocumentKind::Image(ImageFormat::Jpeg)),
        ];
        for (name, expected) in cases {
            assert_eq!(DocumentKind::from_filename(name).unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn test_from_filename_is_case_insensitive() {
        assert_eq!(
            DocumentKind::from_filename("QUOTE.V2.PDF").unwrap(),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let err = DocumentKind::from_filename("setup.exe").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnsupportedFormat { ref extension } if extension == "exe"
        ));
    }

    #[test]
    fn test_missing_extension_is_rejected() {
        assert!(matches!(
            DocumentKind::from_filename("README"),
            Err(ExtractError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_unsupported_format_never_touches_bytes() {
        // not a valid anything; must fail on the extension alone
        let err = extract("payload.exe", None, Bytes::from_static(b"MZ\x90\x00")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_image_passes_through_with_declared_mime() {
        let bytes = Bytes::from_static(b"\xff\xd8\xff\xe0fakejpeg");
        let content = extract("screenshot.jpg", Some("image/jpeg"), bytes.clone()).unwrap();
        assert_eq!(
            content,
            NormalizedContent::Image {
                bytes,
                mime_type: "image/jpeg".to_string()
            }
        );
        assert_eq!(content.text_len(), None);
    }

    #[test]
    fn test_image_mime_falls_back_to_extension() {
        let content = extract(
            "quote.png",
            Some("application/octet-stream"),
            Bytes::from_static(b"\x89PNG"),
        )
        .unwrap();
        match content {
            NormalizedContent::Image { mime_type, .. } => assert_eq!(mime_type, "image/png"),
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_decoded_as_utf8() {
        let content = extract("notes.txt", None, Bytes::from("Budget: 40 000 €")).unwrap();
        assert_eq!(content, NormalizedContent::Text("Budget: 40 000 €".to_string()));
    }

    #[test]
    fn test_invalid_utf8_text_is_corrupt() {
        let err = extract("notes.txt", None, Bytes::from_static(&[0xff, 0xfe, 0x00])).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::CorruptDocument {
                kind: DocumentKind::PlainText,
                ..
            }
        ));
    }

    #[test]
    fn test_text_len_counts_trimmed_chars() {
        let content = NormalizedContent::Text("  éé  \n".to_string());
        assert_eq!(content.text_len(), Some(2));
    }

    #[test]
    fn test_text_formats_yield_text_variant() {
        let csv = extract("lines.csv", None, Bytes::from("item,days\nAPI,12\n")).unwrap();
        assert!(matches!(csv, NormalizedContent::Text(_)));

        let docx = extract(
            "proposal.docx",
            None,
            Bytes::from(docx::tests::build_docx(&["Phase 1", "Phase 2"])),
        )
        .unwrap();
        assert!(matches!(docx, NormalizedContent::Text(_)));

        let rows: &[&[&str]] = &[&["Design sprint", "10"]];
        let xlsx = extract(
            "Budget.XLSX",
            None,
            Bytes::from(sheet::tests::build_xlsx(&[("Budget", rows)])),
        )
        .unwrap();
        assert_eq!(
            xlsx,
            NormalizedContent::Text("## Budget\n\nDesign sprint\t10\n\n".to_string())
        );

        let pdf = extract(
            "proposal.pdf",
            None,
            Bytes::from(pdf::tests::build_pdf(&["Discovery workshop 5 days"])),
        )
        .unwrap();
        assert!(matches!(pdf, NormalizedContent::Text(_)));
    }
}
