use super::{DocumentKind, ExtractError};

/// Extracts the text layer of every page, in page order.
///
/// A scanned PDF without OCR yields an empty or near-empty string, not an error.
/// The minimum-content check downstream is what rejects it.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractError::corrupt(DocumentKind::Pdf, e))?;

    tracing::debug!("PDF text layer extracted: {} chars", text.len());
    Ok(text)
}
