const FENCE: &str = "```";

/// Returns the body of the first ```<info> fenced block in model output.
///
/// The info string (`json`, `JSON`, anything else) is dropped with the opening
/// fence. Prose before the opening fence or after the closing one is discarded.
/// Input that is bare JSON, or has no fence at all, is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with(['{', '[']) {
        return text;
    }
    let Some(start) = text.find(FENCE) else {
        return text;
    };
    let rest = &text[start + FENCE.len()..];

    match rest.split_once('\n') {
        Some((_info, body)) => {
            let end = closing_fence(body).unwrap_or(body.len());
            body[..end].trim()
        }
        // single-line "```json {...}```": everything after the info word
        None => {
            let body = rest
                .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
                .trim_start();
            body.find(FENCE).map_or(body, |end| &body[..end]).trim()
        }
    }
}

/// Byte offset of the first line that opens with a fence.
fn closing_fence(body: &str) -> Option<usize> {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim_start().starts_with(FENCE) {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}
