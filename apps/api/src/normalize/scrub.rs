//! Identity scrubbing: best-effort removal of vendor and technology-class terms
//! from model output.
//!
//! Plain substitution, not semantic redaction. Paraphrases get through.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

pub const PLACEHOLDER: &str = "the audit engine";

/// Brand names and descriptive phrases, English then French. Matched
/// case-insensitively. Longer phrases come first so they win over their
/// own sub-phrases.
const PHRASE_TERMS: &[&str] = &[
    // English
    r"large language models?",
    r"language models?",
    r"AI (?:models?|assistants?|systems?)",
    r"artificial intelligence",
    r"generative AI",
    r"chat ?bots?",
    r"Gemini(?: (?:[0-9]+(?:\.[0-9]+)?|Pro|Flash|Ultra|Nano))*",
    r"DeepMind",
    r"Google",
    r"Bard",
    r"OpenAI",
    r"ChatGPT",
    r"GPT-?[0-9][0-9a-z.]*",
    r"Anthropic",
    r"Claude",
    r"Llama",
    r"Mistral",
    r"Copilot",
    // French
    r"grands? modèles? de langage",
    r"modèles? de langage",
    r"modèles? d'IA",
    r"assistants? IA",
    r"intelligences? artificielles?",
    r"IA générative",
];

/// Bare acronyms. Case-sensitive so ordinary words ("j'ai", "llm" in a URL
/// slug) are left alone.
const ACRONYM_TERMS: &[&str] = &[r"LLMs?", r"AI", r"IA"];

static PHRASES: Lazy<Regex> = Lazy::new(|| build(PHRASE_TERMS, true));
static ACRONYMS: Lazy<Regex> = Lazy::new(|| build(ACRONYM_TERMS, false));
/// "Google Gemini" becomes two placeholders; collapse runs of them into one.
static REPEATS: Lazy<Regex> = Lazy::new(|| {
    let p = regex::escape(PLACEHOLDER);
    Regex::new(&format!(r"{p}(?:\s+{p})+"))
        .unwrap_or_else(|e| panic!("invalid scrub pattern: {e}"))
});

fn build(terms: &[&str], case_insensitive: bool) -> Regex {
    let flags = if case_insensitive { "(?i)" } else { "" };
    let pattern = format!(r"{flags}\b(?:{})\b", terms.join("|"));
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid scrub pattern: {e}"))
}

/// Replaces every known term with [`PLACEHOLDER`]. Idempotent: the placeholder
/// contains none of the terms.
pub fn scrub_identity(text: &str) -> Cow<'_, str> {
    let text = replace(Cow::Borrowed(text), &PHRASES);
    let text = replace(text, &ACRONYMS);
    replace(text, &REPEATS)
}

fn replace<'a>(text: Cow<'a, str>, pattern: &Regex) -> Cow<'a, str> {
    match text {
        Cow::Borrowed(s) => pattern.replace_all(s, PLACEHOLDER),
        Cow::Owned(s) => Cow::Owned(pattern.replace_all(&s, PLACEHOLDER).into_owned()),
    }
}

/// Scrubs every string inside a JSON tree, keys excluded.
pub fn scrub_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::String(s) => {
            if let Cow::Owned(scrubbed) = scrub_identity(s) {
                *s = scrubbed;
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(scrub_json),
        serde_json::Value::Object(map) => map.values_mut().for_each(scrub_json),
        _ => {}
    }
}
