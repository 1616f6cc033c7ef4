//! Language utilities for ISO language code handling
//!
//! Source languages may be an ISO 639-1 / 639-2 code or the literal `auto`;
//! target languages must resolve to a known language.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Literal accepted as source language when the document language is unknown
pub const AUTO_LANGUAGE: &str = "auto";

/// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Whether the code asks for automatic source detection
pub fn is_auto(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(AUTO_LANGUAGE)
}

fn resolve(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let terminological = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(bibliographic, _)| *bibliographic == normalized)
                .map(|(_, terminological)| *terminological)
                .unwrap_or(normalized.as_str());
            Language::from_639_3(terminological)
        }
        _ => None,
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    resolve(code)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let lang = resolve(code)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (resolve(code1), resolve(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    resolve(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Validate a source language: a known code or `auto`
pub fn validate_source_language(code: &str) -> Result<()> {
    if is_auto(code) {
        return Ok(());
    }
    get_language_name(code).map(|_| ())
}

/// Validate a target language: must be a known code, never `auto`
pub fn validate_target_language(code: &str) -> Result<()> {
    if is_auto(code) {
        return Err(anyhow!("Target language cannot be '{}'", AUTO_LANGUAGE));
    }
    get_language_name(code).map(|_| ())
}

/// Human-readable language description for prompts and logs
pub fn describe_language(code: &str) -> String {
    if is_auto(code) {
        return "the language of the text (detect it automatically)".to_string();
    }
    get_language_name(code).unwrap_or_else(|_| code.to_string())
}
