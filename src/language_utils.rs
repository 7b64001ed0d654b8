use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// The translation and speech backends expect ISO 639-1 codes where one
/// exists, optionally followed by script and region subtags ("zh-Hant",
/// "pt-BR"). They also keep a few legacy codes of their own ("iw", "jw").
/// These helpers validate user input and normalize it to that form.

/// Map ISO 639-2/B bibliographic codes to their ISO 639-2/T equivalents
fn bibliographic_to_terminologic(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

/// Legacy codes the Google backends use in place of the ISO 639-1 code
fn google_alias(code: &str) -> Option<&'static str> {
    match code {
        "iw" => Some("he"),
        "jw" => Some("jv"),
        _ => None,
    }
}

fn lookup(code: &str) -> Option<Language> {
    let code = google_alias(code).unwrap_or(code);
    match code.len() {
        2 => Language::from_639_1(code),
        3 => Language::from_639_3(bibliographic_to_terminologic(code).unwrap_or(code)),
        _ => None,
    }
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    let lang = lookup(&normalized_code)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    match lang.to_639_1() {
        Some(code_639_1) => Ok(code_639_1.to_string()),
        None => Ok(lang.to_639_3().to_string()),
    }
}

/// Normalize a target language such as "ES", "spa", "pt-br" or "zh-hant"
///
/// The primary subtag is normalized with [`normalize_to_part1_or_part2t`],
/// except for the backends' legacy codes, which are kept as given. Each
/// further subtag must be a script (four letters, title-cased), a region
/// (two letters, upper-cased) or a numeric region (three digits).
pub fn normalize_target_language(code: &str) -> Result<String> {
    let trimmed = code.trim();
    let mut parts = trimmed.split(['-', '_']);
    let primary = parts.next().unwrap_or_default().to_ascii_lowercase();
    let mut normalized = if google_alias(&primary).is_some() {
        primary
    } else {
        normalize_to_part1_or_part2t(&primary).map_err(|_| anyhow!("Invalid language code: {}", code))?
    };

    for subtag in parts {
        let subtag = normalize_subtag(subtag).ok_or_else(|| anyhow!("Invalid subtag in language code: {}", code))?;
        normalized.push('-');
        normalized.push_str(&subtag);
    }

    Ok(normalized)
}

fn normalize_subtag(subtag: &str) -> Option<String> {
    let alphabetic = subtag.chars().all(|c| c.is_ascii_alphabetic());
    match subtag.len() {
        2 if alphabetic => Some(subtag.to_ascii_uppercase()),
        3 if subtag.chars().all(|c| c.is_ascii_digit()) => Some(subtag.to_string()),
        4 if alphabetic => {
            let (first, rest) = subtag.split_at(1);
            Some(format!("{}{}", first.to_ascii_uppercase(), rest.to_ascii_lowercase()))
        }
        _ => None,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();
    let primary = normalized.split(['-', '_']).next().unwrap_or_default();
    let lang = lookup(primary)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}
