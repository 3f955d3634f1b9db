//! Cheap, deterministic triage of extracted text.
//!
//! Decides whether a block of extracted text is worth sending to the
//! structuring step, without a full NLP pass. OCR of a blank or skewed scan
//! tends to produce short bursts of punctuation and stray glyphs; real lab
//! reports are dense with digits and domain vocabulary.

/// Anything shorter than this cannot carry a usable result table.
const MIN_READABLE_LEN: usize = 50;

/// Below this share of alphanumeric characters the text is OCR noise.
const MIN_ALNUM_RATIO: f64 = 0.3;

/// Above this share the text is accepted even without domain vocabulary.
const HIGH_ALNUM_RATIO: f64 = 0.6;

/// Polish lab-report vocabulary and unit strings, matched case-insensitively.
const DOMAIN_KEYWORDS: &[&str] = &[
    "wynik",
    "badani",
    "norma",
    "laboratorium",
    "morfologia",
    "mg/dl",
    "mmol",
    "g/dl",
    "krew",
    "mocz",
    "ciśnienie",
];

/// Judge whether extracted text is usable for downstream analysis.
///
/// Rules applied in order, first hit wins:
/// 1. Too short → unreadable.
/// 2. Alphanumeric ratio below 0.3 → unreadable (garbage glyphs).
/// 3. Domain keyword, more than 3 digit runs, or ratio above 0.6 → readable.
/// 4. Otherwise unreadable.
pub fn is_readable(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_READABLE_LEN {
        return false;
    }

    let non_whitespace = trimmed.chars().filter(|c| !c.is_whitespace()).count();
    let alphanumeric = trimmed.chars().filter(|c| c.is_alphanumeric()).count();
    if non_whitespace == 0 {
        return false;
    }

    let ratio = alphanumeric as f64 / non_whitespace as f64;
    if ratio < MIN_ALNUM_RATIO {
        return false;
    }

    let lower = trimmed.to_lowercase();
    if DOMAIN_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return true;
    }

    if digit_runs(trimmed) > 3 {
        return true;
    }

    ratio > HIGH_ALNUM_RATIO
}

/// Count maximal runs of consecutive digits. Tabulated numeric results
/// produce many of these even when the surrounding labels are mangled.
fn digit_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            if !in_run {
                runs += 1;
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }
    runs
}
