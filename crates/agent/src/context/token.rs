//! Token estimation for mixed-script text.
//!
//! Weighted character heuristic tuned for Korean/CJK text mixed with
//! English:
//!
//! | Bucket | Weight |
//! |--------|--------|
//! | Hangul, CJK ideographs, kana | 1.5 per character |
//! | Latin-alphanumeric words | 0.75 per word |
//! | Punctuation and symbols | 0.5 per character |
//!
//! Whitespace is free. The weighted sum is rounded to the nearest integer.

const SCRIPT_WEIGHT: f64 = 1.5;
const WORD_WEIGHT: f64 = 0.75;
const SYMBOL_WEIGHT: f64 = 0.5;

/// Whether `c` belongs to an ideographic or syllabic script.
fn is_script_char(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'   // Hangul syllables
        | '\u{1100}'..='\u{11FF}' // Hangul jamo
        | '\u{3130}'..='\u{318F}' // Hangul compatibility jamo
        | '\u{3040}'..='\u{30FF}' // Hiragana, Katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
    )
}

/// Estimate the token count of `text`. Always at least 1.
pub fn estimate_tokens(text: &str) -> usize {
    let mut script = 0usize;
    let mut words = 0usize;
    let mut symbols = 0usize;
    let mut in_word = false;

    for c in text.chars() {
        if is_script_char(c) {
            script += 1;
            in_word = false;
        } else if c.is_alphanumeric() {
            if !in_word {
                words += 1;
                in_word = true;
            }
        } else {
            if !c.is_whitespace() {
                symbols += 1;
            }
            in_word = false;
        }
    }

    let weighted =
        script as f64 * SCRIPT_WEIGHT + words as f64 * WORD_WEIGHT + symbols as f64 * SYMBOL_WEIGHT;
    (weighted.round() as usize).max(1)
}
