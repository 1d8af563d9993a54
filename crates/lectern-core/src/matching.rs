use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LEADING_ARTICLES: [&str; 3] = ["the", "a", "an"];

/// Normalize a work or book title for comparison.
///
/// Steps (order matters):
/// 1. Straighten typographic apostrophes
/// 2. Unicode NFKD normalization (decomposes accents)
/// 3. Strip to ASCII
/// 4. Split on anything that is not `[a-zA-Z0-9]`, lowercase
/// 5. Drop one leading article ("the", "a", "an") when words remain after it
/// 6. Join the words with no separator
pub fn normalize_title(title: &str) -> String {
    static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

    let title = title.replace(['\u{2018}', '\u{2019}'], "'");
    let ascii: String = title.nfkd().filter(|c| c.is_ascii()).collect();
    let lower = ascii.to_lowercase();

    // Apostrophes join words ("night's" -> "nights") rather than split them.
    let lower = lower.replace('\'', "");
    let mut words: Vec<&str> = NON_ALNUM.split(&lower).filter(|w| !w.is_empty()).collect();
    if words.len() > 1 && LEADING_ARTICLES.contains(&words[0]) {
        words.remove(0);
    }
    words.concat()
}

/// Similarity of two titles in `[0, 1]` after normalization.
///
/// Empty inputs never match anything.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize_title(a);
    let norm_b = normalize_title(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    if norm_a == norm_b {
        return 1.0;
    }
    rapidfuzz::fuzz::ratio(norm_a.chars(), norm_b.chars())
}

/// Title-case a file stem: `"paradise_lost"` -> `"Paradise Lost"`.
pub fn title_case(stem: &str) -> String {
    stem.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
