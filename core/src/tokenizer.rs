use lazy_static::lazy_static;
use regex::Regex;

/// Tokens of this many characters or fewer are dropped.
pub const MIN_TOKEN_CHARS: usize = 3;

lazy_static! {
    // Anything that is not a word character, whitespace or a hyphen acts as a separator.
    static ref SEPARATORS: Regex = Regex::new(r"[^\w\s-]").expect("valid regex");
}

/// Tokenize text into index terms: lowercase, punctuation to whitespace, split, drop short tokens.
///
/// The same function feeds the index builder and the query path.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lowered = text.to_lowercase();
    let cleaned = SEPARATORS.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|tok| tok.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_owned)
        .collect()
}

/// Tokenize several texts into one sequence, keeping only the first occurrence of each term.
pub fn tokenize_unique<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for text in texts {
        for tok in tokenize(text.as_ref()) {
            if seen.insert(tok.clone()) {
                out.push(tok);
            }
        }
    }
    out
}
