//! Brand name sanitizer.
//!
//! Turns a raw company name as it appears in input sheets ("Acme Corp.",
//! "acme.com", "Its Skinny Inc") into a query that the retail search box
//! handles well.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Trailing domain suffix, e.g. `acme.com`.
static DOMAIN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(com|net|org|biz|io|co|us|uk|info)$").unwrap());

/// Standalone legal-entity tokens dropped from brand names (compared lowercased).
const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "inc.",
    "llc",
    "l.l.c.",
    "corp",
    "corp.",
    "corporation",
    "co",
    "co.",
    "ltd",
    "ltd.",
    "plc",
    "gmbh",
    "ltda",
    "group",
    "company",
];

/// Mis-decoded registered-trademark sign left behind by spreadsheet exports.
const TRADEMARK_ARTIFACT: &str = "Â®";

fn is_legal_suffix(token: &str) -> bool {
    let lower = token.to_lowercase();
    LEGAL_SUFFIXES.contains(&lower.as_str())
}

fn is_kept_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() || matches!(c, '-' | '&' | '\'')
}

fn clean_token(token: &str) -> String {
    token
        .replace(TRADEMARK_ARTIFACT, "")
        .chars()
        .filter(|c| is_kept_char(*c))
        .collect()
}

/// Normalize a raw brand string into a search-safe query.
///
/// Pure and idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
/// Empty input yields an empty string.
pub fn sanitize(raw: &str) -> String {
    let stripped = DOMAIN_SUFFIX.replace(raw.trim(), "");

    let mut words: Vec<String> = Vec::new();
    for token in stripped.split_whitespace() {
        if is_legal_suffix(token) {
            continue;
        }
        let cleaned = clean_token(token);
        // "Corp!" only becomes a legal suffix once its symbols are gone
        if cleaned.is_empty() || is_legal_suffix(&cleaned) {
            continue;
        }
        if words.is_empty() && cleaned == "Its" {
            words.push("It's".to_string());
        } else {
            words.push(cleaned);
        }
    }

    words.join(" ").trim().to_string()
}
