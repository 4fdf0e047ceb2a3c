//! Citation key generation
//!
//! Keys are `<surname><year><word>`, all lowercase ASCII, e.g.
//! `doe2021climate`. Collisions inside one export get letter suffixes.

use std::collections::HashSet;

use chrono::Utc;

use refport_domain::normalize::fold_ascii;
use refport_domain::CanonicalReference;

/// Words never used as the title part of a key
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "from", "with", "into", "onto", "over", "upon", "about", "that", "this",
    "der", "die", "das", "les", "una",
];

/// Lowercase ASCII letters and digits only
fn normalize_for_key(value: &str) -> String {
    fold_ascii(value)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

/// First title word longer than two characters that is not a stop word
fn first_significant_word(title: &str) -> Option<String> {
    title
        .split(|c: char| c.is_whitespace() || c == '-' || c == ':')
        .map(normalize_for_key)
        .find(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.as_str()))
}

/// Generate a key for a record that has none.
pub fn generate_cite_key(reference: &CanonicalReference) -> String {
    let mut key = String::new();

    if let Some(author) = reference.first_author() {
        key.push_str(&normalize_for_key(&author.family));
    }
    if let Some(year) = reference.year {
        key.push_str(&year.to_string());
    }
    if let Some(word) = reference.title.as_deref().and_then(first_significant_word) {
        key.push_str(&word);
    }

    let anonymous = reference.first_author().is_none() && reference.title.is_none();
    if key.is_empty() || anonymous {
        return format!("ref{}", Utc::now().timestamp());
    }
    key
}

/// Append `a`..`z`, then `2`, `3`, ... until the key is unused.
pub fn make_cite_key_unique(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }

    for suffix in 'a'..='z' {
        let candidate = format!("{}{}", base, suffix);
        if !existing.contains(&candidate) {
            return candidate;
        }
    }

    (2..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Sanitize a user-supplied key: drop characters BibTeX would choke on.
pub fn sanitize_cite_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "_-:./".contains(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use refport_domain::{Contributors, ReferenceType};

    fn reference(author: Option<&str>, year: Option<i32>, title: Option<&str>) -> CanonicalReference {
        CanonicalReference {
            reference_type: ReferenceType::Journal,
            title: title.map(String::from),
            author: author.map(Contributors::parse),
            year,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_cite_key() {
        let r = reference(Some("Doe, Jane"), Some(2021), Some("Climate Models"));
        assert_eq!(generate_cite_key(&r), "doe2021climate");
    }

    #[test]
    fn test_skips_short_and_stop_words() {
        let r = reference(Some("John Smith"), Some(2020), Some("The Art of War"));
        assert_eq!(generate_cite_key(&r), "smith2020art");

        let r = reference(Some("Smith, J."), Some(2020), Some("A Study"));
        assert_eq!(generate_cite_key(&r), "smith2020study");
    }

    #[test]
    fn test_folds_diacritics() {
        let r = reference(Some("Müller, Jörg"), Some(1999), Some("Über Bücher"));
        assert_eq!(generate_cite_key(&r), "muller1999uber");
    }

    #[test]
    fn test_fallback_without_author_or_title() {
        let r = reference(None, Some(2020), None);
        let key = generate_cite_key(&r);
        assert!(key.starts_with("ref"));
        assert!(key[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_title_only_key() {
        let r = reference(None, None, Some("Quantum Widgets"));
        assert_eq!(generate_cite_key(&r), "quantum");
    }

    #[test]
    fn test_make_unique() {
        let mut existing = HashSet::new();
        assert_eq!(make_cite_key_unique("smith2020", &existing), "smith2020");

        existing.insert("smith2020".to_string());
        assert_eq!(make_cite_key_unique("smith2020", &existing), "smith2020a");

        existing.insert("smith2020a".to_string());
        assert_eq!(make_cite_key_unique("smith2020", &existing), "smith2020b");

        for c in 'b'..='z' {
            existing.insert(format!("smith2020{}", c));
        }
        assert_eq!(make_cite_key_unique("smith2020", &existing), "smith20202");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_cite_key("Smith 2020{x}"), "Smith2020x");
        assert_eq!(sanitize_cite_key("doi:10.1/abc"), "doi:10.1/abc");
    }
}
