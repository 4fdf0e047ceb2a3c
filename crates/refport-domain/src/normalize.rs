//! Value cleaning shared by every parser and serializer
//!
//! Every cleaner is idempotent: running it on its own output returns the
//! same value.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{InterchangeError, Result};

lazy_static! {
    static ref YEAR: Regex = Regex::new(r"\d{4}").unwrap();
    static ref DOI_PREFIX: Regex =
        Regex::new(r"(?i)^(?:https?://(?:dx\.)?doi\.org/|(?:dx\.)?doi\.org/|doi:\s*)").unwrap();
    static ref PMID: Regex = Regex::new(r"(?:^|\D)(\d{7,8})(?:\D|$)").unwrap();
    static ref PAGE_DASH: Regex = Regex::new(r"(?:\s*[-–—])+\s*").unwrap();
    static ref PAGE_PREFIX: Regex = Regex::new(r"(?i)^pp?\.\s*").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Date strings that deliberately carry no year
const NO_DATE_MARKERS: &[&str] = &["n.d.", "n.d", "nd", "no date", "in press", "forthcoming"];

/// First 4-digit run in a date-like value
pub fn extract_year(value: &str) -> Option<i32> {
    YEAR.find(value).and_then(|m| m.as_str().parse().ok())
}

/// Year from a date-like source field.
///
/// Empty values and "no date" markers yield `None`; anything else without a
/// 4-digit run is an `InvalidDateFormat`.
pub fn parse_date_field(value: &str) -> Result<Option<i32>> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || NO_DATE_MARKERS
            .iter()
            .any(|m| m.eq_ignore_ascii_case(trimmed))
    {
        return Ok(None);
    }
    extract_year(trimmed)
        .map(Some)
        .ok_or_else(|| InterchangeError::InvalidDateFormat {
            value: trimmed.to_string(),
        })
}

/// Strip resolver URLs and `doi:` prefixes.
pub fn clean_doi(value: &str) -> Option<String> {
    let mut doi = value.trim().to_string();
    while let Some(m) = DOI_PREFIX.find(&doi) {
        doi = doi[m.end()..].trim().to_string();
    }
    non_empty(doi)
}

/// First 7 or 8 digit run
pub fn clean_pmid(value: &str) -> Option<String> {
    PMID.captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Digits and check character `X` only
pub fn clean_isbn(value: &str) -> Option<String> {
    let isbn: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    non_empty(isbn)
}

/// `NNNN-NNNX` when eight characters remain, otherwise the bare characters
pub fn clean_issn(value: &str) -> Option<String> {
    let bare = clean_isbn(value)?;
    if bare.len() == 8 {
        Some(format!("{}-{}", &bare[..4], &bare[4..]))
    } else {
        Some(bare)
    }
}

/// Whether an identifier looks like an ISSN rather than an ISBN
pub fn looks_like_issn(value: &str) -> bool {
    clean_isbn(value).is_some_and(|bare| bare.len() == 8)
}

/// Keep the value only if it is an absolute URL with a host.
pub fn clean_url(value: &str) -> Option<String> {
    let trimmed = value.trim();
    match url::Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() => Some(trimmed.to_string()),
        _ => None,
    }
}

/// Split on `,`, `;` or `|`.
pub fn clean_keywords(value: &str) -> Vec<String> {
    value
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

pub fn join_keywords(keywords: &[String]) -> String {
    keywords.join(", ")
}

/// Collapse dash variants to a single hyphen: `"pp. 123 -- 145"` → `"123-145"`.
pub fn normalize_pages(value: &str) -> String {
    let trimmed = PAGE_PREFIX.replace(value.trim(), "");
    PAGE_DASH.replace_all(trimmed.trim(), "-").into_owned()
}

/// Split a page range into start and end page.
pub fn split_pages(value: &str) -> (String, Option<String>) {
    let normalized = normalize_pages(value);
    match normalized.split_once('-') {
        Some((start, end)) if !end.is_empty() => (start.to_string(), Some(end.to_string())),
        Some((start, _)) => (start.to_string(), None),
        None => (normalized, None),
    }
}

pub fn join_pages(start: &str, end: Option<&str>) -> String {
    match end.map(str::trim).filter(|e| !e.is_empty()) {
        Some(end) => format!("{}-{}", start.trim(), end),
        None => start.trim().to_string(),
    }
}

/// Remove tags and decode the handful of entities abstracts tend to carry.
pub fn strip_html(value: &str) -> String {
    let without_tags = HTML_TAG.replace_all(value, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    collapse_whitespace(&decoded)
}

pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

/// Truncate to at most `max` characters, cutting at a word boundary and
/// appending `...`.
pub fn truncate_words(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    if max < 4 {
        return value.chars().take(max).collect();
    }

    let budget = max - 3;
    let prefix: String = value.chars().take(budget).collect();
    let cut = match prefix.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &prefix[..pos],
        _ => prefix.as_str(),
    };
    format!("{}...", cut.trim_end())
}

/// Greedy word wrap into lines of at most `max` characters. Words longer than
/// `max` are split.
pub fn wrap_words(value: &str, max: usize) -> Vec<String> {
    if max == 0 {
        return vec![value.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in value.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(max) {
            let piece: String = chunk.iter().collect();
            let piece_len = chunk.len();
            if current_len == 0 {
                current = piece;
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= max {
                current.push(' ');
                current.push_str(&piece);
                current_len += 1 + piece_len;
            } else {
                lines.push(std::mem::take(&mut current));
                current = piece;
                current_len = piece_len;
            }
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Decompose and drop non-ASCII marks: `"Müller"` → `"Muller"`.
pub fn fold_ascii(value: &str) -> String {
    value.nfkd().filter(char::is_ascii).collect()
}

/// Trimmed value, or `None` when blank
pub fn non_empty(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("2020", Some(2020))]
    #[case("2020/05/12", Some(2020))]
    #[case("May 1999", Some(1999))]
    #[case("c. 85", None)]
    fn test_extract_year(#[case] input: &str, #[case] expected: Option<i32>) {
        assert_eq!(extract_year(input), expected);
    }

    #[test]
    fn test_parse_date_field() {
        assert_eq!(parse_date_field("2021-03-01"), Ok(Some(2021)));
        assert_eq!(parse_date_field("  "), Ok(None));
        assert_eq!(parse_date_field("n.d."), Ok(None));
        assert!(matches!(
            parse_date_field("spring"),
            Err(InterchangeError::InvalidDateFormat { .. })
        ));
    }

    #[rstest]
    #[case("10.1000/xyz123", "10.1000/xyz123")]
    #[case("https://doi.org/10.1000/xyz123", "10.1000/xyz123")]
    #[case("http://dx.doi.org/10.1000/xyz123", "10.1000/xyz123")]
    #[case("doi: 10.1000/xyz123", "10.1000/xyz123")]
    #[case("DOI:https://doi.org/10.1000/xyz123", "10.1000/xyz123")]
    fn test_clean_doi(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_doi(input).as_deref(), Some(expected));
    }

    #[test]
    fn test_clean_pmid() {
        assert_eq!(clean_pmid("PMID: 12345678").as_deref(), Some("12345678"));
        assert_eq!(clean_pmid("1234567").as_deref(), Some("1234567"));
        assert_eq!(clean_pmid("123456"), None);
        assert_eq!(clean_pmid("123456789"), None);
    }

    #[test]
    fn test_clean_isbn_and_issn() {
        assert_eq!(clean_isbn("978-0-306-40615-7").as_deref(), Some("9780306406157"));
        assert_eq!(clean_isbn("0-8044-2957-x").as_deref(), Some("080442957X"));
        assert_eq!(clean_issn("0028 0836").as_deref(), Some("0028-0836"));
        assert!(looks_like_issn("1234-567X"));
        assert!(!looks_like_issn("978-0-306-40615-7"));
    }

    #[test]
    fn test_clean_url() {
        assert_eq!(
            clean_url(" https://example.org/paper ").as_deref(),
            Some("https://example.org/paper")
        );
        assert_eq!(clean_url("example.org/paper"), None);
        assert_eq!(clean_url("not a url"), None);
    }

    #[test]
    fn test_clean_keywords() {
        assert_eq!(
            clean_keywords("climate; models|ocean , , ice"),
            vec!["climate", "models", "ocean", "ice"]
        );
    }

    #[rstest]
    #[case("123-145", "123-145")]
    #[case("123--145", "123-145")]
    #[case("123 – 145", "123-145")]
    #[case("pp. 12-19", "12-19")]
    #[case("e1002", "e1002")]
    fn test_normalize_pages(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_pages(input), expected);
    }

    #[test]
    fn test_split_and_join_pages() {
        assert_eq!(split_pages("123--145"), ("123".to_string(), Some("145".to_string())));
        assert_eq!(split_pages("77"), ("77".to_string(), None));
        assert_eq!(join_pages("123", Some("145")), "123-145");
        assert_eq!(join_pages("123", None), "123");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Heat &amp; <b>light</b></p>"),
            "Heat & light"
        );
    }

    #[test]
    fn test_truncate_words() {
        let text = "The quick brown fox jumps over the lazy dog";
        let truncated = truncate_words(text, 20);
        assert_eq!(truncated, "The quick brown...");
        assert!(truncated.chars().count() <= 20);
        assert_eq!(truncate_words("short", 20), "short");
    }

    #[test]
    fn test_wrap_words() {
        let lines = wrap_words("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);

        let lines = wrap_words("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    proptest! {
        #[test]
        fn prop_clean_doi_idempotent(s in "\\PC{0,40}") {
            let once = clean_doi(&s);
            let twice = once.as_deref().and_then(clean_doi);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_clean_isbn_idempotent(s in "[0-9Xx -]{0,20}") {
            let once = clean_isbn(&s);
            prop_assert_eq!(once.as_deref().and_then(clean_isbn), once.clone());
        }

        #[test]
        fn prop_normalize_pages_idempotent(s in "[0-9 –-]{0,12}") {
            let once = normalize_pages(&s);
            prop_assert_eq!(normalize_pages(&once), once);
        }

        #[test]
        fn prop_clean_keywords_idempotent(s in "[a-z ,;|]{0,30}") {
            let once = join_keywords(&clean_keywords(&s));
            prop_assert_eq!(join_keywords(&clean_keywords(&once)), once);
        }

        #[test]
        fn prop_wrap_never_exceeds_max(s in "[a-z ]{0,200}", max in 1usize..40) {
            for line in wrap_words(&s, max) {
                prop_assert!(line.chars().count() <= max);
            }
        }

        #[test]
        fn prop_truncate_never_exceeds_max(s in "\\PC{0,200}", max in 0usize..60) {
            prop_assert!(truncate_words(&s, max).chars().count() <= max);
        }
    }
}
