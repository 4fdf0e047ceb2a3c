//! RIS parser implementation
//!
//! RIS is line-oriented: `TY` opens a record, `ER` closes it, every other
//! `TAG  - value` line belongs to the open record. Lines that carry no tag
//! continue the previous value (soft wrapping in exported files).

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use refport_domain::{InterchangeError, Result};

use super::entry::RisEntry;

lazy_static! {
    /// Structural marker required somewhere in a RIS document
    static ref TAG_MARKER: Regex = Regex::new(r"(?m)^[A-Z0-9]{2,4}\s*-\s*").unwrap();
    static ref TY_LINE: Regex = Regex::new(r"(?m)^TY\s*-").unwrap();
    /// Tag line: tags start with a letter and the dash is followed by
    /// whitespace or the end of the line, so "AB-testing" stays prose
    static ref TAG_LINE: Regex =
        Regex::new(r"^([A-Z][A-Z0-9]{1,3})\s*-(?:\s+(.*?))?\s*$").unwrap();
}

/// Check that content looks like RIS at all.
pub fn validate(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(InterchangeError::EmptyContent);
    }
    if !TAG_MARKER.is_match(content) {
        return Err(InterchangeError::invalid_format("RIS", "no tagged lines found"));
    }
    if !TY_LINE.is_match(content) {
        return Err(InterchangeError::invalid_format("RIS", "no TY line found"));
    }
    Ok(())
}

/// Split RIS content into raw entries.
pub fn parse_entries(content: &str) -> Result<Vec<RisEntry>> {
    validate(content)?;

    let mut entries = Vec::new();
    let mut current: Option<RisEntry> = None;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim_start_matches('\u{feff}');
        if line.trim().is_empty() {
            continue;
        }

        match parse_tag_line(line) {
            Some(("TY", value)) => {
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
                current = Some(RisEntry::new(value.to_uppercase()));
            }
            Some(("ER", _)) => {
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
            }
            Some((tag, value)) => match current.as_mut() {
                Some(entry) => entry.add_tag(tag, value),
                None => debug!(line = line_no + 1, tag, "tag outside a record ignored"),
            },
            None => {
                let continued = current
                    .as_mut()
                    .is_some_and(|entry| entry.continue_last(line));
                if !continued {
                    debug!(line = line_no + 1, "stray line ignored");
                }
            }
        }
    }

    // Trailing record without ER
    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(InterchangeError::NoReferencesFound);
    }
    Ok(entries)
}

/// Parse a single RIS line into tag and value
fn parse_tag_line(line: &str) -> Option<(&str, &str)> {
    let caps = TAG_LINE.captures(line)?;
    let tag = caps.get(1)?.as_str();
    let value = caps.get(2).map_or("", |m| m.as_str());
    Some((tag, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_entry() {
        let input = "TY  - JOUR\nTI  - A Great Paper\nAU  - Smith, John\nAU  - Doe, Jane\nPY  - 2024\nER  -\n";
        let entries = parse_entries(input).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.ris_type, "JOUR");
        assert_eq!(entry.get_tag("TI"), Some("A Great Paper"));
        assert_eq!(entry.get_all_tags("AU"), vec!["Smith, John", "Doe, Jane"]);
    }

    #[test]
    fn test_parse_multiple_entries() {
        let input = "TY  - JOUR\nTI  - First Paper\nER  -\n\nTY  - BOOK\nTI  - Second Book\nER  -\n";
        let entries = parse_entries(input).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].ris_type, "BOOK");
    }

    #[test]
    fn test_new_ty_flushes_open_record() {
        let input = "TY  - JOUR\nTI  - First\nTY  - BOOK\nTI  - Second\nER  - ";
        let entries = parse_entries(input).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].get_tag("TI"), Some("First"));
    }

    #[test]
    fn test_trailing_record_without_er() {
        let entries = parse_entries("TY  - JOUR\nTI  - Unterminated").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get_tag("TI"), Some("Unterminated"));
    }

    #[test]
    fn test_continuation_lines() {
        let input = "TY  - JOUR\nAB  - The first part\n  of a wrapped abstract\nAB-testing is not a tag\nER  - ";
        let entries = parse_entries(input).unwrap();
        assert_eq!(
            entries[0].get_tag("AB"),
            Some("The first part of a wrapped abstract AB-testing is not a tag")
        );
    }

    #[test]
    fn test_empty_and_invalid_input() {
        assert_eq!(parse_entries(""), Err(InterchangeError::EmptyContent));
        assert!(matches!(
            parse_entries("just text"),
            Err(InterchangeError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_entries("TI  - No type line\nER  - "),
            Err(InterchangeError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_parse_tag_line() {
        assert_eq!(parse_tag_line("TY  - JOUR"), Some(("TY", "JOUR")));
        assert_eq!(parse_tag_line("T1 - A Title "), Some(("T1", "A Title")));
        assert_eq!(parse_tag_line("ER  -"), Some(("ER", "")));
        assert_eq!(parse_tag_line("ER  - "), Some(("ER", "")));
        assert_eq!(parse_tag_line("invalid"), None);
        assert_eq!(parse_tag_line("1990 - a year"), None);
    }
}
