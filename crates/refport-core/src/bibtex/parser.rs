//! BibTeX parser implementation using nom
//!
//! This parser handles:
//! - `@string` definitions, substituted into later values
//! - `@preamble` and `@comment` blocks (skipped)
//! - Entries delimited by braces or parentheses
//! - Braced values of any depth, quoted values, bare numbers and macros
//! - String concatenation with `#`
//!
//! Entries are located with a brace-depth scanner; escaped braces (`\{`,
//! `\}`) never change the depth.

use std::collections::HashMap;

use lazy_static::lazy_static;
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::map,
    error::{Error, ErrorKind},
    IResult,
};
use regex::Regex;
use tracing::debug;

use refport_domain::{InterchangeError, RecordError, Result};

use super::entry::BibtexEntry;

lazy_static! {
    static ref ENTRY_START: Regex = Regex::new(r"@[A-Za-z]+\s*[{(]").unwrap();
}

/// An entry, or the reason it could not be read
pub type ParsedEntry = std::result::Result<BibtexEntry, RecordError>;

/// Month macros every BibTeX style predefines
const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Count unescaped `{` and `}`
pub fn count_braces(content: &str) -> (usize, usize) {
    let mut open = 0;
    let mut close = 0;
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => open += 1,
            '}' => close += 1,
            _ => {}
        }
    }
    (open, close)
}

/// Structural check: non-empty, balanced braces, at least one `@type{`.
pub fn validate(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(InterchangeError::EmptyContent);
    }

    let (open, close) = count_braces(content);
    if open != close {
        return Err(InterchangeError::UnbalancedBraces { open, close });
    }

    if !ENTRY_START.is_match(content) {
        return Err(InterchangeError::invalid_format(
            "BibTeX",
            "no @type{...} entry found",
        ));
    }

    Ok(())
}

/// Parse every entry in `content`. Malformed entries come back as `Err`
/// items in place; the scan resumes at the next `@type{`.
pub fn parse_entries(content: &str) -> Result<Vec<ParsedEntry>> {
    validate(content)?;

    let mut strings: HashMap<String, String> = MONTHS
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let mut entries = Vec::new();
    let mut remaining = content;

    while let Some(found) = ENTRY_START.find(remaining) {
        let at = &remaining[found.start()..];
        match parse_at_entry(at, &strings) {
            Ok((rest, AtEntry::Entry(entry))) => {
                entries.push(Ok(entry));
                remaining = rest;
            }
            Ok((rest, AtEntry::String(name, value))) => {
                strings.insert(name.to_lowercase(), value);
                remaining = rest;
            }
            Ok((rest, AtEntry::Skipped)) => remaining = rest,
            Err(_) => {
                let offset = content.len() - at.len();
                let line = content[..offset].matches('\n').count() + 1;
                debug!(line, "malformed BibTeX entry");
                entries.push(Err(RecordError::new(
                    format!("record {}", entries.len() + 1),
                    InterchangeError::ParseError {
                        message: format!("malformed entry at line {}", line),
                    },
                )));
                remaining = &at[1..];
            }
        }
    }

    if entries.is_empty() {
        return Err(InterchangeError::NoReferencesFound);
    }
    Ok(entries)
}

/// Result of parsing an @ block
enum AtEntry {
    Entry(BibtexEntry),
    String(String, String),
    Skipped,
}

fn nom_error(input: &str) -> nom::Err<Error<&str>> {
    nom::Err::Error(Error::new(input, ErrorKind::Char))
}

/// Parse an @ block (entry, string, preamble, or comment)
fn parse_at_entry<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, AtEntry> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, entry_type) = take_while1(|c: char| c.is_ascii_alphanumeric())(rest)?;
    let entry_type = entry_type.to_lowercase();

    if entry_type == "comment" {
        let (rest, _) = parse_comment_body(rest)?;
        return Ok((rest, AtEntry::Skipped));
    }

    let (rest, _) = multispace0(rest)?;
    let (rest, close) = open_delimiter(rest)?;

    match entry_type.as_str() {
        "string" => {
            let (rest, (name, value)) = parse_single_field(rest, strings)?;
            let (rest, _) = closing(rest, close)?;
            Ok((rest, AtEntry::String(name, value)))
        }
        "preamble" => {
            let (rest, _) = multispace0(rest)?;
            let (rest, _) = parse_field_value(rest, strings)?;
            let (rest, _) = closing(rest, close)?;
            Ok((rest, AtEntry::Skipped))
        }
        _ => {
            let (rest, entry) = parse_entry_body(rest, &entry_type, close, strings)?;
            Ok((rest, AtEntry::Entry(entry)))
        }
    }
}

/// `{` or `(`; returns the matching closer
fn open_delimiter(input: &str) -> IResult<&str, char> {
    alt((map(char('{'), |_| '}'), map(char('('), |_| ')')))(input)
}

fn closing(input: &str, close: char) -> IResult<&str, char> {
    let (rest, _) = multispace0(input)?;
    char(close)(rest)
}

/// Skip a @comment body: a braced group, or the rest of the line
fn parse_comment_body(input: &str) -> IResult<&str, ()> {
    let (rest, _) = multispace0(input)?;
    if rest.starts_with('{') {
        let (rest, _) = parse_braced_content(rest)?;
        Ok((rest, ()))
    } else {
        let pos = rest.find('\n').unwrap_or(rest.len());
        Ok((&rest[pos..], ()))
    }
}

/// Parse an entry body after its opening delimiter
fn parse_entry_body<'a>(
    input: &'a str,
    entry_type: &str,
    close: char,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, BibtexEntry> {
    let (rest, _) = multispace0(input)?;

    // Citation key runs up to the first comma
    let (rest, cite_key) =
        take_while(|c: char| c != ',' && c != close && !c.is_whitespace())(rest)?;
    let (rest, _) = multispace0(rest)?;

    let mut entry = BibtexEntry::new(entry_type, cite_key);
    let rest = match rest.strip_prefix(',') {
        Some(after_comma) => {
            let (rest, fields) = parse_fields(after_comma, close, strings)?;
            for (name, value) in fields {
                entry.add_field(name, value);
            }
            rest
        }
        None => rest,
    };

    let (rest, _) = closing(rest, close)?;
    Ok((rest, entry))
}

/// Parse fields within an entry
fn parse_fields<'a>(
    input: &'a str,
    close: char,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, Vec<(String, String)>> {
    let mut fields = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;
        if rest.starts_with(close) {
            return Ok((rest, fields));
        }

        match parse_single_field(rest, strings) {
            Ok((rest, field)) => {
                fields.push(field);
                // Skip optional comma
                let (rest, _) = multispace0(rest)?;
                remaining = rest.strip_prefix(',').unwrap_or(rest);
            }
            // No more fields; the caller checks for the closer
            Err(_) => return Ok((remaining, fields)),
        }
    }
}

/// Parse a single field (name = value)
fn parse_single_field<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, (String, String)> {
    let (rest, _) = multispace0(input)?;
    let (rest, name) =
        take_while1(|c: char| c.is_ascii_alphanumeric() || "_-:.".contains(c))(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, value) = parse_field_value(rest, strings)?;

    Ok((rest, (name.to_lowercase(), value)))
}

/// Parse a field value (braced, quoted, number, or macro), following `#`
/// concatenation
fn parse_field_value<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, String> {
    let mut result = String::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;

        let (rest, part) = alt((
            parse_braced_value,
            parse_quoted_value,
            map(take_while1(|c: char| c.is_ascii_digit()), String::from),
            map(
                take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                |name: &str| {
                    strings
                        .get(&name.to_lowercase())
                        .cloned()
                        .unwrap_or_else(|| name.to_string())
                },
            ),
        ))(rest)?;

        result.push_str(&part);
        remaining = rest;

        let (rest, _) = multispace0(remaining)?;
        match rest.strip_prefix('#') {
            Some(after_hash) => remaining = after_hash,
            None => return Ok((rest, result)),
        }
    }
}

/// Parse a braced value {content}, without the outer braces
fn parse_braced_value(input: &str) -> IResult<&str, String> {
    let (rest, content) = parse_braced_content(input)?;
    Ok((rest, content[1..content.len() - 1].to_string()))
}

/// Parse braced content including nested braces.
///
/// Only ASCII bytes are inspected, so every slice boundary falls on a char
/// boundary.
fn parse_braced_content(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(nom_error(input));
    }

    let mut depth = 0usize;
    let mut pos = 0;
    let bytes = input.as_bytes();

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[pos + 1..], &input[..pos + 1]));
                }
            }
            // Skip escaped character
            b'\\' => pos += 1,
            _ => {}
        }
        pos += 1;
    }

    Err(nom_error(input))
}

/// Parse a quoted value "content"; quotes inside braces do not terminate it
fn parse_quoted_value(input: &str) -> IResult<&str, String> {
    if !input.starts_with('"') {
        return Err(nom_error(input));
    }

    let mut depth = 0usize;
    let mut pos = 1;
    let bytes = input.as_bytes();

    while pos < bytes.len() {
        match bytes[pos] {
            b'"' if depth == 0 => {
                return Ok((&input[pos + 1..], input[1..pos].to_string()));
            }
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'\\' => pos += 1,
            _ => {}
        }
        pos += 1;
    }

    Err(nom_error(input))
}
