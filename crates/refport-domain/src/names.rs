//! Person names and contributor lists
//!
//! A contributor list is held either as a formatted string
//! (`"Last, First; Last, First"`) or as an ordered list of structured names.
//! Both forms convert into each other without changing order.

use serde::{Deserialize, Serialize};

use crate::normalize::fold_ascii;

/// A single person (or organisation) name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    pub family: String,
}

impl PersonName {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            given: None,
            family: family.into(),
        }
    }

    pub fn with_given(mut self, given: impl Into<String>) -> Self {
        let given = given.into();
        self.given = if given.trim().is_empty() {
            None
        } else {
            Some(given)
        };
        self
    }

    /// Parse one name written as `"Last, First"`, `"First Last"` or
    /// `"{Literal Organisation}"`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim().trim_end_matches(',').trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with('{') && trimmed.ends_with('}') && trimmed.len() > 1 {
            let literal = trimmed[1..trimmed.len() - 1].trim();
            return (!literal.is_empty()).then(|| Self::new(literal));
        }

        if let Some((family, given)) = trimmed.split_once(',') {
            let family = family.trim();
            if family.is_empty() {
                return None;
            }
            return Some(Self::new(family).with_given(given.trim()));
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.split_last() {
            Some((family, [])) => Some(Self::new(*family)),
            Some((family, given)) => Some(Self::new(*family).with_given(given.join(" "))),
            None => None,
        }
    }

    /// `"Family, Given"`, or the family name alone
    pub fn formatted(&self) -> String {
        match &self.given {
            Some(given) => format!("{}, {}", self.family, given),
            None => self.family.clone(),
        }
    }

    /// `"Given Family"`
    pub fn display_name(&self) -> String {
        match &self.given {
            Some(given) => format!("{} {}", given, self.family),
            None => self.family.clone(),
        }
    }

    /// Lowercased, punctuation-free last token of the family name, used to
    /// compare first authors across differently ordered inputs.
    pub fn surname_key(&self) -> String {
        fold_ascii(&self.family)
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase()
    }
}

/// Author or editor list in either representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contributors {
    Formatted(String),
    Structured(Vec<PersonName>),
}

impl Contributors {
    /// Build from a formatted string, keeping the structured form.
    pub fn parse(input: &str) -> Self {
        Self::Structured(parse_names(input))
    }

    pub fn names(&self) -> Vec<PersonName> {
        match self {
            Self::Formatted(s) => parse_names(s),
            Self::Structured(names) => names.clone(),
        }
    }

    /// `"Last, First; Last, First"`
    pub fn formatted(&self) -> String {
        match self {
            Self::Formatted(s) => format_names(&parse_names(s)),
            Self::Structured(names) => format_names(names),
        }
    }

    pub fn into_structured(self) -> Self {
        Self::Structured(self.names())
    }

    pub fn into_formatted(self) -> Self {
        Self::Formatted(self.formatted())
    }

    pub fn first(&self) -> Option<PersonName> {
        self.names().into_iter().next()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

impl PartialEq for Contributors {
    fn eq(&self, other: &Self) -> bool {
        self.names() == other.names()
    }
}

impl From<Vec<PersonName>> for Contributors {
    fn from(names: Vec<PersonName>) -> Self {
        Self::Structured(names)
    }
}

pub fn format_names(names: &[PersonName]) -> String {
    names
        .iter()
        .map(PersonName::formatted)
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn parse_names(input: &str) -> Vec<PersonName> {
    split_names(input)
        .iter()
        .filter_map(|s| PersonName::parse(s))
        .collect()
}

/// Split a multi-valued name field into individual names.
///
/// `;`, `&` and the word `and` always separate names (outside braces). A bare
/// comma list is only split when it cannot be a single `Last, First`, so a
/// value with one comma is always one name.
pub fn split_names(input: &str) -> Vec<String> {
    let parts = split_top_level(input);
    if parts.len() == 1 && parts[0].contains(',') {
        return split_comma_list(&parts[0]);
    }
    parts
}

fn split_top_level(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ';' | '&' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ if depth == 0 && is_and_separator(&chars, i) => {
                parts.push(std::mem::take(&mut current));
                i += 4;
                continue;
            }
            _ => current.push(c),
        }
        i += 1;
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Whitespace, `and`, whitespace starting at `i`
fn is_and_separator(chars: &[char], i: usize) -> bool {
    i + 4 < chars.len()
        && chars[i].is_whitespace()
        && chars[i + 1..i + 4]
            .iter()
            .collect::<String>()
            .eq_ignore_ascii_case("and")
        && chars[i + 4].is_whitespace()
}

fn split_comma_list(input: &str) -> Vec<String> {
    // Empty family name: leave whole so the name parser rejects it
    if input.trim_start().starts_with(',') {
        return vec![input.trim().to_string()];
    }

    let pieces: Vec<&str> = input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if pieces.len() <= 2 {
        return vec![input.trim().to_string()];
    }

    // "John Smith, Jane Doe, Max Roe": every piece is a full name
    let all_full_names = pieces.iter().all(|p| {
        p.split_whitespace().count() > 1 && p.chars().next().is_some_and(char::is_uppercase)
    });
    if all_full_names {
        return pieces.into_iter().map(String::from).collect();
    }

    // "Smith, J., Doe, A.": pairs of family and given names
    pieces
        .chunks(2)
        .map(|pair| pair.join(", "))
        .collect()
}
