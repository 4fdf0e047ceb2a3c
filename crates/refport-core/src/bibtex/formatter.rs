//! BibTeX formatting
//!
//! Values are expected to be escaped already; the formatter only chooses
//! delimiters.

use super::entry::BibtexEntry;

/// Format a single BibTeX entry to string
pub fn format_entry(entry: &BibtexEntry) -> String {
    let mut result = String::new();

    // Entry type and cite key
    result.push('@');
    result.push_str(&entry.entry_type);
    result.push('{');
    result.push_str(&entry.cite_key);
    result.push_str(",\n");

    for field in &entry.fields {
        result.push_str("    ");
        result.push_str(&field.name);
        result.push_str(" = ");
        result.push_str(&format_field_value(&field.value));
        result.push_str(",\n");
    }

    result.push('}');
    result
}

/// Format multiple entries, separated by blank lines
pub fn format_entries(entries: &[BibtexEntry]) -> String {
    let mut out = entries
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Bare digits stay unbraced, everything else is wrapped in braces
fn format_field_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return value.to_string();
    }
    format!("{{{}}}", value)
}
