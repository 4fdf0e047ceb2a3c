//! RIS formatter implementation

use super::entry::RisEntry;

/// Indent for untagged continuation lines, aligned under the value
const CONTINUATION_INDENT: &str = "      ";

/// Format an RIS entry to string
pub fn format_entry(entry: &RisEntry) -> String {
    let mut lines = Vec::with_capacity(entry.tags.len() + 2);

    // Type tag first
    lines.push(format!("TY  - {}", entry.ris_type));

    for tag in &entry.tags {
        if tag.tag.is_empty() {
            lines.push(format!("{}{}", CONTINUATION_INDENT, tag.value));
        } else {
            lines.push(format!("{}  - {}", tag.tag, tag.value));
        }
    }

    // End tag
    lines.push("ER  - ".to_string());

    lines.join("\n")
}

/// Format multiple entries, separated by blank lines
pub fn format_entries(entries: &[RisEntry]) -> String {
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
