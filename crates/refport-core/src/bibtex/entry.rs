//! Raw BibTeX entries, before LaTeX decoding

/// A single `name = value` pair; the name is lowercased on parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibtexField {
    pub name: String,
    pub value: String,
}

/// One `@type{key, ...}` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibtexEntry {
    /// Lowercased entry type as written (`article`, `phdthesis`, ...)
    pub entry_type: String,
    pub cite_key: String,
    pub fields: Vec<BibtexField>,
}

impl BibtexEntry {
    pub fn new(entry_type: impl Into<String>, cite_key: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into().to_lowercase(),
            cite_key: cite_key.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(BibtexField {
            name: name.into().to_lowercase(),
            value: value.into(),
        });
    }

    /// Get a field value by name (case-insensitive)
    pub fn get_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.get_field("title")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_case_insensitive() {
        let mut entry = BibtexEntry::new("Article", "smith2020");
        entry.add_field("Title", "A Study");
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.fields[0].name, "title");
        assert_eq!(entry.get_field("TITLE"), Some("A Study"));
        assert_eq!(entry.title(), Some("A Study"));
        assert_eq!(entry.get_field("year"), None);
    }
}
