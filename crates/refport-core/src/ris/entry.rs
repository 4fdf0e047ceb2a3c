//! RIS entry data structures

/// A single `TAG  - value` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RisTag {
    pub tag: String,
    pub value: String,
}

/// One RIS record between `TY` and `ER`, tags kept in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RisEntry {
    pub ris_type: String,
    pub tags: Vec<RisTag>,
}

impl RisEntry {
    pub fn new(ris_type: impl Into<String>) -> Self {
        Self {
            ris_type: ris_type.into(),
            tags: Vec::new(),
        }
    }

    pub fn add_tag(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.tags.push(RisTag {
            tag: tag.into(),
            value: value.into(),
        });
    }

    /// Add the tag only when the value is present and not blank.
    pub fn add_opt(&mut self, tag: &str, value: Option<&str>) {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.add_tag(tag, value);
        }
    }

    /// Append a soft-wrapped continuation line to the most recent tag.
    ///
    /// Returns `false` when there is no tag to continue.
    pub fn continue_last(&mut self, text: &str) -> bool {
        match self.tags.last_mut() {
            Some(last) => {
                if !last.value.is_empty() {
                    last.value.push(' ');
                }
                last.value.push_str(text.trim());
                true
            }
            None => false,
        }
    }

    pub fn get_tag(&self, tag: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.tag == tag)
            .map(|t| t.value.as_str())
    }

    pub fn get_all_tags(&self, tag: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.tag == tag)
            .map(|t| t.value.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_tags_accumulate_in_order() {
        let mut entry = RisEntry::new("JOUR");
        entry.add_tag("AU", "Smith, John");
        entry.add_tag("TI", "Title");
        entry.add_tag("AU", "Doe, Jane");

        assert_eq!(entry.get_all_tags("AU"), vec!["Smith, John", "Doe, Jane"]);
        assert_eq!(entry.get_tag("AU"), Some("Smith, John"));
        assert_eq!(entry.get_tag("PY"), None);
    }

    #[test]
    fn test_continue_last() {
        let mut entry = RisEntry::new("JOUR");
        assert!(!entry.continue_last("orphan"));

        entry.add_tag("AB", "First half");
        assert!(entry.continue_last("  second half"));
        assert_eq!(entry.get_tag("AB"), Some("First half second half"));
    }

    #[test]
    fn test_add_opt_skips_blank() {
        let mut entry = RisEntry::new("BOOK");
        entry.add_opt("PB", Some("  "));
        entry.add_opt("CY", None);
        entry.add_opt("ET", Some("2nd"));
        assert_eq!(entry.tags.len(), 1);
    }
}
