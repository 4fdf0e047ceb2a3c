//! Delimiter sniffing
//!
//! A convenience for callers holding files of unknown dialect. Parsing
//! itself always assumes commas.

/// Candidates, in tie-breaking order
const CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

/// Lines sampled from the top of the input
const SAMPLE_LINES: usize = 5;

/// Most frequent candidate delimiter across the first five non-empty lines;
/// `,` when none occurs.
pub fn detect_delimiter(content: &str) -> char {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();

    let mut best = (CANDIDATES[0], 0);
    for candidate in CANDIDATES {
        let count: usize = sample.iter().map(|l| l.matches(candidate).count()).sum();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("title,type\nA,Book\n", ',')]
    #[case("title;type;year\nA;Book;2020\n", ';')]
    #[case("title\ttype\nA\tBook\n", '\t')]
    #[case("title|type\nA|Book\n", '|')]
    #[case("just one column\n", ',')]
    #[case("", ',')]
    fn test_detect_delimiter(#[case] content: &str, #[case] expected: char) {
        assert_eq!(detect_delimiter(content), expected);
    }

    #[test]
    fn test_only_first_lines_are_sampled() {
        let mut content = "a;b\n".repeat(5);
        content.push_str(&"a,b,c,d,e,f\n".repeat(20));
        assert_eq!(detect_delimiter(&content), ';');
    }
}
