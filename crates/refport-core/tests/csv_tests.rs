//! CSV format integration tests

mod common;

use common::fixtures::load_csv_fixture;
use common::strategies::{comparable, reference, Coverage};
use proptest::prelude::*;
use refport_core::csv::{self, detect_delimiter, CsvFormat, HEADER_LABELS};
use refport_core::{
    CanonicalReference, Contributors, InterchangeError, PersonName, ReferenceFormat,
    ReferenceType, SerializeOptions,
};
use rstest::rstest;

#[test]
fn test_fixture_skips_short_row() {
    let parsed = csv::parse(&load_csv_fixture("sample.csv")).unwrap();
    assert_eq!(parsed.len(), 2);

    let study = parsed[0].as_ref().unwrap();
    assert_eq!(study.reference_type, ReferenceType::Journal);
    assert_eq!(study.title.as_deref(), Some("A Study"));
    assert_eq!(study.authors().len(), 1);
    assert_eq!(study.authors()[0].family, "Smith");
    assert_eq!(study.year, Some(2020));
    assert_eq!(study.journal.as_deref(), Some("Nature"));
    assert_eq!(study.doi.as_deref(), Some("10.1/abc"));
    assert_eq!(study.keywords, vec!["a", "b"]);
    assert_eq!(study.extra("Shelf Mark"), Some("QA76"));

    let book = parsed[1].as_ref().unwrap();
    assert_eq!(book.title.as_deref(), Some("Another Book"));
    assert_eq!(book.reference_type, ReferenceType::Book);
    assert_eq!(book.authors().len(), 2);
    assert!(book.doi.is_none());
}

#[rstest]
#[case("Journal Article", ReferenceType::Journal)]
#[case("journal", ReferenceType::Journal)]
#[case("Book Section", ReferenceType::Chapter)]
#[case("Conference Paper", ReferenceType::Conference)]
#[case("Thesis", ReferenceType::Thesis)]
#[case("Web Page", ReferenceType::Website)]
fn test_type_aliases(#[case] label: &str, #[case] expected: ReferenceType) {
    let content = format!("Title,Type\nSomething,{}\n", label);
    let parsed = csv::parse(&content).unwrap();
    assert_eq!(parsed[0].as_ref().unwrap().reference_type, expected);
}

#[rstest]
#[case("a,b,c\n1,2,3\n", ',')]
#[case("a;b;c\n1;2;3\n", ';')]
#[case("a\tb\tc\n1\t2\t3\n", '\t')]
#[case("a|b|c\n1|2|3\n", '|')]
#[case("single\n", ',')]
fn test_detect_delimiter(#[case] content: &str, #[case] expected: char) {
    assert_eq!(detect_delimiter(content), expected);
}

#[test]
fn test_export_header_and_round_trip() {
    let parsed = CsvFormat.parse(&load_csv_fixture("sample.csv")).unwrap();
    let out = CsvFormat.serialize(&parsed, &SerializeOptions::default()).unwrap();

    let header = out.lines().next().unwrap();
    assert_eq!(header, HEADER_LABELS.join(","));

    let again = CsvFormat.parse(&out).unwrap();
    assert_eq!(again.len(), 2);
    assert_eq!(again[0].title, parsed[0].title);
    assert_eq!(again[0].authors(), parsed[0].authors());
    assert_eq!(again[1].authors(), parsed[1].authors());
    assert_eq!(again[0].reference_type, ReferenceType::Journal);
}

#[test]
fn test_long_abstract_is_truncated() {
    let mut r = CanonicalReference::new(ReferenceType::Journal, "Wordy");
    r.abstract_text = Some("word ".repeat(200));
    let options = SerializeOptions {
        max_abstract_length: 40,
        ..Default::default()
    };

    let out = CsvFormat.serialize(&[r], &options).unwrap();
    let again = CsvFormat.parse(&out).unwrap();
    let abstract_text = again[0].abstract_text.as_deref().unwrap();
    assert!(abstract_text.len() <= 40);
    assert!(abstract_text.ends_with("..."));
}

#[test]
fn test_errors() {
    assert_eq!(csv::parse("   "), Err(InterchangeError::EmptyContent));
    assert_eq!(
        csv::parse("Author,Year\nSmith,2020\n"),
        Err(InterchangeError::MissingHeader {
            header: "title".to_string()
        })
    );
    assert_eq!(csv::parse("Title,Type\n"), Err(InterchangeError::NoData));
}

fn parse_ok(content: &str) -> Vec<CanonicalReference> {
    csv::parse(content)
        .unwrap()
        .into_iter()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn test_single_author_cell_with_two_word_surname() {
    let mut r = CanonicalReference::new(ReferenceType::Book, "Cien años de soledad");
    r.author = Some(Contributors::Structured(vec![
        PersonName::new("García Márquez").with_given("Gabriel José"),
    ]));

    let out = CsvFormat
        .serialize(std::slice::from_ref(&r), &SerializeOptions::default())
        .unwrap();
    assert!(out.contains("\"García Márquez, Gabriel José\""), "{}", out);

    let back = &parse_ok(&out)[0];
    assert_eq!(back.authors().len(), 1);
    assert_eq!(back.authors(), r.authors());
}

proptest! {
    #[test]
    fn prop_parse_of_export_is_identity(r in reference(Coverage { pmid: true })) {
        let out = CsvFormat
            .serialize(std::slice::from_ref(&r), &SerializeOptions::default())
            .unwrap();
        let parsed = parse_ok(&out);
        prop_assert_eq!(parsed.len(), 1);
        prop_assert_eq!(comparable(parsed[0].clone()), comparable(r));
    }
}
