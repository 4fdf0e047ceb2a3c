//! Generated references for format round-trip properties
#![allow(dead_code)]

use proptest::prelude::*;
use refport_core::{CanonicalReference, Contributors, PersonName, ReferenceType};

fn words(word: &'static str, max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(word, 1..=max).prop_map(|w| w.join(" "))
}

fn text(max_words: usize) -> impl Strategy<Value = Option<String>> {
    prop::option::of(words("[A-Za-z]{2,8}", max_words))
}

fn number() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[1-9][0-9]{0,2}")
}

/// A name that never contains a standalone `and`
pub fn person_name() -> impl Strategy<Value = PersonName> {
    prop_oneof![
        (words("[A-Z][a-z]{2,8}", 2), words("[A-Z][a-z]{1,8}", 2))
            .prop_map(|(family, given)| PersonName::new(family).with_given(given)),
        "[A-Z][a-z]{2,8}".prop_map(PersonName::new),
    ]
    .prop_filter("`and` separates names", |name| {
        !name
            .formatted()
            .split_whitespace()
            .any(|w| w.eq_ignore_ascii_case("and"))
    })
}

fn contributors() -> impl Strategy<Value = Option<Contributors>> {
    prop::collection::vec(person_name(), 0..4)
        .prop_map(|names| (!names.is_empty()).then(|| Contributors::Structured(names)))
}

/// Which optional fields a format can carry
#[derive(Debug, Clone, Copy)]
pub struct Coverage {
    pub pmid: bool,
}

/// References built only from fields every handler maps
pub fn reference(coverage: Coverage) -> impl Strategy<Value = CanonicalReference> {
    let head = (
        prop::sample::select(ReferenceType::ALL.to_vec()),
        words("[A-Za-z0-9~^&]{1,8}", 6),
        contributors(),
        contributors(),
        prop::option::of(1000i32..2100),
    );
    let containers = (text(4), text(4), text(3), text(2), text(2), text(1), text(6));
    let numbers = (
        number(),
        number(),
        prop::option::of("[1-9][0-9]{0,3}(-[1-9][0-9]{0,3})?"),
        prop::option::of("10\\.[0-9]{4}/[a-z0-9]{1,8}"),
        prop::option::of("978[0-9]{10}"),
        prop::option::of("[0-9]{4}-[0-9]{3}[0-9X]"),
        prop::option::of("[1-9][0-9]{6,7}"),
        prop::option::of("https://example\\.org/[a-z]{1,8}"),
    );
    let tail = (text(12), prop::collection::vec("[a-z]{2,8}", 0..4));

    (head, containers, numbers, tail).prop_map(
        move |(
            (reference_type, title, author, editor, year),
            (journal, publication, publisher, location, language, edition, notes),
            (volume, issue, pages, doi, isbn, issn, pmid, url),
            (abstract_text, keywords),
        )| CanonicalReference {
            reference_type,
            title: Some(title),
            author,
            editor,
            year,
            journal,
            publication,
            publisher,
            volume,
            issue,
            pages,
            doi,
            pmid: pmid.filter(|_| coverage.pmid),
            isbn,
            issn,
            url,
            abstract_text,
            keywords,
            language,
            location,
            edition,
            notes,
            ..Default::default()
        },
    )
}

/// Drop format bookkeeping so records from different sources compare
pub fn comparable(mut r: CanonicalReference) -> CanonicalReference {
    r.extras.clear();
    let squash = |v: Option<String>| v.map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "));
    r.title = squash(r.title);
    r.abstract_text = squash(r.abstract_text);
    r
}
