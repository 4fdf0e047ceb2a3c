//! Test fixture loading utilities

use std::path::PathBuf;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

#[allow(dead_code)]
pub fn load_ris_fixture(name: &str) -> String {
    load_fixture(&format!("ris/{}", name))
}

#[allow(dead_code)]
pub fn load_bibtex_fixture(name: &str) -> String {
    load_fixture(&format!("bibtex/{}", name))
}

#[allow(dead_code)]
pub fn load_csv_fixture(name: &str) -> String {
    load_fixture(&format!("csv/{}", name))
}

#[allow(dead_code)]
pub fn load_json_fixture(name: &str) -> String {
    load_fixture(&format!("json/{}", name))
}
