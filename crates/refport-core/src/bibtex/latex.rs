//! LaTeX decoding and encoding for BibTeX values
//!
//! Decoding turns accent macros into precomposed Unicode, rewrites dash and
//! quote ligatures, unescapes specials and drops grouping braces. Emphasis
//! macros are stripped or rewritten as Markdown depending on `EmphasisMode`.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

use refport_domain::normalize::collapse_whitespace;

use crate::config::EmphasisMode;

lazy_static! {
    static ref DOTLESS_I: Regex = Regex::new(r"\\i([^a-zA-Z]|$)").unwrap();

    // \"a  \"{a}  \'{e}
    static ref SYMBOL_ACCENT: Regex =
        Regex::new(r#"\\(["'`^~=.])\s*(?:\{([A-Za-z])\}|([A-Za-z]))"#).unwrap();

    // \c{c}  \v s  \H{o}
    static ref LETTER_ACCENT: Regex =
        Regex::new(r"\\([cvuHkrd])(?:\s*\{([A-Za-z])\}|\s+([A-Za-z]))").unwrap();

    static ref EMPHASIS_COMMAND: Regex =
        Regex::new(r"\\(textbf|textit|emph|textsl|mathbf|mathit)\s*\{([^{}]*)\}").unwrap();

    // {\em text}  {\bf text}
    static ref EMPHASIS_DECLARATION: Regex =
        Regex::new(r"\{\\(em|it|sl|bf|bfseries|itshape)\s+([^{}]*)\}").unwrap();

    // Any other one-argument command keeps its argument
    static ref WRAPPER_COMMAND: Regex = Regex::new(r"\\[a-zA-Z]+\s*\{([^{}]*)\}").unwrap();

    static ref BARE_COMMAND: Regex = Regex::new(r"\\([a-zA-Z]+)").unwrap();

    // Text-mode escapes for characters the later passes would reinterpret
    static ref LITERAL_COMMAND: Regex =
        Regex::new(r"\\text(backslash|asciitilde|asciicircum)(?:\s*\{\})?").unwrap();

    static ref SYMBOLS: HashMap<&'static str, &'static str> = [
        // Letters
        ("ss", "ß"), ("ae", "æ"), ("AE", "Æ"), ("oe", "œ"), ("OE", "Œ"),
        ("aa", "å"), ("AA", "Å"), ("o", "ø"), ("O", "Ø"), ("l", "ł"), ("L", "Ł"),
        // Punctuation and symbols
        ("ldots", "…"), ("dots", "…"), ("textellipsis", "…"),
        ("textendash", "–"), ("textemdash", "—"),
        ("copyright", "©"), ("textregistered", "®"), ("texttrademark", "™"),
        ("pounds", "£"), ("euro", "€"), ("S", "§"), ("P", "¶"),
        ("textbackslash", "\\"), ("textasciitilde", "~"),
        // Greek
        ("alpha", "α"), ("beta", "β"), ("gamma", "γ"), ("delta", "δ"),
        ("epsilon", "ε"), ("zeta", "ζ"), ("eta", "η"), ("theta", "θ"),
        ("kappa", "κ"), ("lambda", "λ"), ("mu", "μ"), ("nu", "ν"),
        ("xi", "ξ"), ("pi", "π"), ("rho", "ρ"), ("sigma", "σ"),
        ("tau", "τ"), ("phi", "φ"), ("chi", "χ"), ("psi", "ψ"), ("omega", "ω"),
        ("Gamma", "Γ"), ("Delta", "Δ"), ("Theta", "Θ"), ("Lambda", "Λ"),
        ("Pi", "Π"), ("Sigma", "Σ"), ("Phi", "Φ"), ("Psi", "Ψ"), ("Omega", "Ω"),
        // Math
        ("times", "×"), ("pm", "±"), ("leq", "≤"), ("geq", "≥"),
        ("neq", "≠"), ("approx", "≈"), ("sim", "∼"), ("infty", "∞"),
        ("rightarrow", "→"), ("to", "→"), ("leftarrow", "←"), ("cdot", "·"),
    ]
    .into_iter()
    .collect();
}

/// Characters escaped with a backslash on export
const SPECIALS: &[char] = &['&', '$', '%', '#', '_', '{', '}'];

/// Characters written as `\text...{}` commands on export, paired with the
/// private-use placeholder that carries them through decoding
const LITERALS: &[(char, &str, char)] = &[
    ('\\', "backslash", '\u{E000}'),
    ('~', "asciitilde", '\u{E001}'),
    ('^', "asciicircum", '\u{E002}'),
];

fn combining_mark(accent: &str) -> Option<char> {
    Some(match accent {
        "\"" => '\u{0308}',
        "'" => '\u{0301}',
        "`" => '\u{0300}',
        "^" => '\u{0302}',
        "~" => '\u{0303}',
        "=" => '\u{0304}',
        "." => '\u{0307}',
        "c" => '\u{0327}',
        "v" => '\u{030C}',
        "u" => '\u{0306}',
        "H" => '\u{030B}',
        "k" => '\u{0328}',
        "r" => '\u{030A}',
        "d" => '\u{0323}',
        _ => return None,
    })
}

fn compose_accent(caps: &Captures) -> String {
    let letter = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map_or("", |m| m.as_str());
    match combining_mark(&caps[1]) {
        Some(mark) => format!("{}{}", letter, mark).nfc().collect(),
        None => caps[0].to_string(),
    }
}

/// Apply `re` until the text stops changing, so nested commands unwrap from
/// the inside out.
fn replace_nested(text: String, re: &Regex, rep: impl Fn(&Captures) -> String) -> String {
    let mut current = text;
    loop {
        let next = re.replace_all(&current, |c: &Captures| rep(c)).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn emphasis(command: &str, text: &str, mode: EmphasisMode) -> String {
    match mode {
        EmphasisMode::Strip => text.to_string(),
        EmphasisMode::Markdown if text.trim().is_empty() => String::new(),
        EmphasisMode::Markdown => match command {
            "textbf" | "mathbf" | "bf" | "bfseries" => format!("**{}**", text.trim()),
            _ => format!("*{}*", text.trim()),
        },
    }
}

/// Decode a raw BibTeX value into plain Unicode text.
pub fn decode(input: &str, mode: EmphasisMode) -> String {
    let text = LITERAL_COMMAND.replace_all(input, |c: &Captures| {
        LITERALS
            .iter()
            .find(|(_, name, _)| *name == &c[1])
            .map_or(String::new(), |(_, _, placeholder)| placeholder.to_string())
    });
    let mut text = DOTLESS_I.replace_all(&text, "i$1").into_owned();
    text = SYMBOL_ACCENT.replace_all(&text, compose_accent).into_owned();
    text = LETTER_ACCENT.replace_all(&text, compose_accent).into_owned();

    text = replace_nested(text, &EMPHASIS_COMMAND, |c| emphasis(&c[1], &c[2], mode));
    text = replace_nested(text, &EMPHASIS_DECLARATION, |c| emphasis(&c[1], &c[2], mode));
    text = replace_nested(text, &WRAPPER_COMMAND, |c| {
        let name = c[0].trim_start_matches('\\');
        let name = &name[..name.find(|ch: char| !ch.is_ascii_alphabetic()).unwrap_or(name.len())];
        match SYMBOLS.get(name) {
            Some(symbol) => format!("{}{}", symbol, &c[1]),
            None => c[1].to_string(),
        }
    });

    text = BARE_COMMAND
        .replace_all(&text, |c: &Captures| {
            SYMBOLS.get(&c[1]).map_or(String::new(), |s| s.to_string())
        })
        .into_owned();

    let text = text
        .replace("---", "—")
        .replace("--", "–")
        .replace("``", "\"")
        .replace("''", "\"");

    collapse_whitespace(&strip_grouping(&text))
        .chars()
        .map(|c| {
            LITERALS
                .iter()
                .find(|(_, _, placeholder)| *placeholder == c)
                .map_or(c, |(literal, _, _)| *literal)
        })
        .collect()
}

/// Drop unescaped braces and math shifts, unescape specials, turn `~` into
/// a space.
fn strip_grouping(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next) if SPECIALS.contains(&next) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            },
            '{' | '}' | '$' => {}
            '~' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Escape `& $ % # _ { }` for export and spell out `\ ~ ^`.
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if let Some((_, name, _)) = LITERALS.iter().find(|(literal, _, _)| *literal == c) {
            out.push_str("\\text");
            out.push_str(name);
            out.push_str("{}");
            continue;
        }
        if SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
