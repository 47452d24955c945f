// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics: figment errors rendered through miette.
//!
//! Unknown keys are checked against portpool's own section table so a typo
//! in `[reconciler]` gets a suggestion from reconciler keys, and a typo in a
//! section name gets one from the section list.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Every section portpool reads, with the keys it accepts.
pub const SECTIONS: &[(&str, &[&str])] = &[
    ("server", &["log_level", "bind_address", "port"]),
    ("storage", &["database_path", "wal_mode"]),
    (
        "reconciler",
        &["enabled", "interval_secs", "fetch_timeout_secs", "country", "dial_code"],
    ),
    ("panels", &["code", "url"]),
    (
        "generator",
        &[
            "api_key",
            "base_url",
            "model",
            "max_attempts",
            "timeout_secs",
            "max_tokens",
            "temperature",
        ],
    ),
    ("sms", &["dial_code", "scts_utc_offset_minutes"]),
];

/// Jaro-Winkler score a candidate must beat to be offered as a correction.
const SIMILARITY_FLOOR: f64 = 0.75;

/// A configuration problem, ready for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {location}")]
    #[diagnostic(code(portpool::config::unknown_key), help("{help}"))]
    UnknownKey {
        key: String,
        /// `[section]`, `[[panels]]` or `top level`.
        location: String,
        suggestion: Option<String>,
        help: String,
        #[label("not a portpool setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(portpool::config::invalid_type))]
    InvalidType {
        key: String,
        detail: String,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// Only `[[panels]]` has a key without a default.
    #[error("missing key `{key}` in {location}")]
    #[diagnostic(
        code(portpool::config::missing_key),
        help("every {location} entry needs `{key} = ...`")
    )]
    MissingKey { key: String, location: String },

    /// A value parsed but breaks a semantic rule (see `validation`).
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(portpool::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(portpool::config::other))]
    Other(String),
}

/// The section an error path points into, skipping array indices.
fn section_of(path: &[String]) -> Option<&str> {
    path.iter()
        .map(String::as_str)
        .find(|seg| !seg.chars().all(|c| c.is_ascii_digit()))
}

/// How a section is written in TOML.
fn location(section: Option<&str>) -> String {
    match section {
        Some("panels") => "[[panels]]".to_string(),
        Some(name) => format!("[{name}]"),
        None => "top level".to_string(),
    }
}

/// Keys accepted at `section`, or the section names at the top level.
fn candidates(section: Option<&str>) -> Vec<&'static str> {
    match section {
        None => SECTIONS.iter().map(|(name, _)| *name).collect(),
        Some(name) => SECTIONS
            .iter()
            .find(|(s, _)| *s == name)
            .map(|(_, keys)| keys.to_vec())
            .unwrap_or_default(),
    }
}

/// Closest candidate to `unknown`, if any is similar enough.
pub fn closest<'a>(unknown: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, strsim::jaro_winkler(unknown, c)))
        .filter(|(_, score)| *score > SIMILARITY_FLOOR)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}

/// Byte offset of `key` inside `section` of a TOML document.
///
/// Matches `[section]` and `[[section]]` headers and stops at the next
/// header. With no section only lines before the first header count.
pub fn locate_key(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut inside = section.is_none();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            let name = trimmed.trim_matches(|c| c == '[' || c == ']').trim();
            inside = section == Some(name);
        } else if inside {
            let indent = line.len() - line.trim_start().len();
            let rest = &line[indent..];
            if let Some(after) = rest.strip_prefix(key)
                && after.trim_start().starts_with('=')
            {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Pair a span with the file it came from, when the file is one we read.
fn span_in(
    error: &figment::Error,
    section: Option<&str>,
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => path.display().to_string(),
        // Inline strings carry no file; fall back to the only source given.
        _ if sources.len() == 1 => sources[0].0.clone(),
        _ => return (None, None),
    };
    sources
        .iter()
        .find(|(name, _)| *name == origin)
        .and_then(|(name, content)| {
            let at = locate_key(content, section, key)?;
            Some((
                Some(SourceSpan::new(at.into(), key.len())),
                Some(NamedSource::new(name, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Translate every error figment collected into a `ConfigError`.
///
/// `sources` are `(display name, content)` pairs of the TOML files that fed
/// the figment, used to point at the offending line.
pub fn from_figment(err: figment::Error, sources: &[(String, String)]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            let section = section_of(&path);
            match &error.kind {
                Kind::UnknownField(key, _) => {
                    let known = candidates(section);
                    let suggestion = closest(key, &known).map(str::to_string);
                    let help = match &suggestion {
                        Some(s) => format!("did you mean `{s}`? accepted: {}", known.join(", ")),
                        None => format!("accepted: {}", known.join(", ")),
                    };
                    let (span, src) = span_in(&error, section, key, sources);
                    ConfigError::UnknownKey {
                        key: key.clone(),
                        location: location(section),
                        suggestion,
                        help,
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: key.to_string(),
                    location: location(section),
                },
                Kind::InvalidType(actual, expected) => {
                    let key = path.last().cloned().unwrap_or_default();
                    let parent = section.filter(|s| *s != key);
                    let (span, src) = span_in(&error, parent, &key, sources);
                    ConfigError::InvalidType {
                        key: path.join("."),
                        detail: format!("found {actual}, expected {expected}"),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Print each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
