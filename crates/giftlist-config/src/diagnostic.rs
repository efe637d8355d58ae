// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for `giftlist.toml`.
//!
//! Figment deserialization errors and validation failures both become
//! [`ConfigError`]s that name the `section.key` involved, point at it in the
//! file when it can be found there, and carry a help line with an example
//! value. Unknown keys get a Jaro-Winkler "did you mean?" within their section,
//! or a pointer to the section the key actually belongs in.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::fmt;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a known key needs to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Every key giftlist reads, with an example value for help text.
pub const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "bot",
        &[
            ("log_level", "\"info\""),
            ("default_event_title", "\"Мой вишлист\""),
            ("new_event_title", "\"Новое событие\""),
            ("notify_queue_capacity", "256"),
        ],
    ),
    (
        "telegram",
        &[
            ("bot_token", "\"123456:ABC-DEF\""),
            ("bot_username", "\"my_wishlist_bot\""),
        ],
    ),
    (
        "storage",
        &[
            ("database_path", "\"/var/lib/giftlist/giftlist.db\""),
            ("wal_mode", "true"),
        ],
    ),
    (
        "session",
        &[
            ("backend", "\"memory\""),
            ("ttl_secs", "86400"),
            ("purge_interval_secs", "600"),
        ],
    ),
    (
        "reminders",
        &[
            ("enabled", "true"),
            ("schedule", "\"0 9 * * *\""),
            ("utc_offset_hours", "3"),
        ],
    ),
];

fn section_keys(section: &str) -> Option<&'static [(&'static str, &'static str)]> {
    SECTIONS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, keys)| *keys)
}

/// Example value for a dotted key such as `session.ttl_secs`.
pub fn example_value(dotted: &str) -> Option<&'static str> {
    let (section, key) = dotted.split_once('.')?;
    section_keys(section)?
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, example)| *example)
}

/// What to offer instead of an unknown key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// A close spelling in the same place.
    Typo(String),
    /// The key exists, but under another section.
    Moved { section: String },
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suggestion::Typo(key) => write!(f, "did you mean `{key}`?"),
            Suggestion::Moved { section } => write!(f, "this key belongs under [{section}]"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key or section giftlist does not read.
    #[error("unknown key `{key}` in {}", location(.section.as_deref()))]
    #[diagnostic(
        code(giftlist::config::unknown_key),
        help("{}", unknown_key_help(section.as_deref(), suggestion.as_ref()))
    )]
    UnknownKey {
        key: String,
        /// `None` for the top level, where only section names are valid.
        section: Option<String>,
        suggestion: Option<Suggestion>,
        #[label("not a giftlist setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(giftlist::config::invalid_type), help("{}", example_help(key)))]
    InvalidType {
        /// Dotted path, e.g. `session.ttl_secs`.
        key: String,
        detail: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A well-typed value giftlist cannot run with.
    #[error("{message}")]
    #[diagnostic(code(giftlist::config::validation), help("{}", example_help(key)))]
    Validation {
        /// Dotted path, e.g. `reminders.schedule`.
        key: String,
        message: String,
        #[label("rejected value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// The file could not be read as TOML at all.
    #[error("cannot read configuration: {0}")]
    #[diagnostic(
        code(giftlist::config::malformed),
        help("check the file is valid TOML; `giftlist config show` prints a working example")
    )]
    Malformed(String),
}

impl ConfigError {
    /// A validation failure for `key` with no source location yet.
    pub fn validation(key: &str, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            key: key.to_string(),
            message: message.into(),
            span: None,
            src: None,
        }
    }
}

fn location(section: Option<&str>) -> String {
    match section {
        Some(s) => format!("[{s}]"),
        None => "the top level".to_string(),
    }
}

fn unknown_key_help(section: Option<&str>, suggestion: Option<&Suggestion>) -> String {
    let known = match section.and_then(section_keys) {
        Some(keys) => keys.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", "),
        None => SECTIONS
            .iter()
            .map(|(name, _)| format!("[{name}]"))
            .collect::<Vec<_>>()
            .join(", "),
    };
    match suggestion {
        Some(s) => format!("{s} Known here: {known}"),
        None => format!("known here: {known}"),
    }
}

fn example_help(dotted: &str) -> String {
    match (dotted.split_once('.'), example_value(dotted)) {
        (Some((section, key)), Some(example)) => {
            format!("for example:\n[{section}]\n{key} = {example}")
        }
        _ => "see `giftlist config show` for the accepted settings".to_string(),
    }
}

/// Best suggestion for `key` found in `section` (`None` = top level).
pub fn suggest_for(section: Option<&str>, key: &str) -> Option<Suggestion> {
    match section {
        None => {
            let names: Vec<&str> = SECTIONS.iter().map(|(name, _)| *name).collect();
            suggest_key(key, &names)
                .map(Suggestion::Typo)
                .or_else(|| home_section(key, None))
        }
        Some(section) => {
            let local: Vec<&str> = section_keys(section)
                .map(|keys| keys.iter().map(|(k, _)| *k).collect())
                .unwrap_or_default();
            suggest_key(key, &local)
                .map(Suggestion::Typo)
                .or_else(|| home_section(key, Some(section)))
        }
    }
}

/// Section other than `current` that defines `key` exactly.
fn home_section(key: &str, current: Option<&str>) -> Option<Suggestion> {
    SECTIONS
        .iter()
        .filter(|(name, _)| Some(*name) != current)
        .find(|(_, keys)| keys.iter().any(|(k, _)| *k == key))
        .map(|(name, _)| Suggestion::Moved {
            section: name.to_string(),
        })
}

/// Closest candidate above [`SUGGESTION_THRESHOLD`].
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(unknown, c), *c))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Convert a `figment::Error` (which may hold several) into diagnostics.
///
/// `sources` are `(path, content)` pairs of the TOML files that were loaded,
/// highest priority first.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, _) => {
                    let section = path.first().cloned();
                    let (span, src) = locate(sources, section.as_deref(), field);
                    ConfigError::UnknownKey {
                        suggestion: suggest_for(section.as_deref(), field),
                        key: field.clone(),
                        section,
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => {
                    let (span, src) = match path.as_slice() {
                        [section, key] => locate(sources, Some(section.as_str()), key),
                        _ => (None, None),
                    };
                    ConfigError::InvalidType {
                        key: path.join("."),
                        detail: format!("found {actual}, expected {expected}"),
                        span,
                        src,
                    }
                }
                Kind::InvalidValue(actual, expected) => {
                    let key = path.join(".");
                    let message = format!("`{key}` has unsupported value {actual}, expected {expected}");
                    ConfigError::validation(&key, message)
                }
                _ => ConfigError::Malformed(error.to_string()),
            }
        })
        .collect()
}

/// Point validation errors at the file that set the offending key.
pub fn attach_sources(errors: &mut [ConfigError], sources: &[(String, String)]) {
    for error in errors {
        if let ConfigError::Validation { key, span, src, .. } = error
            && span.is_none()
            && let Some((section, field)) = key.split_once('.')
        {
            (*span, *src) = locate(sources, Some(section), field);
        }
    }
}

fn locate(
    sources: &[(String, String)],
    section: Option<&str>,
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    for (path, content) in sources {
        if let Some(offset) = find_key_offset(content, section, key) {
            let span = SourceSpan::new(offset.into(), key.len());
            return (Some(span), Some(NamedSource::new(path, content.clone())));
        }
    }
    (None, None)
}

/// Byte offset of `key = ...` inside `[section]` (or before any section
/// header when `section` is `None`).
pub fn find_key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut in_section = section.is_none();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            let header = trimmed.trim_end().trim_start_matches('[').trim_end_matches(']');
            in_section = section == Some(header.trim());
        } else if in_section
            && let Some(after) = trimmed.strip_prefix(key)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_within_section() {
        assert_eq!(
            suggest_for(Some("session"), "ttl_sec"),
            Some(Suggestion::Typo("ttl_secs".into()))
        );
    }

    #[test]
    fn key_in_wrong_section_points_home() {
        assert_eq!(
            suggest_for(Some("bot"), "bot_token"),
            Some(Suggestion::Moved {
                section: "telegram".into()
            })
        );
        // A bare key at the top level is also sent to its section.
        assert_eq!(
            suggest_for(None, "database_path"),
            Some(Suggestion::Moved {
                section: "storage".into()
            })
        );
    }

    #[test]
    fn misspelled_section_name() {
        assert_eq!(
            suggest_for(None, "reminder"),
            Some(Suggestion::Typo("reminders".into()))
        );
        assert_eq!(suggest_for(None, "zzzzzz"), None);
    }

    #[test]
    fn key_offset_respects_section_boundaries() {
        let content = "[bot]\nlog_level = \"info\"\n\n[session]\nttl_secs = 10\n";
        let o = find_key_offset(content, Some("session"), "ttl_secs").unwrap();
        assert_eq!(&content[o..o + 8], "ttl_secs");
        assert!(find_key_offset(content, Some("bot"), "ttl_secs").is_none());
        assert!(find_key_offset(content, Some("reminders"), "enabled").is_none());
    }

    #[test]
    fn key_prefix_is_not_a_match() {
        let content = "[session]\nttl_secs_extra = 1\nttl_secs = 2\n";
        let o = find_key_offset(content, Some("session"), "ttl_secs").unwrap();
        assert_eq!(&content[o..], "ttl_secs = 2\n");
    }

    #[test]
    fn validation_gets_span_from_highest_priority_file() {
        let sources = vec![
            ("./giftlist.toml".to_string(), "[reminders]\nschedule = \"daily\"\n".to_string()),
            ("/etc/giftlist/giftlist.toml".to_string(), "[reminders]\nschedule = \"x\"\n".to_string()),
        ];
        let mut errors = vec![ConfigError::validation("reminders.schedule", "bad")];
        attach_sources(&mut errors, &sources);
        match &errors[0] {
            ConfigError::Validation { span: Some(span), src: Some(src), .. } => {
                assert_eq!(span.offset(), "[reminders]\n".len());
                assert_eq!(src.name(), "./giftlist.toml");
            }
            other => panic!("expected located validation error, got {other:?}"),
        }
    }

    #[test]
    fn help_carries_example_value() {
        let error = ConfigError::validation("session.ttl_secs", "session.ttl_secs must be greater than 0");
        let help = error.help().unwrap().to_string();
        assert!(help.contains("[session]\nttl_secs = 86400"), "got: {help}");
    }
}
