//! Template hydration.
//!
//! A snippet body may contain `{{param}}` placeholders. Hydration replaces
//! them with named values and appends trailing free-form words. It is a pure
//! function of its inputs.

mod args;

pub use args::parse_args;

use crate::{Error, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

/// `{{name}}`, optionally padded with spaces inside the braces.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_-]+)\s*\}\}").unwrap_or_else(|_| unreachable!())
});

/// How placeholders without a value are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Fail with [`Error::MissingParameter`]. Used by `copy --hydrate`.
    Strict,
    /// Leave the placeholder text in place. Used by direct invocation.
    #[default]
    Lenient,
}

/// Values supplied for one hydration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationRequest {
    pub named_params: BTreeMap<String, String>,
    pub trailing_text: Vec<String>,
}

impl HydrationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.named_params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_trailing<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trailing_text.extend(words.into_iter().map(Into::into));
        self
    }
}

/// Placeholder names in order of first appearance.
pub fn placeholders(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER
        .captures_iter(body)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Renders `body` with the request's parameters and trailing text.
///
/// Parameters not referenced by any placeholder are ignored. Non-empty
/// trailing text is joined with spaces and appended after exactly one
/// newline; trailing newlines of the body are folded into that separator.
pub fn hydrate(body: &str, request: &HydrationRequest, mode: Mode) -> Result<String> {
    if mode == Mode::Strict {
        let missing: Vec<String> = placeholders(body)
            .into_iter()
            .filter(|name| !request.named_params.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingParameter { names: missing });
        }
    }

    let mut rendered = PLACEHOLDER
        .replace_all(body, |caps: &regex::Captures| {
            caps.get(1)
                .and_then(|m| request.named_params.get(m.as_str()))
                .map_or_else(|| caps[0].to_string(), String::clone)
        })
        .into_owned();

    if !request.trailing_text.is_empty() {
        rendered.truncate(rendered.trim_end_matches(['\n', '\r']).len());
        rendered.push('\n');
        rendered.push_str(&request.trailing_text.join(" "));
    }

    Ok(rendered)
}
