//! Locale tags and content-locale resolution.
//!
//! Locales are compared case-insensitively everywhere in the engine. A
//! `Locale` is therefore stored in its normalized (trimmed, lowercase) form,
//! and a blank tag normalizes to a default rather than to an empty string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The canonical reference locale (English) used for fallback content.
pub const REFERENCE_LOCALE: &str = "en";

/// A normalized, non-empty locale tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Normalize `tag`; a blank tag becomes `default` (and a blank default
    /// becomes the reference locale).
    pub fn normalize(tag: &str, default: &str) -> Self {
        let tag = tag.trim();
        if !tag.is_empty() {
            return Self(tag.to_lowercase());
        }
        let default = default.trim();
        if default.is_empty() {
            Self::reference()
        } else {
            Self(default.to_lowercase())
        }
    }

    /// Normalize `tag`, defaulting blank input to the reference locale.
    pub fn parse(tag: &str) -> Self {
        Self::normalize(tag, REFERENCE_LOCALE)
    }

    pub fn reference() -> Self {
        Self(REFERENCE_LOCALE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw tag.
    pub fn matches(&self, tag: &str) -> bool {
        tag.trim().to_lowercase() == self.0
    }
}

impl From<String> for Locale {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of [`resolve_content_locale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleResolution {
    pub requested: Locale,
    pub resolved: Locale,
    /// `None` when the requested locale was available.
    pub fallback_reason: Option<&'static str>,
}

/// Pick the content locale to assemble in, given the locales that have content.
pub fn resolve_content_locale<S: AsRef<str>>(
    requested: &str,
    available: &[S],
    fallback: &str,
) -> LocaleResolution {
    let requested = Locale::normalize(requested, fallback);
    let fallback = Locale::parse(fallback);
    let available: BTreeSet<Locale> = available
        .iter()
        .map(AsRef::as_ref)
        .filter(|tag| !tag.trim().is_empty())
        .map(Locale::parse)
        .collect();

    let (resolved, fallback_reason) = if available.is_empty() {
        (fallback, Some("no_available_locales"))
    } else if available.contains(&requested) {
        (requested.clone(), None)
    } else if available.contains(&fallback) {
        (fallback, Some("missing_requested"))
    } else {
        let first = available.iter().next().cloned().unwrap_or(fallback);
        (first, Some("missing_requested_and_fallback"))
    };

    if let Some(reason) = fallback_reason {
        tracing::debug!(requested = %requested, resolved = %resolved, reason, "Content locale fallback");
    }

    LocaleResolution {
        requested,
        resolved,
        fallback_reason,
    }
}
