//! Navigation transition classification as the single source of truth for
//! transition type strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ValidationError;

/// How the most recent main-frame navigation of a tab was initiated.
///
/// Values the host reports that are not listed here are kept verbatim in
/// [`TransitionType::Other`] so the navigation is still recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransitionType {
    Link,
    Typed,
    AutoBookmark,
    AutoSubframe,
    ManualSubframe,
    Generated,
    AutoToplevel,
    FormSubmit,
    Reload,
    Keyword,
    KeywordGenerated,
    StartPage,
    Other(String),
}

impl TransitionType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Link => "link",
            Self::Typed => "typed",
            Self::AutoBookmark => "auto_bookmark",
            Self::AutoSubframe => "auto_subframe",
            Self::ManualSubframe => "manual_subframe",
            Self::Generated => "generated",
            Self::AutoToplevel => "auto_toplevel",
            Self::FormSubmit => "form_submit",
            Self::Reload => "reload",
            Self::Keyword => "keyword",
            Self::KeywordGenerated => "keyword_generated",
            Self::StartPage => "start_page",
            Self::Other(value) => value,
        }
    }

    /// Classifies a host string, falling back to [`TransitionType::Other`].
    pub fn from_host(value: String) -> Self {
        value.parse().unwrap_or_else(|_| Self::Other(value))
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: only the listed values are accepted.
impl FromStr for TransitionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(Self::Link),
            "typed" => Ok(Self::Typed),
            "auto_bookmark" => Ok(Self::AutoBookmark),
            "auto_subframe" => Ok(Self::AutoSubframe),
            "manual_subframe" => Ok(Self::ManualSubframe),
            "generated" => Ok(Self::Generated),
            "auto_toplevel" => Ok(Self::AutoToplevel),
            "form_submit" => Ok(Self::FormSubmit),
            "reload" => Ok(Self::Reload),
            "keyword" => Ok(Self::Keyword),
            "keyword_generated" => Ok(Self::KeywordGenerated),
            "start_page" => Ok(Self::StartPage),
            _ => Err(ValidationError::UnknownTransitionType {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for TransitionType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransitionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from_host)
    }
}
