// src/types/content_type.rs
//! The content-type mode a batch runs in, and the destination collections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content-type mode selected for a whole batch.
///
/// The mode decides the record shape (tags, date heuristic, slug rule);
/// the destination collection is decided separately from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    News,
    Voice,
    Activity,
    #[default]
    Generic,
}

impl ContentType {
    /// Resolves the optional mode argument. Unset or unrecognized means generic.
    pub fn from_mode(mode: Option<&str>) -> Self {
        mode.and_then(|m| m.parse().ok()).unwrap_or_default()
    }

    /// Whether pages of this type show a publish date that can be parsed.
    pub fn has_visible_date(self) -> bool {
        !matches!(self, ContentType::Activity)
    }

    /// Whether records of this type carry a free-form tag list.
    pub fn carries_tags(self) -> bool {
        matches!(self, ContentType::News | ContentType::Generic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::News => "news",
            ContentType::Voice => "voice",
            ContentType::Activity => "activity",
            ContentType::Generic => "generic",
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(ContentType::News),
            "voice" => Ok(ContentType::Voice),
            "activity" => Ok(ContentType::Activity),
            "" | "generic" => Ok(ContentType::Generic),
            other => Err(format!("unknown content type mode: {}", other)),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination collection, chosen from the first path segment of the source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    News,
    Fieldwork,
    Activity,
    Voice,
}

impl Collection {
    /// Looks up the keyword table. Unknown keywords have no collection.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "news" => Some(Collection::News),
            "fieldwork" => Some(Collection::Fieldwork),
            "activity" => Some(Collection::Activity),
            "voice" => Some(Collection::Voice),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::News => "news",
            Collection::Fieldwork => "fieldwork",
            Collection::Activity => "activity",
            Collection::Voice => "voice",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
