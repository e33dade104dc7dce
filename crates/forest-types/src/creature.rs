//! Creature roster records.
//!
//! A creature is identified by its `filename`. The backend hands the field
//! back in several decorated forms (bare name, `/static/animations/<name>`,
//! absolute URL, with a cache-busting query, percent-encoded), so every
//! dedup or lookup key goes through [`normalize_filename`] first.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Maximum number of characters shown on a creature's name tag.
pub const MAX_DISPLAY_NAME_CHARS: usize = 24;

/// Where a creature lives in the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum CreatureKind {
    /// Flies above the canopy.
    Sky,
    /// Hops around on the forest floor.
    #[default]
    Ground,
    /// Swims along the river.
    Water,
    /// The backend could not infer a kind from the filename prefix.
    #[serde(other)]
    Unknown,
}

impl CreatureKind {
    /// Parse a kind from a loosely formatted string (`"Sky"`, `" water "`).
    ///
    /// Returns `None` for anything other than the three placeable kinds.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sky" => Some(Self::Sky),
            "ground" => Some(Self::Ground),
            "water" => Some(Self::Water),
            _ => None,
        }
    }

    /// Wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sky => "sky",
            Self::Ground => "ground",
            Self::Water => "water",
            Self::Unknown => "unknown",
        }
    }
}

/// One approved creature as listed by `GET /api/latest_animals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CreatureRecord {
    /// Unique identifier, possibly decorated (see [`normalize_filename`]).
    #[serde(default)]
    pub filename: String,
    /// Asset path of the background-removed image, relative to the API base.
    #[serde(default)]
    pub url: String,
    /// Placement kind.
    #[serde(rename = "type", default)]
    pub kind: CreatureKind,
    /// Name of the visitor who drew the creature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    /// Contact number captured at submission time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl CreatureRecord {
    /// Build a bare record (used by tests and the submission flow).
    pub fn new(filename: impl Into<String>, kind: CreatureKind) -> Self {
        let filename = filename.into();
        let url = format!("/static/animations/{filename}");
        Self {
            filename,
            url,
            kind,
            owner_name: None,
            phone_number: None,
        }
    }

    /// Normalized dedup / lookup key.
    pub fn key(&self) -> String {
        normalize_filename(&self.filename)
    }

    /// Label shown on the creature's name tag.
    ///
    /// Prefers the owner's name, then the filename without its extension,
    /// then `"Unknown"`. Truncated to [`MAX_DISPLAY_NAME_CHARS`].
    pub fn display_name(&self) -> String {
        let owner = self.owner_name.as_deref().map(str::trim).unwrap_or_default();
        let label = if owner.is_empty() {
            let key = self.key();
            let stem = key.rsplit_once('.').map_or(key.as_str(), |(stem, _)| stem);
            if stem.is_empty() {
                "Unknown".to_owned()
            } else {
                stem.to_owned()
            }
        } else {
            owner.to_owned()
        };
        label.chars().take(MAX_DISPLAY_NAME_CHARS).collect()
    }
}

/// Response envelope of `GET /api/latest_animals`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPage {
    /// Most recent creatures, newest first.
    #[serde(default)]
    pub items: Vec<CreatureRecord>,
}

/// Reduce a decorated filename to its canonical key.
///
/// Strips the query string, keeps only the last path segment, and
/// percent-decodes it. Malformed escapes pass through untouched; a segment
/// that does not decode to UTF-8 is kept as-is.
pub fn normalize_filename(value: &str) -> String {
    let raw = value.trim();
    if raw.is_empty() {
        return String::new();
    }
    let no_query = raw.split_once('?').map_or(raw, |(head, _)| head);
    let tail = no_query.rsplit('/').next().unwrap_or_default();
    percent_decode_str(tail)
        .decode_utf8()
        .map_or_else(|_| tail.to_owned(), Cow::into_owned)
}
