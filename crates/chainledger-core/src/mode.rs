//! Per-source review/refusal policy.
//!
//! Mode is orthogonal to validation: it never changes what the validation
//! engine accepts, only the caller-facing semantics of a validated result.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{SchemaError, SourceId};

/// Review/refusal policy for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Events are trusted as exported.
    Strict,
    /// Validated events still need mandatory human review before trust.
    Assisted,
    /// Only a behavioral subset of possible events is exported, by design.
    Partial,
    /// The source can produce no safe event at all; requests fail fast with
    /// an explanation instead of silently returning an empty list.
    Blocked,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Assisted => "assisted",
            Self::Partial => "partial",
            Self::Blocked => "blocked",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "assisted" => Ok(Self::Assisted),
            "partial" => Ok(Self::Partial),
            "blocked" => Ok(Self::Blocked),
            other => Err(SchemaError::InvalidMode {
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModeEntry {
    mode: Mode,
    annotation: Option<String>,
}

/// Immutable per-source mode map, built once at startup and passed by
/// reference. Sources without an entry default to [`Mode::Strict`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModePolicy {
    entries: HashMap<SourceId, ModeEntry>,
}

impl ModePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, source: SourceId, mode: Mode) -> Self {
        self.entries.insert(
            source,
            ModeEntry {
                mode,
                annotation: None,
            },
        );
        self
    }

    pub fn with_annotated(
        mut self,
        source: SourceId,
        mode: Mode,
        annotation: impl Into<String>,
    ) -> Self {
        self.entries.insert(
            source,
            ModeEntry {
                mode,
                annotation: Some(annotation.into()),
            },
        );
        self
    }

    pub fn mode_of(&self, source: &SourceId) -> Mode {
        self.entries
            .get(source)
            .map_or(Mode::Strict, |entry| entry.mode)
    }

    /// Human-readable explanation attached to the entry, if any. Blocked
    /// entries carry the reason the source cannot be exported safely.
    pub fn annotation(&self, source: &SourceId) -> Option<&str> {
        self.entries
            .get(source)
            .and_then(|entry| entry.annotation.as_deref())
    }

    /// Policy for the in-tree reference adapters.
    pub fn default_policy() -> Self {
        Self::new()
            .with_mode(
                SourceId::parse("cosmoshub").expect("policy ids are valid"),
                Mode::Strict,
            )
            .with_annotated(
                SourceId::parse("driftperps").expect("policy ids are valid"),
                Mode::Assisted,
                "perp fills need human review: break-even closes are reported as opens upstream",
            )
            .with_annotated(
                SourceId::parse("kavafunding").expect("policy ids are valid"),
                Mode::Partial,
                "exports funding payments only; position history is not part of this feed",
            )
            .with_annotated(
                SourceId::parse("obolvault").expect("policy ids are valid"),
                Mode::Blocked,
                "distributor exposes only balance deltas; explicit reward amounts are not available",
            )
    }
}
