use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::SchemaError;

/// Stable string identifier a source adapter is registered under.
///
/// Ids are lowercase alphanumeric (plus underscore), start with a letter,
/// and are at most 32 characters. They appear in status maps, envelopes,
/// and mode policy entries, so the format is locked down.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(String);

impl SourceId {
    pub fn parse(value: &str) -> Result<Self, SchemaError> {
        let value = value.trim();
        let mut chars = value.chars();

        let valid_start = chars.next().is_some_and(|ch| ch.is_ascii_lowercase());
        let valid_rest =
            chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');

        if !valid_start || !valid_rest || value.len() > 32 {
            return Err(SchemaError::InvalidSourceId {
                value: value.to_owned(),
            });
        }

        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SourceId {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for SourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_ids() {
        let id = SourceId::parse("cosmoshub").expect("must parse");
        assert_eq!(id.as_str(), "cosmoshub");
    }

    #[test]
    fn rejects_uppercase_and_leading_digit() {
        assert!(SourceId::parse("CosmosHub").is_err());
        assert!(SourceId::parse("9chain").is_err());
        assert!(SourceId::parse("").is_err());
    }
}
