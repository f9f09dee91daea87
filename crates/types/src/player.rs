// crates/types/src/player.rs
//! Canonical player identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not a valid player UUID: {input:?}")]
pub struct PlayerIdError {
    pub input: String,
}

/// A player UUID in canonical form: lowercase and hyphenated.
///
/// Both `0123abcd-...` and the undashed 32-digit form are accepted on input,
/// in any case. Storage and comparisons only ever see the canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    pub fn parse(input: &str) -> Result<Self, PlayerIdError> {
        let trimmed = input.trim();
        // Uuid::parse_str also accepts braced and urn forms; only take the two plain ones.
        if trimmed.len() != 32 && trimmed.len() != 36 {
            return Err(PlayerIdError {
                input: input.to_string(),
            });
        }
        let uuid = Uuid::parse_str(trimmed).map_err(|_| PlayerIdError {
            input: input.to_string(),
        })?;
        Ok(Self(uuid.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerId {
    type Error = PlayerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "a937646b-f115-44c3-8dbf-9ae4a65669a0";

    #[test]
    fn test_parse_canonical_is_identity() {
        let id = PlayerId::parse(CANONICAL).unwrap();
        assert_eq!(id.as_str(), CANONICAL);
    }

    #[test]
    fn test_parse_normalizes_case_and_dashes() {
        let upper = PlayerId::parse("A937646BF11544C38DBF9AE4A65669A0").unwrap();
        let mixed = PlayerId::parse("  A937646b-F115-44c3-8DBF-9ae4a65669a0 ").unwrap();
        assert_eq!(upper.as_str(), CANONICAL);
        assert_eq!(mixed, upper);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in [
            "",
            "notauuid",
            "a937646b-f115-44c3-8dbf-9ae4a65669a",
            "{a937646b-f115-44c3-8dbf-9ae4a65669a0}",
            "urn:uuid:a937646b-f115-44c3-8dbf-9ae4a65669a0",
            "g937646bf11544c38dbf9ae4a65669a0",
        ] {
            let err = PlayerId::parse(bad).unwrap_err();
            assert_eq!(err.input, bad);
        }
    }

    #[test]
    fn test_serde_goes_through_parse() {
        let id: PlayerId =
            serde_json::from_str("\"A937646BF11544C38DBF9AE4A65669A0\"").unwrap();
        assert_eq!(id.as_str(), CANONICAL);
        assert!(serde_json::from_str::<PlayerId>("\"nope\"").is_err());
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            format!("\"{CANONICAL}\"")
        );
    }
}
