//! Player identity (SteamID64) validation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Missing SteamID64")]
    MissingSteamId,
    #[error("SteamID64 may only contain numeric characters: '{0}'")]
    NonNumericSteamId(String),
    #[error("SteamID64 must have 17 digits, got {0}")]
    SteamIdLength(usize),
    #[error("Unknown rounding mode: '{0}'")]
    UnknownRoundingMode(String),
}

/// A validated 17-digit SteamID64.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SteamId(String);

impl SteamId {
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ModelError::MissingSteamId);
        }
        if !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(ModelError::NonNumericSteamId(value.to_string()));
        }
        if value.len() != 17 {
            return Err(ModelError::SteamIdLength(value.len()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SteamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SteamId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_seventeen_digits() {
        let id = SteamId::parse("76561198012345678").unwrap();
        assert_eq!(id.to_string(), "76561198012345678");
    }

    #[test]
    fn rejects_bad_ids() {
        assert_eq!(SteamId::parse(""), Err(ModelError::MissingSteamId));
        assert_eq!(
            SteamId::parse("7656119801234567x"),
            Err(ModelError::NonNumericSteamId("7656119801234567x".to_string()))
        );
        assert_eq!(SteamId::parse("1234"), Err(ModelError::SteamIdLength(4)));
    }
}
