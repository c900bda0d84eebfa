//! Stakeholder identifiers
//!
//! Callers address a stakeholder either by its sequential numeric `id` or by
//! its `stakeholder_uuid`. Every raw input classifies as exactly one of:
//! - `Numeric`: the trimmed input parses as an `i64` (`"2"`, `"+2"`, `"-7"`)
//! - `Opaque`: any other non-empty input, matched against `stakeholder_uuid`
//!
//! Blank input and the null literals `null` / `undefined` are rejected.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Lookup key for a single stakeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Identifier {
    /// Auto-assigned `stakeholder.id`
    Numeric(i64),
    /// `stakeholder.stakeholder_uuid`
    Opaque(String),
}

impl Identifier {
    /// Classify a raw identifier string.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
            return Err(Error::AmbiguousIdentifier(raw.to_string()));
        }

        match trimmed.parse::<i64>() {
            Ok(id) => Ok(Identifier::Numeric(id)),
            Err(_) => Ok(Identifier::Opaque(trimmed.to_string())),
        }
    }

    /// SQL column this identifier is matched against
    pub fn column(&self) -> &'static str {
        match self {
            Identifier::Numeric(_) => "id",
            Identifier::Opaque(_) => "stakeholder_uuid",
        }
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Identifier::parse(s)
    }
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Identifier::Numeric(id)
    }
}

impl rusqlite::ToSql for Identifier {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        match self {
            Identifier::Numeric(id) => id.to_sql(),
            Identifier::Opaque(uuid) => uuid.to_sql(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(id) => write!(f, "{}", id),
            Identifier::Opaque(uuid) => write!(f, "{}", uuid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_strings_classify_as_numeric() {
        assert_eq!(Identifier::parse("2").unwrap(), Identifier::Numeric(2));
        assert_eq!(Identifier::parse(" 42 ").unwrap(), Identifier::Numeric(42));
        assert_eq!(Identifier::parse("-3").unwrap(), Identifier::Numeric(-3));
        assert_eq!(Identifier::from(2), Identifier::parse("2").unwrap());
    }

    #[test]
    fn test_uuid_classifies_as_opaque() {
        let id = Identifier::parse("6f1c2b9e-3a43-4d7c-9a55-0c7e2f7f1a10").unwrap();
        assert_eq!(id, Identifier::Opaque("6f1c2b9e-3a43-4d7c-9a55-0c7e2f7f1a10".to_string()));
        assert_eq!(id.column(), "stakeholder_uuid");

        // Looks numeric but overflows i64: still a valid opaque key
        let big = Identifier::parse("99999999999999999999").unwrap();
        assert!(matches!(big, Identifier::Opaque(_)));
    }

    #[test]
    fn test_blank_and_null_are_ambiguous() {
        for raw in ["", "   ", "null", "undefined"] {
            let err = Identifier::parse(raw).unwrap_err();
            assert!(matches!(err, Error::AmbiguousIdentifier(_)), "{raw:?}");
        }
    }

    #[test]
    fn test_display_roundtrip() {
        for raw in ["17", "u1"] {
            let id: Identifier = raw.parse().unwrap();
            assert_eq!(id.to_string(), raw);
        }
    }
}
