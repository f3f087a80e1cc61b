use std::fmt;

use uuid::Uuid;

use crate::error::{Error, Result};

/// A project identifier as accepted at the API boundary: either the internal
/// numeric key or the opaque public token (128-bit hex, with or without
/// hyphens). Resolved once here; nothing downstream branches on the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectKey {
    Internal(i64),
    Public(Uuid),
}

impl ProjectKey {
    /// Parse a raw identifier string. All-digit input must be a positive
    /// `i64`; anything else must be a parseable hex token. Rejected input
    /// never reaches the query layer.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Err(Error::InvalidIdentifier("empty identifier".into()));
        }

        if s.chars().all(|c| c.is_ascii_digit()) {
            let id: i64 = s.parse().map_err(|_| {
                Error::InvalidIdentifier(format!("numeric key out of range: {s}"))
            })?;
            if id == 0 {
                return Err(Error::InvalidIdentifier(
                    "numeric key must be positive".into(),
                ));
            }
            return Ok(ProjectKey::Internal(id));
        }

        let token = Uuid::parse_str(s).map_err(|_| {
            Error::InvalidIdentifier(format!("not a numeric key or public token: {input}"))
        })?;
        Ok(ProjectKey::Public(token))
    }

    /// The SQL predicate form of this key against the aliased `projects p`
    /// table: a WHERE fragment plus its bind value.
    pub fn predicate(&self) -> (&'static str, rusqlite::types::Value) {
        match self {
            ProjectKey::Internal(id) => (
                "p.project_id = ?1",
                rusqlite::types::Value::Integer(*id),
            ),
            ProjectKey::Public(token) => (
                "p.public_token = ?1",
                rusqlite::types::Value::Text(token.simple().to_string()),
            ),
        }
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectKey::Internal(id) => write!(f, "{id}"),
            ProjectKey::Public(token) => write!(f, "{}", token.simple()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_internal() {
        assert_eq!(ProjectKey::parse("42").unwrap(), ProjectKey::Internal(42));
        assert_eq!(
            ProjectKey::parse(" 1234567890 ").unwrap(),
            ProjectKey::Internal(1234567890)
        );
    }

    #[test]
    fn test_parse_zero_rejected() {
        assert!(matches!(
            ProjectKey::parse("0"),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_parse_out_of_range_rejected() {
        // One more digit than i64::MAX
        assert!(matches!(
            ProjectKey::parse("92233720368547758070"),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_parse_public_token_simple() {
        let key = ProjectKey::parse("a1a2a3a4b1b2c1c2d1d2d3d4d5d6d7d8").unwrap();
        assert!(matches!(key, ProjectKey::Public(_)));
    }

    #[test]
    fn test_parse_public_token_hyphenated() {
        let plain = ProjectKey::parse("a1a2a3a4b1b2c1c2d1d2d3d4d5d6d7d8").unwrap();
        let hyphenated = ProjectKey::parse("a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8").unwrap();
        assert_eq!(plain, hyphenated);
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!(ProjectKey::parse("").is_err());
        assert!(ProjectKey::parse("not-a-token").is_err());
        assert!(ProjectKey::parse("123abc").is_err());
    }

    #[test]
    fn test_predicate_columns() {
        let (sql, value) = ProjectKey::Internal(7).predicate();
        assert_eq!(sql, "p.project_id = ?1");
        assert_eq!(value, rusqlite::types::Value::Integer(7));

        let token = Uuid::parse_str("a1a2a3a4b1b2c1c2d1d2d3d4d5d6d7d8").unwrap();
        let (sql, value) = ProjectKey::Public(token).predicate();
        assert_eq!(sql, "p.public_token = ?1");
        assert_eq!(
            value,
            rusqlite::types::Value::Text("a1a2a3a4b1b2c1c2d1d2d3d4d5d6d7d8".into())
        );
    }

    #[test]
    fn test_display_round_trips() {
        let key = ProjectKey::parse("a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8").unwrap();
        assert_eq!(ProjectKey::parse(&key.to_string()).unwrap(), key);
    }
}
