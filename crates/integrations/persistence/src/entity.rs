//! Contracts an entity opts into to be managed by the repository.
//!
//! Entities implement these on their sea-orm `Entity` / `ActiveModel` types.
//! Every method has a no-op default, so an entity without audit columns or
//! soft delete only needs empty `impl` blocks.

use chrono::{DateTime, Utc};
use common::{AppError, AppResult, AuditUser};
use sea_orm::{ActiveModelTrait, EntityTrait, PrimaryKeyTrait, RelationDef};

/// Primary key value type of an entity.
pub type PrimaryKeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Entity-level options consulted when building queries.
pub trait ManagedEntity: EntityTrait {
    /// Column holding the soft-delete timestamp, if the entity supports soft delete.
    fn deleted_at_column() -> Option<Self::Column> {
        None
    }

    /// Resolve a navigation path into one relation per segment, root first.
    fn navigation(path: &IncludePath) -> Option<Vec<RelationDef>> {
        let _ = path;
        None
    }
}

/// Audit stamping applied by create/update.
pub trait Audited: ActiveModelTrait {
    fn stamp_created(&mut self, at: DateTime<Utc>, by: &AuditUser) {
        let _ = (at, by);
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>, by: Option<&AuditUser>) {
        let _ = (at, by);
    }
}

/// Soft-delete stamping applied by soft remove/restore.
pub trait SoftDeletable: ActiveModelTrait {
    fn stamp_deleted(&mut self, at: DateTime<Utc>, by: Option<&AuditUser>);

    fn stamp_restored(&mut self, at: DateTime<Utc>, by: Option<&AuditUser>);
}

/// Dot-separated navigation path, e.g. `comments.author`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludePath {
    segments: Vec<String>,
}

impl IncludePath {
    /// Start a path at a navigation of the root entity.
    pub fn new(segment: impl Into<String>) -> AppResult<Self> {
        let segment = validate_segment(segment.into())?;
        Ok(Self {
            segments: vec![segment],
        })
    }

    /// Continue the path through a navigation of the last segment.
    pub fn then(mut self, segment: impl Into<String>) -> AppResult<Self> {
        let segment = validate_segment(segment.into())?;
        self.segments.push(segment);
        Ok(self)
    }

    /// Parse the dot form (`"comments.author"`).
    pub fn parse(path: &str) -> AppResult<Self> {
        let segments = path
            .split('.')
            .map(|s| validate_segment(s.to_string()))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Path made of the first `len` segments.
    pub fn prefix(&self, len: usize) -> String {
        self.segments[..len.min(self.segments.len())].join(".")
    }
}

impl std::fmt::Display for IncludePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl TryFrom<&str> for IncludePath {
    type Error = AppError;

    fn try_from(path: &str) -> AppResult<Self> {
        Self::parse(path)
    }
}

fn validate_segment(segment: String) -> AppResult<String> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_argument("include segment must not be empty"));
    }
    if trimmed.contains('.') {
        return Err(AppError::invalid_argument(format!(
            "include segment '{}' must not contain '.'",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_chain_renders_dot_path() {
        let path = IncludePath::new("comments").unwrap().then("author").unwrap();
        assert_eq!(path.to_string(), "comments.author");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.prefix(1), "comments");
    }

    #[test]
    fn test_parse_matches_chain() {
        let parsed = IncludePath::parse("comments.author").unwrap();
        let chained = IncludePath::new("comments").unwrap().then("author").unwrap();
        assert_eq!(parsed, chained);
    }

    #[test]
    fn test_invalid_segments_rejected() {
        assert!(IncludePath::new("").unwrap_err().is_invalid_argument());
        assert!(IncludePath::new("a.b").unwrap_err().is_invalid_argument());
        assert!(IncludePath::parse("comments..author").unwrap_err().is_invalid_argument());
        assert!(IncludePath::try_from(".").is_err());
    }
}
