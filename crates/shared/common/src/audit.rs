//! Audit user value object.

use std::fmt;

use crate::error::{AppError, AppResult};

/// Name of the user responsible for a change. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuditUser(String);

impl AuditUser {
    pub fn new(user: impl Into<String>) -> AppResult<Self> {
        let user = user.into();
        let trimmed = user.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_argument("audit user must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuditUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AuditUser> for String {
    fn from(user: AuditUser) -> Self {
        user.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_user_trims() {
        assert_eq!(AuditUser::new("  alice ").unwrap().as_str(), "alice");
    }

    #[test]
    fn test_audit_user_rejects_blank() {
        assert!(AuditUser::new("").unwrap_err().is_invalid_argument());
        assert!(AuditUser::new("\t ").unwrap_err().is_invalid_argument());
    }
}
