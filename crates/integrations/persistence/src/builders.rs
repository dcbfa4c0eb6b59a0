//! Command builders: Add / Create / Update / Remove / Restore, single and range.
//!
//! Builders only collect and validate parameters. They are consumed by the
//! matching [`Repository`](crate::Repository) method, which performs the call.

use common::{impl_timed, AppError, AppResult, AuditUser, TimeoutSetting};
use sea_orm::EntityTrait;

use crate::entity::PrimaryKeyOf;

fn non_empty<T>(items: impl IntoIterator<Item = T>, what: &str) -> AppResult<Vec<T>> {
    let items: Vec<T> = items.into_iter().collect();
    if items.is_empty() {
        return Err(AppError::invalid_argument(format!("{} must not be empty", what)));
    }
    Ok(items)
}

/// Insert one active model as-is.
#[derive(Debug)]
pub struct Add<A> {
    pub(crate) model: A,
    pub(crate) timeout: TimeoutSetting,
}

impl<A> Add<A> {
    pub fn new(model: A) -> Self {
        Self {
            model,
            timeout: TimeoutSetting::default(),
        }
    }
}

/// Insert several active models as-is.
#[derive(Debug)]
pub struct AddRange<A> {
    pub(crate) models: Vec<A>,
    pub(crate) timeout: TimeoutSetting,
}

impl<A> AddRange<A> {
    pub fn new(models: impl IntoIterator<Item = A>) -> AppResult<Self> {
        Ok(Self {
            models: non_empty(models, "models")?,
            timeout: TimeoutSetting::default(),
        })
    }
}

/// Insert one active model stamped with creation audit fields.
#[derive(Debug)]
pub struct Create<A> {
    pub(crate) model: A,
    pub(crate) audit_user: Option<AuditUser>,
    pub(crate) timeout: TimeoutSetting,
}

impl<A> Create<A> {
    pub fn new(model: A) -> Self {
        Self {
            model,
            audit_user: None,
            timeout: TimeoutSetting::default(),
        }
    }

    /// Required before execution.
    pub fn audit_user(mut self, user: impl Into<String>) -> AppResult<Self> {
        self.audit_user = Some(AuditUser::new(user)?);
        Ok(self)
    }
}

/// Insert several active models stamped with creation audit fields.
#[derive(Debug)]
pub struct CreateRange<A> {
    pub(crate) models: Vec<A>,
    pub(crate) audit_user: Option<AuditUser>,
    pub(crate) timeout: TimeoutSetting,
}

impl<A> CreateRange<A> {
    pub fn new(models: impl IntoIterator<Item = A>) -> AppResult<Self> {
        Ok(Self {
            models: non_empty(models, "models")?,
            audit_user: None,
            timeout: TimeoutSetting::default(),
        })
    }

    /// Required before execution.
    pub fn audit_user(mut self, user: impl Into<String>) -> AppResult<Self> {
        self.audit_user = Some(AuditUser::new(user)?);
        Ok(self)
    }
}

/// Persist changes of one active model.
#[derive(Debug)]
pub struct Update<A> {
    pub(crate) model: A,
    pub(crate) audit_user: Option<AuditUser>,
    pub(crate) timeout: TimeoutSetting,
}

impl<A> Update<A> {
    pub fn new(model: A) -> Self {
        Self {
            model,
            audit_user: None,
            timeout: TimeoutSetting::default(),
        }
    }

    pub fn audit_user(mut self, user: impl Into<String>) -> AppResult<Self> {
        self.audit_user = Some(AuditUser::new(user)?);
        Ok(self)
    }
}

/// Persist changes of several active models.
#[derive(Debug)]
pub struct UpdateRange<A> {
    pub(crate) models: Vec<A>,
    pub(crate) audit_user: Option<AuditUser>,
    pub(crate) timeout: TimeoutSetting,
}

impl<A> UpdateRange<A> {
    pub fn new(models: impl IntoIterator<Item = A>) -> AppResult<Self> {
        Ok(Self {
            models: non_empty(models, "models")?,
            audit_user: None,
            timeout: TimeoutSetting::default(),
        })
    }

    pub fn audit_user(mut self, user: impl Into<String>) -> AppResult<Self> {
        self.audit_user = Some(AuditUser::new(user)?);
        Ok(self)
    }
}

/// Remove one entity by primary key (hard delete, or soft via `soft_remove`).
pub struct Remove<E: EntityTrait> {
    pub(crate) id: PrimaryKeyOf<E>,
    pub(crate) audit_user: Option<AuditUser>,
    pub(crate) timeout: TimeoutSetting,
}

impl<E: EntityTrait> Remove<E> {
    pub fn new(id: impl Into<PrimaryKeyOf<E>>) -> Self {
        Self {
            id: id.into(),
            audit_user: None,
            timeout: TimeoutSetting::default(),
        }
    }

    /// Recorded as the deleting user on soft delete; ignored on hard delete.
    pub fn audit_user(mut self, user: impl Into<String>) -> AppResult<Self> {
        self.audit_user = Some(AuditUser::new(user)?);
        Ok(self)
    }
}

/// Remove several entities by primary key.
pub struct RemoveRange<E: EntityTrait> {
    pub(crate) ids: Vec<PrimaryKeyOf<E>>,
    pub(crate) audit_user: Option<AuditUser>,
    pub(crate) timeout: TimeoutSetting,
}

impl<E: EntityTrait> RemoveRange<E> {
    pub fn new<K>(ids: impl IntoIterator<Item = K>) -> AppResult<Self>
    where
        K: Into<PrimaryKeyOf<E>>,
    {
        Ok(Self {
            ids: non_empty(ids.into_iter().map(Into::into), "ids")?,
            audit_user: None,
            timeout: TimeoutSetting::default(),
        })
    }

    pub fn audit_user(mut self, user: impl Into<String>) -> AppResult<Self> {
        self.audit_user = Some(AuditUser::new(user)?);
        Ok(self)
    }
}

/// Restore one soft-deleted entity.
pub struct Restore<E: EntityTrait> {
    pub(crate) id: PrimaryKeyOf<E>,
    pub(crate) audit_user: Option<AuditUser>,
    pub(crate) timeout: TimeoutSetting,
}

impl<E: EntityTrait> Restore<E> {
    pub fn new(id: impl Into<PrimaryKeyOf<E>>) -> Self {
        Self {
            id: id.into(),
            audit_user: None,
            timeout: TimeoutSetting::default(),
        }
    }

    pub fn audit_user(mut self, user: impl Into<String>) -> AppResult<Self> {
        self.audit_user = Some(AuditUser::new(user)?);
        Ok(self)
    }
}

/// Restore several soft-deleted entities.
pub struct RestoreRange<E: EntityTrait> {
    pub(crate) ids: Vec<PrimaryKeyOf<E>>,
    pub(crate) audit_user: Option<AuditUser>,
    pub(crate) timeout: TimeoutSetting,
}

impl<E: EntityTrait> RestoreRange<E> {
    pub fn new<K>(ids: impl IntoIterator<Item = K>) -> AppResult<Self>
    where
        K: Into<PrimaryKeyOf<E>>,
    {
        Ok(Self {
            ids: non_empty(ids.into_iter().map(Into::into), "ids")?,
            audit_user: None,
            timeout: TimeoutSetting::default(),
        })
    }

    pub fn audit_user(mut self, user: impl Into<String>) -> AppResult<Self> {
        self.audit_user = Some(AuditUser::new(user)?);
        Ok(self)
    }
}

impl_timed!(Add<A>);
impl_timed!(AddRange<A>);
impl_timed!(Create<A>);
impl_timed!(CreateRange<A>);
impl_timed!(Update<A>);
impl_timed!(UpdateRange<A>);
impl_timed!(Remove<E: EntityTrait>);
impl_timed!(RemoveRange<E: EntityTrait>);
impl_timed!(Restore<E: EntityTrait>);
impl_timed!(RestoreRange<E: EntityTrait>);
