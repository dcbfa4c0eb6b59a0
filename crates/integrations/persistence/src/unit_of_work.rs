//! Unit of Work: repository access and transaction lifecycle.
//!
//! A unit of work hands out repositories bound to the pooled connection and
//! runs closures inside a transaction that is committed on success and rolled
//! back on error. [`TransactionFactory`] is the lower-level seam for callers
//! that need to drive commit/rollback themselves.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use common::{impl_timed, run_with_timeout, AppResult, DatabaseConfig, TimeoutSetting};
use sea_orm::{AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait};

use crate::db;
use crate::entity::ManagedEntity;
use crate::repository::{db_error, Repository};

/// Boxed future returned by transaction closures.
pub type TransactionFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Isolation level, access mode and timeout of a transaction.
#[derive(Debug, Clone)]
pub struct TransactionOptions {
    pub(crate) isolation: IsolationLevel,
    pub(crate) access_mode: AccessMode,
    pub(crate) timeout: TimeoutSetting,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            isolation: IsolationLevel::ReadCommitted,
            access_mode: AccessMode::ReadWrite,
            timeout: TimeoutSetting::default(),
        }
    }
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strongest consistency guarantees.
    pub fn serializable() -> Self {
        Self::default().isolation(IsolationLevel::Serializable)
    }

    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = level;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.access_mode = AccessMode::ReadOnly;
        self
    }
}

impl_timed!(TransactionOptions);

/// Repository access within a transaction borrowed by a closure.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Repository bound to this transaction.
    pub fn repository<E: ManagedEntity>(&self) -> Repository<'a, E, DatabaseTransaction> {
        Repository::new(self.txn)
    }

    pub fn connection(&self) -> &'a DatabaseTransaction {
        self.txn
    }
}

/// An open transaction owned by the caller.
///
/// Dropping the scope without calling [`commit`](Self::commit) rolls back.
pub struct TransactionScope {
    txn: DatabaseTransaction,
}

impl TransactionScope {
    pub fn repository<E: ManagedEntity>(&self) -> Repository<'_, E, DatabaseTransaction> {
        Repository::new(&self.txn)
    }

    pub fn connection(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub async fn commit(self) -> AppResult<()> {
        self.txn.commit().await.map_err(db_error)
    }

    pub async fn rollback(self) -> AppResult<()> {
        self.txn.rollback().await.map_err(db_error)
    }
}

/// Opens caller-managed transactions.
#[async_trait]
pub trait TransactionFactory: Send + Sync {
    /// Begin a transaction; the options' timeout bounds the begin call.
    async fn begin(&self, options: TransactionOptions) -> AppResult<TransactionScope>;
}

/// Unit of Work trait for dependency injection.
///
/// Note: This trait is not mockable directly due to generic methods.
/// Mock at the service level or test against `MockDatabase`.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Pooled connection used outside transactions.
    fn connection(&self) -> &DatabaseConnection;

    /// Repository bound to the pooled connection.
    fn repository<E: ManagedEntity>(&self) -> Repository<'_, E, DatabaseConnection> {
        Repository::new(self.connection())
    }

    /// Execute a closure within a ReadCommitted, read-write transaction.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send,
    {
        self.transaction_with(TransactionOptions::default(), f).await
    }

    /// Execute a closure within a transaction configured by `options`.
    ///
    /// The timeout, if any, covers the closure; on expiry the transaction is
    /// rolled back and `AppError::Timeout` returned.
    async fn transaction_with<F, T>(&self, options: TransactionOptions, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send;
}

/// sea-orm backed implementation of [`UnitOfWork`] and [`TransactionFactory`].
pub struct Persistence {
    db: DatabaseConnection,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect using pool sizing, connect timeout and SQL logging from config.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    /// Check database connectivity.
    pub async fn ping(&self) -> AppResult<()> {
        db::ping(&self.db).await
    }

    async fn open(&self, options: &TransactionOptions) -> AppResult<DatabaseTransaction> {
        self.db
            .begin_with_config(Some(options.isolation), Some(options.access_mode))
            .await
            .map_err(db_error)
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn transaction_with<F, T>(&self, options: TransactionOptions, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self.open(&options).await?;

        let outcome = {
            let ctx = TransactionContext::new(&txn);
            run_with_timeout(options.timeout.get(), f(ctx)).await
        };

        match outcome {
            Ok(result) => {
                txn.commit().await.map_err(db_error)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl TransactionFactory for Persistence {
    async fn begin(&self, options: TransactionOptions) -> AppResult<TransactionScope> {
        let txn = run_with_timeout(options.timeout.get(), self.open(&options)).await?;
        Ok(TransactionScope { txn })
    }
}

/// Run a block inside `UnitOfWork::transaction`.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::{AppError, Timed, TimeoutSetting};
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    use super::*;
    use crate::builders::Add;
    use crate::testing::post;

    #[test]
    fn test_default_options() {
        let options = TransactionOptions::default();
        assert!(matches!(options.isolation, IsolationLevel::ReadCommitted));
        assert!(matches!(options.access_mode, AccessMode::ReadWrite));
        assert_eq!(options.timeout, TimeoutSetting::default());

        let options = TransactionOptions::serializable().read_only();
        assert!(matches!(options.isolation, IsolationLevel::Serializable));
        assert!(matches!(options.access_mode, AccessMode::ReadOnly));
    }

    #[test]
    fn test_options_timeout_is_bounded() {
        let err = TransactionOptions::new()
            .timeout(Duration::from_secs(7200))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_transaction_returns_closure_result() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post::model(1, "inside")]])
            .into_connection();
        let uow = Persistence::new(db);

        let created = uow
            .transaction(|ctx| {
                Box::pin(async move {
                    let model = post::ActiveModel {
                        title: Set("inside".to_string()),
                        body: Set(String::new()),
                        ..Default::default()
                    };
                    ctx.repository::<post::Entity>().add(Add::new(model)).await
                })
            })
            .await
            .unwrap();

        assert_eq!(created.id, 1);
    }

    #[tokio::test]
    async fn test_transaction_propagates_closure_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let uow = Persistence::new(db);

        let result: AppResult<()> = with_transaction!(uow, |_ctx| Err(AppError::conflict("taken")));
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_scope_commits() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let uow = Persistence::new(db);

        let scope = uow.begin(TransactionOptions::default()).await.unwrap();
        scope.commit().await.unwrap();
    }
}
