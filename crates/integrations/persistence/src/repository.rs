//! Generic repository executing builders against a connection or transaction.

use std::marker::PhantomData;

use chrono::Utc;
use common::{run_with_timeout, AppError, AppResult, AuditUser, Paginated, PaginationParams};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityName,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, TransactionTrait,
};

use crate::builders::{
    Add, AddRange, Create, CreateRange, Remove, RemoveRange, Restore, RestoreRange, Update,
    UpdateRange,
};
use crate::entity::{Audited, ManagedEntity, PrimaryKeyOf, SoftDeletable};
use crate::query::{RangeQuery, SingleQuery};

/// Map database failures, logging anything other than a missing row.
///
/// A missing target row becomes `NotFound`.
pub(crate) fn db_error(err: DbErr) -> AppError {
    match err {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => AppError::NotFound,
        other => {
            tracing::error!("Database error: {}", other);
            AppError::Database(other)
        }
    }
}

/// Repository over one entity type, borrowing a connection or transaction.
///
/// The `*_range` commands run inside their own transaction (a savepoint when
/// the repository is already bound to one), so either every item is written
/// or none is.
pub struct Repository<'c, E, C> {
    conn: &'c C,
    _entity: PhantomData<E>,
}

impl<'c, E, C> Repository<'c, E, C>
where
    E: ManagedEntity,
    C: ConnectionTrait,
{
    pub fn new(conn: &'c C) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    // ------------------------------------------------------------------
    // Inserts
    // ------------------------------------------------------------------

    /// Insert the model as-is.
    pub async fn add<A>(&self, cmd: Add<A>) -> AppResult<E::Model>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        run_with_timeout(cmd.timeout.get(), async {
            cmd.model.insert(self.conn).await.map_err(db_error)
        })
        .await
    }

    /// Insert the models one after another in a single transaction.
    pub async fn add_range<A>(&self, cmd: AddRange<A>) -> AppResult<Vec<E::Model>>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
        C: TransactionTrait,
    {
        run_with_timeout(cmd.timeout.get(), async {
            let txn = self.conn.begin().await.map_err(db_error)?;
            let mut inserted = Vec::with_capacity(cmd.models.len());
            for model in cmd.models {
                inserted.push(model.insert(&txn).await.map_err(db_error)?);
            }
            txn.commit().await.map_err(db_error)?;
            Ok(inserted)
        })
        .await
    }

    /// Insert the model stamped with creation audit fields.
    pub async fn create<A>(&self, cmd: Create<A>) -> AppResult<E::Model>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Audited + Send,
        E::Model: IntoActiveModel<A>,
    {
        let user = cmd
            .audit_user
            .ok_or_else(|| AppError::invalid_argument("create requires an audit user"))?;
        let mut model = cmd.model;
        model.stamp_created(Utc::now(), &user);

        run_with_timeout(cmd.timeout.get(), async {
            let created = model.insert(self.conn).await.map_err(db_error)?;
            tracing::debug!(user = %user, "Entity created");
            Ok(created)
        })
        .await
    }

    pub async fn create_range<A>(&self, cmd: CreateRange<A>) -> AppResult<Vec<E::Model>>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Audited + Send,
        E::Model: IntoActiveModel<A>,
        C: TransactionTrait,
    {
        let CreateRange {
            models,
            audit_user,
            timeout,
        } = cmd;
        let user = audit_user
            .ok_or_else(|| AppError::invalid_argument("create requires an audit user"))?;
        let now = Utc::now();

        run_with_timeout(timeout.get(), async {
            let txn = self.conn.begin().await.map_err(db_error)?;
            let mut created = Vec::with_capacity(models.len());
            for mut model in models {
                model.stamp_created(now, &user);
                created.push(model.insert(&txn).await.map_err(db_error)?);
            }
            txn.commit().await.map_err(db_error)?;
            tracing::debug!(user = %user, count = created.len(), "Entities created");
            Ok(created)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Persist the set fields of the model, stamping update audit fields.
    pub async fn update<A>(&self, cmd: Update<A>) -> AppResult<E::Model>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Audited + Send,
        E::Model: IntoActiveModel<A>,
    {
        let mut model = cmd.model;
        model.stamp_updated(Utc::now(), cmd.audit_user.as_ref());

        run_with_timeout(cmd.timeout.get(), async {
            model.update(self.conn).await.map_err(db_error)
        })
        .await
    }

    /// Update every model or none; a missing row aborts with `NotFound`.
    pub async fn update_range<A>(&self, cmd: UpdateRange<A>) -> AppResult<Vec<E::Model>>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Audited + Send,
        E::Model: IntoActiveModel<A>,
        C: TransactionTrait,
    {
        let UpdateRange {
            models,
            audit_user: user,
            timeout,
        } = cmd;
        let now = Utc::now();

        run_with_timeout(timeout.get(), async {
            let txn = self.conn.begin().await.map_err(db_error)?;
            let mut updated = Vec::with_capacity(models.len());
            for mut model in models {
                model.stamp_updated(now, user.as_ref());
                updated.push(model.update(&txn).await.map_err(db_error)?);
            }
            txn.commit().await.map_err(db_error)?;
            Ok(updated)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Hard delete
    // ------------------------------------------------------------------

    /// Permanently delete by primary key.
    pub async fn remove(&self, cmd: Remove<E>) -> AppResult<()> {
        run_with_timeout(cmd.timeout.get(), async {
            let result = E::delete_by_id(cmd.id)
                .exec(self.conn)
                .await
                .map_err(db_error)?;
            if result.rows_affected == 0 {
                return Err(AppError::NotFound);
            }
            Ok(())
        })
        .await
    }

    /// Permanently delete every key; returns the number of rows removed.
    pub async fn remove_range(&self, cmd: RemoveRange<E>) -> AppResult<u64>
    where
        C: TransactionTrait,
    {
        run_with_timeout(cmd.timeout.get(), async {
            let txn = self.conn.begin().await.map_err(db_error)?;
            let mut removed = 0;
            for id in cmd.ids {
                removed += E::delete_by_id(id)
                    .exec(&txn)
                    .await
                    .map_err(db_error)?
                    .rows_affected;
            }
            if removed == 0 {
                return Err(AppError::NotFound);
            }
            txn.commit().await.map_err(db_error)?;
            Ok(removed)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Soft delete / restore
    // ------------------------------------------------------------------

    /// Mark an active row as deleted.
    pub async fn soft_remove<A>(&self, cmd: Remove<E>) -> AppResult<E::Model>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + SoftDeletable + Send,
        E::Model: IntoActiveModel<A>,
    {
        let column = Self::soft_delete_column()?;
        let Remove {
            id,
            audit_user: user,
            timeout,
        } = cmd;

        run_with_timeout(timeout.get(), async {
            self.soft_remove_one::<A>(column, id, user.as_ref())
                .await?
                .ok_or(AppError::NotFound)
        })
        .await
    }

    /// Mark several active rows as deleted; returns how many were marked.
    pub async fn soft_remove_range<A>(&self, cmd: RemoveRange<E>) -> AppResult<u64>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + SoftDeletable + Send,
        E::Model: IntoActiveModel<A>,
        C: TransactionTrait,
    {
        let column = Self::soft_delete_column()?;
        let RemoveRange {
            ids,
            audit_user: user,
            timeout,
        } = cmd;

        run_with_timeout(timeout.get(), async {
            let txn = self.conn.begin().await.map_err(db_error)?;
            let scoped = Repository::<E, _>::new(&txn);
            let mut marked = 0;
            for id in ids {
                if scoped
                    .soft_remove_one::<A>(column, id, user.as_ref())
                    .await?
                    .is_some()
                {
                    marked += 1;
                }
            }
            if marked == 0 {
                return Err(AppError::NotFound);
            }
            txn.commit().await.map_err(db_error)?;
            Ok(marked)
        })
        .await
    }

    /// Clear the deleted mark of a soft-deleted row.
    pub async fn restore<A>(&self, cmd: Restore<E>) -> AppResult<E::Model>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + SoftDeletable + Send,
        E::Model: IntoActiveModel<A>,
    {
        let column = Self::soft_delete_column()?;
        let Restore {
            id,
            audit_user: user,
            timeout,
        } = cmd;

        run_with_timeout(timeout.get(), async {
            self.restore_one::<A>(column, id, user.as_ref())
                .await?
                .ok_or(AppError::NotFound)
        })
        .await
    }

    pub async fn restore_range<A>(&self, cmd: RestoreRange<E>) -> AppResult<u64>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + SoftDeletable + Send,
        E::Model: IntoActiveModel<A>,
        C: TransactionTrait,
    {
        let column = Self::soft_delete_column()?;
        let RestoreRange {
            ids,
            audit_user: user,
            timeout,
        } = cmd;

        run_with_timeout(timeout.get(), async {
            let txn = self.conn.begin().await.map_err(db_error)?;
            let scoped = Repository::<E, _>::new(&txn);
            let mut restored = 0;
            for id in ids {
                if scoped
                    .restore_one::<A>(column, id, user.as_ref())
                    .await?
                    .is_some()
                {
                    restored += 1;
                }
            }
            if restored == 0 {
                return Err(AppError::NotFound);
            }
            txn.commit().await.map_err(db_error)?;
            Ok(restored)
        })
        .await
    }

    fn soft_delete_column() -> AppResult<E::Column> {
        E::deleted_at_column().ok_or_else(|| {
            AppError::invalid_argument(format!(
                "entity '{}' does not support soft delete",
                E::default().table_name()
            ))
        })
    }

    async fn soft_remove_one<A>(
        &self,
        column: E::Column,
        id: PrimaryKeyOf<E>,
        user: Option<&AuditUser>,
    ) -> AppResult<Option<E::Model>>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + SoftDeletable + Send,
        E::Model: IntoActiveModel<A>,
    {
        let Some(found) = E::find_by_id(id)
            .filter(column.is_null())
            .one(self.conn)
            .await
            .map_err(db_error)?
        else {
            return Ok(None);
        };

        let mut active: A = found.into_active_model();
        active.stamp_deleted(Utc::now(), user);
        let model = active.update(self.conn).await.map_err(db_error)?;
        Ok(Some(model))
    }

    async fn restore_one<A>(
        &self,
        column: E::Column,
        id: PrimaryKeyOf<E>,
        user: Option<&AuditUser>,
    ) -> AppResult<Option<E::Model>>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + SoftDeletable + Send,
        E::Model: IntoActiveModel<A>,
    {
        let Some(found) = E::find_by_id(id)
            .filter(column.is_not_null())
            .one(self.conn)
            .await
            .map_err(db_error)?
        else {
            return Ok(None);
        };

        let mut active: A = found.into_active_model();
        active.stamp_restored(Utc::now(), user);
        let model = active.update(self.conn).await.map_err(db_error)?;
        Ok(Some(model))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First row matching the query, if any.
    pub async fn single(&self, query: SingleQuery<E>) -> AppResult<Option<E::Model>>
    where
        PrimaryKeyOf<E>: Clone,
    {
        let select = query.apply()?;
        run_with_timeout(query.timeout.get(), async {
            select.one(self.conn).await.map_err(db_error)
        })
        .await
    }

    /// Every row matching the query, honoring skip/take.
    pub async fn range(&self, query: RangeQuery<E>) -> AppResult<Vec<E::Model>> {
        let select = query.apply()?;
        run_with_timeout(query.timeout.get(), async {
            select.all(self.conn).await.map_err(db_error)
        })
        .await
    }

    /// Count matching rows, ignoring skip/take.
    pub async fn count(&self, query: RangeQuery<E>) -> AppResult<u64>
    where
        E::Model: Sync,
    {
        let select = query.apply_unpaged()?;
        run_with_timeout(query.timeout.get(), async {
            select.count(self.conn).await.map_err(db_error)
        })
        .await
    }

    /// Whether at least one row matches, ignoring skip/take.
    pub async fn exists(&self, query: RangeQuery<E>) -> AppResult<bool> {
        let select = query.apply_unpaged()?;
        run_with_timeout(query.timeout.get(), async {
            Ok(select.one(self.conn).await.map_err(db_error)?.is_some())
        })
        .await
    }

    /// One page of matching rows plus the total count.
    pub async fn page(
        &self,
        query: RangeQuery<E>,
        params: PaginationParams,
    ) -> AppResult<Paginated<E::Model>>
    where
        E::Model: Sync,
    {
        let select = query.apply_unpaged()?;
        let per_page = params.limit();
        let page = params.page.max(1);

        run_with_timeout(query.timeout.get(), async {
            let paginator = select.paginate(self.conn, per_page);
            let total = paginator.num_items().await.map_err(db_error)?;
            let data = paginator.fetch_page(page - 1).await.map_err(db_error)?;
            Ok(Paginated::new(data, page, per_page, total))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{
        DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Set, Value,
    };

    use common::testing::LogCapture;

    use super::*;
    use crate::entity::IncludePath;
    use crate::testing::{comment, post};

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    fn repo(db: &DatabaseConnection) -> Repository<'_, post::Entity, DatabaseConnection> {
        Repository::new(db)
    }

    fn draft(title: &str) -> post::ActiveModel {
        post::ActiveModel {
            title: Set(title.to_string()),
            body: Set(String::new()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_returns_inserted_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post::model(1, "hello")]])
            .into_connection();

        let created = repo(&db).add(Add::new(draft("hello"))).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.title, "hello");
    }

    #[tokio::test]
    async fn test_create_without_audit_user_fails_before_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = repo(&db).create(Create::new(draft("x"))).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_create_stamps_audit_fields() {
        let mut row = post::model(1, "x");
        row.created_by = Some("alice".to_string());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();

        let cmd = Create::new(draft("x")).audit_user("alice").unwrap();
        let created = repo(&db).create(cmd).await.unwrap();
        assert_eq!(created.created_by.as_deref(), Some("alice"));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("created_by"));
        assert!(log.contains("alice"));
    }

    #[tokio::test]
    async fn test_create_range_inserts_each_model() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post::model(1, "a")], vec![post::model(2, "b")]])
            .into_connection();

        let cmd = CreateRange::new([draft("a"), draft("b")])
            .unwrap()
            .audit_user("bob")
            .unwrap();
        let created = repo(&db).create_range(cmd).await.unwrap();
        assert_eq!(created.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("BEGIN"));
        assert!(log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_add_range_rolls_back_when_an_insert_fails() {
        let (logs, _guard) = LogCapture::install();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post::model(1, "a")]])
            .append_query_errors([DbErr::Custom("duplicate key value".to_string())])
            .into_connection();

        let cmd = AddRange::new([draft("a"), draft("b")]).unwrap();
        let err = repo(&db).add_range(cmd).await.unwrap_err();
        assert_eq!(err.code(), "DATABASE_ERROR");

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("BEGIN"));
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
        assert!(logs.errors().iter().any(|line| line.contains("duplicate key value")));
    }

    #[test]
    fn test_missing_row_is_not_found_without_error_log() {
        let (logs, _guard) = LogCapture::install();

        assert!(matches!(db_error(DbErr::RecordNotUpdated), AppError::NotFound));
        assert!(logs.errors().is_empty());

        let err = db_error(DbErr::Custom("connection reset".to_string()));
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert_eq!(logs.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_update_range_missing_row_rolls_back_earlier_updates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post::model(1, "a2")], Vec::<post::Model>::new()])
            .into_connection();

        let models = [1, 2].map(|id| post::ActiveModel {
            id: Set(id),
            title: Set("changed".to_string()),
            ..Default::default()
        });
        let err = repo(&db)
            .update_range(UpdateRange::new(models).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let model = post::ActiveModel {
            id: Set(9),
            title: Set("changed".to_string()),
            ..Default::default()
        };
        let err = repo(&db).update(Update::new(model)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_remove_with_no_rows_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = repo(&db).remove(Remove::new(42)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_remove_range_counts_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        let removed = repo(&db)
            .remove_range(RemoveRange::new([1, 2]).unwrap())
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_soft_remove_stamps_deleted_fields() {
        let mut deleted = post::model(1, "x");
        deleted.deleted_at = Some(Utc::now());
        deleted.deleted_by = Some("carol".to_string());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post::model(1, "x")], vec![deleted]])
            .into_connection();

        let cmd = Remove::new(1).audit_user("carol").unwrap();
        let model = repo(&db)
            .soft_remove::<post::ActiveModel>(cmd)
            .await
            .unwrap();
        assert!(model.deleted_at.is_some());
        assert_eq!(model.deleted_by.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn test_soft_remove_of_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let err = repo(&db)
            .soft_remove::<post::ActiveModel>(Remove::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_restore_of_active_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let err = repo(&db)
            .restore::<post::ActiveModel>(Restore::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_restore_range_counts_restored() {
        let mut deleted = post::model(1, "x");
        deleted.deleted_at = Some(Utc::now());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![deleted],
                vec![post::model(1, "x")],
                Vec::<post::Model>::new(),
            ])
            .into_connection();

        let restored = repo(&db)
            .restore_range::<post::ActiveModel>(RestoreRange::new([1, 2]).unwrap())
            .await
            .unwrap();
        assert_eq!(restored, 1);
    }

    #[tokio::test]
    async fn test_soft_remove_without_column_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo: Repository<'_, comment::Entity, _> = Repository::new(&db);

        let err = repo
            .soft_remove::<comment::ActiveModel>(Remove::new(1))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_single_and_range_return_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![post::model(3, "c")],
                vec![post::model(1, "a"), post::model(2, "b")],
            ])
            .into_connection();
        let repo = repo(&db);

        let found = repo.single(SingleQuery::by_id(3)).await.unwrap();
        assert_eq!(found.map(|p| p.title), Some("c".to_string()));

        let rows = repo.range(RangeQuery::new()).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_include_fails_before_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let query = RangeQuery::new().include(IncludePath::new("tags").unwrap());

        let err = repo(&db).range(query).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_include_yields_each_root_once() {
        // Two comments on post 1 would otherwise repeat it in rows and count.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post::model(1, "a"), post::model(2, "b")]])
            .append_query_results([vec![count_row(2)]])
            .into_connection();
        let repo = repo(&db);
        let query = || {
            RangeQuery::<post::Entity>::new().include(IncludePath::new("comments").unwrap())
        };

        assert_eq!(repo.range(query()).await.unwrap().len(), 2);
        assert_eq!(repo.count(query()).await.unwrap(), 2);

        let log = format!("{:?}", db.into_transaction_log());
        assert_eq!(log.matches("SELECT DISTINCT").count(), 2);
        assert_eq!(log.matches(r#"LEFT JOIN \"comments\""#).count(), 2);
    }

    #[tokio::test]
    async fn test_count_and_exists() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(4)]])
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();
        let repo = repo(&db);

        assert_eq!(repo.count(RangeQuery::new()).await.unwrap(), 4);
        assert!(!repo.exists(RangeQuery::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_page_reports_totals() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(5)]])
            .append_query_results([vec![post::model(3, "c"), post::model(4, "d")]])
            .into_connection();

        let page = repo(&db)
            .page(RangeQuery::new(), PaginationParams::new(2, 2))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.total, 5);
        assert_eq!(page.meta.total_pages, 3);
        assert_eq!(page.meta.page, 2);
    }
}
