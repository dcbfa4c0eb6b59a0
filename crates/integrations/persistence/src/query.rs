//! Query builders: single-row and range lookups.
//!
//! Accumulated options are applied to a `Select` in a fixed order:
//! includes (joins), soft-delete filter, filters, sort keys, skip, take.
//!
//! Only root columns are selected, so a query with includes is `DISTINCT`
//! and yields each root row once however many related rows it joins.
//! Sort keys must then be root columns.

use std::collections::HashSet;

use common::{impl_timed, AppError, AppResult, PaginationParams, SortDirection, TimeoutSetting};
use sea_orm::{
    sea_query::IntoCondition, ColumnTrait, Condition, EntityTrait, JoinType, Order, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

use crate::entity::{IncludePath, ManagedEntity, PrimaryKeyOf};

fn to_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Ascending => Order::Asc,
        SortDirection::Descending => Order::Desc,
    }
}

/// Options shared by single and range queries.
struct QueryParts<E: EntityTrait> {
    filters: Vec<Condition>,
    includes: Vec<IncludePath>,
    sorts: Vec<(E::Column, SortDirection)>,
    with_deleted: bool,
}

impl<E: EntityTrait> Default for QueryParts<E> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            includes: Vec::new(),
            sorts: Vec::new(),
            with_deleted: false,
        }
    }
}

impl<E: ManagedEntity> QueryParts<E> {
    fn apply(&self, mut select: Select<E>) -> AppResult<Select<E>> {
        // 1. includes
        let mut joined: HashSet<String> = HashSet::new();
        for path in &self.includes {
            let relations = E::navigation(path).ok_or_else(|| {
                AppError::invalid_argument(format!("unknown include path '{}'", path))
            })?;
            if relations.len() != path.depth() {
                return Err(AppError::invalid_argument(format!(
                    "include path '{}' resolved to {} relations",
                    path,
                    relations.len()
                )));
            }
            for (depth, relation) in relations.into_iter().enumerate() {
                if joined.insert(path.prefix(depth + 1)) {
                    select = select.join(JoinType::LeftJoin, relation);
                }
            }
        }
        if !joined.is_empty() {
            select = select.distinct();
        }

        // 2. soft-delete filter
        if !self.with_deleted {
            if let Some(column) = E::deleted_at_column() {
                select = select.filter(column.is_null());
            }
        }

        // 3. filters, in insertion order
        for condition in &self.filters {
            select = select.filter(condition.clone());
        }

        // 4. sort keys, first is primary
        for (column, direction) in &self.sorts {
            select = select.order_by(*column, to_order(*direction));
        }

        Ok(select)
    }
}

/// Lookup of at most one entity.
pub struct SingleQuery<E: EntityTrait> {
    id: Option<PrimaryKeyOf<E>>,
    parts: QueryParts<E>,
    pub(crate) timeout: TimeoutSetting,
}

impl<E: ManagedEntity> Default for SingleQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ManagedEntity> SingleQuery<E> {
    pub fn new() -> Self {
        Self {
            id: None,
            parts: QueryParts::default(),
            timeout: TimeoutSetting::default(),
        }
    }

    /// Look up by primary key.
    pub fn by_id(id: impl Into<PrimaryKeyOf<E>>) -> Self {
        let mut query = Self::new();
        query.id = Some(id.into());
        query
    }

    /// Add a filter; multiple filters are ANDed.
    pub fn filter(mut self, condition: impl IntoCondition) -> Self {
        self.parts.filters.push(condition.into_condition());
        self
    }

    /// Join a navigation path (e.g. `comments.author`).
    pub fn include(mut self, path: IncludePath) -> Self {
        self.parts.includes.push(path);
        self
    }

    /// Order candidates; the first row wins.
    pub fn order_by(mut self, column: E::Column, direction: SortDirection) -> Self {
        self.parts.sorts.push((column, direction));
        self
    }

    /// Include soft-deleted rows.
    pub fn with_deleted(mut self) -> Self {
        self.parts.with_deleted = true;
        self
    }

    /// Build the select, limited to one row.
    pub fn apply(&self) -> AppResult<Select<E>>
    where
        PrimaryKeyOf<E>: Clone,
    {
        let select = match &self.id {
            Some(id) => E::find_by_id(id.clone()),
            None => E::find(),
        };
        Ok(self.parts.apply(select)?.limit(1))
    }
}

/// Lookup of any number of entities.
pub struct RangeQuery<E: EntityTrait> {
    parts: QueryParts<E>,
    skip: Option<u64>,
    take: Option<u64>,
    pub(crate) timeout: TimeoutSetting,
}

impl<E: ManagedEntity> Default for RangeQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ManagedEntity> RangeQuery<E> {
    pub fn new() -> Self {
        Self {
            parts: QueryParts::default(),
            skip: None,
            take: None,
            timeout: TimeoutSetting::default(),
        }
    }

    /// Add a filter; multiple filters are ANDed.
    pub fn filter(mut self, condition: impl IntoCondition) -> Self {
        self.parts.filters.push(condition.into_condition());
        self
    }

    /// Join a navigation path (e.g. `comments.author`).
    pub fn include(mut self, path: IncludePath) -> Self {
        self.parts.includes.push(path);
        self
    }

    /// Replace the sort list with a single primary key.
    pub fn order_by(mut self, column: E::Column, direction: SortDirection) -> Self {
        self.parts.sorts.clear();
        self.parts.sorts.push((column, direction));
        self
    }

    /// Append a secondary sort key.
    pub fn then_by(mut self, column: E::Column, direction: SortDirection) -> Self {
        self.parts.sorts.push((column, direction));
        self
    }

    pub fn skip(mut self, count: u64) -> Self {
        self.skip = Some(count);
        self
    }

    /// Limit the number of rows; zero is rejected.
    pub fn take(mut self, count: u64) -> AppResult<Self> {
        if count == 0 {
            return Err(AppError::invalid_argument("take must be greater than 0"));
        }
        self.take = Some(count);
        Ok(self)
    }

    /// Set skip/take from page parameters.
    pub fn page(mut self, params: &PaginationParams) -> Self {
        self.skip = Some(params.offset());
        self.take = Some(params.limit());
        self
    }

    /// Include soft-deleted rows.
    pub fn with_deleted(mut self) -> Self {
        self.parts.with_deleted = true;
        self
    }

    /// Build the select with skip/take applied.
    pub fn apply(&self) -> AppResult<Select<E>> {
        let mut select = self.apply_unpaged()?;
        if let Some(skip) = self.skip {
            select = select.offset(skip);
        }
        if let Some(take) = self.take {
            select = select.limit(take);
        }
        Ok(select)
    }

    /// Build the select without skip/take (used for counting and paging).
    pub fn apply_unpaged(&self) -> AppResult<Select<E>> {
        self.parts.apply(E::find())
    }
}

impl_timed!(SingleQuery<E: EntityTrait>);
impl_timed!(RangeQuery<E: EntityTrait>);
