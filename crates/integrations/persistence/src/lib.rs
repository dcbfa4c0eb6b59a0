//! Entity persistence over sea-orm.
//!
//! Commands and queries are described with builders and executed by a
//! [`Repository`] bound to either the pooled connection or a transaction.
//! [`Persistence`] ties the two together as a unit of work.

pub mod builders;
pub mod db;
pub mod entity;
pub mod query;
pub mod repository;
pub mod unit_of_work;

#[cfg(test)]
mod testing;

pub use builders::{
    Add, AddRange, Create, CreateRange, Remove, RemoveRange, Restore, RestoreRange, Update,
    UpdateRange,
};
pub use entity::{Audited, IncludePath, ManagedEntity, PrimaryKeyOf, SoftDeletable};
pub use query::{RangeQuery, SingleQuery};
pub use repository::Repository;
pub use unit_of_work::{
    Persistence, TransactionContext, TransactionFactory, TransactionFuture, TransactionOptions,
    TransactionScope, UnitOfWork,
};

pub use sea_orm::{AccessMode, IsolationLevel};
