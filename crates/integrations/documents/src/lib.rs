//! Document database wrapper over the MongoDB driver.

pub mod builders;
pub mod repository;
pub mod store;

pub use builders::{
    DeleteDocuments, FindDocument, FindDocuments, InsertDocument, InsertDocuments,
    ReplaceDocument,
};
pub use repository::{DocumentRepository, ReplaceOutcome};
pub use store::DocumentStore;

pub use mongodb::bson::{doc, Bson, Document};
