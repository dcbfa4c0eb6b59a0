//! Builders for document commands and queries.

use common::{impl_timed, AppError, AppResult, SortDirection, TimeoutSetting};
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOneOptions, FindOptions};

/// Combine accumulated filters; multiple filters are ANDed.
fn combine(filters: &[Document]) -> Document {
    match filters {
        [] => Document::new(),
        [only] => only.clone(),
        many => doc! { "$and": many.iter().cloned().map(Bson::Document).collect::<Vec<_>>() },
    }
}

fn sort_value(direction: SortDirection) -> i32 {
    match direction {
        SortDirection::Ascending => 1,
        SortDirection::Descending => -1,
    }
}

fn projection<I, S>(fields: I) -> Document
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields.into_iter().map(|f| (f.into(), Bson::Int32(1))).collect()
}

/// Insert one document.
#[derive(Debug)]
pub struct InsertDocument<T> {
    pub(crate) document: T,
    pub(crate) timeout: TimeoutSetting,
}

impl<T> InsertDocument<T> {
    pub fn new(document: T) -> Self {
        Self {
            document,
            timeout: TimeoutSetting::default(),
        }
    }
}

/// Insert several documents in order.
#[derive(Debug)]
pub struct InsertDocuments<T> {
    pub(crate) documents: Vec<T>,
    pub(crate) timeout: TimeoutSetting,
}

impl<T> InsertDocuments<T> {
    pub fn new(documents: impl IntoIterator<Item = T>) -> AppResult<Self> {
        let documents: Vec<T> = documents.into_iter().collect();
        if documents.is_empty() {
            return Err(AppError::invalid_argument("documents must not be empty"));
        }
        Ok(Self {
            documents,
            timeout: TimeoutSetting::default(),
        })
    }
}

/// Replace the first document matching a filter.
#[derive(Debug)]
pub struct ReplaceDocument<T> {
    pub(crate) filter: Document,
    pub(crate) replacement: T,
    pub(crate) upsert: bool,
    pub(crate) timeout: TimeoutSetting,
}

impl<T> ReplaceDocument<T> {
    pub fn new(filter: Document, replacement: T) -> Self {
        Self {
            filter,
            replacement,
            upsert: false,
            timeout: TimeoutSetting::default(),
        }
    }

    /// Insert the replacement when nothing matches.
    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }
}

/// Delete the first (or every, with `many()`) document matching a filter.
#[derive(Debug)]
pub struct DeleteDocuments {
    pub(crate) filter: Document,
    pub(crate) many: bool,
    pub(crate) timeout: TimeoutSetting,
}

impl DeleteDocuments {
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            many: false,
            timeout: TimeoutSetting::default(),
        }
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }
}

/// Lookup of at most one document.
#[derive(Debug, Default)]
pub struct FindDocument {
    filters: Vec<Document>,
    sort: Document,
    skip: Option<u64>,
    projection: Option<Document>,
    pub(crate) timeout: TimeoutSetting,
}

impl FindDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Document) -> Self {
        self.filters.push(filter);
        self
    }

    /// Order candidates; the first document wins.
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let field = field.into();
        self.sort.remove(&field);
        self.sort.insert(field, sort_value(direction));
        self
    }

    pub fn skip(mut self, count: u64) -> Self {
        self.skip = Some(count);
        self
    }

    /// Return only the named fields (plus `_id`).
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(projection(fields));
        self
    }

    pub fn filter_document(&self) -> Document {
        combine(&self.filters)
    }

    pub fn find_one_options(&self) -> FindOneOptions {
        let mut options = FindOneOptions::default();
        if !self.sort.is_empty() {
            options.sort = Some(self.sort.clone());
        }
        options.skip = self.skip;
        options.projection = self.projection.clone();
        options.max_time = self.timeout.get().map(|t| t.duration());
        options
    }
}

/// Lookup of any number of documents.
#[derive(Debug, Default)]
pub struct FindDocuments {
    filters: Vec<Document>,
    sort: Document,
    skip: Option<u64>,
    take: Option<i64>,
    projection: Option<Document>,
    pub(crate) timeout: TimeoutSetting,
}

impl FindDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter; multiple filters are ANDed.
    pub fn filter(mut self, filter: Document) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append a sort key; the first key is primary. Sorting on a field
    /// again moves it to the end.
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let field = field.into();
        self.sort.remove(&field);
        self.sort.insert(field, sort_value(direction));
        self
    }

    pub fn skip(mut self, count: u64) -> Self {
        self.skip = Some(count);
        self
    }

    /// Limit the number of documents; zero is rejected.
    pub fn take(mut self, count: u64) -> AppResult<Self> {
        if count == 0 {
            return Err(AppError::invalid_argument("take must be greater than 0"));
        }
        let count = i64::try_from(count)
            .map_err(|_| AppError::invalid_argument("take is too large"))?;
        self.take = Some(count);
        Ok(self)
    }

    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(projection(fields));
        self
    }

    pub fn filter_document(&self) -> Document {
        combine(&self.filters)
    }

    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        if !self.sort.is_empty() {
            options.sort = Some(self.sort.clone());
        }
        options.skip = self.skip;
        options.limit = self.take;
        options.projection = self.projection.clone();
        options.max_time = self.timeout.get().map(|t| t.duration());
        options
    }
}

impl_timed!(InsertDocument<T>);
impl_timed!(InsertDocuments<T>);
impl_timed!(ReplaceDocument<T>);
impl_timed!(DeleteDocuments);
impl_timed!(FindDocument);
impl_timed!(FindDocuments);
