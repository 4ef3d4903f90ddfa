// src/notion/mod.rs
//! Destination record store: the ability to create pages in Notion databases.
//!
//! The pipeline depends on the `RecordStore` trait, never on HTTP details.

pub mod client;
pub mod request;

pub use client::NotionHttpClient;
pub use request::PropertyNames;

use crate::error::AppError;
use crate::model::DestinationRecord;
use crate::types::{Collection, DatabaseId, PageId};
use indexmap::IndexMap;

/// The ability to create destination records. Write-once; there is no update path.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_record(&self, record: &DestinationRecord) -> Result<PageId, AppError>;
}

/// The Notion database each collection's records are created in.
#[derive(Debug, Clone, Default)]
pub struct CollectionDatabases(IndexMap<Collection, DatabaseId>);

impl CollectionDatabases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, collection: Collection, database: DatabaseId) -> Self {
        self.0.insert(collection, database);
        self
    }

    pub fn get(&self, collection: Collection) -> Option<&DatabaseId> {
        self.0.get(&collection)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn collections(&self) -> impl Iterator<Item = Collection> + '_ {
        self.0.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn databases_are_looked_up_per_collection() {
        let news = DatabaseId::parse("0123456789abcdef0123456789abcdef").unwrap();
        let databases = CollectionDatabases::new().with(Collection::News, news.clone());

        assert_eq!(databases.get(Collection::News), Some(&news));
        assert_eq!(databases.get(Collection::Voice), None);
        assert_eq!(databases.collections().collect::<Vec<_>>(), vec![Collection::News]);
    }
}
