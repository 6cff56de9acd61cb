//! Record trait implemented by every persisted document type

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::IndexValue;

/// A document that can be stored in a [`crate::Store`]
pub trait Record: Serialize + DeserializeOwned {
    /// Unique identifier within the collection
    fn id(&self) -> &str;

    /// Last modification time (unix ms), used to order documents and to pick
    /// the newest version when replaying the JSONL log
    fn updated_at(&self) -> i64;

    /// Collection (and JSONL file) name
    fn collection_name() -> &'static str;

    /// Fields that should be queryable through [`crate::Filter`]
    fn indexed_fields(&self) -> HashMap<String, IndexValue>;
}
