//! TodoStore - generic document persistence with SQLite+JSONL
//!
//! Records are serialized as JSON documents. Every write is appended to a
//! per-collection JSONL log, which is the source of truth and diffs cleanly
//! in git. SQLite holds the latest version of each document plus a small
//! index table so callers can filter without deserializing everything.
//!
//! # Layout
//!
//! ```text
//! .todostore/
//! ├── store.db            # SQLite query cache (rebuildable)
//! ├── todo_lists.jsonl    # append-only log, one document per line
//! └── chat_messages.jsonl
//! ```
//!
//! # Example
//!
//! ```ignore
//! use todostore::{Filter, FilterOp, IndexValue, Store};
//!
//! let mut store = Store::open(".todostore")?;
//! store.create(my_record)?;
//! let accepted: Vec<MyRecord> = store.list(&[Filter::eq("accepted", IndexValue::Bool(true))])?;
//! ```

mod filter;
mod record;
mod store;

pub use filter::{Filter, FilterOp, IndexValue};
pub use record::Record;
pub use store::Store;

/// Current time as unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
