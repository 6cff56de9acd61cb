//! Core Store implementation

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use eyre::{Context, Result, bail};
use fs2::FileExt;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Filter, IndexValue, Record};

const DB_FILE: &str = "store.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE TABLE IF NOT EXISTS record_indexes (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    field TEXT NOT NULL,
    value,
    PRIMARY KEY (collection, id, field)
);

CREATE INDEX IF NOT EXISTS idx_record_indexes_lookup
    ON record_indexes (collection, field, value);

CREATE TABLE IF NOT EXISTS sync_state (
    collection TEXT PRIMARY KEY,
    log_len INTEGER NOT NULL
);
"#;

/// One line of a collection's JSONL log
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum LogEntry {
    Put {
        id: String,
        updated_at: i64,
        data: serde_json::Value,
    },
    Delete {
        id: String,
    },
}

/// Document store backed by JSONL logs and a SQLite cache
pub struct Store {
    base_path: PathBuf,
    conn: Connection,
}

impl Store {
    /// Open or create a store in the given directory
    ///
    /// Any JSONL log that is ahead of the SQLite cache (for example after a
    /// `git pull` or a crash between the two writes) is replayed. Indexes of
    /// replayed collections are empty until [`Store::rebuild_indexes`] runs.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let conn = Connection::open(base_path.join(DB_FILE)).context("Failed to open SQLite database")?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
            .context("Failed to enable WAL mode")?;
        conn.execute_batch(SCHEMA).context("Failed to create schema")?;

        let mut store = Self { base_path, conn };
        let replayed = store.sync()?;
        debug!(base_path = ?store.base_path, replayed, "Opened store");
        Ok(store)
    }

    /// Replay JSONL logs whose length differs from what the cache last saw
    ///
    /// Returns the number of documents loaded from replayed logs.
    pub fn sync(&mut self) -> Result<usize> {
        let mut total = 0;

        for entry in fs::read_dir(&self.base_path).context("Failed to read store directory")? {
            let path = entry?.path();
            if path.extension().map(|e| e != "jsonl").unwrap_or(true) {
                continue;
            }
            let Some(collection) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let log_len = fs::metadata(&path)?.len() as i64;
            let seen: Option<i64> = self
                .conn
                .query_row(
                    "SELECT log_len FROM sync_state WHERE collection = ?1",
                    params![collection],
                    |row| row.get(0),
                )
                .optional()?;

            if seen == Some(log_len) {
                continue;
            }

            let count = self.replay_log(&collection, &path, log_len)?;
            info!(%collection, count, "Replayed JSONL log into cache");
            total += count;
        }

        Ok(total)
    }

    fn replay_log(&mut self, collection: &str, path: &Path, log_len: i64) -> Result<usize> {
        let file = fs::File::open(path).context(format!("Failed to open log: {}", path.display()))?;

        // Later lines win, so fold the whole log before touching SQLite
        let mut latest: Vec<(String, Option<(i64, String)>)> = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: LogEntry = match serde_json::from_str(&line) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(%collection, line = line_no + 1, error = %e, "Skipping corrupt log line");
                    continue;
                }
            };
            let (id, doc) = match entry {
                LogEntry::Put { id, updated_at, data } => (id, Some((updated_at, data.to_string()))),
                LogEntry::Delete { id } => (id, None),
            };
            match latest.iter_mut().find(|(existing, _)| *existing == id) {
                Some(slot) => slot.1 = doc,
                None => latest.push((id, doc)),
            }
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records WHERE collection = ?1", params![collection])?;
        tx.execute("DELETE FROM record_indexes WHERE collection = ?1", params![collection])?;

        let mut count = 0;
        for (id, doc) in &latest {
            if let Some((updated_at, data)) = doc {
                tx.execute(
                    "INSERT INTO records (collection, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)",
                    params![collection, id, data, updated_at],
                )?;
                count += 1;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO sync_state (collection, log_len) VALUES (?1, ?2)",
            params![collection, log_len],
        )?;
        tx.commit()?;

        Ok(count)
    }

    /// Insert a new record, failing if its id is already taken
    pub fn create<T: Record>(&mut self, record: T) -> Result<String> {
        let collection = T::collection_name();
        debug!(%collection, id = %record.id(), "create: called");

        if self.exists(collection, record.id())? {
            bail!("Record already exists: {}/{}", collection, record.id());
        }

        self.put(&record)?;
        Ok(record.id().to_string())
    }

    /// Replace an existing record, failing if it does not exist
    pub fn update<T: Record>(&mut self, record: T) -> Result<()> {
        let collection = T::collection_name();
        debug!(%collection, id = %record.id(), "update: called");

        if !self.exists(collection, record.id())? {
            bail!("Record not found: {}/{}", collection, record.id());
        }

        self.put(&record)
    }

    /// Fetch a record by id
    pub fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM records WHERE collection = ?1 AND id = ?2",
                params![T::collection_name(), id],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|d| serde_json::from_str(&d).context(format!("Failed to deserialize record {}", id)))
            .transpose()
    }

    /// Delete a record; returns whether it existed
    pub fn delete<T: Record>(&mut self, id: &str) -> Result<bool> {
        let collection = T::collection_name();
        if !self.exists(collection, id)? {
            return Ok(false);
        }

        let log_len = self.append_log(collection, &LogEntry::Delete { id: id.to_string() })?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        tx.execute(
            "DELETE FROM record_indexes WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        set_log_len(&tx, collection, log_len)?;
        tx.commit()?;

        Ok(true)
    }

    /// List records matching all filters, most recently updated first
    pub fn list<T: Record>(&self, filters: &[Filter]) -> Result<Vec<T>> {
        let (sql, values) = build_query("SELECT r.data", T::collection_name(), filters);
        let sql = format!("{} ORDER BY r.updated_at DESC, r.id ASC", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            let data = row?;
            records.push(serde_json::from_str(&data).context("Failed to deserialize record")?);
        }
        Ok(records)
    }

    /// Count records matching all filters
    pub fn count<T: Record>(&self, filters: &[Filter]) -> Result<usize> {
        let (sql, values) = build_query("SELECT COUNT(*)", T::collection_name(), filters);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Recompute the index table for every record of type `T`
    pub fn rebuild_indexes<T: Record>(&mut self) -> Result<usize> {
        let collection = T::collection_name();
        let records: Vec<T> = self.list(&[])?;

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM record_indexes WHERE collection = ?1", params![collection])?;
        for record in &records {
            insert_indexes(&tx, collection, record)?;
        }
        tx.commit()?;

        debug!(%collection, count = records.len(), "rebuild_indexes: done");
        Ok(records.len())
    }

    fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn put<T: Record>(&mut self, record: &T) -> Result<()> {
        let collection = T::collection_name();
        let data = serde_json::to_value(record).context("Failed to serialize record")?;

        let log_len = self.append_log(
            collection,
            &LogEntry::Put {
                id: record.id().to_string(),
                updated_at: record.updated_at(),
                data: data.clone(),
            },
        )?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO records (collection, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![collection, record.id(), data.to_string(), record.updated_at()],
        )?;
        tx.execute(
            "DELETE FROM record_indexes WHERE collection = ?1 AND id = ?2",
            params![collection, record.id()],
        )?;
        insert_indexes(&tx, collection, record)?;
        set_log_len(&tx, collection, log_len)?;
        tx.commit()?;

        Ok(())
    }

    /// Append one entry to the collection log under an exclusive lock and
    /// return the new log length
    fn append_log(&self, collection: &str, entry: &LogEntry) -> Result<i64> {
        let path = self.base_path.join(format!("{}.jsonl", collection));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(format!("Failed to open log: {}", path.display()))?;

        file.lock_exclusive().context("Failed to lock log")?;
        let line = serde_json::to_string(entry)?;
        let written = writeln!(file, "{}", line).and_then(|_| file.flush());
        let len = file.metadata().map(|m| m.len() as i64);
        FileExt::unlock(&file).context("Failed to unlock log")?;

        written.context("Failed to append to log")?;
        Ok(len?)
    }
}

fn build_query(select: &str, collection: &str, filters: &[Filter]) -> (String, Vec<Value>) {
    let mut sql = format!("{} FROM records r WHERE r.collection = ?", select);
    let mut values = vec![Value::Text(collection.to_string())];

    for filter in filters {
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM record_indexes i WHERE i.collection = r.collection \
             AND i.id = r.id AND i.field = ? AND {})",
            filter.op.sql()
        ));
        values.push(Value::Text(filter.field.clone()));
        values.push(match &filter.value {
            IndexValue::String(s) => Value::Text(s.clone()),
            IndexValue::Int(i) => Value::Integer(*i),
            IndexValue::Bool(b) => Value::Integer(i64::from(*b)),
        });
    }

    (sql, values)
}

fn insert_indexes<T: Record>(conn: &Connection, collection: &str, record: &T) -> rusqlite::Result<()> {
    for (field, value) in record.indexed_fields() {
        conn.execute(
            "INSERT OR REPLACE INTO record_indexes (collection, id, field, value) VALUES (?1, ?2, ?3, ?4)",
            params![collection, record.id(), field, value],
        )?;
    }
    Ok(())
}

fn set_log_len(conn: &Connection, collection: &str, log_len: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sync_state (collection, log_len) VALUES (?1, ?2)",
        params![collection, log_len],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
        pinned: bool,
        priority: i64,
        updated_at: i64,
    }

    impl Note {
        fn new(id: &str, body: &str, pinned: bool, priority: i64, updated_at: i64) -> Self {
            Self {
                id: id.to_string(),
                body: body.to_string(),
                pinned,
                priority,
                updated_at,
            }
        }
    }

    impl Record for Note {
        fn id(&self) -> &str {
            &self.id
        }

        fn updated_at(&self) -> i64 {
            self.updated_at
        }

        fn collection_name() -> &'static str {
            "notes"
        }

        fn indexed_fields(&self) -> HashMap<String, IndexValue> {
            let mut fields = HashMap::new();
            fields.insert("pinned".to_string(), IndexValue::Bool(self.pinned));
            fields.insert("priority".to_string(), IndexValue::Int(self.priority));
            fields.insert("body".to_string(), IndexValue::String(self.body.clone()));
            fields
        }
    }

    #[test]
    fn test_create_and_get() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();

        let id = store.create(Note::new("n1", "hello", false, 1, 100)).unwrap();
        assert_eq!(id, "n1");

        let note: Note = store.get("n1").unwrap().unwrap();
        assert_eq!(note.body, "hello");
        assert!(store.get::<Note>("missing").unwrap().is_none());
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();

        store.create(Note::new("n1", "a", false, 1, 100)).unwrap();
        assert!(store.create(Note::new("n1", "b", false, 1, 200)).is_err());
    }

    #[test]
    fn test_update_requires_existing_record() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();

        assert!(store.update(Note::new("n1", "a", false, 1, 100)).is_err());

        store.create(Note::new("n1", "a", false, 1, 100)).unwrap();
        store.update(Note::new("n1", "b", true, 1, 200)).unwrap();
        let note: Note = store.get("n1").unwrap().unwrap();
        assert_eq!(note.body, "b");
        assert!(note.pinned);
    }

    #[test]
    fn test_list_orders_by_updated_at_desc() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();

        store.create(Note::new("old", "a", false, 1, 100)).unwrap();
        store.create(Note::new("new", "b", false, 1, 300)).unwrap();
        store.create(Note::new("mid", "c", false, 1, 200)).unwrap();

        let notes: Vec<Note> = store.list(&[]).unwrap();
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_list_with_filters() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();

        store.create(Note::new("a", "alpha", true, 1, 100)).unwrap();
        store.create(Note::new("b", "beta", false, 5, 200)).unwrap();
        store.create(Note::new("c", "gamma", true, 9, 300)).unwrap();

        let pinned: Vec<Note> = store.list(&[Filter::eq("pinned", IndexValue::Bool(true))]).unwrap();
        assert_eq!(pinned.len(), 2);

        let high: Vec<Note> = store
            .list(&[Filter {
                field: "priority".to_string(),
                op: crate::FilterOp::Gte,
                value: IndexValue::Int(5),
            }])
            .unwrap();
        assert_eq!(high.len(), 2);

        let both: Vec<Note> = store
            .list(&[
                Filter::eq("pinned", IndexValue::Bool(true)),
                Filter {
                    field: "body".to_string(),
                    op: crate::FilterOp::Contains,
                    value: IndexValue::String("amm".to_string()),
                },
            ])
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, "c");

        assert_eq!(store.count::<Note>(&[Filter::eq("pinned", IndexValue::Bool(false))]).unwrap(), 1);
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();

        store.create(Note::new("n1", "a", false, 1, 100)).unwrap();
        assert!(store.delete::<Note>("n1").unwrap());
        assert!(!store.delete::<Note>("n1").unwrap());
        assert!(store.get::<Note>("n1").unwrap().is_none());
    }

    #[test]
    fn test_reopen_keeps_records_and_indexes() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = Store::open(temp.path()).unwrap();
            store.create(Note::new("n1", "a", true, 1, 100)).unwrap();
        }

        let store = Store::open(temp.path()).unwrap();
        let pinned: Vec<Note> = store.list(&[Filter::eq("pinned", IndexValue::Bool(true))]).unwrap();
        assert_eq!(pinned.len(), 1);
    }

    #[test]
    fn test_replay_from_log_when_cache_is_lost() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = Store::open(temp.path()).unwrap();
            store.create(Note::new("n1", "first", true, 1, 100)).unwrap();
            store.update(Note::new("n1", "second", true, 1, 200)).unwrap();
            store.create(Note::new("n2", "gone", false, 1, 150)).unwrap();
            store.delete::<Note>("n2").unwrap();
        }

        for name in ["store.db", "store.db-wal", "store.db-shm"] {
            let _ = fs::remove_file(temp.path().join(name));
        }

        let mut store = Store::open(temp.path()).unwrap();
        let notes: Vec<Note> = store.list(&[]).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].body, "second");

        // Indexes come back only after a typed rebuild
        assert_eq!(store.rebuild_indexes::<Note>().unwrap(), 1);
        let pinned: Vec<Note> = store.list(&[Filter::eq("pinned", IndexValue::Bool(true))]).unwrap();
        assert_eq!(pinned.len(), 1);
    }

    #[test]
    fn test_corrupt_log_line_is_skipped() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = Store::open(temp.path()).unwrap();
            store.create(Note::new("n1", "ok", false, 1, 100)).unwrap();
        }
        let log = temp.path().join("notes.jsonl");
        let mut file = OpenOptions::new().append(true).open(&log).unwrap();
        writeln!(file, "{{not json").unwrap();

        let store = Store::open(temp.path()).unwrap();
        let notes: Vec<Note> = store.list(&[]).unwrap();
        assert_eq!(notes.len(), 1);
    }
}
