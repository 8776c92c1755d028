use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A stored key/value pair, echoed back by `get` and `set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

/// Acknowledgement returned by `delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvDeleted {
    pub key: String,
    pub deleted: bool,
}

/// Ordered key listing returned by `list`. Empty on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvKeys {
    pub keys: Vec<String>,
}

/// String-keyed store with a uniform failure-swallowing contract: no
/// operation ever panics or returns an error. A failed read or write
/// degrades to `None` (or an empty listing) and the cause goes to the
/// diagnostic log only. Callers never handle storage errors; the worst
/// case is losing the cosmetic progress snapshot.
pub trait KvStore: std::fmt::Debug {
    fn get(&self, key: &str) -> Option<KvEntry>;
    fn set(&mut self, key: &str, value: &str) -> Option<KvEntry>;
    fn delete(&mut self, key: &str) -> Option<KvDeleted>;
    fn list(&self, prefix: Option<&str>) -> KvKeys;
}

/// SQLite-backed store: a single `kv` table under the state directory.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path`. Opening is the one fallible
    /// entry point; once a store exists, every operation swallows failure.
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(SqliteStore { conn })
    }

    /// Open the store at the default state-dir location.
    pub fn open_default() -> rusqlite::Result<Self> {
        let path = crate::app_dirs::AppDirs::store_path()
            .unwrap_or_else(|| PathBuf::from("lunalog_store.db"));
        Self::open(path)
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Option<KvEntry> {
        let row = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional();

        match row {
            Ok(value) => value.map(|value| KvEntry {
                key: key.to_string(),
                value,
            }),
            Err(e) => {
                warn!(key, error = %e, "store get failed");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Option<KvEntry> {
        let result = self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        );

        match result {
            Ok(_) => Some(KvEntry {
                key: key.to_string(),
                value: value.to_string(),
            }),
            Err(e) => {
                warn!(key, error = %e, "store set failed");
                None
            }
        }
    }

    fn delete(&mut self, key: &str) -> Option<KvDeleted> {
        // Removing an absent key still acknowledges; only a real failure
        // degrades to None.
        match self.conn.execute("DELETE FROM kv WHERE key = ?1", [key]) {
            Ok(_) => Some(KvDeleted {
                key: key.to_string(),
                deleted: true,
            }),
            Err(e) => {
                warn!(key, error = %e, "store delete failed");
                None
            }
        }
    }

    fn list(&self, prefix: Option<&str>) -> KvKeys {
        let pattern = format!("{}%", prefix.unwrap_or(""));
        let mut stmt = match self
            .conn
            .prepare("SELECT key FROM kv WHERE key LIKE ?1 ORDER BY key")
        {
            Ok(stmt) => stmt,
            Err(e) => {
                warn!(error = %e, "store list failed");
                return KvKeys::default();
            }
        };

        let rows = stmt.query_map([pattern], |row| row.get::<_, String>(0));
        match rows {
            Ok(rows) => KvKeys {
                keys: rows.filter_map(|r| r.ok()).collect(),
            },
            Err(e) => {
                warn!(error = %e, "store list failed");
                KvKeys::default()
            }
        }
    }
}

/// In-memory store. Backs tests, and serves as the degraded mode when the
/// on-disk store cannot be opened (state then lives for the process only).
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    entries: BTreeMap<String, String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &str) -> Option<KvEntry> {
        self.entries.get(key).map(|value| KvEntry {
            key: key.to_string(),
            value: value.clone(),
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Option<KvEntry> {
        self.entries.insert(key.to_string(), value.to_string());
        Some(KvEntry {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn delete(&mut self, key: &str) -> Option<KvDeleted> {
        self.entries.remove(key);
        Some(KvDeleted {
            key: key.to_string(),
            deleted: true,
        })
    }

    fn list(&self, prefix: Option<&str>) -> KvKeys {
        KvKeys {
            keys: self
                .entries
                .keys()
                .filter(|k| prefix.map_or(true, |p| k.starts_with(p)))
                .cloned()
                .collect(),
        }
    }
}
