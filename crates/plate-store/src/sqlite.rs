use std::path::Path;

use log::debug;
use plate_core::{AssociationStore, ErrorInfo, Owner, PlateError};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

pub const SCHEMA_VERSION: i64 = 1;

fn store_error(code: &str, err: impl ToString) -> PlateError {
    PlateError::Store(ErrorInfo::new(code, err.to_string()))
}

/// SQLite-backed store keeping one row per (owner, key).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) a store at `path`.
    pub fn open(path: &Path) -> Result<Self, PlateError> {
        let conn = Connection::open(path).map_err(|err| {
            PlateError::Store(
                ErrorInfo::new("plate_store.open", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, PlateError> {
        let conn = Connection::open_in_memory().map_err(|err| store_error("plate_store.open", err))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, PlateError> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn init_schema(conn: &Connection) -> Result<(), PlateError> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS meta(version INTEGER NOT NULL);
        CREATE TABLE IF NOT EXISTS associations(
            owner_kind TEXT NOT NULL,
            owner_id INTEGER NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY(owner_kind, owner_id, key)
        );
        COMMIT;",
    )
    .map_err(|err| store_error("plate_store.schema", err))?;
    set_version(conn, SCHEMA_VERSION)
}

fn set_version(conn: &Connection, version: i64) -> Result<(), PlateError> {
    let existing: Option<i64> = conn
        .query_row("SELECT version FROM meta LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|err| store_error("plate_store.schema", err))?;
    match existing {
        Some(current) if current == version => Ok(()),
        Some(current) => Err(PlateError::Store(ErrorInfo::new(
            "plate_store.schema_version",
            format!("store schema {current} incompatible with expected {version}"),
        ))),
        None => {
            conn.execute("INSERT INTO meta(version) VALUES (?)", params![version])
                .map_err(|err| store_error("plate_store.schema", err))?;
            Ok(())
        }
    }
}

fn owner_id(owner: Owner) -> Result<i64, PlateError> {
    i64::try_from(owner.id()).map_err(|_| {
        PlateError::Store(
            ErrorInfo::new("plate_store.owner_id", "owner id does not fit an SQLite integer")
                .with_context("owner", owner.to_string()),
        )
    })
}

impl AssociationStore for SqliteStore {
    fn put(&mut self, owner: Owner, key: &str, value: Value) -> Result<(), PlateError> {
        let id = owner_id(owner)?;
        let encoded = serde_json::to_string(&value).map_err(|err| store_error("plate_store.encode", err))?;
        self.conn
            .execute(
                "INSERT INTO associations(owner_kind, owner_id, key, value) VALUES (?, ?, ?, ?)
                 ON CONFLICT(owner_kind, owner_id, key) DO UPDATE SET value = excluded.value",
                params![owner.kind(), id, key, encoded],
            )
            .map_err(|err| store_error("plate_store.put", err))?;
        debug!("stored {key} on {owner}");
        Ok(())
    }

    fn get(&self, owner: Owner, key: &str) -> Result<Option<Value>, PlateError> {
        let id = owner_id(owner)?;
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM associations WHERE owner_kind = ? AND owner_id = ? AND key = ?",
                params![owner.kind(), id, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| store_error("plate_store.get", err))?;
        raw.map(|text| serde_json::from_str(&text).map_err(|err| store_error("plate_store.decode", err)))
            .transpose()
    }

    fn keys(&self, owner: Owner) -> Result<Vec<String>, PlateError> {
        let id = owner_id(owner)?;
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM associations WHERE owner_kind = ? AND owner_id = ? ORDER BY key")
            .map_err(|err| store_error("plate_store.query", err))?;
        let rows = stmt
            .query_map(params![owner.kind(), id], |row| row.get(0))
            .map_err(|err| store_error("plate_store.query", err))?;
        rows.collect::<Result<Vec<String>, _>>()
            .map_err(|err| store_error("plate_store.query", err))
    }
}
