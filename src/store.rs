//! SQLite-хранилище событий (`files`).
//!
//! Одна таблица, ключ — время события в наносекундах:
//! `files(time INTEGER PRIMARY KEY, path STRING)`.

use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use rusqlite::{params, Connection};

use crate::error::RecentError;

const CREATE_TABLE_SQL: &str =
  "create table if not exists files (time integer primary key, path string)";
const INSERT_SQL: &str = "insert into files values(?1, ?2)";

/// Сколько SQLite ждёт снятия блокировки, прежде чем вернуть BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(1);

/// Записанное событие.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
  /// Unix-время в наносекундах, первичный ключ.
  pub timestamp: i64,
  pub path: String,
}

/// Приёмник событий для `Recorder`: append-only, одна запись за вызов.
pub trait EventSink {
  /// Добавить запись; возвращает количество затронутых строк.
  fn insert_event(&mut self, timestamp: i64, path: &str) -> Result<usize, RecentError>;
}

pub struct SqliteStore {
  conn: Connection,
}

impl SqliteStore {
  /// Открыть (или создать) хранилище, создать схему и подготовить insert.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, RecentError> {
    let path = path.as_ref();
    let conn = Connection::open(path)?;
    let store = Self::from_connection(conn)?;
    info!("Event store opened: {}", path.display());
    Ok(store)
  }

  pub fn open_in_memory() -> Result<Self, RecentError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, RecentError> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let store = Self { conn };
    store.ensure_schema()?;
    // Ошибка подготовки statement'а — ошибка запуска, а не первой вставки.
    store.conn.prepare_cached(INSERT_SQL)?;
    Ok(store)
  }

  /// `create table if not exists` — повторный вызов безопасен.
  pub fn ensure_schema(&self) -> Result<(), RecentError> {
    self.conn.execute_batch(CREATE_TABLE_SQL)?;
    debug!("Schema ensured");
    Ok(())
  }

  pub fn count(&self) -> Result<u64, RecentError> {
    let n: i64 = self
      .conn
      .query_row("select count(*) from files", [], |row| row.get(0))?;
    Ok(n as u64)
  }

  /// Последние `limit` записей, новые первыми.
  pub fn recent(&self, limit: usize) -> Result<Vec<EventRecord>, RecentError> {
    let mut stmt = self
      .conn
      .prepare("select time, path from files order by time desc limit ?1")?;
    let rows = stmt.query_map(params![limit as i64], |row| {
      Ok(EventRecord {
        timestamp: row.get(0)?,
        path: row.get(1)?,
      })
    })?;

    let mut out = Vec::new();
    for row in rows {
      out.push(row?);
    }
    Ok(out)
  }

  /// Закрыть соединение (вместе с кэшем подготовленных statement'ов).
  pub fn close(self) -> Result<(), RecentError> {
    self.conn.close().map_err(|(_, e)| RecentError::Store(e))?;
    info!("Event store closed");
    Ok(())
  }
}

impl EventSink for SqliteStore {
  fn insert_event(&mut self, timestamp: i64, path: &str) -> Result<usize, RecentError> {
    let mut stmt = self.conn.prepare_cached(INSERT_SQL)?;
    Ok(stmt.execute(params![timestamp, path])?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_insert_affects_one_row() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    assert_eq!(store.insert_event(1, "/tmp/a.txt").expect("insert"), 1);
    assert_eq!(store.count().expect("count"), 1);
  }

  #[test]
  fn test_duplicate_timestamp_is_rejected() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    store.insert_event(42, "/tmp/first").expect("insert");

    let err = store.insert_event(42, "/tmp/second").unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");

    // первая запись не перезаписана
    let rows = store.recent(10).expect("recent");
    assert_eq!(
      rows,
      vec![EventRecord {
        timestamp: 42,
        path: "/tmp/first".to_string()
      }]
    );
  }

  #[test]
  fn test_schema_is_idempotent_and_keeps_data() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("recent.db");

    {
      let mut store = SqliteStore::open(&db_path).expect("open");
      store.insert_event(7, "/tmp/kept").expect("insert");
      store.ensure_schema().expect("second ensure_schema");
      assert_eq!(store.count().expect("count"), 1);
      store.close().expect("close");
    }

    let store = SqliteStore::open(&db_path).expect("reopen");
    store.ensure_schema().expect("ensure_schema after reopen");
    assert_eq!(store.recent(1).expect("recent")[0].path, "/tmp/kept");
  }

  #[test]
  fn test_recent_orders_newest_first() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    store.insert_event(1, "/a").expect("insert");
    store.insert_event(3, "/c").expect("insert");
    store.insert_event(2, "/b").expect("insert");

    let paths: Vec<String> = store
      .recent(2)
      .expect("recent")
      .into_iter()
      .map(|r| r.path)
      .collect();
    assert_eq!(paths, vec!["/c".to_string(), "/b".to_string()]);
  }

  #[test]
  fn test_open_fails_for_missing_parent_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("no").join("such").join("recent.db");
    assert!(SqliteStore::open(db_path).is_err());
  }
}
