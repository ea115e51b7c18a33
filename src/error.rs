use std::path::PathBuf;

use rusqlite::ErrorCode;

/// Единый тип ошибок crate `recent`.
#[derive(thiserror::Error, Debug)]
pub enum RecentError {
  #[error("Home directory is not available on this OS/user")]
  HomeDirNotFound,

  #[error("Failed to watch directory {path:?}: {source}")]
  WatchRegistration {
    path: PathBuf,
    #[source]
    source: notify::Error,
  },

  #[error("Watcher is closed")]
  WatcherClosed,

  #[error("Expected {expected} affected rows, but got {actual}")]
  UnexpectedRowCount { expected: usize, actual: usize },

  #[error("Failed to install shutdown handler: {0}")]
  ShutdownHandler(#[from] ctrlc::Error),

  #[error("System clock is before the Unix epoch: {0}")]
  ClockBeforeEpoch(#[from] std::time::SystemTimeError),

  #[error("Notify error: {0}")]
  Notify(#[from] notify::Error),

  #[error("Store error: {0}")]
  Store(#[from] rusqlite::Error),
}

impl RecentError {
  fn sqlite_code(&self) -> Option<ErrorCode> {
    match self {
      RecentError::Store(rusqlite::Error::SqliteFailure(e, _)) => Some(e.code),
      _ => None,
    }
  }

  /// Нарушение ограничения (например, дубликат PRIMARY KEY).
  pub fn is_constraint_violation(&self) -> bool {
    self.sqlite_code() == Some(ErrorCode::ConstraintViolation)
  }

  /// Временная ошибка хранилища (BUSY/LOCKED), которую имеет смысл повторить.
  pub fn is_transient(&self) -> bool {
    matches!(
      self.sqlite_code(),
      Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
  }
}
