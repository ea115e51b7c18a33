use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::error::RecentError;
use crate::file_watcher::Op;

/// Имя файла хранилища в домашней директории.
pub const DEFAULT_DB_FILE_NAME: &str = ".recent.db";

/// Путь к хранилищу по умолчанию: `<home>/.recent.db`.
pub fn default_db_path() -> Result<PathBuf, RecentError> {
  let home = dirs::home_dir().ok_or(RecentError::HomeDirNotFound)?;
  Ok(home.join(DEFAULT_DB_FILE_NAME))
}

/// Повтор вставки при временных ошибках хранилища (BUSY/LOCKED).
///
/// По умолчанию повторов нет: первая же ошибка вставки фатальна.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_retries: u32,
  /// Задержка перед первым повтором; удваивается на каждом следующем.
  pub backoff: Duration,
}

impl RetryPolicy {
  pub const NONE: RetryPolicy = RetryPolicy {
    max_retries: 0,
    backoff: Duration::ZERO,
  };

  /// Задержка перед повтором номер `attempt` (с 1).
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    self.backoff.saturating_mul(1u32 << shift)
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::NONE
  }
}

/// Набор операций, которые `Recorder` записывает в хранилище.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpFilter {
  ops: HashSet<Op>,
}

impl OpFilter {
  pub fn only(ops: impl IntoIterator<Item = Op>) -> Self {
    Self {
      ops: ops.into_iter().collect(),
    }
  }

  pub fn matches(&self, op: Op) -> bool {
    self.ops.contains(&op)
  }
}

impl Default for OpFilter {
  /// Только создание файлов.
  fn default() -> Self {
    Self::only([Op::Create])
  }
}

/// Конфигурация команды `listen`.
#[derive(Clone, Debug)]
pub struct ListenConfig {
  pub db_path: PathBuf,
  pub dirs: Vec<PathBuf>,
  pub filter: OpFilter,
  pub retry: RetryPolicy,
}

#[derive(Parser)]
#[command(
  name = "recent",
  version,
  about = "Index of recently created files",
  long_about = "All files created under watched directories are recorded in ~/.recent.db sqlite file.\n\
                Each record has a time field and a path field."
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
  /// Listen to a bunch of directories for file creation events
  Listen {
    /// Directories to watch
    #[arg(required = true, num_args = 1..)]
    dirs: Vec<PathBuf>,
    /// Event store location (default: ~/.recent.db)
    #[arg(long)]
    db: Option<PathBuf>,
    /// Event kinds to record
    #[arg(long, value_enum, value_delimiter = ',', default_value = "create")]
    kinds: Vec<KindArg>,
    /// Retries for transient store errors (busy/locked)
    #[arg(long, default_value_t = 0)]
    insert_retries: u32,
    /// Initial backoff between retries, in milliseconds
    #[arg(long, default_value_t = 50)]
    retry_backoff_ms: u64,
  },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
  Create,
  Write,
  Remove,
  Rename,
  Chmod,
}

impl From<KindArg> for Op {
  fn from(kind: KindArg) -> Self {
    match kind {
      KindArg::Create => Op::Create,
      KindArg::Write => Op::Write,
      KindArg::Remove => Op::Remove,
      KindArg::Rename => Op::Rename,
      KindArg::Chmod => Op::Chmod,
    }
  }
}

impl Command {
  pub fn into_listen_config(self) -> Result<ListenConfig, RecentError> {
    match self {
      Command::Listen {
        dirs,
        db,
        kinds,
        insert_retries,
        retry_backoff_ms,
      } => {
        let db_path = match db {
          Some(p) => p,
          None => default_db_path()?,
        };
        Ok(ListenConfig {
          db_path,
          dirs,
          filter: OpFilter::only(kinds.into_iter().map(Op::from)),
          retry: RetryPolicy {
            max_retries: insert_retries,
            backoff: Duration::from_millis(retry_backoff_ms),
          },
        })
      }
    }
  }
}
