//! recent — индекс недавно созданных файлов.
//!
//! Watcher (`notify`) следит за набором директорий, `Recorder` записывает
//! каждое событие создания `(time, path)` в SQLite (`~/.recent.db`).
//! Сборка компонентов — явно в точке входа (`main.rs`), без глобального состояния.

pub mod config;
pub mod error;
pub mod file_watcher;
pub mod listen;
pub mod logging;
pub mod recorder;
pub mod store;

pub use config::{ListenConfig, OpFilter, RetryPolicy};
pub use error::RecentError;
pub use file_watcher::{DirWatcher, Op, WatchEvent};
pub use listen::listen;
pub use recorder::{Recorder, RunSummary, StopReason};
pub use store::{EventRecord, EventSink, SqliteStore};
