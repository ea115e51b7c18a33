//! Команда `listen`: собирает хранилище, watcher и `Recorder` и запускает цикл.

use crossbeam_channel::Receiver;
use log::{error, info};

use crate::config::ListenConfig;
use crate::error::RecentError;
use crate::file_watcher::DirWatcher;
use crate::recorder::{Recorder, RunSummary};
use crate::store::SqliteStore;

/// Блокирует поток до сигнала `shutdown`, закрытия watcher'а или фатальной ошибки.
///
/// Ошибки запуска (хранилище, watcher, регистрация директорий) и ошибки
/// записи возвращаются как `Err`. При штатной остановке watcher и хранилище
/// закрываются до возврата.
pub fn listen(config: &ListenConfig, shutdown: &Receiver<()>) -> Result<RunSummary, RecentError> {
  let store = SqliteStore::open(&config.db_path)?;

  let mut watcher = DirWatcher::new()?;
  for dir in &config.dirs {
    watcher.register(dir)?;
  }
  info!(
    "Listening to {} director(ies), store: {}",
    watcher.watched().len(),
    config.db_path.display()
  );

  let mut recorder = Recorder::new(store)
    .with_filter(config.filter.clone())
    .with_retry(config.retry);

  let summary = recorder.run(&watcher.events(), &watcher.errors(), shutdown)?;

  watcher.close();
  if let Err(e) = recorder.into_sink().close() {
    error!("Failed to close event store: {e}");
  }
  info!(
    "Recorder stopped ({:?}): recorded={}, ignored={}, watcher_errors={}",
    summary.reason, summary.recorded, summary.ignored, summary.watcher_errors
  );
  Ok(summary)
}
