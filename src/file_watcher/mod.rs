//! Модуль мониторинга файловой системы.
//!
//! Отвечает за:
//! - создание `notify` watcher'а
//! - регистрацию директорий (non-recursive, как inotify/fsnotify)
//! - разделение уведомлений на два канала: события и ошибки
//! - освобождение ресурсов ОС в `close()`

mod events;

pub use events::{Op, WatchEvent};

use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver};
use log::{debug, info};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::RecentError;

/// Watcher над набором директорий (watch set).
///
/// Обе последовательности (`events()` и `errors()`) ленивые и бесконечные,
/// пока watcher не закрыт. После `close()` отправители дропаются вместе
/// с watcher'ом ОС, и каналы исчерпываются.
pub struct DirWatcher {
  inner: Option<RecommendedWatcher>,
  event_rx: Receiver<WatchEvent>,
  error_rx: Receiver<notify::Error>,
  watched: Vec<PathBuf>,
}

impl DirWatcher {
  pub fn new() -> Result<Self, RecentError> {
    let (event_tx, event_rx) = unbounded::<WatchEvent>();
    let (error_tx, error_rx) = unbounded::<notify::Error>();

    let inner = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
      // best-effort send; если receiver уже закрыт — просто игнорируем.
      match res {
        Ok(event) => {
          for e in WatchEvent::from_notify(event) {
            let _ = event_tx.send(e);
          }
        }
        Err(err) => {
          let _ = error_tx.send(err);
        }
      }
    })?;

    Ok(Self {
      inner: Some(inner),
      event_rx,
      error_rx,
      watched: Vec::new(),
    })
  }

  /// Добавить директорию в watch set.
  ///
  /// Повторная регистрация той же директории не дедуплицируется.
  pub fn register(&mut self, dir: impl AsRef<Path>) -> Result<(), RecentError> {
    let dir = dir.as_ref();
    let inner = self.inner.as_mut().ok_or(RecentError::WatcherClosed)?;

    if !dir.is_dir() {
      return Err(RecentError::WatchRegistration {
        path: dir.to_path_buf(),
        source: notify::Error::path_not_found().add_path(dir.to_path_buf()),
      });
    }

    inner
      .watch(dir, RecursiveMode::NonRecursive)
      .map_err(|source| RecentError::WatchRegistration {
        path: dir.to_path_buf(),
        source,
      })?;

    info!("Watching directory: {}", dir.display());
    self.watched.push(dir.to_path_buf());
    Ok(())
  }

  /// Зарегистрированные директории в порядке регистрации.
  pub fn watched(&self) -> &[PathBuf] {
    &self.watched
  }

  #[cfg(test)]
  pub(crate) fn is_closed(&self) -> bool {
    self.inner.is_none()
  }

  /// Последовательность событий по всем директориям.
  pub fn events(&self) -> Receiver<WatchEvent> {
    self.event_rx.clone()
  }

  /// Последовательность асинхронных ошибок подсистемы уведомлений.
  pub fn errors(&self) -> Receiver<notify::Error> {
    self.error_rx.clone()
  }

  /// Освободить ресурсы ОС. Идемпотентно.
  pub fn close(&mut self) {
    if let Some(mut inner) = self.inner.take() {
      for dir in &self.watched {
        if let Err(e) = inner.unwatch(dir) {
          debug!("Failed to unwatch {}: {e}", dir.display());
        }
      }
      drop(inner);
      info!("Watcher closed");
    }
  }
}

impl Drop for DirWatcher {
  fn drop(&mut self) {
    self.close();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_register_missing_directory_fails() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("missing");

    let mut watcher = DirWatcher::new().expect("Failed to create watcher");
    let err = watcher.register(&missing).unwrap_err();
    assert!(matches!(err, RecentError::WatchRegistration { ref path, .. } if *path == missing));
    assert!(watcher.watched().is_empty());
  }

  #[test]
  fn test_register_file_instead_of_directory_fails() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let file = temp_dir.path().join("plain.txt");
    std::fs::File::create(&file).expect("Failed to create file");

    let mut watcher = DirWatcher::new().expect("Failed to create watcher");
    assert!(watcher.register(&file).is_err());
  }

  #[test]
  fn test_duplicate_registration_is_allowed() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");

    let mut watcher = DirWatcher::new().expect("Failed to create watcher");
    watcher.register(temp_dir.path()).expect("first register");
    watcher.register(temp_dir.path()).expect("second register");
    assert_eq!(watcher.watched().len(), 2);
  }

  #[test]
  fn test_register_after_close_fails() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");

    let mut watcher = DirWatcher::new().expect("Failed to create watcher");
    watcher.close();
    assert!(watcher.is_closed());
    assert!(matches!(
      watcher.register(temp_dir.path()),
      Err(RecentError::WatcherClosed)
    ));
    // повторный close — no-op
    watcher.close();
  }
}
