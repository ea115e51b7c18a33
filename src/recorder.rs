//! Цикл записи событий: один потребитель, два канала от watcher'а и сигнал остановки.
//!
//! Любая ошибка вставки (или вставка, затронувшая не одну строку) фатальна:
//! `run()` возвращает `Err`, и процесс завершается.

use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_channel::{never, select, Receiver};
use log::{debug, info, warn};

use crate::config::{OpFilter, RetryPolicy};
use crate::error::RecentError;
use crate::file_watcher::WatchEvent;
use crate::store::EventSink;

/// Текущее Unix-время в наносекундах.
pub fn now_nanos() -> Result<i64, RecentError> {
  let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH)?;
  Ok(since_epoch.as_nanos() as i64)
}

/// Почему завершился `run()` без ошибки.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
  Shutdown,
  WatcherClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
  pub reason: StopReason,
  pub recorded: u64,
  pub ignored: u64,
  pub watcher_errors: u64,
}

pub struct Recorder<S: EventSink> {
  sink: S,
  filter: OpFilter,
  retry: RetryPolicy,
  clock: fn() -> Result<i64, RecentError>,
}

impl<S: EventSink> Recorder<S> {
  pub fn new(sink: S) -> Self {
    Self {
      sink,
      filter: OpFilter::default(),
      retry: RetryPolicy::default(),
      clock: now_nanos,
    }
  }

  pub fn with_filter(mut self, filter: OpFilter) -> Self {
    self.filter = filter;
    self
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn with_clock(mut self, clock: fn() -> Result<i64, RecentError>) -> Self {
    self.clock = clock;
    self
  }

  #[cfg(test)]
  pub(crate) fn sink(&self) -> &S {
    &self.sink
  }

  pub fn into_sink(self) -> S {
    self.sink
  }

  /// Блокирующий цикл. Обрабатывает по одному элементу за пробуждение.
  ///
  /// Завершается `Ok`, когда приходит сигнал `shutdown` (или его отправитель
  /// дропнут) либо когда канал событий исчерпан (watcher закрыт). Уже
  /// полученные к моменту остановки события и ошибки обрабатываются.
  pub fn run(
    &mut self,
    events: &Receiver<WatchEvent>,
    errors: &Receiver<notify::Error>,
    shutdown: &Receiver<()>,
  ) -> Result<RunSummary, RecentError> {
    let mut errors = errors.clone();
    let mut summary = RunSummary {
      reason: StopReason::Shutdown,
      recorded: 0,
      ignored: 0,
      watcher_errors: 0,
    };

    loop {
      select! {
        recv(shutdown) -> _ => {
          info!("Shutdown requested, stopping recorder");
          for event in events.try_iter() {
            self.count_event(&event, &mut summary)?;
          }
          for err in errors.try_iter() {
            warn!("watcher error: {err}");
            summary.watcher_errors += 1;
          }
          summary.reason = StopReason::Shutdown;
          break;
        }
        recv(events) -> msg => match msg {
          Ok(event) => self.count_event(&event, &mut summary)?,
          Err(_) => {
            for err in errors.try_iter() {
              warn!("watcher error: {err}");
              summary.watcher_errors += 1;
            }
            info!("Event channel closed, stopping recorder");
            summary.reason = StopReason::WatcherClosed;
            break;
          }
        },
        recv(errors) -> msg => match msg {
          Ok(err) => {
            warn!("watcher error: {err}");
            summary.watcher_errors += 1;
          }
          Err(_) => {
            debug!("Error channel closed");
            errors = never();
          }
        },
      }
    }

    Ok(summary)
  }

  fn count_event(&mut self, event: &WatchEvent, summary: &mut RunSummary) -> Result<(), RecentError> {
    if self.handle_event(event)? {
      summary.recorded += 1;
    } else {
      summary.ignored += 1;
    }
    Ok(())
  }

  /// Записать событие, если его вид проходит фильтр. `Ok(false)` — событие проигнорировано.
  pub fn handle_event(&mut self, event: &WatchEvent) -> Result<bool, RecentError> {
    if !self.filter.matches(event.op) {
      return Ok(false);
    }

    info!("event: {}", event.path.display());
    let timestamp = (self.clock)()?;
    let path = event.path.to_string_lossy();

    let affected = self.insert_with_retry(timestamp, &path)?;
    if affected != 1 {
      return Err(RecentError::UnexpectedRowCount {
        expected: 1,
        actual: affected,
      });
    }
    Ok(true)
  }

  fn insert_with_retry(&mut self, timestamp: i64, path: &str) -> Result<usize, RecentError> {
    let mut attempt = 0;
    loop {
      match self.sink.insert_event(timestamp, path) {
        Ok(affected) => return Ok(affected),
        Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
          attempt += 1;
          let delay = self.retry.delay_for(attempt);
          warn!(
            "Transient store error ({e}), retry {attempt}/{} in {delay:?}",
            self.retry.max_retries
          );
          thread::sleep(delay);
        }
        Err(e) => return Err(e),
      }
    }
  }
}
