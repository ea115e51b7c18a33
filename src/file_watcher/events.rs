//! Типы событий file_watcher.
//!
//! Не зависят от хранилища: `Recorder` решает, какие операции записывать.

use std::fmt;
use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;

/// Вид операции над файлом.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
  Create,
  Write,
  Remove,
  Rename,
  Chmod,
  /// Access и прочие события, не имеющие аналога выше.
  Other,
}

impl Op {
  pub fn as_str(self) -> &'static str {
    match self {
      Op::Create => "create",
      Op::Write => "write",
      Op::Remove => "remove",
      Op::Rename => "rename",
      Op::Chmod => "chmod",
      Op::Other => "other",
    }
  }
}

impl fmt::Display for Op {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<&EventKind> for Op {
  fn from(kind: &EventKind) -> Self {
    match kind {
      EventKind::Create(_) => Op::Create,
      // Новое имя после переноса в директорию — это появление файла.
      EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Op::Create,
      EventKind::Modify(ModifyKind::Name(_)) => Op::Rename,
      EventKind::Modify(ModifyKind::Metadata(_)) => Op::Chmod,
      EventKind::Modify(_) => Op::Write,
      EventKind::Remove(_) => Op::Remove,
      EventKind::Access(_) => Op::Other,
      EventKind::Any | EventKind::Other => Op::Other,
    }
  }
}

/// Одно событие файловой системы: операция + путь в том виде, в каком его отдала ОС.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchEvent {
  pub op: Op,
  pub path: PathBuf,
}

impl WatchEvent {
  pub fn new(op: Op, path: impl Into<PathBuf>) -> Self {
    Self {
      op,
      path: path.into(),
    }
  }

  /// Разворачивает событие notify (может содержать несколько путей)
  /// в последовательность событий по одному пути, сохраняя порядок.
  ///
  /// `Name(Both)` пропускается: notify выдаёт его в дополнение к уже
  /// отправленным `Name(From)` (старое имя) и `Name(To)` (новое имя).
  pub fn from_notify(event: notify::Event) -> impl Iterator<Item = WatchEvent> {
    let op = Op::from(&event.kind);
    let paths = match event.kind {
      EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Vec::new(),
      _ => event.paths,
    };
    paths.into_iter().map(move |path| WatchEvent { op, path })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

  #[test]
  fn test_op_mapping() {
    assert_eq!(Op::from(&EventKind::Create(CreateKind::File)), Op::Create);
    assert_eq!(Op::from(&EventKind::Create(CreateKind::Folder)), Op::Create);
    assert_eq!(
      Op::from(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
      Op::Write
    );
    assert_eq!(
      Op::from(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
      Op::Rename
    );
    assert_eq!(
      Op::from(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
      Op::Create
    );
    assert_eq!(
      Op::from(&EventKind::Modify(ModifyKind::Name(RenameMode::Any))),
      Op::Rename
    );
    assert_eq!(
      Op::from(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
      Op::Chmod
    );
    assert_eq!(Op::from(&EventKind::Remove(RemoveKind::File)), Op::Remove);
    assert_eq!(Op::from(&EventKind::Access(AccessKind::Any)), Op::Other);
  }

  #[test]
  fn test_from_notify_fans_out_paths_in_order() {
    let event = notify::Event::new(EventKind::Create(CreateKind::File))
      .add_path(PathBuf::from("/a/1"))
      .add_path(PathBuf::from("/b/2"));

    let events: Vec<_> = WatchEvent::from_notify(event).collect();
    assert_eq!(
      events,
      vec![
        WatchEvent::new(Op::Create, "/a/1"),
        WatchEvent::new(Op::Create, "/b/2"),
      ]
    );
  }

  #[test]
  fn test_rename_halves_map_to_rename_and_create() {
    let from = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
      .add_path(PathBuf::from("/w/dl.part"));
    let to = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
      .add_path(PathBuf::from("/w/dl.bin"));
    let both = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
      .add_path(PathBuf::from("/w/dl.part"))
      .add_path(PathBuf::from("/w/dl.bin"));

    let events: Vec<_> = [from, to, both]
      .into_iter()
      .flat_map(WatchEvent::from_notify)
      .collect();
    assert_eq!(
      events,
      vec![
        WatchEvent::new(Op::Rename, "/w/dl.part"),
        WatchEvent::new(Op::Create, "/w/dl.bin"),
      ]
    );
  }
}
