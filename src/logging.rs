//! Логирование для `recent`.
//!
//! ## Уровни логов
//! - `ERROR`: фатальные ошибки, после которых процесс завершается
//! - `WARN`:  ошибки watcher'а (процесс продолжает работу)
//! - `INFO`:  события создания файлов и жизненный цикл (startup, shutdown)
//! - `DEBUG`: проигнорированные события, детали хранилища
//!
//! ## Использование
//! ```ignore
//! use recent::logging::init_logging;
//!
//! init_logging(); // вызывается один раз при старте
//!
//! log::info!(target: "recent::recorder", "event: {}", path.display());
//! ```

use std::sync::Once;

use log::{Level, LevelFilter};
use std::io::Write;

static INIT: Once = Once::new();

/// Инициализировать логирование (idempotent).
///
/// Управление уровнем логов: переменная окружения `RUST_LOG`.
/// Примеры:
/// - `RUST_LOG=info` — только INFO и выше
/// - `RUST_LOG=recent=debug` — DEBUG для нашего crate
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_module("recent", LevelFilter::Info)
            .filter_module("notify", LevelFilter::Warn)
            .parse_env("RUST_LOG")
            .format(|buf, record| {
                let timestamp = clock_timestamp();

                // Формат: [timestamp] [LEVEL] [target] message
                writeln!(
                    buf,
                    "[{}] [{}] [{}] {}",
                    timestamp,
                    level_letter(record.level()),
                    record.target(),
                    record.args()
                )
            })
            .try_init();
    });
}

fn level_letter(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

/// Время суток (UTC) в формате `hh:mm:ss.mmm`.
fn clock_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format_clock(now.as_secs(), now.subsec_millis())
}

fn format_clock(secs: u64, millis: u32) -> String {
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
