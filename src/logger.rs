//! Logging setup.
//!
//! Records go to stderr through `env_logger` and are also kept in a bounded
//! in-memory buffer so the GUI can show them.

use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};

use log::{Log, Metadata, Record};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const CAPTURE_LIMIT: usize = 1000;
const TIMESTAMP: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

static CAPTURED: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();

fn buffer() -> &'static Mutex<VecDeque<String>> {
    CAPTURED.get_or_init(|| Mutex::new(VecDeque::with_capacity(CAPTURE_LIMIT)))
}

/// Store a line in the capture buffer, dropping the oldest beyond the limit.
pub fn capture(line: String) {
    if let Ok(mut lines) = buffer().lock() {
        if lines.len() == CAPTURE_LIMIT {
            lines.pop_front();
        }
        lines.push_back(line);
    }
}

/// Captured lines, oldest first.
pub fn captured_lines() -> Vec<String> {
    buffer()
        .lock()
        .map(|lines| lines.iter().cloned().collect())
        .unwrap_or_default()
}

pub fn clear_captured() {
    if let Ok(mut lines) = buffer().lock() {
        lines.clear();
    }
}

pub struct CapturingLogger {
    inner: env_logger::Logger,
}

impl CapturingLogger {
    /// Install the logger. `RUST_LOG` overrides `default_filter`.
    pub fn init(default_filter: &str) -> Result<(), log::SetLoggerError> {
        let inner = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(default_filter),
        )
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Seconds))
        .build();

        let max_level = inner.filter();
        log::set_boxed_logger(Box::new(Self { inner }))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);

        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let timestamp = now.format(TIMESTAMP).unwrap_or_default();
        capture(format!(
            "[{}] {:5} {} - {}",
            timestamp,
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {
        self.inner.flush();
    }
}
