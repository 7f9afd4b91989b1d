//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes every record to stderr and to a
//! per-day log file, and keeps the most recent lines in a circular buffer so a
//! running process can report them without touching the disk.
//!
//! `log` records emitted by library crates are bridged into the same
//! subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{Local, NaiveDate};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Lines kept in memory for `recent_lines`
pub const RING_CAPACITY: usize = 500;

/// Daily files kept on disk; older ones are removed on rollover
pub const MAX_LOG_FILES: usize = 7;

static GLOBAL: OnceLock<RollingLog> = OnceLock::new();

struct LogState {
    dir: PathBuf,
    app_name: String,
    day: Option<NaiveDate>,
    file: Option<File>,
    ring: VecDeque<String>,
    capacity: usize,
}

impl LogState {
    fn file_name(&self, day: NaiveDate) -> String {
        format!("{}.{}.log", self.app_name, day.format("%Y-%m-%d"))
    }

    /// Open (or reuse) the file for `day`, pruning old files on rollover
    fn file_for(&mut self, day: NaiveDate) -> io::Result<&mut File> {
        if self.day != Some(day) || self.file.is_none() {
            let path = self.dir.join(self.file_name(day));
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            self.file = Some(file);
            self.day = Some(day);
            prune_old_files(&self.dir, &self.app_name, MAX_LOG_FILES)?;
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))
    }

    fn remember(&mut self, buf: &[u8]) {
        for line in String::from_utf8_lossy(buf).lines() {
            if line.trim().is_empty() {
                continue;
            }
            if self.ring.len() == self.capacity {
                self.ring.pop_front();
            }
            self.ring.push_back(line.to_string());
        }
    }
}

/// Shared handle to the rolling file + ring buffer
#[derive(Clone)]
pub struct RollingLog {
    state: Arc<Mutex<LogState>>,
}

impl RollingLog {
    /// Create a log rooted at `dir`; the directory is created if missing
    pub fn new(dir: impl Into<PathBuf>, app_name: &str) -> io::Result<Self> {
        Self::with_capacity(dir, app_name, RING_CAPACITY)
    }

    pub fn with_capacity(dir: impl Into<PathBuf>, app_name: &str, capacity: usize) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            state: Arc::new(Mutex::new(LogState {
                dir,
                app_name: app_name.to_string(),
                day: None,
                file: None,
                ring: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
            })),
        })
    }

    /// Most recent lines, oldest first
    pub fn recent(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => state.ring.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().ring.iter().cloned().collect(),
        }
    }

    /// Path of the file that receives today's records
    pub fn current_file(&self) -> Option<PathBuf> {
        let state = self.state.lock().ok()?;
        let today = Local::now().date_naive();
        Some(state.dir.join(state.file_name(today)))
    }

    fn write_for_day(&self, day: NaiveDate, buf: &[u8]) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log state poisoned"))?;
        state.remember(buf);
        let file = state.file_for(day)?;
        file.write_all(buf)
    }
}

/// Writer handed out to the fmt layer for a single record
pub struct RollingWriter {
    log: RollingLog,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.log.write_for_day(Local::now().date_naive(), buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .log
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log state poisoned"))?;
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingLog {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter { log: self.clone() }
    }
}

/// Remove all but the newest `keep` files belonging to `app_name`
fn prune_old_files(dir: &Path, app_name: &str, keep: usize) -> io::Result<()> {
    let prefix = format!("{}.", app_name);
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix) && n.ends_with(".log"))
                .unwrap_or(false)
        })
        .collect();
    if files.len() <= keep {
        return Ok(());
    }
    // Names embed the date, so lexical order is chronological
    files.sort();
    let excess = files.len() - keep;
    for path in files.into_iter().take(excess) {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Initialize the global logger.
///
/// Honors `RUST_LOG`; defaults to `info`. Calling it twice is an error.
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    let log = RollingLog::new(log_dir, app_name).map_err(|e| e.to_string())?;
    GLOBAL
        .set(log.clone())
        .map_err(|_| "logger already initialized".to_string())?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(log.and(io::stderr))
        .try_init()
        .map_err(|e| e.to_string())
}

/// Initialize a stderr-only logger, for runs without a log directory
pub fn init_stderr_logger() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| e.to_string())
}

pub fn info(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    log::info!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    log::error!("{}", msg);
    Ok(())
}

/// Recent lines of the global logger (empty before `init_logger`)
pub fn recent_lines() -> Vec<String> {
    GLOBAL.get().map(RollingLog::recent).unwrap_or_default()
}

fn ensure_initialized() -> Result<(), String> {
    if GLOBAL.get().is_some() {
        Ok(())
    } else {
        Err("logger not initialized".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_to_dated_file() {
        let dir = TempDir::new().unwrap();
        let log = RollingLog::new(dir.path(), "Test").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        log.write_for_day(day, b"first line\n").unwrap();
        log.write_for_day(day, b"second line\n").unwrap();

        let content = fs::read_to_string(dir.path().join("Test.2024-03-01.log")).unwrap();
        assert_eq!(content, "first line\nsecond line\n");
    }

    #[test]
    fn test_ring_keeps_latest_lines() {
        let dir = TempDir::new().unwrap();
        let log = RollingLog::with_capacity(dir.path(), "Ring", 2).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        log.write_for_day(day, b"a\nb\n").unwrap();
        log.write_for_day(day, b"c\n").unwrap();

        assert_eq!(log.recent(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_rollover_prunes_old_files() {
        let dir = TempDir::new().unwrap();
        let log = RollingLog::new(dir.path(), "Prune").unwrap();

        for d in 1..=(MAX_LOG_FILES as u32 + 3) {
            let day = NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
            log.write_for_day(day, b"entry\n").unwrap();
        }

        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, MAX_LOG_FILES);
        assert!(!dir.path().join("Prune.2024-03-01.log").exists());
    }

    #[test]
    fn test_helpers_require_init() {
        // No test installs the global logger
        assert!(recent_lines().is_empty());
        assert!(info("nothing").is_err());
        assert!(error("nothing").is_err());
    }
}
