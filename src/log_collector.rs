//! Robust, decoupled logging pipeline for documentation builds.
//!
//! # Architecture
//!
//! ```text
//! log::info!() / log_parsed!()
//!     |
//! [LogCollector] (non-blocking)
//!     |                    \
//!     | (crossbeam channel) \ (immediate)
//!     v                      v
//! [DiskPersister]         stderr
//! (background thread)
//!     |
//! logs/full/<ts>_full.log
//! logs/parsed/<ts>_parsed.log
//! ```
//!
//! Every line reaches the full log; lines logged with target `parsed`
//! (stage milestones) are also written to the parsed log.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Internal log line or special marker
enum LogMessage {
    /// Regular log line
    Line(LogLine),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// Kind of log line, deciding which files it lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogKind {
    Full,
    Parsed,
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub kind: LogKind,
    /// Timestamp of when the log was created
    pub timestamp: String,
}

impl LogLine {
    pub fn new(message: String) -> Self {
        LogLine {
            message,
            kind: LogKind::Full,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(message: String) -> Self {
        LogLine {
            kind: LogKind::Parsed,
            ..LogLine::new(message)
        }
    }

    fn formatted(&self) -> String {
        format!("[{}] {}\n", self.timestamp, self.message)
    }
}

/// Unified logger that handles disk persistence and console echo
#[derive(Clone)]
pub struct LogCollector {
    /// Channel to the disk persister thread
    tx: Sender<LogMessage>,
    /// Session log files, `None` when only echoing to the console
    files: Option<SessionFiles>,
    /// Most verbose level echoed to stderr
    console_level: LevelFilter,
}

#[derive(Clone, Debug)]
struct SessionFiles {
    log_dir: PathBuf,
    full_log_path: PathBuf,
    parsed_log_path: PathBuf,
}

impl LogCollector {
    /// Create the session log files under `log_dir` and start the persister.
    pub fn new(log_dir: PathBuf, console_level: LevelFilter) -> Result<Self, String> {
        let full_log_dir = log_dir.join("full");
        let parsed_log_dir = log_dir.join("parsed");
        std::fs::create_dir_all(&full_log_dir)
            .map_err(|e| format!("Failed to create full log dir: {}", e))?;
        std::fs::create_dir_all(&parsed_log_dir)
            .map_err(|e| format!("Failed to create parsed log dir: {}", e))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S%.3f").to_string();
        let full_log_path = full_log_dir.join(format!("{}_full.log", stamp));
        let parsed_log_path = parsed_log_dir.join(format!("{}_parsed.log", stamp));

        // Open both up front so a session always leaves its files behind
        let full = open_append(&full_log_path)?;
        let parsed = open_append(&parsed_log_path)?;

        Ok(LogCollector {
            tx: spawn_persister(Some((full, parsed))),
            files: Some(SessionFiles {
                log_dir,
                full_log_path,
                parsed_log_path,
            }),
            console_level,
        })
    }

    /// Collector that only echoes to stderr; nothing is written to disk.
    pub fn console_only(console_level: LevelFilter) -> Self {
        LogCollector {
            tx: spawn_persister(None),
            files: None,
            console_level,
        }
    }

    /// Disk logging under `log_dir`, or console-only when the files cannot be
    /// created. The second value carries the reason for the fallback.
    pub fn new_or_console(log_dir: PathBuf, console_level: LevelFilter) -> (Self, Option<String>) {
        match Self::new(log_dir, console_level) {
            Ok(collector) => (collector, None),
            Err(e) => (Self::console_only(console_level), Some(e)),
        }
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.files.as_ref().map(|f| f.log_dir.as_path())
    }

    /// Full log file of this session
    pub fn full_log_path(&self) -> Option<&Path> {
        self.files.as_ref().map(|f| f.full_log_path.as_path())
    }

    /// Parsed (milestone) log file of this session
    pub fn parsed_log_path(&self) -> Option<&Path> {
        self.files.as_ref().map(|f| f.parsed_log_path.as_path())
    }

    /// Send a log line (non-blocking)
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Send a simple string log
    pub fn log_str(&self, message: impl Into<String>) {
        self.log_line(LogLine::new(message.into()));
    }

    /// Send a parsed (high-level) log
    pub fn log_parsed(&self, message: impl Into<String>) {
        self.log_line(LogLine::parsed(message.into()));
    }

    /// Block until every line sent so far is written to disk.
    pub fn flush_pending(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        rx.recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))?;
        Ok(())
    }

    /// Register a clone of this collector as the global `log` backend.
    ///
    /// The disk logs always receive `Debug` and above; `console_level` only
    /// filters the stderr echo.
    pub fn install(&self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))
            .map(|()| log::set_max_level(LevelFilter::Debug.max(self.console_level)))
    }
}

/// Wires all log::info!(), log::warn!(), log::error!() calls into LogCollector
impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug || metadata.level() <= self.console_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = format!("[{}] {}", record.level(), record.args());
        if record.level() <= self.console_level {
            eprintln!("{}", message);
        }

        // Target-aware routing: "parsed" marks high-level milestones
        if record.target() == "parsed" {
            self.log_parsed(message);
        } else {
            self.log_str(message);
        }
    }

    fn flush(&self) {
        let _ = self.flush_pending();
    }
}

/// Start the background writer. Without files it only acknowledges flushes.
fn spawn_persister(mut files: Option<(File, File)>) -> Sender<LogMessage> {
    let (tx, rx) = unbounded::<LogMessage>();

    std::thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            match msg {
                LogMessage::Line(line) => {
                    if let Some((full, parsed)) = files.as_mut() {
                        let formatted = line.formatted();
                        let _ = full.write_all(formatted.as_bytes());
                        if line.kind == LogKind::Parsed {
                            let _ = parsed.write_all(formatted.as_bytes());
                        }
                    }
                }
                LogMessage::Flush(done) => {
                    if let Some((full, parsed)) = files.as_mut() {
                        let _ = full.flush();
                        let _ = parsed.flush();
                    }
                    let _ = done.send(());
                }
            }
        }
    });

    tx
}

fn open_append(path: &Path) -> Result<File, String> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))
}

/// Get the default logs path under the repository root: <root>/logs
pub fn default_logs_path(root: &Path) -> PathBuf {
    root.join("logs")
}
