// logger.rs — engine log sink behind the `log` facade.
//
// Every line goes to stdout; when a log directory is configured, the same
// line is mirrored into logs/ember-<timestamp>.log (one file per run).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

use crate::files;

/// Engine logger. Install once via [`init`].
pub struct EngineLogger {
    level: LevelFilter,
    file: Mutex<Option<File>>,
}

impl EngineLogger {
    fn new(level: LevelFilter, file: Option<File>) -> Self {
        Self {
            level,
            file: Mutex::new(file),
        }
    }
}

impl Log for EngineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now().format("%H:%M:%S").to_string();
        let line = format_line(
            &timestamp,
            record.level(),
            record.target(),
            &record.args().to_string(),
        );

        println!("{}", line);

        let mut file = self.file.lock();
        if let Some(f) = file.as_mut() {
            let _ = writeln!(f, "{}", line);
        }
    }

    fn flush(&self) {
        let mut file = self.file.lock();
        if let Some(f) = file.as_mut() {
            let _ = f.flush();
        }
    }
}

/// Format a single log line: `[HH:MM:SS] [LEVEL] (target) message`.
fn format_line(timestamp: &str, level: Level, target: &str, message: &str) -> String {
    format!("[{}] [{}] ({}) {}", timestamp, level, target, message)
}

/// Path of the log file for a run started at the given local time.
fn log_file_path(dir: &Path, now: &chrono::DateTime<Local>) -> PathBuf {
    dir.join(format!("ember-{}.log", now.format("%Y-%m-%d_%H.%M.%S")))
}

/// Install the engine logger. `log_dir` enables the file sink.
///
/// Returns the path of the log file if one was opened. Fails if a logger is
/// already installed or the log file cannot be created.
pub fn init(level: LevelFilter, log_dir: Option<&Path>) -> Result<Option<PathBuf>, String> {
    let mut opened = None;
    let file = match log_dir {
        Some(dir) => {
            files::create_dir(dir).map_err(|e| format!("Failed to create log dir: {}", e))?;
            let path = log_file_path(dir, &Local::now());
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))?;
            opened = Some(path);
            Some(f)
        }
        None => None,
    };

    log::set_boxed_logger(Box::new(EngineLogger::new(level, file)))
        .map_err(|e| format!("Logger already installed: {}", e))?;
    log::set_max_level(level);

    Ok(opened)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        let line = format_line("12:34:56", Level::Warn, "client", "swapchain out of date");
        assert_eq!(line, "[12:34:56] [WARN] (client) swapchain out of date");
    }

    #[test]
    fn file_name_uses_run_timestamp() {
        let now = Local::now();
        let path = log_file_path(Path::new("logs"), &now);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("ember-"));
        assert!(name.ends_with(".log"));
        // ember-YYYY-MM-DD_HH.MM.SS.log
        assert_eq!(name.len(), "ember-0000-00-00_00.00.00.log".len());
    }

    #[test]
    fn level_gate() {
        let logger = EngineLogger::new(LevelFilter::Info, None);
        assert!(logger.enabled(&Metadata::builder().level(Level::Error).build()));
        assert!(logger.enabled(&Metadata::builder().level(Level::Info).build()));
        assert!(!logger.enabled(&Metadata::builder().level(Level::Debug).build()));
    }
}
