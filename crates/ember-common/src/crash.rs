// crash.rs — crash report generation.
//
// A crash report captures what went wrong plus a host snapshot, and is
// persisted under crash-reports/ so users can attach it to bug reports.
// Fatal init errors and panics both funnel through here before exit.

use std::io;
use std::panic;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::files;
use crate::sysinfo::SystemInfo;

/// Default directory for saved reports, relative to the working directory.
pub const CRASH_DIR: &str = "crash-reports";

/// A single crash report.
pub struct CrashReport {
    pub summary: String,
    pub detail: String,
    pub module: Option<String>,
    timestamp: DateTime<Local>,
    system: SystemInfo,
}

impl CrashReport {
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
            module: None,
            timestamp: Local::now(),
            system: SystemInfo::probe(),
        }
    }

    /// Tag the report with the subsystem that failed.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// File name for this report: `crash-YYYY-MM-DD_HH.MM.SS.txt`.
    pub fn file_name(&self) -> String {
        format!("crash-{}.txt", self.timestamp.format("%Y-%m-%d_%H.%M.%S"))
    }

    /// Render the full report text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("---- Ember Crash Report ----\n\n");
        out.push_str(&format!(
            "Time: {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("Summary: {}\n", self.summary));
        if let Some(module) = &self.module {
            out.push_str(&format!("Module: {}\n", module));
        }
        out.push_str("\nDetail:\n");
        for line in self.detail.lines() {
            out.push_str(&format!("    {}\n", line));
        }
        out.push_str("\nSystem:\n");
        out.push_str(&self.system.render());
        out
    }

    /// Write the report into `dir`, creating it if needed.
    pub fn save_to(&self, dir: &Path) -> io::Result<PathBuf> {
        files::create_dir(dir)?;
        let path = dir.join(self.file_name());
        files::write_file(&path, self.render().as_bytes())?;
        Ok(path)
    }

    /// Write the report into the default crash-reports directory.
    pub fn save(&self) -> io::Result<PathBuf> {
        self.save_to(Path::new(CRASH_DIR))
    }
}

/// Install a panic hook that persists a crash report before the process dies.
///
/// The previous hook still runs afterwards, so the usual panic message and
/// backtrace are not swallowed.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        let detail = match info.location() {
            Some(loc) => format!("{}\n at {}:{}:{}", payload, loc.file(), loc.line(), loc.column()),
            None => payload,
        };

        let report = CrashReport::new("Unhandled panic", detail);
        match report.save() {
            Ok(path) => eprintln!("Crash report written to {}", path.display()),
            Err(e) => eprintln!("Failed to write crash report: {}", e),
        }

        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn report_renders_all_sections() {
        let report = CrashReport::new("Vulkan init failed", "No suitable GPU found\nsecond line")
            .with_module("client::vulkan");
        let text = report.render();

        assert!(text.starts_with("---- Ember Crash Report ----"));
        assert!(text.contains("Summary: Vulkan init failed"));
        assert!(text.contains("Module: client::vulkan"));
        assert!(text.contains("    No suitable GPU found"));
        assert!(text.contains("    second line"));
        assert!(text.contains("System:"));
        assert!(text.contains("OS: "));
    }

    #[test]
    fn file_name_shape() {
        let report = CrashReport::new("x", "y");
        let name = report.file_name();
        assert!(name.starts_with("crash-"));
        assert!(name.ends_with(".txt"));
        assert_eq!(name.len(), "crash-0000-00-00_00.00.00.txt".len());
    }

    #[test]
    fn save_creates_dir_and_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("reports");

        let report = CrashReport::new("boom", "detail");
        let path = report.save_to(&target).unwrap();

        let written = crate::files::load_file(&path).unwrap();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("Summary: boom"));
    }
}
