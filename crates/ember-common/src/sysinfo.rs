// sysinfo.rs — best-effort host probe for startup logs and crash reports.
//
// Every field is optional or defaulted; probing never fails and never
// panics, since this runs inside the crash path.

use std::env;

/// Snapshot of the host system.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: String,
    pub kernel: Option<String>,
    pub cpu_count: usize,
    pub total_memory_kib: Option<u64>,
    pub available_memory_kib: Option<u64>,
    pub working_dir: Option<String>,
}

impl SystemInfo {
    /// Probe the host. Never fails; unknown fields come back `None`.
    pub fn probe() -> Self {
        let (total_memory_kib, available_memory_kib) = memory_status();

        Self {
            os: format!("{} {}", env::consts::OS, env::consts::ARCH),
            kernel: kernel_version(),
            cpu_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            total_memory_kib,
            available_memory_kib,
            working_dir: env::current_dir()
                .ok()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }

    /// Render as an indented text block for logs and crash reports.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("    OS: {}\n", self.os));
        if let Some(kernel) = &self.kernel {
            out.push_str(&format!("    Kernel: {}\n", kernel));
        }
        out.push_str(&format!("    Logical CPUs: {}\n", self.cpu_count));
        match (self.available_memory_kib, self.total_memory_kib) {
            (Some(avail), Some(total)) => {
                out.push_str(&format!(
                    "    Memory: {} MiB available of {} MiB\n",
                    avail / 1024,
                    total / 1024
                ));
            }
            (None, Some(total)) => {
                out.push_str(&format!("    Memory: {} MiB total\n", total / 1024));
            }
            _ => out.push_str("    Memory: unknown\n"),
        }
        if let Some(dir) = &self.working_dir {
            out.push_str(&format!("    Working dir: {}\n", dir));
        }
        out
    }
}

#[cfg(target_os = "linux")]
fn kernel_version() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .ok()
        .map(|s| s.trim().to_string())
}

#[cfg(not(target_os = "linux"))]
fn kernel_version() -> Option<String> {
    None
}

/// (total, available) physical memory in KiB.
#[cfg(target_os = "linux")]
fn memory_status() -> (Option<u64>, Option<u64>) {
    match std::fs::read_to_string("/proc/meminfo") {
        Ok(text) => parse_meminfo(&text),
        Err(_) => (None, None),
    }
}

#[cfg(windows)]
fn memory_status() -> (Option<u64>, Option<u64>) {
    #[repr(C)]
    struct MemoryStatusEx {
        dw_length: u32,
        dw_memory_load: u32,
        ull_total_phys: u64,
        ull_avail_phys: u64,
        ull_total_page_file: u64,
        ull_avail_page_file: u64,
        ull_total_virtual: u64,
        ull_avail_virtual: u64,
        ull_avail_extended_virtual: u64,
    }

    extern "system" {
        fn GlobalMemoryStatusEx(buffer: *mut MemoryStatusEx) -> i32;
    }

    unsafe {
        let mut status = MemoryStatusEx {
            dw_length: std::mem::size_of::<MemoryStatusEx>() as u32,
            dw_memory_load: 0,
            ull_total_phys: 0,
            ull_avail_phys: 0,
            ull_total_page_file: 0,
            ull_avail_page_file: 0,
            ull_total_virtual: 0,
            ull_avail_virtual: 0,
            ull_avail_extended_virtual: 0,
        };
        if GlobalMemoryStatusEx(&mut status) != 0 {
            (
                Some(status.ull_total_phys / 1024),
                Some(status.ull_avail_phys / 1024),
            )
        } else {
            (None, None)
        }
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
fn memory_status() -> (Option<u64>, Option<u64>) {
    (None, None)
}

/// Parse MemTotal/MemAvailable out of /proc/meminfo text.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_meminfo(text: &str) -> (Option<u64>, Option<u64>) {
    let mut total = None;
    let mut available = None;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = parse_kib(rest);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available = parse_kib(rest);
        }
    }

    (total, available)
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_kib(s: &str) -> Option<u64> {
    s.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meminfo_parse() {
        let text = "MemTotal:       32768000 kB\n\
                    MemFree:         1024000 kB\n\
                    MemAvailable:   16384000 kB\n";
        let (total, available) = parse_meminfo(text);
        assert_eq!(total, Some(32_768_000));
        assert_eq!(available, Some(16_384_000));
    }

    #[test]
    fn meminfo_parse_missing_fields() {
        assert_eq!(parse_meminfo("SwapTotal: 0 kB\n"), (None, None));
        assert_eq!(parse_meminfo("MemTotal: garbage kB\n"), (None, None));
    }

    #[test]
    fn probe_never_panics_and_renders() {
        let info = SystemInfo::probe();
        assert!(info.cpu_count >= 1);

        let block = info.render();
        assert!(block.contains("OS: "));
        assert!(block.contains("Logical CPUs: "));
        assert!(block.contains("Memory: "));
        // Indented so it can be embedded under a report heading
        assert!(block.lines().all(|l| l.starts_with("    ")));
    }
}
