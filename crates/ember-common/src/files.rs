// files.rs — filesystem helpers shared by the engine.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Maximum bytes per read chunk (64k).
const MAX_READ: usize = 0x10000;

/// Create every directory component leading up to `path`.
///
/// The final component is treated as a file name and is not created itself.
pub fn create_path(path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = fs::create_dir_all(parent);
        }
    }
}

/// Create a directory (and any missing parents).
pub fn create_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Load an entire file into memory.
///
/// Returns `None` on any error; the failure is logged at debug level so
/// probing for optional files stays quiet.
pub fn load_file(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(data) => Some(data),
        Err(e) => {
            log::debug!("load_file: {}: {}", path.display(), e);
            None
        }
    }
}

/// Length of a file in bytes, or `None` if it cannot be stat'd.
pub fn file_length(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

/// Fill `buf` from `f`, reading in bounded chunks.
///
/// Errors with `UnexpectedEof` if the file ends before `buf` is full.
pub fn read_exact_chunked(f: &mut File, buf: &mut [u8]) -> io::Result<()> {
    let mut offset = 0;
    while offset < buf.len() {
        let end = (offset + MAX_READ).min(buf.len());
        let n = f.read(&mut buf[offset..end])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file shorter than expected",
            ));
        }
        offset += n;
    }
    Ok(())
}

/// Write a file atomically: write to `<path>.tmp`, then rename over `path`.
///
/// Intermediate directories are created as needed.
pub fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    create_path(path);

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut f = File::create(&tmp)?;
        f.write_all(data)?;
    }
    fs::rename(&tmp, path)
}

/// List files in a directory matching a `*`/`?` wildcard pattern.
///
/// `pattern` is a path whose final component may contain wildcards, e.g.
/// `crash-reports/crash-*.txt`. Results are full paths, sorted.
pub fn list_files(pattern: &str) -> Vec<String> {
    let path = Path::new(pattern);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name_pattern = match path.file_name() {
        Some(n) => n.to_string_lossy().into_owned(),
        None => return Vec::new(),
    };

    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut found: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if wildcard_match(&name_pattern, &name) {
                Some(dir.join(name).to_string_lossy().into_owned())
            } else {
                None
            }
        })
        .collect();

    found.sort();
    found
}

/// Match `text` against a pattern containing `*` (any run) and `?` (any one).
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            // Backtrack: let the last '*' swallow one more character
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn wildcard_basics() {
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("*.log", "ember-2026.log"));
        assert!(!wildcard_match("*.log", "ember.txt"));
        assert!(wildcard_match("crash-????.txt", "crash-0001.txt"));
        assert!(!wildcard_match("crash-????.txt", "crash-01.txt"));
        assert!(wildcard_match("a*b*c", "axxbyyc"));
        assert!(!wildcard_match("a*b*c", "axxbyy"));
        assert!(wildcard_match("", ""));
        assert!(!wildcard_match("", "x"));
    }

    #[test]
    fn write_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/data.bin");

        write_file(&path, b"payload").unwrap();
        assert_eq!(load_file(&path).unwrap(), b"payload");
        assert_eq!(file_length(&path), Some(7));

        // Temp file must not survive the rename
        assert!(load_file(&path.with_extension("bin.tmp")).is_none());
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_file(&dir.path().join("absent")).is_none());
        assert!(file_length(&dir.path().join("absent")).is_none());
    }

    #[test]
    fn chunked_read_fills_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..200_000).map(|i| (i % 251) as u8).collect();
        write_file(&path, &data).unwrap();

        let mut f = File::open(&path).unwrap();
        let mut buf = vec![0u8; data.len()];
        read_exact_chunked(&mut f, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn chunked_read_short_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        write_file(&path, b"abc").unwrap();

        let mut f = File::open(&path).unwrap();
        let mut buf = vec![0u8; 10];
        let err = read_exact_chunked(&mut f, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn list_files_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.log", "a.log", "c.txt"] {
            write_file(&dir.path().join(name), b"x").unwrap();
        }

        let pattern = format!("{}/*.log", dir.path().display());
        let found = list_files(&pattern);
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("a.log"));
        assert!(found[1].ends_with("b.log"));
    }
}
