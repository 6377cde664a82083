// compression.rs — gzip helpers for save data and archived reports.

use std::io::Read;
use std::path::Path;

use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;

use crate::files;

/// Minimum payload size to consider for compression.
/// Anything smaller is not worth the header overhead.
pub const MIN_COMPRESS_SIZE: usize = 128;

/// Only prefer the compressed form if it saves at least this percentage.
pub const COMPRESS_THRESHOLD_PERCENT: usize = 20;

/// Default ceiling for decompressed output, to stop decompression bombs.
pub const MAX_DECOMPRESS_SIZE: usize = 16 * 1024 * 1024;

/// Compress data with gzip.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut encoder = GzEncoder::new(data, Compression::default());
    let mut compressed = Vec::with_capacity(data.len() / 2 + 64);
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| format!("Compression failed: {}", e))?;
    Ok(compressed)
}

/// Compress data only when it pays off.
///
/// Returns `Some(compressed)` if the payload is large enough and the gzip
/// form saves at least [`COMPRESS_THRESHOLD_PERCENT`], otherwise `None`
/// to signal the caller should keep the original bytes.
pub fn compress_if_worthwhile(data: &[u8]) -> Option<Vec<u8>> {
    if data.len() < MIN_COMPRESS_SIZE {
        return None;
    }

    let compressed = compress(data).ok()?;

    let threshold = data.len() * (100 - COMPRESS_THRESHOLD_PERCENT) / 100;
    if compressed.len() < threshold {
        Some(compressed)
    } else {
        None
    }
}

/// Decompress gzip data, refusing to produce more than `max_size` bytes.
pub fn decompress(data: &[u8], max_size: usize) -> Result<Vec<u8>, String> {
    let max_size = max_size.min(MAX_DECOMPRESS_SIZE);

    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::with_capacity(max_size.min(data.len() * 4));

    // Read in chunks so the size ceiling is enforced as we go
    let mut buffer = [0u8; 4096];
    loop {
        match decoder.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                if decompressed.len() + n > max_size {
                    return Err(format!(
                        "Decompressed size exceeds limit of {} bytes",
                        max_size
                    ));
                }
                decompressed.extend_from_slice(&buffer[..n]);
            }
            Err(e) => return Err(format!("Decompression failed: {}", e)),
        }
    }

    Ok(decompressed)
}

/// Compress `data` and write it to `path` (atomically, via files::write_file).
pub fn write_gz_file(path: &Path, data: &[u8]) -> Result<(), String> {
    let compressed = compress(data)?;
    files::write_file(path, &compressed)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Read and decompress a gzip file written by [`write_gz_file`].
pub fn read_gz_file(path: &Path, max_size: usize) -> Result<Vec<u8>, String> {
    let data = files::load_file(path)
        .ok_or_else(|| format!("Failed to read {}", path.display()))?;
    decompress(&data, max_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn repetitive(len: usize) -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog "
            .iter()
            .cycle()
            .take(len)
            .copied()
            .collect()
    }

    #[test]
    fn roundtrip() {
        let original = repetitive(4096);
        let compressed = compress(&original).unwrap();
        assert!(compressed.len() < original.len());
        let decompressed = decompress(&compressed, original.len() * 2).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn small_payload_not_worthwhile() {
        assert!(compress_if_worthwhile(b"tiny").is_none());
    }

    #[test]
    fn compressible_payload_is_worthwhile() {
        let data = repetitive(2048);
        let compressed = compress_if_worthwhile(&data).unwrap();
        assert!(compressed.len() < data.len() * (100 - COMPRESS_THRESHOLD_PERCENT) / 100);
    }

    #[test]
    fn size_ceiling_enforced() {
        let original = vec![0u8; 100_000];
        let compressed = compress(&original).unwrap();

        assert!(decompress(&compressed, 1000).is_err());
        assert_eq!(decompress(&compressed, 200_000).unwrap(), original);
    }

    #[test]
    fn gz_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save/world.dat.gz");
        let data = repetitive(10_000);

        write_gz_file(&path, &data).unwrap();
        // On-disk form is the compressed one
        assert!(crate::files::file_length(&path).unwrap() < data.len() as u64);
        assert_eq!(read_gz_file(&path, MAX_DECOMPRESS_SIZE).unwrap(), data);
    }

    #[test]
    fn truncated_stream_errors() {
        let compressed = compress(&repetitive(4096)).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        assert!(decompress(truncated, MAX_DECOMPRESS_SIZE).is_err());
    }
}
