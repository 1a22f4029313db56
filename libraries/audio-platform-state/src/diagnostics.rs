//! Firmware diagnostic dump
//!
//! Streams the content of diagnostic files into the error log in bounded
//! chunks, so that a whole file never has to be held in memory and no single
//! log line exceeds the logger's limits.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::error;

/// Outcome of a dump
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DumpReport {
    /// Files read to the end or to their first read error
    pub dumped: Vec<PathBuf>,
    /// Files that could not be opened
    pub skipped: Vec<PathBuf>,
    /// Number of chunks logged
    pub chunks: usize,
    /// Number of bytes logged
    pub bytes: usize,
}

/// Split a whitespace separated path list
pub fn split_path_list(list: &str) -> Vec<PathBuf> {
    list.split_whitespace().map(PathBuf::from).collect()
}

/// Log every file of `paths` in chunks of at most `chunk_size` bytes
///
/// Unopenable files are logged and skipped.
pub fn dump_files(paths: &[PathBuf], chunk_size: usize) -> DumpReport {
    let mut report = DumpReport::default();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    for path in paths {
        error!("Opening file {} and reading it.", path.display());
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                error!("Unable to open file {}: {}", path.display(), e);
                report.skipped.push(path.clone());
                continue;
            }
        };
        dump_one(path, &mut file, &mut buffer, &mut report);
        report.dumped.push(path.clone());
    }
    report
}

fn dump_one(path: &Path, file: &mut File, buffer: &mut [u8], report: &mut DumpReport) {
    let mut pending = Vec::new();
    loop {
        match file.read(buffer) {
            Ok(0) => break,
            Ok(n) => {
                report.bytes += n;
                let text = decode_chunk(&mut pending, &buffer[..n]);
                if !text.is_empty() {
                    error!("{}", text);
                    report.chunks += 1;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Error reading {}: {}", path.display(), e);
                break;
            }
        }
    }
    if !pending.is_empty() {
        error!("{}", String::from_utf8_lossy(&pending));
        report.chunks += 1;
    }
}

/// Decode `chunk` after the bytes held back from the previous chunk
///
/// A multibyte character cut at the end of `chunk` stays in `pending` until
/// the next chunk completes it.
fn decode_chunk(pending: &mut Vec<u8>, chunk: &[u8]) -> String {
    pending.extend_from_slice(chunk);
    let complete = pending.len() - incomplete_tail(pending);
    let text = String::from_utf8_lossy(&pending[..complete]).into_owned();
    pending.drain(..complete);
    text
}

/// Length of a truncated UTF-8 sequence at the end of `bytes`
fn incomplete_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_split_path_list() {
        assert_eq!(
            split_path_list(" /a/b\n/c  /d "),
            vec![PathBuf::from("/a/b"), PathBuf::from("/c"), PathBuf::from("/d")]
        );
        assert!(split_path_list("   ").is_empty());
    }

    #[test]
    fn test_dump_in_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'x'; 2500]).unwrap();

        let report = dump_files(&[file.path().to_path_buf()], 998);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.bytes, 2500);
        assert_eq!(report.dumped.len(), 1);
    }

    #[test]
    fn test_multibyte_characters_survive_chunk_boundaries() {
        let mut pending = Vec::new();
        assert_eq!(decode_chunk(&mut pending, b"a\xC3"), "a");
        assert_eq!(pending, b"\xC3");
        assert_eq!(decode_chunk(&mut pending, b"\xA9b"), "\u{e9}b");
        assert!(pending.is_empty());

        let crab = "\u{1F980}".as_bytes();
        assert_eq!(decode_chunk(&mut pending, &crab[..1]), "");
        assert_eq!(decode_chunk(&mut pending, &crab[1..3]), "");
        assert_eq!(decode_chunk(&mut pending, &crab[3..]), "\u{1F980}");
    }

    #[test]
    fn test_dump_splits_on_character_boundaries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("a\u{e9}bc".as_bytes()).unwrap();

        let report = dump_files(&[file.path().to_path_buf()], 2);
        assert_eq!(report.bytes, 5);
        assert_eq!(report.chunks, 3);
    }

    #[test]
    fn test_truncated_file_tail_is_still_logged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ok\xE2\x82").unwrap();

        let report = dump_files(&[file.path().to_path_buf()], 998);
        assert_eq!(report.bytes, 4);
        assert_eq!(report.chunks, 2);
    }

    #[test]
    fn test_unopenable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present");
        std::fs::write(&present, "fw ok").unwrap();
        let missing = dir.path().join("missing");

        let report = dump_files(&[missing.clone(), present.clone()], 998);
        assert_eq!(report.skipped, vec![missing]);
        assert_eq!(report.dumped, vec![present]);
        assert_eq!(report.bytes, 5);
    }
}
