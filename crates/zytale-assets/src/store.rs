//! The ZIP-backed content store.
//!
//! The archive is indexed once at open: the End-of-Central-Directory
//! record is located by scanning the file tail backward, the central
//! directory is walked, and every stored file entry lands in two maps
//! (by path and by sha256 of the path). Reads go straight to the local
//! file header; only stored (uncompressed) entries are served.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

const EOCD_SIGNATURE: u32 = 0x0605_4B50;
const CENTRAL_SIGNATURE: u32 = 0x0201_4B50;
const LOCAL_SIGNATURE: u32 = 0x0403_4B50;
const EOCD_TAIL_SCAN: u64 = 65_536;
const LOCAL_HEADER_LEN: u64 = 30;

/// Chunk size used when streaming asset bytes to clients.
pub const STREAM_CHUNK_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no end-of-central-directory record found")]
    MissingEocd,
    #[error("bad signature at offset {0:#x}")]
    BadSignature(u64),
    #[error("entry not found: {0}")]
    NotFound(String),
    #[error("malformed asset index at line {0}")]
    BadIndexLine(usize),
}

/// One indexed archive entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub path: String,
    pub local_header_offset: u64,
    pub uncompressed_size: u64,
    pub path_sha256: String,
}

pub struct AssetStore {
    archive_path: PathBuf,
    by_path: HashMap<String, EntryInfo>,
    by_hash: HashMap<String, String>,
}

impl AssetStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let archive_path = path.as_ref().to_path_buf();
        let mut file = File::open(&archive_path)?;
        let file_len = file.metadata()?.len();

        let tail_len = file_len.min(EOCD_TAIL_SCAN);
        file.seek(SeekFrom::Start(file_len - tail_len))?;
        let mut tail = vec![0u8; tail_len as usize];
        file.read_exact(&mut tail)?;

        let eocd_pos = find_eocd(&tail).ok_or(StoreError::MissingEocd)?;
        let eocd = &tail[eocd_pos..];
        let entry_count = u16::from_le_bytes([eocd[10], eocd[11]]);
        let cd_offset = u32::from_le_bytes([eocd[16], eocd[17], eocd[18], eocd[19]]) as u64;

        file.seek(SeekFrom::Start(cd_offset))?;
        let mut by_path = HashMap::new();
        let mut by_hash = HashMap::new();
        for _ in 0..entry_count {
            let Some(entry) = read_central_entry(&mut file)? else {
                continue;
            };
            by_hash.insert(entry.path_sha256.clone(), entry.path.clone());
            by_path.insert(entry.path.clone(), entry);
        }

        Ok(Self {
            archive_path,
            by_path,
            by_hash,
        })
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn entry(&self, path: &str) -> Option<&EntryInfo> {
        self.by_path.get(path)
    }

    /// Look up an entry by the lowercase hex sha256 of its path.
    pub fn entry_by_hash(&self, hash: &str) -> Option<&EntryInfo> {
        self.by_hash.get(hash).and_then(|path| self.by_path.get(path))
    }

    /// Entries under a directory prefix, e.g. `Server/TagPatterns/`.
    pub fn entries_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a EntryInfo> {
        self.by_path
            .values()
            .filter(move |entry| entry.path.starts_with(prefix))
    }

    /// Cross-check the archive against an asset index file: every listed
    /// path must exist with the listed size. Returns the number of
    /// mismatches after logging each one.
    pub fn verify_index(&self, lines: &[IndexLine]) -> usize {
        let mut mismatches = 0;
        for line in lines {
            match self.by_path.get(&line.path) {
                Some(entry) if entry.uncompressed_size == line.size => {}
                Some(entry) => {
                    warn!(
                        path = %line.path,
                        expected = line.size,
                        actual = entry.uncompressed_size,
                        "asset index size mismatch"
                    );
                    mismatches += 1;
                }
                None => {
                    warn!(path = %line.path, "asset index lists a missing entry");
                    mismatches += 1;
                }
            }
        }
        mismatches
    }

    /// Read one entry in full.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let entry = self
            .by_path
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_owned()))?;
        let mut reader = self.open_entry(entry)?;
        let mut data = Vec::with_capacity(entry.uncompressed_size as usize);
        reader.file.read_to_end(&mut data)?;
        data.truncate(entry.uncompressed_size as usize);
        Ok(data)
    }

    /// Open an entry for chunked streaming.
    pub fn open_entry(&self, entry: &EntryInfo) -> Result<EntryReader, StoreError> {
        let mut file = File::open(&self.archive_path)?;
        file.seek(SeekFrom::Start(entry.local_header_offset))?;
        let mut header = [0u8; LOCAL_HEADER_LEN as usize];
        file.read_exact(&mut header)?;
        let signature = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if signature != LOCAL_SIGNATURE {
            return Err(StoreError::BadSignature(entry.local_header_offset));
        }
        let name_len = u16::from_le_bytes([header[26], header[27]]) as i64;
        let extra_len = u16::from_le_bytes([header[28], header[29]]) as i64;
        file.seek(SeekFrom::Current(name_len + extra_len))?;
        Ok(EntryReader {
            file: file.take(entry.uncompressed_size),
            remaining: entry.uncompressed_size,
        })
    }
}

pub struct EntryReader {
    file: std::io::Take<File>,
    remaining: u64,
}

impl EntryReader {
    /// The next up-to-4-MiB chunk, or None at end of entry.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let len = self.remaining.min(STREAM_CHUNK_SIZE as u64) as usize;
        let mut chunk = vec![0u8; len];
        self.file.read_exact(&mut chunk)?;
        self.remaining -= len as u64;
        Ok(Some(chunk))
    }
}

fn find_eocd(tail: &[u8]) -> Option<usize> {
    if tail.len() < 22 {
        return None;
    }
    (0..=tail.len() - 22)
        .rev()
        .find(|&pos| u32::from_le_bytes([tail[pos], tail[pos + 1], tail[pos + 2], tail[pos + 3]]) == EOCD_SIGNATURE)
}

/// Parse one central-directory record. Directory entries and entries
/// using any compression method are skipped with a warning rather than
/// failing the whole archive.
fn read_central_entry(file: &mut File) -> Result<Option<EntryInfo>, StoreError> {
    let pos = file.stream_position()?;
    let mut header = [0u8; 46];
    file.read_exact(&mut header)?;
    let signature = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    if signature != CENTRAL_SIGNATURE {
        return Err(StoreError::BadSignature(pos));
    }
    let method = u16::from_le_bytes([header[10], header[11]]);
    let uncompressed_size = u32::from_le_bytes([header[24], header[25], header[26], header[27]]) as u64;
    let name_len = u16::from_le_bytes([header[28], header[29]]) as usize;
    let extra_len = u16::from_le_bytes([header[30], header[31]]) as i64;
    let comment_len = u16::from_le_bytes([header[32], header[33]]) as i64;
    let local_header_offset = u32::from_le_bytes([header[42], header[43], header[44], header[45]]) as u64;

    let mut name = vec![0u8; name_len];
    file.read_exact(&mut name)?;
    file.seek(SeekFrom::Current(extra_len + comment_len))?;

    let path = String::from_utf8_lossy(&name).into_owned();
    if path.ends_with('/') {
        return Ok(None);
    }
    if method != 0 {
        warn!(path = %path, method, "skipping compressed archive entry");
        return Ok(None);
    }

    let path_sha256 = hex::encode(Sha256::digest(path.as_bytes()));
    Ok(Some(EntryInfo {
        path,
        local_header_offset,
        uncompressed_size,
        path_sha256,
    }))
}

/// One line of the optional asset index file:
/// `<sha256_hex> <size_decimal> <path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLine {
    pub sha256: String,
    pub size: u64,
    pub path: String,
}

/// Parse an asset index. Blank lines and lines starting with `#` are
/// ignored.
pub fn parse_asset_index(reader: impl BufRead) -> Result<Vec<IndexLine>, StoreError> {
    let mut lines = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.splitn(3, ' ');
        let (Some(sha256), Some(size), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(StoreError::BadIndexLine(number + 1));
        };
        let size = size
            .parse::<u64>()
            .map_err(|_| StoreError::BadIndexLine(number + 1))?;
        lines.push(IndexLine {
            sha256: sha256.to_owned(),
            size,
            path: path.to_owned(),
        });
    }
    Ok(lines)
}

/// Test fixture: builds minimal stored-only ZIP archives without pulling
/// in an archiver dependency.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::{CENTRAL_SIGNATURE, EOCD_SIGNATURE, LOCAL_SIGNATURE};
    use std::io::Write;

    /// Build a minimal stored-only ZIP in memory.
    pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();
        for (path, data) in entries {
            let local_offset = out.len() as u32;
            let name = path.as_bytes();
            // Local file header.
            out.extend_from_slice(&LOCAL_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes()); // version needed
            out.extend_from_slice(&0u16.to_le_bytes()); // flags
            out.extend_from_slice(&0u16.to_le_bytes()); // method: stored
            out.extend_from_slice(&0u32.to_le_bytes()); // time + date
            out.extend_from_slice(&0u32.to_le_bytes()); // crc (unchecked)
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // extra
            out.extend_from_slice(name);
            out.extend_from_slice(data);
            // Central directory record.
            central.extend_from_slice(&CENTRAL_SIGNATURE.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes()); // made by
            central.extend_from_slice(&20u16.to_le_bytes()); // needed
            central.extend_from_slice(&0u16.to_le_bytes()); // flags
            central.extend_from_slice(&0u16.to_le_bytes()); // method
            central.extend_from_slice(&0u32.to_le_bytes()); // time + date
            central.extend_from_slice(&0u32.to_le_bytes()); // crc
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // extra
            central.extend_from_slice(&0u16.to_le_bytes()); // comment
            central.extend_from_slice(&0u16.to_le_bytes()); // disk
            central.extend_from_slice(&0u16.to_le_bytes()); // int attrs
            central.extend_from_slice(&0u32.to_le_bytes()); // ext attrs
            central.extend_from_slice(&local_offset.to_le_bytes());
            central.extend_from_slice(name);
        }
        let cd_offset = out.len() as u32;
        out.extend_from_slice(&central);
        // End of central directory.
        out.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // disk
        out.extend_from_slice(&0u16.to_le_bytes()); // cd disk
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // comment
        out
    }

    pub(crate) fn write_zip(entries: &[(&str, &[u8])]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&build_zip(entries)).unwrap();
        file.flush().unwrap();
        file
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::write_zip;
    use super::*;
    use std::io::Write;

    #[test]
    fn open_indexes_file_entries() {
        let file = write_zip(&[
            ("Server/TagPatterns/a.json", b"{}"),
            ("Server/TagPatterns/", b""),
            ("Server/Trails/spark.json", b"{\"x\":1}"),
        ]);
        let store = AssetStore::open(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.entry("Server/TagPatterns/a.json").is_some());
        assert!(store.entry("Server/TagPatterns/").is_none());
    }

    #[test]
    fn read_returns_exact_bytes() {
        let file = write_zip(&[("dir/hello.txt", b"hello zip")]);
        let store = AssetStore::open(file.path()).unwrap();
        assert_eq!(store.read("dir/hello.txt").unwrap(), b"hello zip");
        assert!(matches!(
            store.read("missing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn hash_index_resolves() {
        let file = write_zip(&[("a/b.json", b"1")]);
        let store = AssetStore::open(file.path()).unwrap();
        let hash = hex::encode(Sha256::digest(b"a/b.json"));
        let entry = store.entry_by_hash(&hash).unwrap();
        assert_eq!(entry.path, "a/b.json");
        assert_eq!(entry.uncompressed_size, 1);
    }

    #[test]
    fn prefix_walk() {
        let file = write_zip(&[
            ("Server/Audio/AudioCategories/music.json", b"{}"),
            ("Server/Audio/AudioCategories/sfx.json", b"{}"),
            ("Server/Trails/spark.json", b"{}"),
        ]);
        let store = AssetStore::open(file.path()).unwrap();
        let audio: Vec<_> = store
            .entries_with_prefix("Server/Audio/AudioCategories/")
            .collect();
        assert_eq!(audio.len(), 2);
    }

    #[test]
    fn chunked_reads_cover_entry() {
        let body = vec![0xABu8; 1000];
        let file = write_zip(&[("big.bin", &body)]);
        let store = AssetStore::open(file.path()).unwrap();
        let entry = store.entry("big.bin").unwrap().clone();
        let mut reader = store.open_entry(&entry).unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = reader.next_chunk().unwrap() {
            collected.extend_from_slice(&chunk);
        }
        assert_eq!(collected, body);
    }

    #[test]
    fn missing_eocd_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a zip archive").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            AssetStore::open(file.path()),
            Err(StoreError::MissingEocd)
        ));
    }

    #[test]
    fn index_verification_reports_mismatches() {
        let file = write_zip(&[("a.bin", b"12345"), ("b.bin", b"x")]);
        let store = AssetStore::open(file.path()).unwrap();
        let lines = vec![
            IndexLine {
                sha256: "00".into(),
                size: 5,
                path: "a.bin".into(),
            },
            IndexLine {
                sha256: "00".into(),
                size: 9,
                path: "b.bin".into(),
            },
            IndexLine {
                sha256: "00".into(),
                size: 1,
                path: "missing.bin".into(),
            },
        ];
        assert_eq!(store.verify_index(&lines), 2);
        assert_eq!(store.verify_index(&lines[..1]), 0);
    }

    #[test]
    fn asset_index_parsing() {
        let text = "\
# comment line
abc123 42 Server/Trails/spark.json

def456 7 Server/Environments/forest.json
";
        let lines = parse_asset_index(text.as_bytes()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].size, 42);
        assert_eq!(lines[1].path, "Server/Environments/forest.json");

        assert!(parse_asset_index("not enough".as_bytes()).is_err());
        assert!(parse_asset_index("h notanumber p".as_bytes()).is_err());
    }
}
