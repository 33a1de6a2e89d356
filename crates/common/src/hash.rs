//! Hashing utilities for integrity verification.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size used when streaming file content.
pub const CHUNK_SIZE: usize = 8192;

/// Digest and byte count of a streamed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub sha256: String,
    pub size: u64,
}

/// Compute SHA256 hash of bytes.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of a reader, along with the number of bytes read.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<FileDigest> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut size = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
        size += n as u64;
    }
    Ok(FileDigest {
        sha256: hex::encode(hasher.finalize()),
        size,
    })
}

/// Compute SHA256 hash of a file on disk.
///
/// Any open or read failure is reported as [`Error::Io`].
pub fn sha256_file(path: &Path) -> Result<FileDigest> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    sha256_reader(file).map_err(|e| Error::io(path, e))
}

/// A reader that hashes everything passing through it.
///
/// Used to re-hash evidence while it is being copied into an archive, so
/// the archived bytes are checked without a second read.
pub struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
    size: u64,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            size: 0,
        }
    }

    /// Consume the reader and return the digest of the bytes read so far.
    pub fn finish(self) -> FileDigest {
        FileDigest {
            sha256: hex::encode(self.hasher.finalize()),
            size: self.size,
        }
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.size += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_bytes() {
        let hash = sha256_bytes(b"hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(sha256_bytes(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_sha256_reader_spans_chunks() {
        let data = vec![0xabu8; CHUNK_SIZE * 3 + 17];
        let digest = sha256_reader(data.as_slice()).unwrap();
        assert_eq!(digest.size, data.len() as u64);
        assert_eq!(digest.sha256, sha256_bytes(&data));
    }

    #[test]
    fn test_sha256_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();

        let digest = sha256_file(file.path()).unwrap();
        assert_eq!(digest.sha256, HELLO_SHA256);
        assert_eq!(digest.size, 5);
    }

    #[test]
    fn test_sha256_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha256_file(&dir.path().join("gone.bin")).unwrap_err();
        assert_eq!(err.kind(), "IOError");
    }

    #[test]
    fn test_hashing_reader_matches_direct_hash() {
        let mut reader = HashingReader::new(&b"hello"[..]);
        let mut sink = Vec::new();
        io::copy(&mut reader, &mut sink).unwrap();

        let digest = reader.finish();
        assert_eq!(sink, b"hello");
        assert_eq!(digest.sha256, HELLO_SHA256);
        assert_eq!(digest.size, 5);
    }
}
