/*!
 * Fixed-size chunk hashing compatible with S3 multipart boundaries
 */

use md5::{Digest, Md5};
use std::io::{self, Read};

/// Chunk size shared by fingerprinting and multipart uploads (8 MiB).
///
/// Must equal the multipart threshold and part size used when uploading,
/// otherwise the store assigns ETags that never match local fingerprints.
pub const CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Raw 128-bit MD5 digest of one chunk
pub type ChunkDigest = [u8; 16];

/// Streaming hasher yielding one digest per fixed-size chunk, in stream order
///
/// Only one chunk is held in memory at a time. The final chunk may be shorter
/// than the chunk size. A read error is yielded once and ends the iteration.
pub struct ChunkHasher<R> {
    reader: R,
    chunk_size: usize,
    buffer: Vec<u8>,
    done: bool,
}

impl<R: Read> ChunkHasher<R> {
    /// Create a chunk hasher using [`CHUNK_SIZE`]
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, CHUNK_SIZE)
    }

    /// Create a chunk hasher with a custom chunk size
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            buffer: Vec::new(),
            done: false,
        }
    }
}

impl<R: Read> Iterator for ChunkHasher<R> {
    type Item = io::Result<ChunkDigest>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buffer.clear();
        let limit = self.chunk_size as u64;
        match (&mut self.reader).take(limit).read_to_end(&mut self.buffer) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => Some(Ok(md5_digest(&self.buffer))),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// MD5 digest of a byte slice
pub fn md5_digest(data: &[u8]) -> ChunkDigest {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Md5::digest(data));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_md5_digest() {
        // MD5 of "hello"
        assert_eq!(
            hex::encode(md5_digest(b"hello")),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        let hasher = ChunkHasher::new(Cursor::new(Vec::new()));
        assert_eq!(hasher.count(), 0);
    }

    #[test]
    fn test_chunks_in_stream_order() {
        let digests: Vec<_> = ChunkHasher::with_chunk_size(Cursor::new(b"abcdefghij".to_vec()), 4)
            .collect::<io::Result<_>>()
            .unwrap();

        assert_eq!(digests.len(), 3);
        assert_eq!(digests[0], md5_digest(b"abcd"));
        assert_eq!(digests[1], md5_digest(b"efgh"));
        assert_eq!(digests[2], md5_digest(b"ij"));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_chunk() {
        let hasher = ChunkHasher::with_chunk_size(Cursor::new(vec![7u8; 8]), 4);
        assert_eq!(hasher.count(), 2);
    }

    /// Reader that hands out data in tiny pieces to exercise short reads
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_short_reads_fill_whole_chunks() {
        let reader = Trickle {
            data: b"0123456789".to_vec(),
            pos: 0,
        };
        let digests: Vec<_> = ChunkHasher::with_chunk_size(reader, 5)
            .collect::<io::Result<_>>()
            .unwrap();

        assert_eq!(digests, vec![md5_digest(b"01234"), md5_digest(b"56789")]);
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_read_error_propagates_and_stops() {
        let mut hasher = ChunkHasher::new(Failing);
        let err = hasher.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(hasher.next().is_none());
    }
}
