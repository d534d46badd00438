/*!
 * Content fingerprints matching the S3 ETag algorithm
 *
 * A single-chunk object's ETag is the MD5 of its content. A multipart
 * object's ETag is the MD5 of the concatenated raw part digests, suffixed
 * with the part count. Computing the same value locally lets the sync
 * decide whether a file changed without reading remote content.
 */

use md5::{Digest, Md5};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::checksum::{md5_digest, ChunkDigest, ChunkHasher, CHUNK_SIZE};

/// Locally computed or remotely reported content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Zero-length content; has no comparable value
    Empty,

    /// Content that fits in one chunk
    Simple(ChunkDigest),

    /// Content spanning `parts` chunks
    Composite { digest: ChunkDigest, parts: usize },
}

impl Fingerprint {
    /// Fingerprint a reader using [`CHUNK_SIZE`]
    pub fn from_reader<R: Read>(reader: R) -> io::Result<Self> {
        Self::from_reader_with_chunk_size(reader, CHUNK_SIZE)
    }

    /// Fingerprint a reader with a custom chunk size
    pub fn from_reader_with_chunk_size<R: Read>(reader: R, chunk_size: usize) -> io::Result<Self> {
        let mut composer = FingerprintComposer::new();
        for digest in ChunkHasher::with_chunk_size(reader, chunk_size) {
            composer.push(digest?);
        }
        Ok(composer.finish())
    }

    /// Fingerprint a file on disk using [`CHUNK_SIZE`]
    pub fn from_file(path: &Path) -> io::Result<Self> {
        Self::from_file_with_chunk_size(path, CHUNK_SIZE)
    }

    /// Fingerprint a file on disk with a custom chunk size
    pub fn from_file_with_chunk_size(path: &Path, chunk_size: usize) -> io::Result<Self> {
        let file = BufReader::new(File::open(path)?);
        Self::from_reader_with_chunk_size(file, chunk_size)
    }

    /// Parse an ETag as reported by the store or written by [`fmt::Display`]
    ///
    /// Accepts `hex`, `"hex"`, `"hex-N"` and `"hex"-N`. Returns `None` for
    /// anything else, including the empty string.
    pub fn parse(etag: &str) -> Option<Self> {
        let body = etag.trim();
        let body = body.strip_prefix('"').unwrap_or(body);
        let body = body.strip_suffix('"').unwrap_or(body);

        match body.split_once('-') {
            None => parse_digest(body).map(Fingerprint::Simple),
            Some((hex_part, count)) => {
                let hex_part = hex_part.strip_suffix('"').unwrap_or(hex_part);
                let digest = parse_digest(hex_part)?;
                let parts: usize = count.parse().ok()?;
                if parts == 0 {
                    return None;
                }
                Some(Fingerprint::Composite { digest, parts })
            }
        }
    }

    /// Whether this is the zero-length sentinel
    pub fn is_empty(&self) -> bool {
        matches!(self, Fingerprint::Empty)
    }

    /// Number of chunks the content spans
    pub fn parts(&self) -> usize {
        match self {
            Fingerprint::Empty => 0,
            Fingerprint::Simple(_) => 1,
            Fingerprint::Composite { parts, .. } => *parts,
        }
    }

    /// ETag the store reports for content with this fingerprint
    pub fn store_etag(&self) -> String {
        match self {
            Fingerprint::Empty => format!("\"{}\"", hex::encode(md5_digest(&[]))),
            Fingerprint::Simple(digest) => format!("\"{}\"", hex::encode(digest)),
            Fingerprint::Composite { digest, parts } => {
                format!("\"{}-{}\"", hex::encode(digest), parts)
            }
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Empty => Ok(()),
            Fingerprint::Simple(digest) => write!(f, "{}", hex::encode(digest)),
            Fingerprint::Composite { digest, parts } => {
                write!(f, "\"{}\"-{}", hex::encode(digest), parts)
            }
        }
    }
}

fn parse_digest(hex_str: &str) -> Option<ChunkDigest> {
    let mut out = [0u8; 16];
    hex::decode_to_slice(hex_str, &mut out).ok()?;
    Some(out)
}

/// Reduces an ordered digest sequence into a [`Fingerprint`]
///
/// Digests are folded as they arrive, so composing a large file needs
/// constant memory.
#[derive(Default)]
pub struct FingerprintComposer {
    outer: Md5,
    first: Option<ChunkDigest>,
    parts: usize,
}

impl FingerprintComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next chunk digest in stream order
    pub fn push(&mut self, digest: ChunkDigest) {
        if self.first.is_none() {
            self.first = Some(digest);
        }
        self.outer.update(digest);
        self.parts += 1;
    }

    pub fn finish(self) -> Fingerprint {
        match (self.parts, self.first) {
            (1, Some(digest)) => Fingerprint::Simple(digest),
            (0, _) | (_, None) => Fingerprint::Empty,
            (parts, Some(_)) => {
                let mut digest = [0u8; 16];
                digest.copy_from_slice(&self.outer.finalize());
                Fingerprint::Composite { digest, parts }
            }
        }
    }
}

/// Compose a fingerprint from an ordered digest sequence
pub fn compose<I>(digests: I) -> Fingerprint
where
    I: IntoIterator<Item = ChunkDigest>,
{
    let mut composer = FingerprintComposer::new();
    for digest in digests {
        composer.push(digest);
    }
    composer.finish()
}
