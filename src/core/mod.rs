/*!
 * Core sync engine: chunk hashing, ETag fingerprints, tree walking,
 * manifest loading and the sync orchestrator
 */

pub mod checksum;
pub mod etag;
pub mod manifest;
pub mod sync;
pub mod walker;

pub use checksum::{ChunkDigest, ChunkHasher, CHUNK_SIZE};
pub use etag::{compose, Fingerprint, FingerprintComposer};
pub use manifest::Manifest;
pub use sync::{
    content_type_for, decide, Decision, FileReport, Outcome, SyncReport, Syncer, UploadReason,
};
pub use walker::{FileEntry, IgnoreSet, TreeWalker};
