//! arcprobe inspects mail-borne archives without extracting them, and
//! builds ZIP archives of its own:
//!
//! ```
//! use arcprobe::read::{read_archive, FormatHint, ReadContext};
//! use arcprobe::write::{write_zip, ZipFileSpec};
//!
//! // Synthesize a ZIP from in-memory entries...
//! let files = [ZipFileSpec { name: "hi.txt", data: b"hello", mtime: 0, mode: 0 }];
//! let bytes = write_zip(&files, None, None)?;
//!
//! // ...and enumerate an archive's members without decompressing anything.
//! let ctx = ReadContext::default();
//! let archive = read_archive(&bytes, FormatHint::Zip, &ctx)?;
//! assert_eq!(archive.files[0].name, "hi.txt");
//! # Ok::<(), arcprobe::result::ArcError>(())
//! ```
//!
//! The readers cover ZIP, RAR (v4 and v5), 7-Zip, and gzip. They parse
//! just enough of each format to list member names and a few flags
//! (encrypted, obfuscated name) — attachment triage, not extraction.
//! Offsets, counts, and lengths in these formats are attacker-controlled,
//! so every walk is bounded: short reads, runaway variable-length
//! integers, and absurd declared counts all reject the input cleanly.
//!
//! The writer produces ZIP archives with DEFLATE (falling back to stored)
//! and optional WinZip-AES AE-2 encryption, plus a standalone
//! AES-256-CBC envelope format. Crypto primitives and charset detection
//! are injected interfaces; the stock [`crypto::OsCrypto`] covers hosts
//! without their own crypto library.

pub mod crypto;
pub mod names;
pub mod read;
pub mod result;
pub mod write;

pub use read::{read_archive, Archive, ArchiveFile, ArchiveType, FormatHint, ReadContext};
pub use write::{write_envelope, write_zip, ZipFileSpec};

mod cursor;
mod gzip;
mod rar;
mod sevenzip;
mod zip;

pub use sevenzip::EncodedHeaderReader;
