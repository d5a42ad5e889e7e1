//! Archive metadata types and the format dispatcher.
//!
//! To inspect a blob, pick a [`FormatHint`] (usually from the attachment's
//! detected extension) and call [`read_archive`]:
//!
//! ```
//! use arcprobe::read::*;
//!
//! let ctx = ReadContext::default();
//! match read_archive(b"not a zip", FormatHint::Zip, &ctx) {
//!     Ok(archive) => println!("{} members", archive.files.len()),
//!     Err(err) => println!("rejected: {err}"),
//! }
//! ```
//!
//! Readers extract metadata only: member names, sizes, and encryption /
//! obfuscation flags. Nothing is ever decompressed. Parsing is
//! all-or-nothing; a malformed structure rejects the whole input and no
//! partial [`Archive`] escapes.

use log::*;

use crate::names::{CharsetDetector, NoDetection};
use crate::result::*;
use crate::sevenzip::EncodedHeaderReader;
use crate::{gzip, rar, sevenzip, zip};

/// The container format a blob was identified as.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArchiveType {
    Zip,
    Rar,
    SevenZip,
    Gzip,
}

impl ArchiveType {
    /// Short lowercase form used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveType::Zip => "zip",
            ArchiveType::Rar => "rar",
            ArchiveType::SevenZip => "7z",
            ArchiveType::Gzip => "gz",
        }
    }
}

impl std::fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one member of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    /// Normalized UTF-8 member name.
    pub name: String,

    /// Compressed size in bytes, as declared by the archive.
    pub compressed_size: u64,

    /// Uncompressed size in bytes, as declared by the archive.
    pub uncompressed_size: u64,

    /// The member is marked encrypted.
    pub encrypted: bool,

    /// The member name contains control or zero-width characters.
    pub obfuscated: bool,
}

/// An identified archive and the metadata of its members.
///
/// Produced by exactly one reader invocation and immutable afterwards.
/// `files` preserves archive order.
#[derive(Debug)]
pub struct Archive<'a> {
    pub archive_type: ArchiveType,
    pub files: Vec<ArchiveFile>,

    /// The archive itself is encrypted (encrypted headers, or — for RAR5
    /// and 7-Zip — any encrypted member).
    pub encrypted: bool,

    /// At least one member name is obfuscated.
    pub has_obfuscated_files: bool,

    /// Length of the source blob.
    pub size: u64,

    /// Filename of the surrounding container, when the host knows it.
    pub archive_name: Option<&'a str>,
}

impl<'a> Archive<'a> {
    pub(crate) fn new(archive_type: ArchiveType, input_len: usize, ctx: &ReadContext<'a>) -> Self {
        Self {
            archive_type,
            files: Vec::new(),
            encrypted: false,
            has_obfuscated_files: false,
            size: input_len as u64,
            archive_name: ctx.archive_name,
        }
    }

    /// Appends a member, folding its obfuscation flag into the archive.
    pub(crate) fn push_file(&mut self, file: ArchiveFile) {
        if file.obfuscated {
            self.has_obfuscated_files = true;
        }
        self.files.push(file);
    }
}

/// Collaborators and context a reader invocation needs from the host.
pub struct ReadContext<'a> {
    /// Filename of the surrounding container (e.g. the MIME part name).
    pub archive_name: Option<&'a str>,

    /// Charset detection and conversion for member names.
    pub charset: &'a dyn CharsetDetector,

    /// External 7-Zip reader used for `kEncodedHeader` archives.
    pub sevenz: Option<&'a dyn EncodedHeaderReader>,
}

impl Default for ReadContext<'_> {
    fn default() -> Self {
        Self {
            archive_name: None,
            charset: &NoDetection,
            sevenz: None,
        }
    }
}

/// Which parser to run, usually derived from a filename extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FormatHint {
    Zip,
    Rar,
    SevenZip,
    Gzip,
}

impl FormatHint {
    /// Maps a filename extension to a hint (`zip`, `rar`, `7z`, `gz`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("zip") {
            Some(FormatHint::Zip)
        } else if ext.eq_ignore_ascii_case("rar") {
            Some(FormatHint::Rar)
        } else if ext.eq_ignore_ascii_case("7z") {
            Some(FormatHint::SevenZip)
        } else if ext.eq_ignore_ascii_case("gz") {
            Some(FormatHint::Gzip)
        } else {
            None
        }
    }
}

/// Parses `data` with the reader selected by `hint`.
pub fn read_archive<'a>(
    data: &[u8],
    hint: FormatHint,
    ctx: &ReadContext<'a>,
) -> ArcResult<Archive<'a>> {
    match hint {
        FormatHint::Zip => zip::read(data, ctx),
        FormatHint::Rar => rar::read(data, ctx),
        FormatHint::SevenZip => sevenzip::read(data, ctx),
        FormatHint::Gzip => gzip::read(data, ctx),
    }
}

/// What the host declared about a message part.
pub struct PartInfo<'a> {
    /// Detected filename extension, if any.
    pub extension: Option<&'a str>,

    /// Declared content type, if any.
    pub content_type: Option<&'a str>,
}

/// Result of inspecting one message part.
pub struct Inspection<'a> {
    pub archive: Archive<'a>,

    /// The part claimed to be text but parsed as an archive; the host
    /// should mark its content type broken.
    pub content_type_broken: bool,
}

/// Inspects a message part: resolves the format hint from the declared
/// extension, runs the reader, and reports a content-type mismatch.
///
/// Returns `None` when there is no usable hint or the reader rejects the
/// data — nothing is attached in either case.
pub fn inspect_part<'a>(
    data: &[u8],
    part: &PartInfo<'_>,
    ctx: &ReadContext<'a>,
) -> Option<Inspection<'a>> {
    let hint = FormatHint::from_extension(part.extension?)?;

    let archive = match read_archive(data, hint, ctx) {
        Ok(archive) => archive,
        Err(err) => {
            debug!("part is not a readable archive: {err}");
            return None;
        }
    };

    let content_type_broken = part.content_type.is_some_and(|ct| {
        let ct = ct.trim_start().as_bytes();
        ct.len() >= 5 && ct[..5].eq_ignore_ascii_case(b"text/")
    });

    if content_type_broken {
        info!(
            "found {} archive with incorrect content-type: {}",
            archive.archive_type,
            part.content_type.unwrap_or_default()
        );
    }

    Some(Inspection {
        archive,
        content_type_broken,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hint_from_extension() {
        assert_eq!(FormatHint::from_extension("ZIP"), Some(FormatHint::Zip));
        assert_eq!(FormatHint::from_extension("rar"), Some(FormatHint::Rar));
        assert_eq!(FormatHint::from_extension("7z"), Some(FormatHint::SevenZip));
        assert_eq!(FormatHint::from_extension("gz"), Some(FormatHint::Gzip));
        assert_eq!(FormatHint::from_extension("tar"), None);
    }

    #[test]
    fn inspect_rejects_hintless_parts() {
        let ctx = ReadContext::default();
        let part = PartInfo {
            extension: None,
            content_type: Some("application/zip"),
        };
        assert!(inspect_part(b"PK", &part, &ctx).is_none());
    }
}
