//! gzip member-name extraction.
//!
//! A gzip stream holds at most one member name, and only when FLG.FNAME is
//! set. Without it we fall back to deriving a name from the surrounding
//! container's filename (`report.pdf.gz` → `report.pdf`). Either way the
//! payload is never inflated.

use log::*;
use memchr::memchr;

use crate::cursor::Cursor;
use crate::names::{normalize_name, MAX_NAME_LEN};
use crate::read::{Archive, ArchiveFile, ArchiveType, ReadContext};
use crate::result::*;

const GZ_MAGIC: [u8; 2] = [0x1F, 0x8B];
/// Fixed header: magic, method, flags, mtime, xfl, os.
const GZ_BASE_LEN: usize = 10;

// FLG bits
const FLG_MULTIPART: u8 = 1 << 1;
const FLG_EXTRA: u8 = 1 << 2;
const FLG_NAME: u8 = 1 << 3;
/// Reserved in RFC 1952; the pre-RFC "encrypted" bit.
const FLG_ENCRYPTED: u8 = 1 << 5;

pub(crate) fn read<'a>(data: &[u8], ctx: &ReadContext<'a>) -> ArcResult<Archive<'a>> {
    if data.len() <= GZ_BASE_LEN || !data.starts_with(&GZ_MAGIC) {
        debug!("gzip archive is invalid (no gzip magic)");
        return Err(ArcError::BadMagic("not a gzip stream"));
    }

    let mut archive = Archive::new(ArchiveType::Gzip, data.len(), ctx);
    let flags = data[3];

    if flags & FLG_ENCRYPTED != 0 {
        archive.encrypted = true;
    }

    if flags & FLG_NAME != 0 {
        let mut cur = Cursor::new(data);
        // Multipart streams carry a part number after the fixed header.
        let fixed = if flags & FLG_MULTIPART != 0 {
            GZ_BASE_LEN + 2
        } else {
            GZ_BASE_LEN
        };
        cur.seek_to(fixed, "gzip header")?;

        if flags & FLG_EXTRA != 0 {
            let xlen = cur.read_u16("gzip extra length")? as usize;
            cur.skip(xlen, "gzip extra field")?;
        }

        let rest = cur.rest();
        let name_len = match memchr(0, rest) {
            Some(0) | None => {
                debug!("gzip archive is invalid (bad filename)");
                return Err(ArcError::InvalidArchive("bad gzip filename"));
            }
            Some(nul) => nul,
        };
        if name_len > MAX_NAME_LEN {
            return Err(ArcError::TooLarge("gzip filename length"));
        }

        let normalized = normalize_name(&rest[..name_len], ctx.charset, ctx.archive_name);
        debug!("found file in gzip archive: {}", normalized.name);
        archive.push_file(ArchiveFile {
            name: normalized.name,
            compressed_size: 0,
            uncompressed_size: 0,
            encrypted: false,
            obfuscated: normalized.obfuscated,
        });
        return Ok(archive);
    }

    // No FNAME: derive the member name from the container's filename.
    // When that's impossible the archive is still attached, just empty.
    if let Some(derived) = ctx.archive_name.and_then(derive_member_name) {
        debug!("fallback to gzip filename based on container: {derived}");
        archive.push_file(ArchiveFile {
            name: derived,
            compressed_size: 0,
            uncompressed_size: 0,
            encrypted: false,
            obfuscated: false,
        });
    }

    Ok(archive)
}

/// Strips the directory component and the final extension from a container
/// filename: `mail/report.pdf.gz` → `report.pdf`. A name whose only dot is
/// the final one is kept whole.
fn derive_member_name(container: &str) -> Option<String> {
    let dot = container.rfind('.')?;

    match container.rfind('/') {
        Some(slash) if slash < dot => Some(container[slash + 1..dot].to_owned()),
        _ => {
            if container.find('.') != Some(dot) {
                // Double dots, something like foo.exe.gz
                Some(container[..dot].to_owned())
            } else {
                // Single dot, something like foo.gzz
                Some(container.to_owned())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::read::ReadContext;

    fn header(flags: u8) -> Vec<u8> {
        let mut data = GZ_MAGIC.to_vec();
        data.push(0x08); // deflate
        data.push(flags);
        data.extend_from_slice(&[0u8; 6]); // mtime, xfl, os
        data
    }

    #[test]
    fn rejects_non_gzip() {
        let ctx = ReadContext::default();
        assert!(matches!(
            read(b"BZh9 definitely not gzip", &ctx),
            Err(ArcError::BadMagic(_))
        ));
    }

    #[test]
    fn reads_embedded_filename() {
        let ctx = ReadContext::default();
        let mut data = header(FLG_NAME);
        data.extend_from_slice(b"doc.pdf\0");
        data.extend_from_slice(&[0xAA; 4]); // payload

        let archive = read(&data, &ctx).unwrap();
        assert_eq!(archive.archive_type, ArchiveType::Gzip);
        assert_eq!(archive.files.len(), 1);
        assert_eq!(archive.files[0].name, "doc.pdf");
    }

    #[test]
    fn skips_fextra_before_filename() {
        let ctx = ReadContext::default();
        let mut data = header(FLG_NAME | FLG_EXTRA);
        data.extend_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(&[0xEE; 3]);
        data.extend_from_slice(b"inner\0");

        let archive = read(&data, &ctx).unwrap();
        assert_eq!(archive.files[0].name, "inner");
    }

    #[test]
    fn rejects_unterminated_filename() {
        let ctx = ReadContext::default();
        let mut data = header(FLG_NAME);
        data.extend_from_slice(b"never-ends");
        assert!(matches!(
            read(&data, &ctx),
            Err(ArcError::InvalidArchive(_))
        ));
    }

    #[test]
    fn encrypted_bit_sets_archive_flag() {
        let ctx = ReadContext::default();
        let mut data = header(FLG_ENCRYPTED);
        data.extend_from_slice(&[0u8; 4]);
        let archive = read(&data, &ctx).unwrap();
        assert!(archive.encrypted);
    }

    #[test]
    fn falls_back_to_container_filename() {
        let ctx = ReadContext {
            archive_name: Some("mail/report.pdf.gz"),
            ..ReadContext::default()
        };
        let mut data = header(0);
        data.extend_from_slice(&[0u8; 4]);

        let archive = read(&data, &ctx).unwrap();
        assert_eq!(archive.files.len(), 1);
        assert_eq!(archive.files[0].name, "report.pdf");
    }

    #[test]
    fn double_dot_container_keeps_inner_extension() {
        let ctx = ReadContext {
            archive_name: Some("payload.exe.gz"),
            ..ReadContext::default()
        };
        let mut data = header(0);
        data.extend_from_slice(&[0u8; 4]);
        assert_eq!(read(&data, &ctx).unwrap().files[0].name, "payload.exe");
    }

    #[test]
    fn no_fallback_attaches_empty_archive() {
        let ctx = ReadContext::default();
        let mut data = header(0);
        data.extend_from_slice(&[0u8; 4]);

        let archive = read(&data, &ctx).unwrap();
        assert!(archive.files.is_empty());
        assert_eq!(archive.size, data.len() as u64);
    }
}
