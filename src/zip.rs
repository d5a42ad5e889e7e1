//! ZIP central-directory metadata reader.
//!
//! Most comments quote the ZIP spec, [`APPNOTE.TXT`].
//!
//! A ZIP archive keeps the interesting data at its back: the End of central
//! directory record points at the central directory, and each central
//! directory file header carries everything we need — the member name,
//! declared sizes, and the encryption bits. The local headers and the
//! compressed payloads are never touched.
//!
//! [`APPNOTE.TXT`]: https://pkware.cachefly.net/webdocs/APPNOTE/APPNOTE-6.3.6.TXT

use log::*;
use memchr::memmem;

use crate::cursor::Cursor;
use crate::names::normalize_name;
use crate::read::{Archive, ArchiveFile, ArchiveType, ReadContext};
use crate::result::*;

/// End of central directory magic number
const EOCD_MAGIC: [u8; 4] = [b'P', b'K', 5, 6];
/// Central directory file header magic number
const CDFH_MAGIC: [u8; 4] = [b'P', b'K', 1, 2];

/// Fixed part of a central directory file header.
const CDFH_BASE_LEN: usize = 46;
/// An EOCD with an empty comment.
const EOCD_BASE_LEN: usize = 22;

/// How many candidate positions the backward EOCD scan may visit.
/// The comment field caps the nominal search at 21 + 65535 bytes, but a
/// hostile blob shouldn't cost us that much work.
const MAX_EOCD_CANDIDATES: usize = 1024;

/// Extra field id for PKWARE strong encryption.
const EXTRA_ID_STRONG_ENCRYPTION: u16 = 0x0017;

/// Searches backward from the end of `data` for the EOCD record.
fn find_eocd(data: &[u8]) -> ArcResult<usize> {
    if data.len() < EOCD_BASE_LEN {
        return Err(ArcError::NoEocd);
    }
    // Start where a comment-less EOCD would sit and give the magic a
    // bounded window to appear in.
    let window_start = data
        .len()
        .saturating_sub(EOCD_BASE_LEN + MAX_EOCD_CANDIDATES);
    let window_end = data.len() - EOCD_BASE_LEN + EOCD_MAGIC.len();

    memmem::rfind(&data[window_start..window_end], &EOCD_MAGIC)
        .map(|pos| window_start + pos)
        .ok_or(ArcError::NoEocd)
}

pub(crate) fn read<'a>(data: &[u8], ctx: &ReadContext<'a>) -> ArcResult<Archive<'a>> {
    let eocd_pos = find_eocd(data)?;

    // 4.3.16: we only need the central directory size (offset +12)
    // and its offset from the start of the archive (+16).
    let mut eocd = Cursor::new(data);
    eocd.seek_to(eocd_pos + 12, "eocd")?;
    let cd_size = eocd.read_u32("eocd cd size")? as usize;
    let cd_offset = eocd.read_u32("eocd cd offset")? as usize;

    // The whole central directory must sit before the EOCD.
    let cd_end = match cd_offset.checked_add(cd_size) {
        Some(end) if end <= eocd_pos => end,
        _ => {
            info!("zip archive is invalid (bad size/offset for CD)");
            return Err(ArcError::BadCdExtent);
        }
    };

    let mut archive = Archive::new(ArchiveType::Zip, data.len(), ctx);
    let mut pos = cd_offset;

    while pos < cd_end {
        // 4.3.12 Central directory structure, fixed part:
        //
        //   central file header signature   4 bytes  (0x02014b50)
        //   version made by                 2 bytes
        //   version needed to extract       2 bytes
        //   general purpose bit flag        2 bytes
        //   compression method              2 bytes
        //   last mod file time              2 bytes
        //   last mod file date              2 bytes
        //   crc-32                          4 bytes
        //   compressed size                 4 bytes
        //   uncompressed size               4 bytes
        //   file name length                2 bytes
        //   extra field length              2 bytes
        //   file comment length             2 bytes
        //   disk number start               2 bytes
        //   internal file attributes        2 bytes
        //   external file attributes        4 bytes
        //   relative offset of local header 4 bytes
        if eocd_pos - pos < CDFH_BASE_LEN || data[pos..pos + 4] != CDFH_MAGIC {
            info!("zip archive is invalid (bad cd record)");
            return Err(ArcError::InvalidArchive("bad central directory record"));
        }

        let mut rec = Cursor::new(data);
        rec.seek_to(pos + 8, "cd record")?;
        let gp_flags = rec.read_u16("cd flags")?;
        rec.skip(10, "cd record")?;
        let compressed_size = rec.read_u32("cd compressed size")?;
        let uncompressed_size = rec.read_u32("cd uncompressed size")?;
        let fname_len = rec.read_u16("cd name length")? as usize;
        let extra_len = rec.read_u16("cd extra length")? as usize;
        let comment_len = rec.read_u16("cd comment length")? as usize;

        let record_len = CDFH_BASE_LEN + fname_len + extra_len + comment_len;
        if pos + record_len > eocd_pos {
            info!("zip archive is invalid (too large cd record)");
            return Err(ArcError::InvalidArchive("central directory record crosses EOCD"));
        }

        let name_bytes = &data[pos + CDFH_BASE_LEN..pos + CDFH_BASE_LEN + fname_len];
        let normalized = normalize_name(name_bytes, ctx.charset, ctx.archive_name);

        // Bit 0 is standard encryption, bit 6 strong encryption.
        let mut encrypted = gp_flags & 0x41 != 0;

        // The strong-encryption extra field also marks the entry.
        let extra_start = pos + CDFH_BASE_LEN + fname_len;
        let mut extra = Cursor::new(&data[extra_start..extra_start + extra_len]);
        while extra.remaining() >= 4 {
            let id = extra.read_u16("extra field id")?;
            let len = extra.read_u16("extra field length")? as usize;
            if id == EXTRA_ID_STRONG_ENCRYPTION {
                encrypted = true;
            }
            if extra.remaining() < len {
                break;
            }
            extra.skip(len, "extra field payload")?;
        }

        debug!("found file in zip archive: {}", normalized.name);
        archive.push_file(ArchiveFile {
            name: normalized.name,
            compressed_size: u64::from(compressed_size),
            uncompressed_size: u64::from(uncompressed_size),
            encrypted,
            obfuscated: normalized.obfuscated,
        });

        pos += record_len;
    }

    // Per-entry encryption deliberately doesn't set the archive flag for
    // ZIP; consumers can compute it from the member list.
    Ok(archive)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::read::ReadContext;

    fn eocd(cd_size: u32, cd_offset: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&EOCD_MAGIC);
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn rejects_input_without_eocd() {
        let ctx = ReadContext::default();
        assert!(matches!(
            read(b"definitely not a zip archive", &ctx),
            Err(ArcError::NoEocd)
        ));
        assert!(matches!(read(b"PK", &ctx), Err(ArcError::NoEocd)));
    }

    #[test]
    fn accepts_empty_central_directory() {
        let ctx = ReadContext::default();
        let archive = read(&eocd(0, 0), &ctx).unwrap();
        assert_eq!(archive.archive_type, ArchiveType::Zip);
        assert!(archive.files.is_empty());
        assert_eq!(archive.size, EOCD_BASE_LEN as u64);
        assert!(!archive.encrypted);
    }

    #[test]
    fn rejects_bad_cd_extent() {
        let ctx = ReadContext::default();
        // Claims a central directory bigger than everything before the EOCD.
        let mut data = vec![0u8; 10];
        data.extend_from_slice(&eocd(100, 0));
        assert!(matches!(read(&data, &ctx), Err(ArcError::BadCdExtent)));
    }

    #[test]
    fn rejects_garbage_central_directory() {
        let ctx = ReadContext::default();
        let mut data = vec![0xAAu8; 46];
        data.extend_from_slice(&eocd(46, 0));
        assert!(matches!(
            read(&data, &ctx),
            Err(ArcError::InvalidArchive(_))
        ));
    }
}
