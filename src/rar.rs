//! RAR metadata reader, covering the v4 and v5 on-disk formats.
//!
//! The two generations share nothing but the first six magic bytes: v4 is a
//! chain of fixed-layout records with bit-flagged optional fields, v5 is a
//! tree of variable-length integers (see
//! <http://www.rarlab.com/technote.htm>). Both walkers only hop from record
//! to record collecting names and sizes; packed data is skipped wholesale.

use log::*;
use memchr::memchr;

use crate::cursor::Cursor;
use crate::names::{normalize_name, MAX_NAME_LEN};
use crate::read::{Archive, ArchiveFile, ArchiveType, ReadContext};
use crate::result::*;

const RAR_V5_MAGIC: [u8; 8] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x01, 0x00];
const RAR_V4_MAGIC: [u8; 7] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];

// v4 record types
const V4_MAIN_HEADER: u8 = 0x73;
const V4_FILE_HEADER: u8 = 0x74;

// v5 header types
const V5_MAIN_HEADER: u64 = 1;
const V5_FILE_HEADER: u64 = 2;
const V5_ENCRYPTION_HEADER: u64 = 4;

/// v5 extra-area record carrying file encryption parameters.
const V5_EXTRA_CRYPT: u64 = 0x01;

pub(crate) fn read<'a>(data: &[u8], ctx: &ReadContext<'a>) -> ArcResult<Archive<'a>> {
    if data.starts_with(&RAR_V5_MAGIC) {
        read_v5(data, ctx)
    } else if data.starts_with(&RAR_V4_MAGIC) {
        read_v4(data, ctx)
    } else {
        debug!("rar archive is invalid (no rar magic)");
        Err(ArcError::BadMagic("not a rar archive"))
    }
}

/// Walks RAR v4 records:
/// `crc16 | type:u8 | flags:u16 | size:u16 | [add_size:u32 if flags & 0x8000]`.
fn read_v4<'a>(data: &[u8], ctx: &ReadContext<'a>) -> ArcResult<Archive<'a>> {
    let mut archive = Archive::new(ArchiveType::Rar, data.len(), ctx);
    let mut cur = Cursor::new(data);
    cur.skip(RAR_V4_MAGIC.len(), "rar4 magic")?;

    while !cur.is_empty() {
        let record_start = cur.position();
        cur.skip(2, "rar4 record crc")?;
        let rtype = cur.read_u8("rar4 record type")?;
        let flags = cur.read_u16("rar4 record flags")?;

        if rtype == V4_MAIN_HEADER && flags & 0x80 != 0 {
            // Encrypted block headers: nothing more can be read.
            debug!("rar4: encrypted archive headers");
            archive.encrypted = true;
            return Ok(archive);
        }

        let mut record_len = u64::from(cur.read_u16("rar4 record size")?);
        let mut comp_size = 0u64;
        if flags & 0x8000 != 0 {
            // ADD_SIZE follows, doubling as PACK_SIZE for file headers.
            let add = u64::from(cur.read_u32("rar4 add size")?);
            record_len += add;
            comp_size = add;
        }

        if record_len == 0 {
            debug!("rar archive is invalid (zero size block)");
            return Err(ArcError::InvalidArchive("zero-sized rar4 block"));
        }

        if rtype == V4_FILE_HEADER {
            let mut uncomp_size = u64::from(cur.read_u32("rar4 unpacked size")?);
            // HOST_OS, FILE_CRC, FTIME, UNP_VER, METHOD
            cur.skip(11, "rar4 file header")?;
            let fname_len = cur.read_u16("rar4 name size")? as usize;
            cur.skip(4, "rar4 attrs")?;

            if fname_len == 0 {
                debug!("rar archive is invalid (bad filename size)");
                return Err(ArcError::InvalidArchive("empty rar4 filename"));
            }
            if fname_len > MAX_NAME_LEN {
                return Err(ArcError::TooLarge("rar4 filename length"));
            }

            if flags & 0x100 != 0 {
                // 64-bit sizes: HIGH_PACK_SIZE and HIGH_UNP_SIZE.
                let high_pack = u64::from(cur.read_u32("rar4 high pack size")?);
                record_len += high_pack << 32;
                comp_size += high_pack << 32;
                let high_unp = u64::from(cur.read_u32("rar4 high unpacked size")?);
                uncomp_size += high_unp << 32;
            }

            let name_bytes = cur.take(fname_len, "rar4 filename")?;
            let raw_name = if flags & 0x200 != 0 {
                // Unicode name: a zero-terminated legacy segment followed by
                // an encoded one. With no NUL the whole thing is UTF-8.
                match memchr(0, name_bytes) {
                    Some(nul) => &name_bytes[..nul],
                    None => name_bytes,
                }
            } else {
                name_bytes
            };

            let normalized = normalize_name(raw_name, ctx.charset, ctx.archive_name);
            debug!("found file in rar4 archive: {}", normalized.name);
            archive.push_file(ArchiveFile {
                name: normalized.name,
                compressed_size: comp_size,
                uncompressed_size: uncomp_size,
                encrypted: flags & 0x4 != 0,
                obfuscated: normalized.obfuscated,
            });
        }

        advance_record(&mut cur, record_start, record_len)?;
    }

    Ok(archive)
}

/// Walks RAR v5 headers:
/// `crc32 | size:vint | type:vint | hflags:vint | [extra_size] | [data_size]`.
fn read_v5<'a>(data: &[u8], ctx: &ReadContext<'a>) -> ArcResult<Archive<'a>> {
    let mut archive = Archive::new(ArchiveType::Rar, data.len(), ctx);
    let mut cur = Cursor::new(data);
    cur.skip(RAR_V5_MAGIC.len(), "rar5 magic")?;

    // The first header is either the encryption header or the main archive
    // header; nothing useful lives in either.
    cur.skip(4, "rar5 header crc")?;
    let size = cur.read_rar_vint("rar5 header size")?;
    let section_start = cur.position();
    let htype = cur.read_rar_vint("rar5 header type")?;
    let hflags = cur.read_rar_vint("rar5 header flags")?;
    let mut record_len = size;
    if hflags & 0x1 != 0 {
        cur.read_rar_vint("rar5 extra size")?;
    }
    if hflags & 0x2 != 0 {
        record_len += cur.read_rar_vint("rar5 data size")?;
    }

    if htype == V5_ENCRYPTION_HEADER {
        // Everything past this point is ciphertext.
        debug!("rar5: encrypted archive headers");
        archive.encrypted = true;
        return Ok(archive);
    }
    if htype != V5_MAIN_HEADER {
        debug!("rar archive is invalid (bad main header)");
        return Err(ArcError::InvalidArchive("bad rar5 main header"));
    }

    advance_record(&mut cur, section_start, record_len)?;

    while !cur.is_empty() {
        cur.skip(4, "rar5 header crc")?;
        let size = cur.read_rar_vint("rar5 header size")?;
        if size == 0 {
            debug!("rar archive is invalid (zero size block)");
            return Err(ArcError::InvalidArchive("zero-sized rar5 block"));
        }

        let section_start = cur.position();
        let htype = cur.read_rar_vint("rar5 header type")?;
        let hflags = cur.read_rar_vint("rar5 header flags")?;

        let mut extra_size = 0u64;
        if hflags & 0x1 != 0 {
            extra_size = cur.read_rar_vint("rar5 extra size")?;
        }
        let mut record_len = size;
        let mut comp_size = 0u64;
        if hflags & 0x2 != 0 {
            let data_size = cur.read_rar_vint("rar5 data size")?;
            record_len += data_size;
            comp_size = data_size;
        }

        if htype == V5_FILE_HEADER {
            let fflags = cur.read_rar_vint("rar5 file flags")?;
            let uncomp_size = cur.read_rar_vint("rar5 unpacked size")?;
            cur.read_rar_vint("rar5 attributes")?;
            if fflags & 0x2 != 0 {
                cur.skip(4, "rar5 mtime")?;
            }
            if fflags & 0x4 != 0 {
                cur.skip(4, "rar5 data crc")?;
            }

            if fflags & 0x1 != 0 {
                // Ignore directories for sanity purposes.
                debug!("skip directory record in a rar archive");
            } else {
                cur.read_rar_vint("rar5 compression info")?;
                cur.read_rar_vint("rar5 host os")?;
                let fname_len = cur.read_rar_vint("rar5 name size")? as usize;
                if fname_len == 0 {
                    debug!("rar archive is invalid (bad filename size)");
                    return Err(ArcError::InvalidArchive("empty rar5 filename"));
                }
                if fname_len > MAX_NAME_LEN {
                    return Err(ArcError::TooLarge("rar5 filename length"));
                }

                let name_bytes = cur.take(fname_len, "rar5 filename")?;
                let normalized = normalize_name(name_bytes, ctx.charset, ctx.archive_name);

                let mut encrypted = false;
                let extra_len = usize::try_from(extra_size)
                    .map_err(|_| ArcError::Truncated("rar5 extra area"))?;
                if extra_len > 0 && cur.remaining() >= extra_len {
                    let area = cur.take(extra_len, "rar5 extra area")?;
                    encrypted = extra_area_is_encrypted(area)?;
                    if encrypted {
                        archive.encrypted = true;
                    }
                }

                debug!("found file in rar5 archive: {}", normalized.name);
                archive.push_file(ArchiveFile {
                    name: normalized.name,
                    compressed_size: comp_size,
                    uncompressed_size: uncomp_size,
                    encrypted,
                    obfuscated: normalized.obfuscated,
                });
            }
        }

        advance_record(&mut cur, section_start, record_len)?;
    }

    Ok(archive)
}

/// Scans a v5 extra area (`size:vint | type:vint | payload` repeats) for a
/// file-encryption record.
fn extra_area_is_encrypted(area: &[u8]) -> ArcResult<bool> {
    let mut ex = Cursor::new(area);
    while !ex.is_empty() {
        let rec_size = ex.read_rar_vint("rar5 extra record size")?;
        let body_start = ex.position();
        let rec_type = ex.read_rar_vint("rar5 extra record type")?;
        if rec_type == V5_EXTRA_CRYPT {
            return Ok(true);
        }
        let rec_len =
            usize::try_from(rec_size).map_err(|_| ArcError::BadVint("rar5 extra record size"))?;
        match body_start.checked_add(rec_len) {
            Some(next) if next < area.len() && rec_len > 0 => {
                ex.seek_to(next, "rar5 extra record")?
            }
            _ => break,
        }
    }
    Ok(false)
}

/// Jumps to the next record, `record_len` bytes past `record_start`.
fn advance_record(cur: &mut Cursor, record_start: usize, record_len: u64) -> ArcResult<()> {
    let len = usize::try_from(record_len).map_err(|_| ArcError::Truncated("record size"))?;
    let next = record_start
        .checked_add(len)
        .ok_or(ArcError::Truncated("record size"))?;
    if next <= record_start {
        // A record that doesn't move the cursor forward would loop forever.
        return Err(ArcError::InvalidArchive("rar record size too small"));
    }
    cur.seek_to(next, "rar record size")
}
