//! 7-Zip metadata reader.
//!
//! ## Signature header layout (32 bytes total)
//!
//! | Offset | Size | Field              | Notes                              |
//! |--------|------|--------------------|------------------------------------|
//! | 0x00   | 6    | Signature          | 37 7A BC AF 27 1C                  |
//! | 0x06   | 2    | Version            | major, minor                       |
//! | 0x08   | 4    | Start header CRC   |                                    |
//! | 0x0C   | 8    | Next header offset | relative to byte 0x20              |
//! | 0x14   | 8    | Next header size   |                                    |
//! | 0x1C   | 4    | Next header CRC    |                                    |
//!
//! The main header is a tree of tagged sections (NID bytes): stream
//! topology under `MainStreamsInfo`, member names under `FilesInfo`. We
//! walk it for names and the crypto coder ids; sizes, CRCs, and bind pairs
//! are parsed just far enough to be skipped safely. An `EncodedHeader`
//! (compressed or encrypted metadata) is handed to the host's external
//! reader via [`EncodedHeaderReader`].

use log::*;

use crate::cursor::Cursor;
use crate::names::MAX_NAME_LEN;
use crate::read::{Archive, ArchiveFile, ArchiveType, ReadContext};
use crate::result::*;

const SEVENZ_MAGIC: [u8; 6] = [b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C];
const SIGNATURE_HEADER_LEN: usize = 32;

/// Ceilings for declared counts. Anything larger is hostile.
const MAX_FOLDERS: u64 = 8192;
const MAX_FILES: u64 = 65535;

/// Bound on section nesting.
const MAX_DEPTH: u32 = 16;

/// Header NIDs (the tag byte opening each section or property).
mod nid {
    pub const END: u8 = 0x00;
    pub const HEADER: u8 = 0x01;
    pub const ARCHIVE_PROPERTIES: u8 = 0x02;
    pub const ADDITIONAL_STREAMS_INFO: u8 = 0x03;
    pub const MAIN_STREAMS_INFO: u8 = 0x04;
    pub const FILES_INFO: u8 = 0x05;
    pub const PACK_INFO: u8 = 0x06;
    pub const UNPACK_INFO: u8 = 0x07;
    pub const SUBSTREAMS_INFO: u8 = 0x08;
    pub const SIZE: u8 = 0x09;
    pub const CRC: u8 = 0x0A;
    pub const FOLDER: u8 = 0x0B;
    pub const CODERS_UNPACK_SIZE: u8 = 0x0C;
    pub const NUM_UNPACK_STREAM: u8 = 0x0D;
    pub const NAME: u8 = 0x11;
    pub const ENCODED_HEADER: u8 = 0x17;
}

/// Coder ids that mean the streams are encrypted.
const CODEC_ZIP_CRYPTO: u64 = 0x06F1_0101;
const CODEC_RAR29_AES: u64 = 0x06F1_0303;
const CODEC_AES256_SHA256: u64 = 0x06F1_0701;

fn is_crypto_codec(codec_id: u64) -> bool {
    matches!(
        codec_id,
        CODEC_ZIP_CRYPTO | CODEC_RAR29_AES | CODEC_AES256_SHA256
    )
}

/// External 7-Zip reader used when the metadata itself is packed inside an
/// `EncodedHeader`. The host typically backs this with a full 7z library;
/// the core only needs the member enumeration and the encryption verdict.
pub trait EncodedHeaderReader {
    /// Enumerates member names of the whole archive blob.
    fn entry_names(&self, data: &[u8]) -> ArcResult<Vec<String>>;

    /// True if any member is encrypted.
    fn has_encrypted_entries(&self, data: &[u8]) -> bool;
}

enum Walk {
    Next,
    Done,
}

pub(crate) fn read<'a>(data: &[u8], ctx: &ReadContext<'a>) -> ArcResult<Archive<'a>> {
    if data.len() <= SIGNATURE_HEADER_LEN || !data.starts_with(&SEVENZ_MAGIC) {
        debug!("7z archive is invalid (no 7z magic)");
        return Err(ArcError::BadMagic("not a 7z archive"));
    }

    let mut cur = Cursor::new(data);
    // Magic, version, start-header CRC.
    cur.skip(12, "7z signature header")?;
    let next_hdr_offset = cur.read_u64("7z next header offset")?;
    let _next_hdr_size = cur.read_u64("7z next header size")?;
    cur.skip(4, "7z next header crc")?;

    let offset = usize::try_from(next_hdr_offset)
        .ok()
        .and_then(|off| off.checked_add(SIGNATURE_HEADER_LEN))
        .ok_or(ArcError::Truncated("7z next header offset"))?;
    cur.seek_to(offset, "7z next header offset")?;
    if cur.is_empty() {
        debug!("7z archive is invalid (incorrect section offset)");
        return Err(ArcError::Truncated("7z main header"));
    }

    let mut archive = Archive::new(ArchiveType::SevenZip, data.len(), ctx);

    while !cur.is_empty() {
        match read_section(&mut cur, &mut archive, ctx, data, 0)? {
            Walk::Next => {}
            Walk::Done => break,
        }
    }

    Ok(archive)
}

fn read_section<'a>(
    cur: &mut Cursor,
    archive: &mut Archive<'a>,
    ctx: &ReadContext<'a>,
    data: &[u8],
    depth: u32,
) -> ArcResult<Walk> {
    let tag = cur.read_u8("7z section tag")?;
    debug!("7z: read section {tag:#04x}");

    match tag {
        nid::HEADER => Ok(Walk::Next),
        nid::ENCODED_HEADER => {
            read_encoded_header(archive, ctx, data)?;
            Ok(Walk::Done)
        }
        nid::ARCHIVE_PROPERTIES => {
            read_archive_properties(cur)?;
            Ok(Walk::Next)
        }
        nid::MAIN_STREAMS_INFO | nid::ADDITIONAL_STREAMS_INFO => {
            read_streams_info(cur, archive, depth + 1)?;
            Ok(Walk::Next)
        }
        nid::FILES_INFO => {
            read_files_info(cur, archive, depth + 1)?;
            Ok(Walk::Next)
        }
        nid::END => {
            debug!("7z: read final section");
            Ok(Walk::Done)
        }
        _ => {
            debug!("bad 7z section tag: {tag:#04x}");
            Err(ArcError::UnsupportedCodec("unknown 7z section"))
        }
    }
}

/// The header is itself packed; hand the whole blob to the external reader
/// and take its word on names and encryption.
fn read_encoded_header<'a>(
    archive: &mut Archive<'a>,
    ctx: &ReadContext<'a>,
    data: &[u8],
) -> ArcResult<()> {
    let reader = ctx
        .sevenz
        .ok_or(ArcError::UnsupportedCodec("encoded 7z header needs an external reader"))?;

    debug!("7z: encoded header, needs to be uncompressed");

    // Anything enumerated so far came from a header we now know was not
    // the real one.
    archive.files.clear();
    archive.has_obfuscated_files = false;

    for name in reader.entry_names(data)? {
        debug!("7z: found file {name}");
        archive.push_file(ArchiveFile {
            name,
            compressed_size: 0,
            uncompressed_size: 0,
            encrypted: false,
            obfuscated: false,
        });
    }

    if reader.has_encrypted_entries(data) {
        debug!("7z: found encrypted entries");
        archive.encrypted = true;
    }

    Ok(())
}

/// `(type:u8, size:vint, payload)` records until a zero type.
fn read_archive_properties(cur: &mut Cursor) -> ArcResult<()> {
    loop {
        let prop_type = cur.read_u8("7z property type")?;
        if prop_type == 0 {
            return Ok(());
        }
        let len = cur.read_sevenz_vint("7z property size")?;
        let len = usize::try_from(len).map_err(|_| ArcError::Truncated("7z property size"))?;
        cur.skip(len, "7z property data")?;
    }
}

fn read_streams_info(cur: &mut Cursor, archive: &mut Archive, depth: u32) -> ArcResult<()> {
    if depth > MAX_DEPTH {
        return Err(ArcError::TooLarge("7z section nesting"));
    }

    let mut num_folders = 0u64;
    let mut unknown_digests = 0u64;

    loop {
        let tag = cur.read_u8("7z streams info tag")?;
        debug!("7z: read streams info {tag:#04x}");

        match tag {
            nid::PACK_INFO => read_pack_info(cur)?,
            nid::UNPACK_INFO => {
                (num_folders, unknown_digests) = read_coders_info(cur, archive, depth + 1)?;
            }
            nid::SUBSTREAMS_INFO => {
                read_substreams_info(cur, num_folders, unknown_digests, depth + 1)?;
            }
            nid::END => return Ok(()),
            _ => {
                debug!("bad 7z streams info tag: {tag:#04x}");
                return Err(ArcError::UnsupportedCodec("unexpected tag in 7z streams info"));
            }
        }
    }
}

/// ```text
/// UINT64 PackPos
/// UINT64 NumPackStreams
/// [ BYTE NID::kSize  UINT64 PackSizes[NumPackStreams] ]
/// [ BYTE NID::kCRC   PackStreamDigests[NumPackStreams] ]
/// BYTE NID::kEnd
/// ```
fn read_pack_info(cur: &mut Cursor) -> ArcResult<()> {
    let _pack_pos = cur.read_sevenz_vint("7z pack position")?;
    let pack_streams = cur.read_sevenz_vint("7z pack stream count")?;

    loop {
        let tag = cur.read_u8("7z pack info tag")?;
        debug!("7z: read pack info {tag:#04x}");

        match tag {
            nid::SIZE => {
                for _ in 0..pack_streams {
                    cur.read_sevenz_vint("7z pack size")?;
                }
            }
            nid::CRC => {
                read_digests(cur, pack_streams)?;
            }
            nid::END => return Ok(()),
            _ => {
                debug!("bad 7z pack info tag: {tag:#04x}");
                return Err(ArcError::UnsupportedCodec("unexpected tag in 7z pack info"));
            }
        }
    }
}

/// Skips a digest vector:
/// ```text
/// BYTE AllAreDefined
/// if (AllAreDefined == 0) { for (NumStreams) BIT Defined }
/// UINT32 CRCs[NumDefined]
/// ```
/// Returns how many digests were present.
fn read_digests(cur: &mut Cursor, num_streams: u64) -> ArcResult<u64> {
    let all_defined = cur.read_u8("7z digest flag")?;

    let num_defined = if all_defined != 0 {
        num_streams
    } else {
        if num_streams > MAX_FOLDERS {
            return Err(ArcError::TooLarge("7z digest vector"));
        }
        read_bit_vector(cur, num_streams)?
    };

    for _ in 0..num_defined {
        cur.skip(4, "7z digest")?;
    }

    Ok(num_defined)
}

/// Reads `nbits` MSB-first bits, returning how many were set.
fn read_bit_vector(cur: &mut Cursor, nbits: u64) -> ArcResult<u64> {
    let mut set = 0u64;
    let mut mask = 0u8;
    let mut current = 0u8;

    for _ in 0..nbits {
        if mask == 0 {
            current = cur.read_u8("7z bit vector")?;
            mask = 0x80;
        }
        if current & mask != 0 {
            set += 1;
        }
        mask >>= 1;
    }

    Ok(set)
}

/// Reads the folder table. Returns the folder count and the number of
/// digests declared by the folders but not stored here — the substreams
/// section needs that count to skip its own CRC vector.
fn read_coders_info(
    cur: &mut Cursor,
    archive: &mut Archive,
    depth: u32,
) -> ArcResult<(u64, u64)> {
    if depth > MAX_DEPTH {
        return Err(ArcError::TooLarge("7z section nesting"));
    }

    let mut num_folders = 0u64;
    let mut folder_out_streams: Vec<u64> = Vec::new();
    let mut num_digests = 0u64;
    let mut digests_read = 0u64;

    loop {
        let tag = cur.read_u8("7z coders info tag")?;
        debug!("7z: read coders info {tag:#04x}");

        match tag {
            nid::FOLDER => {
                num_folders = cur.read_sevenz_vint("7z folder count")?;
                debug!("7z: nfolders={num_folders}");
                let external = cur.read_u8("7z folder external flag")?;
                if external != 0 {
                    cur.read_sevenz_vint("7z folder data stream index")?;
                } else {
                    if num_folders > MAX_FOLDERS {
                        return Err(ArcError::TooLarge("7z folder count"));
                    }
                    folder_out_streams.clear();
                    for _ in 0..num_folders {
                        let (out_streams, packed) = read_folder(cur, archive)?;
                        folder_out_streams.push(out_streams);
                        num_digests += packed;
                    }
                }
            }
            nid::CODERS_UNPACK_SIZE => {
                for &out_streams in &folder_out_streams {
                    for _ in 0..out_streams {
                        cur.read_sevenz_vint("7z unpacked size")?;
                    }
                }
            }
            nid::CRC => {
                digests_read = read_digests(cur, num_digests)?;
            }
            nid::END => break,
            _ => {
                debug!("bad 7z coders info tag: {tag:#04x}");
                return Err(ArcError::UnsupportedCodec("unexpected tag in 7z coders info"));
            }
        }
    }

    Ok((num_folders, num_digests.saturating_sub(digests_read)))
}

/// One folder: its coder descriptors, bind pairs, and packed-stream
/// indices. Returns `(out_streams, packed_streams)`.
///
/// ```text
/// BYTE { 0:3 CodecIdSize, 4: IsComplex, 5: HasAttributes, 6: Reserved }
/// BYTE CodecId[CodecIdSize]
/// if (IsComplex)      { UINT64 NumInStreams; UINT64 NumOutStreams }
/// if (HasAttributes)  { UINT64 PropertiesSize; BYTE Properties[...] }
/// ```
fn read_folder(cur: &mut Cursor, archive: &mut Archive) -> ArcResult<(u64, u64)> {
    let num_coders = cur.read_sevenz_vint("7z coder count")?;
    let mut in_streams = 0u64;
    let mut out_streams = 0u64;

    for _ in 0..num_coders {
        let desc = cur.read_u8("7z coder descriptor")?;
        let id_len = (desc & 0x0F) as usize;

        let mut codec_id = 0u64;
        for &b in cur.take(id_len, "7z codec id")? {
            codec_id = (codec_id << 8) | u64::from(b);
        }
        debug!("7z: read codec id {codec_id:#x}");

        if is_crypto_codec(codec_id) {
            debug!("7z: encrypted codec {codec_id:#x}");
            archive.encrypted = true;
        }

        if desc & (1 << 4) != 0 {
            // Complex coder.
            in_streams += cur.read_sevenz_vint("7z coder in-streams")?;
            out_streams += cur.read_sevenz_vint("7z coder out-streams")?;
        } else {
            in_streams += 1;
            out_streams += 1;
        }

        if desc & (1 << 5) != 0 {
            let prop_len = cur.read_sevenz_vint("7z coder property size")?;
            let prop_len =
                usize::try_from(prop_len).map_err(|_| ArcError::Truncated("7z coder properties"))?;
            cur.skip(prop_len, "7z coder properties")?;
        }
    }

    if out_streams > 1 {
        // Bind pairs: (in-index, out-index) per internal connection.
        for _ in 0..out_streams - 1 {
            cur.read_sevenz_vint("7z bind pair in-index")?;
            cur.read_sevenz_vint("7z bind pair out-index")?;
        }
    }

    let packed = in_streams.saturating_sub(out_streams) + 1;
    debug!("7z: instreams={in_streams}, outstreams={out_streams}, packed={packed}");
    if packed > 1 {
        for _ in 0..packed {
            cur.read_sevenz_vint("7z packed stream index")?;
        }
    }

    Ok((out_streams, packed))
}

/// ```text
/// [ BYTE NID::kNumUnPackStream  UINT64 NumUnPackStreamsInFolders[NumFolders] ]
/// [ BYTE NID::kSize             UINT64 UnPackSizes[...] ]
/// [ BYTE NID::kCRC              Digests[streams with unknown CRC] ]
/// BYTE NID::kEnd
/// ```
fn read_substreams_info(
    cur: &mut Cursor,
    num_folders: u64,
    unknown_digests: u64,
    depth: u32,
) -> ArcResult<()> {
    if depth > MAX_DEPTH {
        return Err(ArcError::TooLarge("7z section nesting"));
    }
    if num_folders > MAX_FOLDERS {
        return Err(ArcError::TooLarge("7z folder count"));
    }

    let mut folder_streams = vec![0u64; num_folders as usize];

    loop {
        let tag = cur.read_u8("7z substreams info tag")?;
        debug!("7z: read substreams info {tag:#04x}");

        match tag {
            nid::NUM_UNPACK_STREAM => {
                for slot in folder_streams.iter_mut() {
                    *slot = cur.read_sevenz_vint("7z substream count")?;
                }
            }
            nid::SIZE => {
                for &count in &folder_streams {
                    for _ in 0..count {
                        cur.read_sevenz_vint("7z substream size")?;
                    }
                }
            }
            nid::CRC => {
                read_digests(cur, unknown_digests)?;
            }
            nid::END => return Ok(()),
            _ => {
                debug!("bad 7z substreams info tag: {tag:#04x}");
                return Err(ArcError::UnsupportedCodec(
                    "unexpected tag in 7z substreams info",
                ));
            }
        }
    }
}

/// Member names and the other per-file property vectors. Only `kName` is
/// interpreted; everything else is consumed via its declared size.
fn read_files_info(cur: &mut Cursor, archive: &mut Archive, depth: u32) -> ArcResult<()> {
    if depth > MAX_DEPTH {
        return Err(ArcError::TooLarge("7z section nesting"));
    }

    let num_files = cur.read_sevenz_vint("7z file count")?;
    if num_files > MAX_FILES {
        return Err(ArcError::TooLarge("7z file count"));
    }

    loop {
        let tag = cur.read_u8("7z file property tag")?;
        debug!("7z: read file property {tag:#04x}");
        if tag == nid::END {
            return Ok(());
        }

        let size = cur.read_sevenz_vint("7z file property size")?;

        if tag == nid::NAME {
            let external = cur.read_u8("7z name external flag")?;
            if external != 0 {
                cur.read_sevenz_vint("7z external name stream index")?;
            } else {
                for _ in 0..num_files {
                    read_name(cur, archive)?;
                }
            }
        } else {
            let size = usize::try_from(size).map_err(|_| ArcError::Truncated("7z file property"))?;
            cur.skip(size, "7z file property")?;
        }
    }
}

/// One NUL-terminated UCS-2LE name. Names that don't decode are dropped;
/// an unterminated or empty name rejects the archive.
fn read_name(cur: &mut Cursor, archive: &mut Archive) -> ArcResult<()> {
    let rest = cur.rest();
    let mut terminator = None;
    let mut i = 0;
    while i + 1 < rest.len() {
        if rest[i] == 0 && rest[i + 1] == 0 {
            terminator = Some(i);
            break;
        }
        i += 2;
    }

    let end = match terminator {
        Some(0) | None => {
            debug!("bad 7z member name");
            return Err(ArcError::InvalidArchive("bad 7z member name"));
        }
        Some(end) => end,
    };
    if end > MAX_NAME_LEN {
        return Err(ArcError::TooLarge("7z member name length"));
    }

    let units: Vec<u16> = rest[..end]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    match char::decode_utf16(units).collect::<Result<String, _>>() {
        Ok(name) => {
            debug!("7z: found file {name}");
            archive.push_file(ArchiveFile {
                name,
                compressed_size: 0,
                uncompressed_size: 0,
                encrypted: false,
                obfuscated: false,
            });
        }
        Err(_) => {
            // Undecodable name: the entry is dropped, the walk goes on.
            debug!("bad 7z member name (undecodable)");
        }
    }

    cur.skip(end + 2, "7z member name")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::read::ReadContext;

    /// Wraps main-header bytes in a signature header with offset 0.
    fn sz_archive(header: &[u8]) -> Vec<u8> {
        let mut data = SEVENZ_MAGIC.to_vec();
        data.extend_from_slice(&[0x00, 0x04]); // version
        data.extend_from_slice(&[0u8; 4]); // start header crc
        data.extend_from_slice(&0u64.to_le_bytes()); // next header offset
        data.extend_from_slice(&(header.len() as u64).to_le_bytes());
        data.extend_from_slice(&[0u8; 4]); // next header crc
        data.extend_from_slice(header);
        data
    }

    fn ucs2(name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in name.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&[0, 0]);
        out
    }

    #[test]
    fn rejects_non_7z() {
        let ctx = ReadContext::default();
        assert!(matches!(
            read(b"7z but actually far too short", &ctx),
            Err(ArcError::BadMagic(_))
        ));
    }

    #[test]
    fn lists_files_from_files_info() {
        let ctx = ReadContext::default();
        let mut names = Vec::new();
        names.push(0x00); // inline names
        names.extend_from_slice(&ucs2("a.txt"));
        names.extend_from_slice(&ucs2("b.bin"));

        let mut header = vec![nid::HEADER, nid::FILES_INFO];
        header.push(0x02); // two files
        header.push(nid::NAME);
        header.push(names.len() as u8); // property size
        header.extend_from_slice(&names);
        header.push(nid::END); // end of files info
        header.push(nid::END); // end of header

        let archive = read(&sz_archive(&header), &ctx).unwrap();
        assert_eq!(archive.archive_type, ArchiveType::SevenZip);
        assert_eq!(archive.files.len(), 2);
        assert_eq!(archive.files[0].name, "a.txt");
        assert_eq!(archive.files[1].name, "b.bin");
        assert!(!archive.encrypted);
    }

    #[test]
    fn crypto_coder_marks_archive_encrypted() {
        let ctx = ReadContext::default();
        let header = vec![
            nid::HEADER,
            nid::MAIN_STREAMS_INFO,
            nid::UNPACK_INFO,
            nid::FOLDER,
            0x01, // one folder
            0x00, // inline
            0x01, // one coder
            0x04, // codec id length 4, simple, no attributes
            0x06, 0xF1, 0x07, 0x01, // AES-256 + SHA-256
            nid::CODERS_UNPACK_SIZE,
            0x05, // unpacked size for the single out-stream
            nid::END, // end of coders info
            nid::END, // end of streams info
            nid::END, // end of header
        ];

        let archive = read(&sz_archive(&header), &ctx).unwrap();
        assert!(archive.encrypted);
        assert!(archive.files.is_empty());
    }

    #[test]
    fn rejects_oversized_file_count() {
        let ctx = ReadContext::default();
        // 65536 as a 7z vint: 110xxxxx with x=1, two zero bytes.
        let header = vec![nid::HEADER, nid::FILES_INFO, 0xC1, 0x00, 0x00];
        assert!(matches!(
            read(&sz_archive(&header), &ctx),
            Err(ArcError::TooLarge(_))
        ));
    }

    #[test]
    fn encoded_header_without_delegate_is_unsupported() {
        let ctx = ReadContext::default();
        let header = vec![nid::ENCODED_HEADER];
        assert!(matches!(
            read(&sz_archive(&header), &ctx),
            Err(ArcError::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn encoded_header_delegates_to_external_reader() {
        struct FakeReader;
        impl EncodedHeaderReader for FakeReader {
            fn entry_names(&self, _data: &[u8]) -> ArcResult<Vec<String>> {
                Ok(vec!["inner.doc".to_owned()])
            }
            fn has_encrypted_entries(&self, _data: &[u8]) -> bool {
                true
            }
        }

        let ctx = ReadContext {
            sevenz: Some(&FakeReader),
            ..ReadContext::default()
        };
        let header = vec![nid::ENCODED_HEADER];
        let archive = read(&sz_archive(&header), &ctx).unwrap();
        assert_eq!(archive.files.len(), 1);
        assert_eq!(archive.files[0].name, "inner.doc");
        assert!(archive.encrypted);
    }

    #[test]
    fn undecodable_name_drops_only_that_entry() {
        let ctx = ReadContext::default();
        let mut names = Vec::new();
        names.push(0x00);
        // Unpaired high surrogate, then the terminator.
        names.extend_from_slice(&0xD800u16.to_le_bytes());
        names.extend_from_slice(&[0, 0]);
        names.extend_from_slice(&ucs2("ok.txt"));

        let mut header = vec![nid::HEADER, nid::FILES_INFO];
        header.push(0x02);
        header.push(nid::NAME);
        header.push(names.len() as u8);
        header.extend_from_slice(&names);
        header.push(nid::END);
        header.push(nid::END);

        let archive = read(&sz_archive(&header), &ctx).unwrap();
        assert_eq!(archive.files.len(), 1);
        assert_eq!(archive.files[0].name, "ok.txt");
    }
}
