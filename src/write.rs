//! ZIP writer with optional WinZip-AES (AE-2) encryption, and the
//! standalone AES-256-CBC envelope.
//!
//! The writer emits one contiguous byte vector: local file headers with
//! DEFLATE (or stored, when DEFLATE doesn't help) payloads, a central
//! directory, and the End of central directory record. With a password
//! each payload is wrapped per the [WinZip AE-2 profile]: a fresh salt and
//! PBKDF2-HMAC-SHA1 key derivation per entry, AES-256-CTR over the
//! compressed bytes, and a 10-byte HMAC-SHA1 trailer. Compressed sizes
//! aren't known up front, so headers are patched in place afterwards.
//!
//! [WinZip AE-2 profile]: https://www.winzip.com/en/support/aes-encryption/

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use log::*;
use std::io::Write;

use crate::crypto::Crypto;
use crate::result::*;

/// One entry to be placed in a written ZIP archive.
pub struct ZipFileSpec<'a> {
    /// Member path inside the archive. Must be relative and free of
    /// traversal tricks.
    pub name: &'a str,

    /// File contents.
    pub data: &'a [u8],

    /// Modification time, seconds since the epoch; 0 means now.
    pub mtime: i64,

    /// POSIX permission bits; 0 means 0o644.
    pub mode: u32,
}

const LFH_MAGIC: u32 = 0x04034B50;
const CDFH_MAGIC: u32 = 0x02014B50;
const EOCD_MAGIC: u32 = 0x06054B50;

const METHOD_STORE: u16 = 0;
const METHOD_DEFLATE: u16 = 8;
/// Wire method code signalling WinZip AES.
const METHOD_AES: u16 = 99;

const AES_EXTRA_ID: u16 = 0x9901;
/// id + size + 7-byte payload.
const AES_EXTRA_LEN: u16 = 11;
const AES_VENDOR_AE2: u16 = 0x0002;
const AES_STRENGTH_256: u8 = 0x03;
const AES_SALT_LEN: usize = 16;
const AES_KEY_LEN: usize = 32;
const AES_PBKDF2_ITERS: u32 = 1000;
const HMAC_TRAILER_LEN: usize = 10;

const ENVELOPE_MAGIC: &[u8; 8] = b"RZAE0001";
const ENVELOPE_KDF_ITERS: u32 = 100_000;

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// MS-DOS time and date words for a unix timestamp (0 means now).
/// DOS dates start in 1980; anything earlier is clamped.
fn dos_datetime(mtime: i64) -> (u16, u16) {
    let dt: DateTime<Local> = if mtime == 0 {
        Local::now()
    } else {
        match Local.timestamp_opt(mtime, 0) {
            chrono::LocalResult::Single(dt) => dt,
            _ => Local::now(),
        }
    };

    let time = ((dt.hour() as u16 & 0x1F) << 11)
        | ((dt.minute() as u16 & 0x3F) << 5)
        | ((dt.second() as u16 / 2) & 0x1F);

    let year = dt.year().max(1980);
    let date = ((((year - 1980) as u16) & 0x7F) << 9)
        | ((dt.month() as u16 & 0x0F) << 5)
        | (dt.day() as u16 & 0x1F);

    (time, date)
}

/// Rejects absolute paths, parent traversals, and drive/stream colons.
fn validate_name(name: &str) -> ArcResult<()> {
    if name.is_empty()
        || name.starts_with('/')
        || name.starts_with('\\')
        || name.contains("..")
        || name.contains(':')
    {
        return Err(ArcError::InvalidName(name.to_owned()));
    }
    Ok(())
}

/// Raw DEFLATE (no zlib framing), as ZIP wants it.
fn deflate(data: &[u8]) -> ArcResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len()), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|_| ArcError::CompressionFailed)
}

/// The WinZip AES extra field (0x9901).
fn write_extra_aes(out: &mut Vec<u8>, actual_method: u16) {
    put_u16(out, AES_EXTRA_ID);
    put_u16(out, 7);
    put_u16(out, AES_VENDOR_AE2);
    out.extend_from_slice(b"AE");
    out.push(AES_STRENGTH_256);
    put_u16(out, actual_method);
}

/// Builds a ZIP archive from `files`, optionally encrypting every entry
/// with WinZip AES-256 (AE-2).
///
/// `crypto` is only consulted when a non-empty password is given; passing
/// a password without a crypto backend fails with
/// [`ArcError::CryptoUnavailable`]. On any error all partial output and
/// key material are destroyed.
pub fn write_zip(
    files: &[ZipFileSpec<'_>],
    password: Option<&str>,
    crypto: Option<&dyn Crypto>,
) -> ArcResult<Vec<u8>> {
    if files.is_empty() {
        return Err(ArcError::InvalidName("no files to archive".to_owned()));
    }
    if files.len() > u16::MAX as usize {
        return Err(ArcError::TooLarge("zip entry count"));
    }

    let aes: Option<(&str, &dyn Crypto)> = match password {
        Some(pw) if !pw.is_empty() => Some((pw, crypto.ok_or(ArcError::CryptoUnavailable)?)),
        _ => None,
    };

    let mut zip: Vec<u8> = Vec::new();
    let mut cd: Vec<u8> = Vec::new();

    for spec in files {
        validate_name(spec.name)?;
        if spec.data.len() > u32::MAX as usize {
            return Err(ArcError::TooLarge("zip entry size"));
        }

        let crc = if aes.is_some() {
            // AE-2 stores no CRC.
            0
        } else {
            crc32fast::hash(spec.data)
        };

        let mut method = METHOD_DEFLATE;
        let mut gp_flags = 1u16 << 11; // UTF-8 names
        let mut ver_needed = 20u16;
        let mut extra_len = 0u16;
        let mut actual_method = METHOD_DEFLATE;

        if aes.is_some() {
            ver_needed = ver_needed.max(51);
            gp_flags |= 1; // encrypted
            method = METHOD_AES;
            extra_len = AES_EXTRA_LEN;
        }

        let lfh_offset = zip.len();
        let (dos_time, dos_date) = dos_datetime(spec.mtime);

        put_u32(&mut zip, LFH_MAGIC);
        put_u16(&mut zip, ver_needed);
        put_u16(&mut zip, gp_flags);
        put_u16(&mut zip, method);
        put_u16(&mut zip, dos_time);
        put_u16(&mut zip, dos_date);
        put_u32(&mut zip, crc);
        put_u32(&mut zip, 0); // compressed size, patched below
        put_u32(&mut zip, spec.data.len() as u32);
        put_u16(&mut zip, spec.name.len() as u16);
        put_u16(&mut zip, extra_len);
        zip.extend_from_slice(spec.name.as_bytes());
        if aes.is_some() {
            write_extra_aes(&mut zip, actual_method);
        }

        let csize = if let Some((pw, crypto)) = aes {
            write_encrypted_payload(&mut zip, spec, pw, crypto, lfh_offset, &mut actual_method)?
        } else {
            write_plain_payload(&mut zip, spec, lfh_offset, &mut method)?
        };

        // Patch the compressed size at LFH offset +18.
        zip[lfh_offset + 18..lfh_offset + 22].copy_from_slice(&csize.to_le_bytes());

        // Central directory record mirroring the local header.
        put_u32(&mut cd, CDFH_MAGIC);
        put_u16(&mut cd, (3 << 8) | 20); // version made by: UNIX, 2.0
        put_u16(&mut cd, ver_needed);
        put_u16(&mut cd, gp_flags);
        put_u16(&mut cd, method);
        put_u16(&mut cd, dos_time);
        put_u16(&mut cd, dos_date);
        put_u32(&mut cd, crc);
        put_u32(&mut cd, csize);
        put_u32(&mut cd, spec.data.len() as u32);
        put_u16(&mut cd, spec.name.len() as u16);
        put_u16(&mut cd, extra_len);
        put_u16(&mut cd, 0); // comment length
        put_u16(&mut cd, 0); // disk number start
        put_u16(&mut cd, 0); // internal attributes
        let mode = if spec.mode != 0 { spec.mode } else { 0o644 };
        put_u32(&mut cd, (mode & 0xFFFF) << 16);
        put_u32(&mut cd, lfh_offset as u32);
        cd.extend_from_slice(spec.name.as_bytes());
        if aes.is_some() {
            write_extra_aes(&mut cd, actual_method);
        }

        let effective_method = if method == METHOD_AES { actual_method } else { method };
        debug!(
            "zip: added entry '{}' (usize={}, csize={}, method={})",
            spec.name,
            spec.data.len(),
            csize,
            if effective_method == METHOD_STORE { "store" } else { "deflate" }
        );
    }

    let cd_start = zip.len() as u32;
    zip.extend_from_slice(&cd);

    put_u32(&mut zip, EOCD_MAGIC);
    put_u16(&mut zip, 0); // this disk
    put_u16(&mut zip, 0); // disk with the central directory
    put_u16(&mut zip, files.len() as u16);
    put_u16(&mut zip, files.len() as u16);
    put_u32(&mut zip, cd.len() as u32);
    put_u32(&mut zip, cd_start);
    put_u16(&mut zip, 0); // comment length

    debug!("zip: created archive ({} bytes)", zip.len());
    Ok(zip)
}

/// Deflates (or stores) the payload and returns the compressed size.
/// A stored fallback also rewrites the method in the local header.
fn write_plain_payload(
    zip: &mut Vec<u8>,
    spec: &ZipFileSpec<'_>,
    lfh_offset: usize,
    method: &mut u16,
) -> ArcResult<u32> {
    let deflated = deflate(spec.data)?;

    let csize = if deflated.len() >= spec.data.len() {
        zip.extend_from_slice(spec.data);
        *method = METHOD_STORE;
        zip[lfh_offset + 8..lfh_offset + 10].copy_from_slice(&METHOD_STORE.to_le_bytes());
        spec.data.len()
    } else {
        zip.extend_from_slice(&deflated);
        deflated.len()
    };

    Ok(csize as u32)
}

/// Salt, verifier, AES-CTR ciphertext, and HMAC trailer per AE-2.
/// Updates the actual-method byte pair inside the already-written AES
/// extra field when the store fallback kicks in.
fn write_encrypted_payload(
    zip: &mut Vec<u8>,
    spec: &ZipFileSpec<'_>,
    password: &str,
    crypto: &dyn Crypto,
    lfh_offset: usize,
    actual_method: &mut u16,
) -> ArcResult<u32> {
    let mut salt = [0u8; AES_SALT_LEN];
    crypto.rand_bytes(&mut salt)?;

    // PBKDF2 output: encryption key, HMAC key, 2-byte password verifier.
    let mut derived = [0u8; 2 * AES_KEY_LEN + 2];
    crypto.pbkdf2_hmac_sha1(password.as_bytes(), &salt, AES_PBKDF2_ITERS, &mut derived);

    let result = (|| {
        let (enc_key, rest) = derived.split_at(AES_KEY_LEN);
        let (auth_key, verifier) = rest.split_at(AES_KEY_LEN);

        zip.extend_from_slice(&salt);
        zip.extend_from_slice(verifier);

        let payload_start = zip.len();
        let deflated = deflate(spec.data)?;
        if deflated.len() >= spec.data.len() {
            zip.extend_from_slice(spec.data);
            *actual_method = METHOD_STORE;
        } else {
            zip.extend_from_slice(&deflated);
        }

        crypto.aes256_ctr_apply(enc_key, &mut zip[payload_start..]);
        let mac = crypto.hmac_sha1(auth_key, &zip[payload_start..]);
        let payload_len = zip.len() - payload_start;
        zip.extend_from_slice(&mac[..HMAC_TRAILER_LEN]);

        // The actual compression method lives in the last two bytes of the
        // AES extra field payload.
        let method_offset = lfh_offset + 30 + spec.name.len() + 9;
        zip[method_offset..method_offset + 2].copy_from_slice(&actual_method.to_le_bytes());

        Ok((AES_SALT_LEN + 2 + payload_len + HMAC_TRAILER_LEN) as u32)
    })();

    derived.fill(0);
    result
}

/// Encrypts `plain` into the `RZAE0001` envelope:
/// magic, 16-byte salt, 16-byte IV, then PKCS#7-padded AES-256-CBC
/// ciphertext under a PBKDF2-HMAC-SHA256 key.
pub fn write_envelope(plain: &[u8], password: &str, crypto: &dyn Crypto) -> ArcResult<Vec<u8>> {
    if password.is_empty() {
        return Err(ArcError::InvalidPassword);
    }

    let mut salt = [0u8; 16];
    let mut iv = [0u8; 16];
    crypto.rand_bytes(&mut salt)?;
    crypto.rand_bytes(&mut iv)?;

    let mut key = [0u8; AES_KEY_LEN];
    crypto.pbkdf2_hmac_sha256(password.as_bytes(), &salt, ENVELOPE_KDF_ITERS, &mut key);

    let ciphertext = crypto.aes256_cbc_encrypt(&key, &iv, plain);
    key.fill(0);

    let mut out = Vec::with_capacity(ENVELOPE_MAGIC.len() + salt.len() + iv.len() + ciphertext.len());
    out.extend_from_slice(ENVELOPE_MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);

    info!(
        "AES-256-CBC envelope created (PBKDF2-SHA256 iters={ENVELOPE_KDF_ITERS})"
    );
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::OsCrypto;

    #[test]
    fn name_validation() {
        assert!(validate_name("docs/a.txt").is_ok());
        assert!(validate_name("a.txt").is_ok());

        for bad in ["", "/etc/passwd", "\\host\\share", "../up", "a/../b", "C:stream"] {
            assert!(
                matches!(validate_name(bad), Err(ArcError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn dos_datetime_clamps_pre_1980() {
        let (_, date) = dos_datetime(1); // 1970-01-01
        assert_eq!(date >> 9, 0); // year field pinned to 1980
    }

    #[test]
    fn incompressible_data_is_stored() {
        // Pseudo-random bytes deflate poorly.
        let mut data = Vec::with_capacity(256);
        let mut x = 0x12345678u32;
        for _ in 0..256 {
            x = x.wrapping_mul(1664525).wrapping_add(1013904223);
            data.push((x >> 24) as u8);
        }
        let files = [ZipFileSpec {
            name: "noise.bin",
            data: &data,
            mtime: 1,
            mode: 0,
        }];
        let zip = write_zip(&files, None, None).unwrap();
        // Method field in the local header.
        assert_eq!(&zip[8..10], &METHOD_STORE.to_le_bytes());
        // Compressed size equals the raw length.
        assert_eq!(&zip[18..22], &(data.len() as u32).to_le_bytes());
    }

    #[test]
    fn password_without_crypto_backend_fails() {
        let files = [ZipFileSpec {
            name: "a.txt",
            data: b"hello",
            mtime: 1,
            mode: 0,
        }];
        assert!(matches!(
            write_zip(&files, Some("pw"), None),
            Err(ArcError::CryptoUnavailable)
        ));
    }

    #[test]
    fn empty_password_means_plain() {
        let files = [ZipFileSpec {
            name: "a.txt",
            data: b"hello",
            mtime: 1,
            mode: 0,
        }];
        let zip = write_zip(&files, Some(""), None).unwrap();
        // Not flagged encrypted.
        assert_eq!(zip[6] & 1, 0);
    }

    #[test]
    fn envelope_rejects_empty_password() {
        assert!(matches!(
            write_envelope(b"data", "", &OsCrypto),
            Err(ArcError::InvalidPassword)
        ));
    }

    #[test]
    fn envelope_framing() {
        for len in [0usize, 1, 15, 16, 17, 100] {
            let plain = vec![0x5Au8; len];
            let out = write_envelope(&plain, "pw", &OsCrypto).unwrap();
            assert_eq!(&out[..8], b"RZAE0001");
            assert_eq!(out.len(), 40 + (len / 16 + 1) * 16);
        }
    }
}
