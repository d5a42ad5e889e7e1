//! Crypto capabilities for the writers.
//!
//! The readers need none of this. The writers take their primitives
//! through the [`Crypto`] trait so hosts can route them to their own
//! library; [`OsCrypto`] is the stock implementation on the RustCrypto
//! crates.

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit, StreamCipher};
use aes::Aes256;
use hmac::{Mac, SimpleHmac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;
use sha2::Sha256;

use crate::result::*;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256Ctr = ctr::Ctr128LE<Aes256>;
type HmacSha1 = SimpleHmac<Sha1>;

/// The primitive set the writers need. Key slices are always 32 bytes.
pub trait Crypto {
    /// Fills `out` with cryptographically secure random bytes.
    fn rand_bytes(&self, out: &mut [u8]) -> ArcResult<()>;

    fn pbkdf2_hmac_sha1(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]);

    fn pbkdf2_hmac_sha256(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]);

    /// XORs `buf` in place with the AES-256-CTR keystream, using the
    /// WinZip AES convention: little-endian 128-bit counter starting at 1,
    /// no nonce.
    fn aes256_ctr_apply(&self, key: &[u8], buf: &mut [u8]);

    /// AES-256-CBC with PKCS#7 padding.
    fn aes256_cbc_encrypt(&self, key: &[u8], iv: &[u8], plain: &[u8]) -> Vec<u8>;

    fn hmac_sha1(&self, key: &[u8], data: &[u8]) -> [u8; 20];
}

/// [`Crypto`] backed by the RustCrypto crates and the OS random source.
pub struct OsCrypto;

impl Crypto for OsCrypto {
    fn rand_bytes(&self, out: &mut [u8]) -> ArcResult<()> {
        OsRng.try_fill_bytes(out).map_err(|_| ArcError::RngFailed)
    }

    fn pbkdf2_hmac_sha1(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, iterations, out);
    }

    fn pbkdf2_hmac_sha256(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out);
    }

    fn aes256_ctr_apply(&self, key: &[u8], buf: &mut [u8]) {
        let iv = 1u128.to_le_bytes();
        let mut cipher = Aes256Ctr::new(key.into(), iv.as_slice().into());
        cipher.apply_keystream(buf);
    }

    fn aes256_cbc_encrypt(&self, key: &[u8], iv: &[u8], plain: &[u8]) -> Vec<u8> {
        Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plain)
    }

    fn hmac_sha1(&self, key: &[u8], data: &[u8]) -> [u8; 20] {
        let mut mac = HmacSha1::new_from_slice(key).expect("hmac accepts any key length");
        mac.update(data);
        let digest = mac.finalize().into_bytes();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ctr_keystream_roundtrips() {
        let key = [0x42u8; 32];
        let mut buf = b"attack at dawn".to_vec();
        OsCrypto.aes256_ctr_apply(&key, &mut buf);
        assert_ne!(buf, b"attack at dawn");
        OsCrypto.aes256_ctr_apply(&key, &mut buf);
        assert_eq!(buf, b"attack at dawn");
    }

    #[test]
    fn cbc_pads_to_block_multiple() {
        let key = [1u8; 32];
        let iv = [2u8; 16];
        for len in 0..33 {
            let plain = vec![0u8; len];
            let ct = OsCrypto.aes256_cbc_encrypt(&key, &iv, &plain);
            assert_eq!(ct.len(), (len / 16 + 1) * 16);
        }
    }

    #[test]
    fn rand_bytes_fills_buffer() {
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        OsCrypto.rand_bytes(&mut a).unwrap();
        OsCrypto.rand_bytes(&mut b).unwrap();
        assert_ne!(a, b);
    }
}
