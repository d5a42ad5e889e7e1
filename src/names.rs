//! Filename normalization and obfuscation detection.
//!
//! Archive member names arrive as raw bytes in whatever encoding the
//! archiver felt like using. The host supplies charset detection and
//! conversion through [`CharsetDetector`]; this module owns only the
//! policy: produce a UTF-8 name and flag the tricks spammers play with
//! control and zero-width characters.

use log::*;

/// Hard ceiling on a declared member-name length.
pub(crate) const MAX_NAME_LEN: usize = 64 * 1024;

/// Host-provided charset detection and conversion.
///
/// The core bundles no charset tables. A host without a detector can pass
/// [`NoDetection`], which routes every name through the ASCII fallback.
pub trait CharsetDetector {
    /// Guesses a charset name from raw bytes, or `None` if undetectable.
    fn detect(&self, raw: &[u8]) -> Option<String>;

    /// Converts raw bytes from `charset` to UTF-16 code units,
    /// or `None` if the conversion fails.
    fn to_utf16(&self, raw: &[u8], charset: &str) -> Option<Vec<u16>>;
}

/// A detector that never detects anything.
pub struct NoDetection;

impl CharsetDetector for NoDetection {
    fn detect(&self, _raw: &[u8]) -> Option<String> {
        None
    }

    fn to_utf16(&self, _raw: &[u8], _charset: &str) -> Option<Vec<u16>> {
        None
    }
}

/// A member name after normalization.
#[derive(Debug, PartialEq, Eq)]
pub struct NormalizedName {
    pub name: String,
    pub obfuscated: bool,
}

/// True for characters that hide or disguise a filename: C0/C1 controls
/// and the zero-width family.
fn is_suspicious(c: char) -> bool {
    // char::is_control covers C0, DEL, and C1.
    c.is_control() || matches!(c as u32, 0x200B..=0x200D | 0x2060 | 0xFEFF)
}

/// Normalizes raw name bytes into UTF-8, flagging obfuscation.
///
/// With a detected charset the bytes are converted through UTF-16 and the
/// code points scanned for controls and zero-width characters. Without one,
/// every byte that isn't a printable ASCII graphic becomes `?`, and ASCII
/// controls or NULs mark the name obfuscated. A failed conversion keeps the
/// raw bytes (lossily as UTF-8) and marks the name obfuscated.
pub fn normalize_name(
    raw: &[u8],
    detector: &dyn CharsetDetector,
    archive_name: Option<&str>,
) -> NormalizedName {
    let charset = match detector.detect(raw) {
        Some(cs) => cs,
        None => return ascii_fallback(raw, archive_name),
    };

    let units = match detector.to_utf16(raw, &charset) {
        Some(units) => units,
        None => {
            info!("cannot convert file name from {charset}");
            return NormalizedName {
                name: String::from_utf8_lossy(raw).into_owned(),
                obfuscated: true,
            };
        }
    };

    let mut obfuscated = false;
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) if is_suspicious(c) => {
                info!(
                    "control character in archive file name found: {:#06x} (archive={})",
                    c as u32,
                    archive_name.unwrap_or("?")
                );
                obfuscated = true;
                break;
            }
            Ok(_) => {}
            Err(_) => {
                // Unpaired surrogate: fall back to the raw bytes.
                return NormalizedName {
                    name: String::from_utf8_lossy(raw).into_owned(),
                    obfuscated: true,
                };
            }
        }
    }

    match String::from_utf16(&units) {
        Ok(name) => NormalizedName { name, obfuscated },
        Err(_) => NormalizedName {
            name: String::from_utf8_lossy(raw).into_owned(),
            obfuscated: true,
        },
    }
}

/// No charset: keep printable ASCII, replace everything else with `?`.
fn ascii_fallback(raw: &[u8], archive_name: Option<&str>) -> NormalizedName {
    let mut name = String::with_capacity(raw.len());
    let mut obfuscated = false;

    for &b in raw {
        if b.is_ascii_graphic() {
            name.push(b as char);
        } else {
            name.push('?');
            if b < 0x7F && (b.is_ascii_control() || b == 0) && !obfuscated {
                info!(
                    "suspicious character in archive file name found: {:#04x} (archive={})",
                    b,
                    archive_name.unwrap_or("?")
                );
                obfuscated = true;
            }
        }
    }

    NormalizedName { name, obfuscated }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Calls raw bytes UTF-8 whenever they parse as such.
    struct Utf8Detector;

    impl CharsetDetector for Utf8Detector {
        fn detect(&self, raw: &[u8]) -> Option<String> {
            std::str::from_utf8(raw).ok().map(|_| "utf-8".to_owned())
        }

        fn to_utf16(&self, raw: &[u8], _charset: &str) -> Option<Vec<u16>> {
            Some(std::str::from_utf8(raw).ok()?.encode_utf16().collect())
        }
    }

    #[test]
    fn printable_utf8_is_untouched() {
        let n = normalize_name(b"report.pdf", &Utf8Detector, None);
        assert_eq!(n.name, "report.pdf");
        assert!(!n.obfuscated);
    }

    #[test]
    fn zero_width_space_is_obfuscated() {
        let n = normalize_name("inv\u{200B}oice.exe".as_bytes(), &Utf8Detector, None);
        assert_eq!(n.name, "inv\u{200B}oice.exe");
        assert!(n.obfuscated);
    }

    #[test]
    fn c0_control_is_obfuscated() {
        let n = normalize_name(b"doc\x07.pdf", &Utf8Detector, None);
        assert!(n.obfuscated);
    }

    #[test]
    fn ascii_fallback_replaces_nongraphic() {
        let n = normalize_name(b"hello world", &NoDetection, None);
        // Space is not an ASCII graphic.
        assert_eq!(n.name, "hello?world");
        assert!(!n.obfuscated);
    }

    #[test]
    fn ascii_fallback_flags_nul_and_controls() {
        let n = normalize_name(b"a\x00b", &NoDetection, None);
        assert_eq!(n.name, "a?b");
        assert!(n.obfuscated);

        let n = normalize_name(b"a\x1Bb", &NoDetection, None);
        assert!(n.obfuscated);

        // High bytes are replaced but not flagged.
        let n = normalize_name(b"caf\xE9", &NoDetection, None);
        assert_eq!(n.name, "caf?");
        assert!(!n.obfuscated);
    }

    #[test]
    fn failed_conversion_keeps_lossy_bytes() {
        struct BadConverter;
        impl CharsetDetector for BadConverter {
            fn detect(&self, _raw: &[u8]) -> Option<String> {
                Some("x-unknown".to_owned())
            }
            fn to_utf16(&self, _raw: &[u8], _charset: &str) -> Option<Vec<u16>> {
                None
            }
        }

        let n = normalize_name(b"caf\xE9", &BadConverter, None);
        assert_eq!(n.name, "caf\u{FFFD}");
        assert!(n.obfuscated);
    }
}
