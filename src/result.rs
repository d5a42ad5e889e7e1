//! Error types and the related `Result<T>`

use thiserror::Error;

pub type ArcResult<T> = Result<T, ArcError>;

#[derive(Debug, Error)]
pub enum ArcError {
    /// The input doesn't start with the magic of the format we were told it is.
    #[error("Bad magic: {0}")]
    BadMagic(&'static str),

    /// A fixed-width read ran off the end of the input.
    #[error("Truncated input: {0}")]
    Truncated(&'static str),

    /// A variable-length integer was malformed or ran off the end of the input.
    #[error("Bad variable-length integer: {0}")]
    BadVint(&'static str),

    /// No End Of Central Directory record in a purported ZIP archive.
    #[error("Couldn't find End Of Central Directory Record")]
    NoEocd,

    /// The ZIP central directory extent doesn't fit before the EOCD.
    #[error("Invalid central directory size or offset")]
    BadCdExtent,

    /// The archive contained invalid data per its format specification.
    #[error("Invalid archive: {0}")]
    InvalidArchive(&'static str),

    /// A 7-Zip section or coder descriptor we can't make sense of.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(&'static str),

    /// A declared count or length exceeds the implementation ceiling.
    #[error("Declared size exceeds limit: {0}")]
    TooLarge(&'static str),

    /// The writer rejected an entry path.
    #[error("Invalid zip entry name: {0}")]
    InvalidName(String),

    /// A password was given but no crypto capability was provided.
    #[error("No crypto backend available for encryption")]
    CryptoUnavailable,

    /// The crypto backend couldn't produce random bytes.
    #[error("Random generator failure")]
    RngFailed,

    /// DEFLATE compression failed.
    #[error("Compression failed")]
    CompressionFailed,

    /// The envelope writer requires a non-empty password.
    #[error("Empty password")]
    InvalidPassword,
}
