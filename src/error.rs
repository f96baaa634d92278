use crate::object::ObjectId;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type returned by every public entry point.
///
/// The core never prints, logs, or swallows an error: every failure is
/// surfaced to the caller as one of these variants.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Xref(#[from] XrefError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeature),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("dangling reference to object {} {}", .0.0, .0.1)]
    Resolution(ObjectId),

    #[error("serializer produced invalid PDF: {0}")]
    Write(String),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error("object {} {} is not a dictionary", .0.0, .0.1)]
    NotDictionary(ObjectId),

    #[error("object {} {} is not a stream", .0.0, .0.1)]
    NotStream(ObjectId),

    #[error("object {} {} is not an array", .0.0, .0.1)]
    NotArray(ObjectId),

    #[error("reference cycle detected while resolving object {} {}", .0.0, .0.1)]
    ReferenceCycle(ObjectId),

    #[error("missing xref entry")]
    MissingXrefEntry,

    #[error("dictionary is missing required key /{0}")]
    MissingKey(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
}

impl Error {
    pub fn missing_key(key: &[u8]) -> Self {
        Error::MissingKey(String::from_utf8_lossy(key).into_owned())
    }
}

/// Byte-level tokenization failures. All positions are offsets into the
/// buffer the lexer was constructed over.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("malformed number at offset {0}")]
    MalformedNumber(usize),
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("invalid hex digit at offset {0}")]
    InvalidHexDigit(usize),
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEof(usize),
}

/// Object-structure failures: invalid syntax, a missing required entry, or
/// an unrecognized keyword where a value was expected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid file header: missing %PDF- marker")]
    InvalidFileHeader,
    #[error("invalid indirect object syntax at offset {0}")]
    InvalidIndirectObject(usize),
    #[error("invalid xref table or stream")]
    InvalidXref,
    #[error("invalid dictionary syntax at offset {0}")]
    InvalidDictionary(usize),
    #[error("invalid object stream header")]
    InvalidObjectStream,
    #[error("unexpected keyword '{0}'")]
    UnexpectedKeyword(String),
    #[error("offset {0} is past the end of the buffer")]
    InvalidOffset(usize),
    #[error("stream object {0} {1} has no usable /Length")]
    InvalidStreamLength(u32, u16),
}

/// Cross-reference table/stream resolution failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum XrefError {
    #[error("could not locate startxref")]
    Start,
    #[error("invalid /Prev offset")]
    PrevStart,
    #[error("invalid /XRefStm offset")]
    StreamStart,
    #[error("cycle detected while walking /Prev chain")]
    PrevCycle,
    #[error("xref stream missing required /W entry")]
    MissingW,
}

/// A filter, predictor, or encryption handler this crate does not implement.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedFeature {
    #[error("unsupported filter: {0}")]
    Filter(String),
    #[error("unsupported predictor: {0}")]
    Predictor(i64),
    #[error("unsupported xref format")]
    XrefFormat,
}

/// Stream decode/encode failures (decompression, hex/base85 corruption).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("flate decompression failed: {0}")]
    Flate(String),
    #[error("invalid hex string at offset {0}")]
    InvalidHex(usize),
    #[error("invalid ASCII85 data at offset {0}")]
    InvalidAscii85(usize),
    #[error("invalid LZW stream: {0}")]
    Lzw(String),
    #[error("invalid run-length data")]
    RunLength,
}

/// Signature construction/verification failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("missing signing certificate")]
    MissingCertificate,
    #[error("missing or unusable private key: {0}")]
    UnusableKey(String),
    #[error("signature placeholder too small: need {needed} bytes, reserved {reserved}")]
    PlaceholderTooSmall { needed: usize, reserved: usize },
    #[error("could not compute byte range: {0}")]
    ByteRange(String),
    #[error("document has no existing revision to append to")]
    NoPriorRevision,
    #[error("no signature dictionary found")]
    NoSignature,
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),
}

