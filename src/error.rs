use core::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The reason an image was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The buffer does not start with an SOI marker and is not a JPEG file.
    NotAJpeg,
    /// The file is a JPEG, but uses a feature this library does not support
    /// (progressive encoding, >8-bit precision, arithmetic coding, unusual
    /// sampling factors or component counts).
    Unsupported,
    /// The bitstream violates the baseline JPEG segment grammar.
    SyntaxError,
    /// An internal invariant was violated. Not triggerable by a conforming
    /// (even if malformed) input file.
    InternalError,
}

/// The error type returned by all decoding and encoding entry points.
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn not_a_jpeg(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAJpeg, message)
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Returns the broad category of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for Error {}
