use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// An error from the underlying reader or writer.
    Io(std::io::Error),

    /// A discriminant that selects no arm of an enum or union.
    InvalidEnumValue(u32),

    /// A value too large to be length-prefixed with a `u32`.
    ObjectTooLarge(usize),

    /// A byte string that was expected to be UTF-8 but is not.
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::InvalidEnumValue(v) => write!(f, "invalid enum value: {v}"),
            Self::ObjectTooLarge(len) => write!(f, "object too large: {len} bytes"),
            Self::Utf8(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}
