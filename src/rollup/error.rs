use std::io;
use std::num::ParseIntError;

/// Malformed content in a `Key: value [unit]` file.
///
/// Converts into an [`io::Error`] of kind [`io::ErrorKind::InvalidData`], so a
/// parser can keep returning [`io::Result`] and callers can still recover the
/// cause through [`io::Error::get_ref`].
#[derive(Debug, thiserror::Error)]
pub enum StatParseError {
    #[error("key `{field}` repeated on line {line}")]
    DuplicateField { field: String, line: usize },

    #[error("line {line}: `{value}` is not a valid value for `{key}`: {source}")]
    InvalidKeyValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<StatParseError> for io::Error {
    fn from(err: StatParseError) -> Self {
        if let StatParseError::Io(inner) = err {
            return inner;
        }
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

/// Recovers the [`StatParseError`] wrapped by `err`. Panics if there is none.
#[cfg(test)]
pub(super) fn unwrap_parse_error(err: &io::Error) -> &StatParseError {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<StatParseError>())
        .expect("io::Error does not wrap a StatParseError")
}
