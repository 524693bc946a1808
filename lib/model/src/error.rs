use oxrdfio::RdfParseError;
use std::error::Error;
use std::io;

/// An error raised by a quad source before it signalled the end of its sequence.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The source failed to parse its input.
    #[error(transparent)]
    Parsing(#[from] RdfParseError),
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl SourceError {
    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Other(msg.into().into())
    }

    /// Wraps an arbitrary error raised by the source.
    #[inline]
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}

impl From<SourceError> for io::Error {
    #[inline]
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::Parsing(error) => error.into(),
            SourceError::Io(error) => error,
            SourceError::Other(error) => Self::other(error),
        }
    }
}
