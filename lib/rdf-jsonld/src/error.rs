use crate::options::ProcessStep;
use rdf_jsonld_algorithms::JsonLdError;
use rdf_jsonld_model::SourceError;
use std::io;

/// An error raised while serializing a quad stream into JSON-LD.
///
/// Every error ends the run. It is emitted as the single item of the
/// [`SerializerStream`](crate::SerializerStream).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SerializerError {
    /// The quad source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The conversion of the collected quads into JSON-LD failed.
    #[error("Failed to convert the quads into JSON-LD: {0}")]
    Conversion(#[source] JsonLdError),
    /// A compact, flatten or frame step failed.
    #[error("The {step} step failed: {source}")]
    Transform {
        /// The step that failed.
        step: ProcessStep,
        /// The error raised by the JSON-LD processor.
        #[source]
        source: JsonLdError,
    },
    /// The document could not be encoded as text.
    #[error("Failed to encode the JSON-LD document: {0}")]
    Encoding(#[from] serde_json::Error),
    /// The options are invalid.
    #[error("Invalid serializer options: {0}")]
    InvalidOptions(String),
}

impl From<SerializerError> for io::Error {
    #[inline]
    fn from(error: SerializerError) -> Self {
        match error {
            SerializerError::Source(error) => error.into(),
            SerializerError::Encoding(error) => error.into(),
            SerializerError::InvalidOptions(_) => {
                Self::new(io::ErrorKind::InvalidInput, error.to_string())
            }
            SerializerError::Conversion(_) | SerializerError::Transform { .. } => {
                Self::new(io::ErrorKind::InvalidData, error.to_string())
            }
        }
    }
}
