use crate::compact::{compact, CompactOptions};
use crate::error::JsonLdError;
use crate::flatten::flatten;
use crate::frame::{frame, FrameOptions};
use crate::from_rdf::from_rdf;
use crate::rdf::RdfQuad;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// The JSON-LD algorithms used by a serializer.
///
/// Implementations may run the algorithms elsewhere (e.g. on a blocking pool or in another
/// process). [`DefaultJsonLdProcessor`] runs them in place.
#[async_trait]
pub trait JsonLdProcessor: Debug + Send + Sync {
    /// Converts a dataset into an expanded document.
    async fn from_rdf(&self, quads: &[RdfQuad]) -> Result<Value, JsonLdError>;

    /// Compacts `document` with `context`.
    async fn compact(&self, document: Value, context: &Value) -> Result<Value, JsonLdError>;

    /// Flattens `document` and compacts the result with `context`.
    async fn flatten(&self, document: Value, context: &Value) -> Result<Value, JsonLdError>;

    /// Frames `document` with `frame`.
    async fn frame(&self, document: Value, frame: &Value) -> Result<Value, JsonLdError>;
}

/// Runs the algorithms of this crate with their default options.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultJsonLdProcessor {
    frame_options: FrameOptions,
}

impl DefaultJsonLdProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `options` as the defaults for framing.
    #[must_use]
    pub fn with_frame_options(mut self, options: FrameOptions) -> Self {
        self.frame_options = options;
        self
    }
}

#[async_trait]
impl JsonLdProcessor for DefaultJsonLdProcessor {
    async fn from_rdf(&self, quads: &[RdfQuad]) -> Result<Value, JsonLdError> {
        Ok(from_rdf(quads))
    }

    async fn compact(&self, document: Value, context: &Value) -> Result<Value, JsonLdError> {
        compact(&document, context, CompactOptions::default())
    }

    async fn flatten(&self, document: Value, context: &Value) -> Result<Value, JsonLdError> {
        flatten(&document, context)
    }

    async fn frame(&self, document: Value, frame_value: &Value) -> Result<Value, JsonLdError> {
        frame(&document, frame_value, self.frame_options)
    }
}
