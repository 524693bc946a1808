use crate::collect::collect_quads;
use crate::context::ContextAccumulator;
use crate::error::SerializerError;
use crate::options::{PipelineConfig, SerializerOptions};
use crate::source::QuadSource;
use crate::stream::SerializerStream;
use crate::transform::{SerializedOutput, TransformChain};
use rdf_jsonld_algorithms::{DefaultJsonLdProcessor, JsonLdProcessor, RdfQuad};
use std::sync::Arc;
use tracing::debug;

/// Serializes quad sources into JSON-LD documents.
///
/// Each call to [`import`](Self::import) starts an independent run. The serializer can be cloned
/// cheaply and shared between tasks.
///
/// ```
/// use futures::StreamExt;
/// use rdf_jsonld::{JsonLdSerializer, QuadStreamSource, SerializedOutput, SerializerOptions};
/// use rdf_jsonld::model::{GraphName, Literal, NamedNode, Quad};
/// use serde_json::json;
///
/// let serializer = JsonLdSerializer::new(
///     SerializerOptions::new()
///         .with_context(json!({"ex": "http://example.org/"}))
///         .with_compact(true),
/// );
/// let source = QuadStreamSource::from_quads([Quad::new(
///     NamedNode::new("http://example.org/subject")?,
///     NamedNode::new("http://example.org/predicate")?,
///     Literal::new_simple_literal("object"),
///     GraphName::DefaultGraph,
/// )]);
/// # tokio_test::block_on(async {
/// let mut stream = serializer.import(source);
/// assert_eq!(
///     stream.next().await.transpose()?,
///     Some(SerializedOutput::Object(json!({
///         "@context": {"ex": "http://example.org/"},
///         "@id": "ex:subject",
///         "ex:predicate": "object"
///     })))
/// );
/// assert!(stream.next().await.is_none());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonLdSerializer {
    options: SerializerOptions,
    processor: Arc<dyn JsonLdProcessor>,
}

impl JsonLdSerializer {
    /// A serializer running the algorithms of [`DefaultJsonLdProcessor`].
    pub fn new(options: SerializerOptions) -> Self {
        Self::with_processor(options, Arc::new(DefaultJsonLdProcessor::new()))
    }

    /// A serializer delegating the JSON-LD algorithms to `processor`.
    pub fn with_processor(options: SerializerOptions, processor: Arc<dyn JsonLdProcessor>) -> Self {
        Self { options, processor }
    }

    /// The options every run of this serializer starts from.
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Serializes `source` with the options of this serializer.
    pub fn import(&self, source: impl QuadSource + 'static) -> SerializerStream {
        self.import_with(source, SerializerOptions::default())
    }

    /// Serializes `source` with the options of this serializer, replacing the fields set in
    /// `overrides`.
    pub fn import_with(
        &self,
        source: impl QuadSource + 'static,
        overrides: SerializerOptions,
    ) -> SerializerStream {
        let options = self.options.clone().merge(overrides);
        SerializerStream::new(run(source, options, Arc::clone(&self.processor)))
    }

    /// Serializes `source` and waits for the result.
    pub async fn serialize(
        &self,
        source: impl QuadSource + 'static,
    ) -> Result<SerializedOutput, SerializerError> {
        run(source, self.options.clone(), Arc::clone(&self.processor)).await
    }
}

impl Default for JsonLdSerializer {
    fn default() -> Self {
        Self::new(SerializerOptions::default())
    }
}

async fn run(
    source: impl QuadSource,
    options: SerializerOptions,
    processor: Arc<dyn JsonLdProcessor>,
) -> Result<SerializedOutput, SerializerError> {
    let mut config = options.resolve()?;
    let steps = config
        .steps()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    debug!("Starting JSON-LD serialization with steps [{}]", steps.join(", "));
    let mut context = ContextAccumulator::new(config.context, config.base_iri.as_ref());
    let quads = collect_quads(source, &mut context).await?;
    config.context = context.into_context();
    let output = serialize_quads(&quads, &config, processor.as_ref()).await?;
    debug!("Finished JSON-LD serialization of {} quads", quads.len());
    Ok(output)
}

/// Converts already collected quads into JSON-LD and post-processes the document.
///
/// `config.context` is used as is: it must already contain the prefixes and `@base`.
pub async fn serialize_quads(
    quads: &[RdfQuad],
    config: &PipelineConfig,
    processor: &dyn JsonLdProcessor,
) -> Result<SerializedOutput, SerializerError> {
    let document = processor
        .from_rdf(quads)
        .await
        .map_err(SerializerError::Conversion)?;
    TransformChain::apply(document, config, processor).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::QuadStreamSource;
    use rdf_jsonld_algorithms::{RdfTerm, XSD_STRING};
    use serde_json::json;

    #[tokio::test]
    async fn test_serialize_quads_without_steps() -> Result<(), SerializerError> {
        let quads = [RdfQuad::new(
            RdfTerm::NamedNode("http://example.org/subject".to_owned()),
            RdfTerm::NamedNode("http://example.org/predicate".to_owned()),
            RdfTerm::Literal {
                value: "object".to_owned(),
                language: None,
                datatype: XSD_STRING.to_owned(),
            },
            RdfTerm::DefaultGraph,
        )];
        let config = SerializerOptions::new().resolve()?;
        let output = serialize_quads(&quads, &config, &DefaultJsonLdProcessor::new()).await?;
        assert_eq!(
            output,
            SerializedOutput::Object(json!([{
                "@id": "http://example.org/subject",
                "http://example.org/predicate": [{"@value": "object"}]
            }]))
        );
        Ok(())
    }

    #[test]
    fn test_import_with_keeps_options() {
        let serializer = JsonLdSerializer::new(SerializerOptions::new().with_compact(true));
        drop(serializer.import_with(
            QuadStreamSource::from_quads([]),
            SerializerOptions::new().with_flatten(true),
        ));
        assert_eq!(
            serializer.options(),
            &SerializerOptions::new().with_compact(true)
        );
    }

    #[tokio::test]
    async fn test_invalid_options_are_emitted() {
        let serializer =
            JsonLdSerializer::new(SerializerOptions::new().with_context(json!("not a context")));
        let result = serializer.serialize(QuadStreamSource::from_quads([])).await;
        assert!(matches!(result, Err(SerializerError::InvalidOptions(_))));
    }

    #[tokio::test]
    async fn test_empty_source() -> Result<(), SerializerError> {
        let serializer = JsonLdSerializer::default();
        let output = serializer.serialize(QuadStreamSource::from_quads([])).await?;
        assert_eq!(output, SerializedOutput::Object(json!([])));
        Ok(())
    }
}
