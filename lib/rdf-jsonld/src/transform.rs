use crate::error::SerializerError;
use crate::options::{Encoding, PipelineConfig, ProcessStep};
use rdf_jsonld_algorithms::{JsonLdError, JsonLdProcessor};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// The single item emitted by a serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedOutput {
    Object(Value),
    Text(String),
}

impl SerializedOutput {
    /// Returns the document, parsing it if it was encoded as text.
    pub fn into_value(self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Object(value) => Ok(value),
            Self::Text(text) => serde_json::from_str(&text),
        }
    }

    pub fn as_object(&self) -> Option<&Value> {
        match self {
            Self::Object(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Object(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for SerializedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Post-processes the document produced by the RDF to JSON-LD conversion.
///
/// The steps run in this order: the compact, flatten and frame steps (or the explicit process
/// steps), removal of the `@context`, unwrapping of a single-entry `@graph` and finally the
/// encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformChain;

impl TransformChain {
    pub async fn apply(
        mut document: Value,
        config: &PipelineConfig,
        processor: &dyn JsonLdProcessor,
    ) -> Result<SerializedOutput, SerializerError> {
        let context = Value::Object(config.context.clone());
        if config.process_steps.is_none()
            && [config.compact, config.flatten, config.frame]
                .into_iter()
                .filter(|flag| *flag)
                .count()
                > 1
        {
            warn!(
                "Several of compact, flatten and frame are enabled, they are chained in this order"
            );
        }

        for step in config.steps() {
            debug!("Running the {step} step");
            document = run_step(step, document, &context, processor)
                .await
                .map_err(|source| SerializerError::Transform { step, source })?;
        }

        if config.skip_context {
            strip_context(&mut document);
        }
        if config.skip_graph_property {
            unwrap_single_graph(&mut document);
        }
        encode(document, config)
    }
}

async fn run_step(
    step: ProcessStep,
    document: Value,
    context: &Value,
    processor: &dyn JsonLdProcessor,
) -> Result<Value, JsonLdError> {
    match step {
        ProcessStep::Compact => processor.compact(document, context).await,
        ProcessStep::Flatten => processor.flatten(document, context).await,
        ProcessStep::Frame => processor.frame(document, context).await,
    }
}

/// Removes the top-level `@context` of `document`, if any.
pub fn strip_context(document: &mut Value) {
    if let Value::Object(object) = document {
        object.remove("@context");
    }
}

/// Merges the entry of a top-level `@graph` into the root object if it is the only one.
///
/// Keys of the entry replace the root keys with the same name.
pub fn unwrap_single_graph(document: &mut Value) {
    let Value::Object(object) = document else {
        return;
    };
    let entry = match object.get("@graph") {
        Some(Value::Array(graph)) if graph.len() == 1 => match &graph[0] {
            Value::Object(entry) => entry.clone(),
            _ => return,
        },
        _ => return,
    };
    object.remove("@graph");
    object.extend(entry);
}

fn encode(document: Value, config: &PipelineConfig) -> Result<SerializedOutput, SerializerError> {
    Ok(match config.encoding {
        Encoding::Object => SerializedOutput::Object(document),
        Encoding::String if config.pretty_print => {
            SerializedOutput::Text(serde_json::to_string_pretty(&document)?)
        }
        Encoding::String => SerializedOutput::Text(serde_json::to_string(&document)?),
    })
}
