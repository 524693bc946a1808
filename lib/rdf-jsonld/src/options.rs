use crate::error::SerializerError;
use rdf_jsonld_model::{Iri, NamedNode, NamedNodeRef};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The options of a [`JsonLdSerializer`](crate::JsonLdSerializer).
///
/// Every field is optional so that the options passed to
/// [`import_with`](crate::JsonLdSerializer::import_with) can override the constructor options
/// field by field. The options can also be deserialized from their JSON form:
///
/// ```
/// use rdf_jsonld::{Encoding, ProcessStep, SerializerOptions};
///
/// let options: SerializerOptions = serde_json::from_str(
///     r#"{
///         "context": {"ex": "http://example.org/"},
///         "skipGraphProperty": true,
///         "encoding": "string",
///         "baseIRI": "http://example.org/",
///         "process": [{"compact": true}]
///     }"#,
/// )?;
/// let config = options.resolve()?;
/// assert_eq!(config.encoding, Encoding::String);
/// assert_eq!(config.steps(), vec![ProcessStep::Compact]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializerOptions {
    pub context: Option<Value>,
    pub compact: Option<bool>,
    pub flatten: Option<bool>,
    pub frame: Option<bool>,
    pub skip_context: Option<bool>,
    pub skip_graph_property: Option<bool>,
    pub encoding: Option<Encoding>,
    pub pretty_print: Option<bool>,
    #[serde(rename = "baseIRI")]
    pub base_iri: Option<BaseIri>,
    #[serde(alias = "process")]
    pub process_steps: Option<Vec<ProcessStep>>,
}

impl SerializerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the context used by the compact, flatten and frame steps.
    ///
    /// When framing, the context is the frame.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<Value>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = Some(compact);
        self
    }

    #[must_use]
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = Some(flatten);
        self
    }

    #[must_use]
    pub fn with_frame(mut self, frame: bool) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Removes the top-level `@context` of the result.
    #[must_use]
    pub fn with_skip_context(mut self, skip_context: bool) -> Self {
        self.skip_context = Some(skip_context);
        self
    }

    /// Merges a top-level `@graph` with exactly one entry into the root object.
    #[must_use]
    pub fn with_skip_graph_property(mut self, skip_graph_property: bool) -> Self {
        self.skip_graph_property = Some(skip_graph_property);
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Indents the text output by two spaces. Only used with [`Encoding::String`].
    #[must_use]
    pub fn with_pretty_print(mut self, pretty_print: bool) -> Self {
        self.pretty_print = Some(pretty_print);
        self
    }

    /// Sets `@base` in the context.
    ///
    /// The base IRI replaces a `@base` already present in the context.
    #[must_use]
    pub fn with_base_iri(mut self, base_iri: impl Into<BaseIri>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    /// Runs the given steps, in order, instead of the `compact`, `flatten` and `frame` flags.
    #[must_use]
    pub fn with_process_steps(mut self, steps: impl IntoIterator<Item = ProcessStep>) -> Self {
        self.process_steps = Some(steps.into_iter().collect());
        self
    }

    /// Returns these options with every field set in `overrides` replaced.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            context: overrides.context.or(self.context),
            compact: overrides.compact.or(self.compact),
            flatten: overrides.flatten.or(self.flatten),
            frame: overrides.frame.or(self.frame),
            skip_context: overrides.skip_context.or(self.skip_context),
            skip_graph_property: overrides.skip_graph_property.or(self.skip_graph_property),
            encoding: overrides.encoding.or(self.encoding),
            pretty_print: overrides.pretty_print.or(self.pretty_print),
            base_iri: overrides.base_iri.or(self.base_iri),
            process_steps: overrides.process_steps.or(self.process_steps),
        }
    }

    /// Validates the options and fills in the defaults.
    pub fn resolve(&self) -> Result<PipelineConfig, SerializerError> {
        let context = match &self.context {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(context)) => context.clone(),
            Some(other) => {
                return Err(SerializerError::InvalidOptions(format!(
                    "the context must be an object, found {other}"
                )))
            }
        };
        if let Some(base_iri) = &self.base_iri {
            Iri::parse(base_iri.as_str()).map_err(|e| {
                SerializerError::InvalidOptions(format!(
                    "'{}' is not a valid base IRI: {e}",
                    base_iri.as_str()
                ))
            })?;
        }
        Ok(PipelineConfig {
            context,
            compact: self.compact.unwrap_or_default(),
            flatten: self.flatten.unwrap_or_default(),
            frame: self.frame.unwrap_or_default(),
            skip_context: self.skip_context.unwrap_or_default(),
            skip_graph_property: self.skip_graph_property.unwrap_or_default(),
            encoding: self.encoding.unwrap_or_default(),
            pretty_print: self.pretty_print.unwrap_or_default(),
            base_iri: self.base_iri.clone(),
            process_steps: self.process_steps.clone(),
        })
    }
}

/// An absolute IRI used as `@base` of the context.
///
/// It can be built from a [`NamedNode`], an [`Iri`] or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct BaseIri(String);

impl BaseIri {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseIri {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NamedNode> for BaseIri {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self(node.into_string())
    }
}

impl From<NamedNodeRef<'_>> for BaseIri {
    #[inline]
    fn from(node: NamedNodeRef<'_>) -> Self {
        Self(node.as_str().to_owned())
    }
}

impl From<Iri<String>> for BaseIri {
    #[inline]
    fn from(iri: Iri<String>) -> Self {
        Self(iri.into_inner())
    }
}

impl From<&str> for BaseIri {
    #[inline]
    fn from(iri: &str) -> Self {
        Self(iri.to_owned())
    }
}

impl From<String> for BaseIri {
    #[inline]
    fn from(iri: String) -> Self {
        Self(iri)
    }
}

/// The shape of the emitted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// A [`serde_json::Value`].
    #[default]
    Object,
    /// The JSON text of the document.
    String,
}

/// One step of an explicit processing order.
///
/// In JSON a step is an object with exactly one flag set, e.g. `{"flatten": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "BTreeMap<String, bool>")]
pub enum ProcessStep {
    Compact,
    Flatten,
    Frame,
}

impl fmt::Display for ProcessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Flatten => "flatten",
            Self::Frame => "frame",
        })
    }
}

impl TryFrom<BTreeMap<String, bool>> for ProcessStep {
    type Error = String;

    fn try_from(flags: BTreeMap<String, bool>) -> Result<Self, Self::Error> {
        let mut selected = None;
        for (name, enabled) in flags {
            let step = match name.as_str() {
                "compact" => Self::Compact,
                "flatten" => Self::Flatten,
                "frame" => Self::Frame,
                _ => return Err(format!("unknown process step '{name}'")),
            };
            if !enabled {
                continue;
            }
            if let Some(previous) = selected.replace(step) {
                return Err(format!(
                    "a process step must set exactly one flag, found '{previous}' and '{step}'"
                ));
            }
        }
        selected.ok_or_else(|| "a process step must set exactly one flag".to_owned())
    }
}

/// The resolved options of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub context: Map<String, Value>,
    pub compact: bool,
    pub flatten: bool,
    pub frame: bool,
    pub skip_context: bool,
    pub skip_graph_property: bool,
    pub encoding: Encoding,
    pub pretty_print: bool,
    pub base_iri: Option<BaseIri>,
    pub process_steps: Option<Vec<ProcessStep>>,
}

impl PipelineConfig {
    /// The steps of the run, in execution order.
    pub fn steps(&self) -> Vec<ProcessStep> {
        if let Some(steps) = &self.process_steps {
            return steps.clone();
        }
        [
            (self.compact, ProcessStep::Compact),
            (self.flatten, ProcessStep::Flatten),
            (self.frame, ProcessStep::Frame),
        ]
        .into_iter()
        .filter_map(|(enabled, step)| enabled.then_some(step))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() -> Result<(), SerializerError> {
        let config = SerializerOptions::new().resolve()?;
        assert!(config.context.is_empty());
        assert!(config.steps().is_empty());
        assert_eq!(config.encoding, Encoding::Object);
        assert!(!config.skip_context && !config.skip_graph_property && !config.pretty_print);
        Ok(())
    }

    #[test]
    fn test_flags_run_in_fixed_order() -> Result<(), SerializerError> {
        let config = SerializerOptions::new()
            .with_frame(true)
            .with_compact(true)
            .resolve()?;
        assert_eq!(config.steps(), vec![ProcessStep::Compact, ProcessStep::Frame]);
        Ok(())
    }

    #[test]
    fn test_process_steps_replace_flags() -> Result<(), SerializerError> {
        let config = SerializerOptions::new()
            .with_compact(true)
            .with_process_steps([ProcessStep::Flatten, ProcessStep::Compact])
            .resolve()?;
        assert_eq!(
            config.steps(),
            vec![ProcessStep::Flatten, ProcessStep::Compact]
        );
        Ok(())
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let base = SerializerOptions::new()
            .with_context(json!({"ex": "http://example.org/"}))
            .with_compact(true);
        let overrides = SerializerOptions::new()
            .with_compact(false)
            .with_encoding(Encoding::String);
        let merged = base.merge(overrides);
        assert_eq!(merged.context, Some(json!({"ex": "http://example.org/"})));
        assert_eq!(merged.compact, Some(false));
        assert_eq!(merged.encoding, Some(Encoding::String));
    }

    #[test]
    fn test_deserialize_process_alias() -> Result<(), Box<dyn std::error::Error>> {
        let options: SerializerOptions = serde_json::from_value(json!({
            "process": [{"flatten": true}, {"compact": true, "frame": false}]
        }))?;
        assert_eq!(
            options.process_steps,
            Some(vec![ProcessStep::Flatten, ProcessStep::Compact])
        );
        Ok(())
    }

    #[test]
    fn test_deserialize_rejects_ambiguous_step() {
        let result = serde_json::from_value::<SerializerOptions>(
            json!({"processSteps": [{"flatten": true, "compact": true}]}),
        );
        assert!(result.is_err());
        let result =
            serde_json::from_value::<SerializerOptions>(json!({"processSteps": [{"sort": true}]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_base_iri_forms_are_equal() -> Result<(), Box<dyn std::error::Error>> {
        let from_str = BaseIri::from("http://example.org/");
        let from_node = BaseIri::from(NamedNode::new("http://example.org/")?);
        let from_iri = BaseIri::from(Iri::parse("http://example.org/".to_owned())?);
        assert_eq!(from_str, from_node);
        assert_eq!(from_str, from_iri);
        Ok(())
    }

    #[test]
    fn test_invalid_options() {
        let result = SerializerOptions::new().with_context(json!(["ex"])).resolve();
        assert!(matches!(result, Err(SerializerError::InvalidOptions(_))));
        let result = SerializerOptions::new().with_base_iri("not an iri").resolve();
        assert!(matches!(result, Err(SerializerError::InvalidOptions(_))));
    }
}
