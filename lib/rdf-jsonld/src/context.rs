use crate::options::BaseIri;
use crate::source::{PrefixEvent, PrefixReceiver};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Builds the context of a run from the configured context and the prefixes declared by the
/// source.
///
/// Keys are never overwritten: the first declaration of a prefix wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextAccumulator {
    context: Map<String, Value>,
}

impl ContextAccumulator {
    /// Starts from `context`, with `@base` set to `base_iri` if given.
    pub fn new(mut context: Map<String, Value>, base_iri: Option<&BaseIri>) -> Self {
        if let Some(base_iri) = base_iri {
            context.insert("@base".to_owned(), Value::String(base_iri.as_str().to_owned()));
        }
        Self { context }
    }

    /// Adds `prefix` unless the context already has an entry with this name.
    ///
    /// Returns whether the prefix was added.
    pub fn declare(&mut self, event: PrefixEvent) -> bool {
        if self.context.contains_key(&event.prefix) {
            debug!(
                "Ignoring declaration of '{}' as <{}>, the prefix is already defined",
                event.prefix,
                event.namespace.as_str()
            );
            return false;
        }
        trace!(
            "Declaring prefix '{}' as <{}>",
            event.prefix,
            event.namespace.as_str()
        );
        self.context
            .insert(event.prefix, Value::String(event.namespace.into_string()));
        true
    }

    /// Declares every event currently buffered in `receiver`.
    pub fn drain(&mut self, receiver: &mut PrefixReceiver) {
        while let Some(event) = receiver.try_next() {
            self.declare(event);
        }
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn into_context(self) -> Map<String, Value> {
        self.context
    }
}
