use crate::error::{JsonLdError, Result};
use crate::util::{as_slice, has_keyword_form, is_absolute_iri, is_blank_node_id, is_keyword};
use oxiri::Iri;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Container types for JSON-LD `@container` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    List,
    Set,
    Index,
    Language,
}

impl Container {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "@list" => Some(Self::List),
            "@set" => Some(Self::Set),
            "@index" => Some(Self::Index),
            "@language" => Some(Self::Language),
            _ => None,
        }
    }
}

/// A single term definition of an [`ActiveContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermDefinition {
    /// The IRI mapping. `None` for terms explicitly mapped to `null`.
    pub iri: Option<String>,
    /// `@id`, `@vocab`, `@json`, `@none` or a datatype IRI.
    pub type_mapping: Option<String>,
    /// `Some(None)` means the default language is explicitly cleared for the term.
    pub language: Option<Option<String>>,
    pub container: Option<Container>,
    pub reverse: bool,
    /// Whether the term may be used as the prefix of a compact IRI.
    pub prefix: bool,
}

/// The result of processing a chain of local contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveContext {
    pub base: Option<String>,
    pub vocab: Option<String>,
    pub language: Option<String>,
    terms: BTreeMap<String, TermDefinition>,
    original_base: Option<String>,
}

impl ActiveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty context whose `@base` is `base`. A `null` local context resets to it.
    pub fn with_base(base: Option<String>) -> Self {
        Self {
            base: base.clone(),
            original_base: base,
            ..Self::default()
        }
    }

    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermDefinition)> {
        self.terms.iter().map(|(term, def)| (term.as_str(), def))
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// The container mapping of `property`, if it is a term with one.
    pub fn container(&self, property: Option<&str>) -> Option<Container> {
        property
            .and_then(|property| self.terms.get(property))
            .and_then(|def| def.container)
    }

    /// Processes `local` on top of this context and returns the new active context.
    ///
    /// `local` may be `null`, an object, or an array of those. Remote contexts (strings) are not
    /// loaded.
    pub fn parse(&self, local: &Value) -> Result<Self> {
        let mut result = self.clone();
        for context in as_slice(local) {
            match context {
                Value::Null => result = Self::with_base(self.original_base.clone()),
                Value::String(iri) => {
                    return Err(JsonLdError::LoadingRemoteContextFailed { iri: iri.clone() })
                }
                Value::Object(map) => result.apply(map)?,
                other => {
                    return Err(JsonLdError::InvalidLocalContext {
                        message: format!("unexpected context value {other}"),
                    })
                }
            }
        }
        Ok(result)
    }

    fn apply(&mut self, local: &Map<String, Value>) -> Result<()> {
        if local.contains_key("@import") {
            return Err(JsonLdError::unsupported("@import"));
        }
        if let Some(version) = local.get("@version") {
            if version.as_f64() != Some(1.1) {
                return Err(JsonLdError::InvalidLocalContext {
                    message: format!("invalid @version value {version}"),
                });
            }
        }
        if let Some(base) = local.get("@base") {
            self.base = match base {
                Value::Null => None,
                Value::String(iri) => Some(self.resolve_base(iri)?),
                other => {
                    return Err(JsonLdError::InvalidBaseIri {
                        iri: other.to_string(),
                    })
                }
            };
        }
        if let Some(vocab) = local.get("@vocab") {
            self.vocab = match vocab {
                Value::Null => None,
                Value::String(iri) if is_absolute_iri(iri) || is_blank_node_id(iri) => {
                    Some(iri.clone())
                }
                Value::String(iri) => Some(
                    self.expand_iri(iri, true, true)
                        .unwrap_or_else(|| iri.clone()),
                ),
                other => {
                    return Err(JsonLdError::InvalidVocabMapping {
                        value: other.clone(),
                    })
                }
            };
        }
        if let Some(language) = local.get("@language") {
            self.language = match language {
                Value::Null => None,
                Value::String(language) => Some(language.to_lowercase()),
                other => {
                    return Err(JsonLdError::InvalidDefaultLanguage {
                        value: other.clone(),
                    })
                }
            };
        }

        let mut defined = HashMap::new();
        for term in local.keys() {
            if matches!(
                term.as_str(),
                "@base"
                    | "@direction"
                    | "@import"
                    | "@language"
                    | "@propagate"
                    | "@protected"
                    | "@version"
                    | "@vocab"
            ) {
                continue;
            }
            self.create_term_definition(local, term, &mut defined)?;
        }
        Ok(())
    }

    fn resolve_base(&self, iri: &str) -> Result<String> {
        let invalid = || JsonLdError::InvalidBaseIri {
            iri: iri.to_owned(),
        };
        if is_absolute_iri(iri) {
            return Iri::parse(iri.to_owned())
                .map(Iri::into_inner)
                .map_err(|_| invalid());
        }
        let base = self.base.as_deref().ok_or_else(invalid)?;
        Iri::parse(base)
            .and_then(|base| base.resolve(iri))
            .map(Iri::into_inner)
            .map_err(|_| invalid())
    }

    fn create_term_definition(
        &mut self,
        local: &Map<String, Value>,
        term: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<()> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(JsonLdError::CyclicIriMapping {
                    term: term.to_owned(),
                })
            }
            None => {}
        }
        let Some(value) = local.get(term) else {
            return Ok(());
        };
        if term.is_empty() {
            return Err(JsonLdError::InvalidTermDefinition {
                term: term.to_owned(),
            });
        }
        if is_keyword(term) {
            return Err(JsonLdError::KeywordRedefinition {
                term: term.to_owned(),
            });
        }
        if has_keyword_form(term) {
            tracing::warn!(term, "Ignoring term that has the form of a keyword");
            return Ok(());
        }

        defined.insert(term.to_owned(), false);
        self.terms.remove(term);

        let empty = Map::new();
        let (map, id) = match value {
            Value::Null => (&empty, Some(&Value::Null)),
            Value::String(_) => (&empty, Some(value)),
            Value::Object(map) => (map, map.get("@id")),
            _ => {
                return Err(JsonLdError::InvalidTermDefinition {
                    term: term.to_owned(),
                })
            }
        };
        let simple_term = value.is_string();
        let mut definition = TermDefinition::default();

        if let Some(reverse) = map.get("@reverse") {
            if map.contains_key("@id") {
                return Err(JsonLdError::InvalidTermDefinition {
                    term: term.to_owned(),
                });
            }
            let Value::String(reverse) = reverse else {
                return Err(JsonLdError::InvalidIriMapping {
                    term: term.to_owned(),
                });
            };
            let iri = self.expand_iri_for_definition(local, term, reverse, defined)?;
            if !is_absolute_iri(&iri) && !is_blank_node_id(&iri) {
                return Err(JsonLdError::InvalidIriMapping {
                    term: term.to_owned(),
                });
            }
            definition.iri = Some(iri);
            definition.reverse = true;
        } else if let Some(id) = id.filter(|id| id.as_str() != Some(term)) {
            match id {
                Value::Null => {}
                Value::String(id) => {
                    let iri = self.expand_iri_for_definition(local, term, id, defined)?;
                    if iri == "@context"
                        || !(is_keyword(&iri) || is_absolute_iri(&iri) || is_blank_node_id(&iri))
                    {
                        return Err(JsonLdError::InvalidIriMapping {
                            term: term.to_owned(),
                        });
                    }
                    definition.prefix = simple_term
                        && !term.contains(':')
                        && !term.contains('/')
                        && iri.ends_with([':', '/', '?', '#', '[', ']', '@']);
                    definition.iri = Some(iri);
                }
                _ => {
                    return Err(JsonLdError::InvalidIriMapping {
                        term: term.to_owned(),
                    })
                }
            }
        } else if let Some((prefix, suffix)) = term.split_once(':') {
            if local.contains_key(prefix) {
                self.create_term_definition(local, prefix, defined)?;
            }
            let prefix_iri = self.terms.get(prefix).and_then(|def| def.iri.as_deref());
            definition.iri = Some(match prefix_iri {
                Some(prefix_iri) => format!("{prefix_iri}{suffix}"),
                None => term.to_owned(),
            });
        } else if term.contains('/') {
            definition.iri = self.expand_iri(term, false, true);
        } else if let Some(vocab) = &self.vocab {
            definition.iri = Some(format!("{vocab}{term}"));
        } else {
            return Err(JsonLdError::InvalidIriMapping {
                term: term.to_owned(),
            });
        }

        if let Some(type_mapping) = map.get("@type") {
            let Value::String(type_mapping) = type_mapping else {
                return Err(JsonLdError::InvalidTypeMapping {
                    term: term.to_owned(),
                });
            };
            let type_mapping = match type_mapping.as_str() {
                "@id" | "@vocab" | "@json" | "@none" => type_mapping.clone(),
                _ => {
                    let iri = self.expand_iri_for_definition(local, term, type_mapping, defined)?;
                    if !is_absolute_iri(&iri) {
                        return Err(JsonLdError::InvalidTypeMapping {
                            term: term.to_owned(),
                        });
                    }
                    iri
                }
            };
            definition.type_mapping = Some(type_mapping);
        }

        if let Some(container) = map.get("@container") {
            let container = match container {
                Value::String(container) => Container::parse(container),
                Value::Array(items) if items.len() == 1 => {
                    items[0].as_str().and_then(Container::parse)
                }
                _ => None,
            };
            let container = container.ok_or_else(|| JsonLdError::InvalidContainerMapping {
                term: term.to_owned(),
            })?;
            if definition.reverse && !matches!(container, Container::Set | Container::Index) {
                return Err(JsonLdError::InvalidContainerMapping {
                    term: term.to_owned(),
                });
            }
            definition.container = Some(container);
        }

        if let Some(language) = map.get("@language") {
            definition.language = Some(match language {
                Value::Null => None,
                Value::String(language) => Some(language.to_lowercase()),
                _ => {
                    return Err(JsonLdError::InvalidLanguageMapping {
                        term: term.to_owned(),
                    })
                }
            });
        }

        if let Some(prefix) = map.get("@prefix") {
            let Value::Bool(prefix) = prefix else {
                return Err(JsonLdError::InvalidTermDefinition {
                    term: term.to_owned(),
                });
            };
            if term.contains(':') || term.contains('/') {
                return Err(JsonLdError::InvalidTermDefinition {
                    term: term.to_owned(),
                });
            }
            definition.prefix = *prefix;
        }

        if map.contains_key("@context") {
            return Err(JsonLdError::unsupported("scoped contexts"));
        }
        if map.contains_key("@nest") {
            return Err(JsonLdError::unsupported("@nest"));
        }

        self.terms.insert(term.to_owned(), definition);
        defined.insert(term.to_owned(), true);
        Ok(())
    }

    /// IRI expansion while a local context is processed: terms of `local` the value depends on
    /// are defined first.
    fn expand_iri_for_definition(
        &mut self,
        local: &Map<String, Value>,
        term: &str,
        value: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<String> {
        if is_keyword(value) {
            return Ok(value.to_owned());
        }
        if local.contains_key(value) {
            self.create_term_definition(local, value, defined)?;
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix != "_" && !suffix.starts_with("//") && local.contains_key(prefix) {
                self.create_term_definition(local, prefix, defined)?;
            }
        }
        self.expand_iri(value, true, false)
            .ok_or_else(|| JsonLdError::InvalidIriMapping {
                term: term.to_owned(),
            })
    }

    /// Expands `value` to an absolute IRI, a blank node identifier or a keyword.
    ///
    /// With `vocab`, terms and `@vocab` are considered. With `document_relative`, relative IRIs
    /// are resolved against `@base`. Returns `None` for terms mapped to `null` and for strings
    /// that only look like keywords.
    pub fn expand_iri(&self, value: &str, vocab: bool, document_relative: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_owned());
        }
        if has_keyword_form(value) {
            return None;
        }
        if vocab {
            if let Some(definition) = self.terms.get(value) {
                return definition.iri.clone();
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_owned());
            }
            if let Some(prefix_iri) = self.terms.get(prefix).and_then(|def| def.iri.as_deref()) {
                return Some(format!("{prefix_iri}{suffix}"));
            }
            if is_absolute_iri(value) {
                return Some(value.to_owned());
            }
        }
        if vocab {
            if let Some(vocab) = &self.vocab {
                return Some(format!("{vocab}{value}"));
            }
        }
        if document_relative {
            if let Some(base) = &self.base {
                if let Ok(resolved) = Iri::parse(base.as_str()).and_then(|base| base.resolve(value))
                {
                    return Some(resolved.into_inner());
                }
            }
        }
        Some(value.to_owned())
    }
}
