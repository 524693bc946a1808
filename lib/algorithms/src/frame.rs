use crate::compact::{compact_expanded, local_context, remove_preserve, CompactOptions};
use crate::context::ActiveContext;
use crate::error::{JsonLdError, Result};
use crate::expand::{expand, ExpandOptions};
use crate::node_map::{generate_node_map, merge_node_maps, BlankNodeIssuer, NodeMap};
use crate::util::{
    add_value, as_slice, is_blank_node_id, is_keyword, is_list_object, is_node_reference,
    is_value_object, sorted_keys,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// How matched nodes are embedded into the nodes referencing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embed {
    /// Embeds every reference.
    Always,
    /// Embeds the first reference within a top-level match, later ones become references.
    Once,
    /// Never embeds, only references are produced.
    Never,
}

impl Embed {
    fn parse(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(true) => Ok(Self::Once),
            Value::Bool(false) => Ok(Self::Never),
            Value::String(embed) => match embed.as_str() {
                "@always" => Ok(Self::Always),
                "@once" => Ok(Self::Once),
                "@never" => Ok(Self::Never),
                "@last" => {
                    tracing::debug!("Treating @embed @last as @once");
                    Ok(Self::Once)
                }
                "@link" => Err(JsonLdError::unsupported("@embed @link")),
                _ => Err(JsonLdError::invalid_frame(format!(
                    "invalid @embed value {embed}"
                ))),
            },
            other => Err(JsonLdError::invalid_frame(format!(
                "invalid @embed value {other}"
            ))),
        }
    }

    fn as_keyword(self) -> &'static str {
        match self {
            Self::Always => "@always",
            Self::Once => "@once",
            Self::Never => "@never",
        }
    }
}

/// Defaults for the framing flags. Flags in the frame itself take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    pub embed: Embed,
    pub explicit: bool,
    pub require_all: bool,
    pub omit_default: bool,
    /// Returns a single top-level match without the `@graph` wrapper.
    pub omit_graph: bool,
    /// Removes blank node identifiers that are referenced only once.
    pub prune_blank_node_identifiers: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            embed: Embed::Once,
            explicit: false,
            require_all: false,
            omit_default: false,
            omit_graph: false,
            prune_blank_node_identifiers: true,
        }
    }
}

/// Frames `input` with `frame` and compacts the result with the frame's `@context`.
pub fn frame(input: &Value, frame: &Value, options: FrameOptions) -> Result<Value> {
    let context = match frame {
        Value::Object(map) => map.get("@context").cloned().unwrap_or(Value::Null),
        Value::Array(_) => Value::Null,
        other => {
            return Err(JsonLdError::invalid_frame(format!(
                "a frame must be an object, found {other}"
            )))
        }
    };
    let context = local_context(&context).clone();
    let active = ActiveContext::new().parse(&context)?;

    let expanded_frame = expand(
        frame,
        &ActiveContext::new(),
        ExpandOptions {
            frame_expansion: true,
        },
    )?;
    let frame = match as_slice(&expanded_frame).first() {
        None => Map::new(),
        Some(Value::Object(frame)) => frame.clone(),
        Some(other) => {
            return Err(JsonLdError::invalid_frame(format!(
                "a frame must be an object, found {other}"
            )))
        }
    };

    let expanded = expand(input, &ActiveContext::new(), ExpandOptions::default())?;
    let graphs = generate_node_map(&expanded, &mut BlankNodeIssuer::default());
    let subjects = merge_node_maps(&graphs);
    let ids: Vec<String> = subjects.keys().cloned().collect();

    let mut framer = Framer {
        subjects: &subjects,
        options,
        unique_embeds: HashSet::new(),
        subject_stack: Vec::new(),
    };
    let mut framed = Value::Array(framer.frame_subjects(&ids, &frame, false)?);
    tracing::trace!(matches = ?framed.as_array().map(Vec::len), "Framed input");

    if options.prune_blank_node_identifiers {
        prune_blank_node_identifiers(&mut framed);
    }
    let compacted = compact_expanded(
        &framed,
        &context,
        &active,
        CompactOptions {
            graph: !options.omit_graph,
        },
    )?;
    Ok(remove_preserve(&active, compacted))
}

#[derive(Debug, Clone, Copy)]
struct Flags {
    embed: Embed,
    explicit: bool,
    require_all: bool,
}

impl Flags {
    fn from_frame(frame: &Map<String, Value>, options: &FrameOptions) -> Result<Self> {
        Ok(Self {
            embed: match flag(frame, "@embed") {
                Some(embed) => Embed::parse(embed)?,
                None => options.embed,
            },
            explicit: bool_flag(frame, "@explicit")?.unwrap_or(options.explicit),
            require_all: bool_flag(frame, "@requireAll")?.unwrap_or(options.require_all),
        })
    }

    /// The frame used for properties the frame does not mention.
    fn implicit_frame(self) -> Map<String, Value> {
        let mut frame = Map::new();
        frame.insert(
            "@embed".to_owned(),
            Value::String(self.embed.as_keyword().to_owned()),
        );
        frame.insert("@explicit".to_owned(), Value::Bool(self.explicit));
        frame.insert("@requireAll".to_owned(), Value::Bool(self.require_all));
        frame
    }
}

/// A framing flag, unwrapped from arrays and value objects.
fn flag<'a>(frame: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    let value = as_slice(frame.get(name)?).first()?;
    match value {
        Value::Object(map) if map.contains_key("@value") => map.get("@value"),
        other => Some(other),
    }
}

fn bool_flag(frame: &Map<String, Value>, name: &str) -> Result<Option<bool>> {
    match flag(frame, name) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(other) => Err(JsonLdError::invalid_frame(format!(
            "invalid {name} value {other}"
        ))),
    }
}

/// The first frame of a property, if it is an object.
fn first_frame(value: &Value) -> Option<&Map<String, Value>> {
    as_slice(value).first().and_then(Value::as_object)
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

struct Framer<'a> {
    subjects: &'a NodeMap,
    options: FrameOptions,
    /// Nodes embedded below the current top-level match.
    unique_embeds: HashSet<String>,
    /// Nodes currently being embedded, used to break cycles.
    subject_stack: Vec<String>,
}

impl Framer<'_> {
    fn frame_subjects(
        &mut self,
        ids: &[String],
        frame: &Map<String, Value>,
        embedded: bool,
    ) -> Result<Vec<Value>> {
        let flags = Flags::from_frame(frame, &self.options)?;
        let subjects = self.subjects;
        let mut outputs = Vec::new();

        for id in ids {
            let Some(subject) = subjects.get(id) else {
                continue;
            };
            if !self.filter_subject(subject, frame, flags.require_all) {
                continue;
            }
            if !embedded {
                self.unique_embeds.clear();
            }

            let mut output = Map::new();
            output.insert("@id".to_owned(), Value::String(id.clone()));
            if embedded
                && (flags.embed == Embed::Never
                    || self.subject_stack.contains(id)
                    || (flags.embed == Embed::Once && self.unique_embeds.contains(id)))
            {
                outputs.push(Value::Object(output));
                continue;
            }
            self.unique_embeds.insert(id.clone());
            self.subject_stack.push(id.clone());

            for property in sorted_keys(subject) {
                let values = &subject[property];
                if is_keyword(property) {
                    output.insert(property.clone(), values.clone());
                    continue;
                }
                if flags.explicit && !frame.contains_key(property) {
                    continue;
                }
                let subframe = frame
                    .get(property)
                    .and_then(first_frame)
                    .cloned()
                    .unwrap_or_else(|| flags.implicit_frame());

                for item in as_slice(values) {
                    if is_list_object(item) {
                        let list_frame = subframe
                            .get("@list")
                            .and_then(first_frame)
                            .cloned()
                            .unwrap_or_else(|| flags.implicit_frame());
                        let mut list = Vec::new();
                        for entry in as_slice(&item["@list"]) {
                            match entry.get("@id").and_then(Value::as_str) {
                                Some(entry_id) if is_node_reference(entry) => list.extend(
                                    self.frame_subjects(&[entry_id.to_owned()], &list_frame, true)?,
                                ),
                                _ => list.push(entry.clone()),
                            }
                        }
                        let mut list_object = Map::new();
                        list_object.insert("@list".to_owned(), Value::Array(list));
                        add_value(&mut output, property, Value::Object(list_object), true, false);
                    } else if let Some(reference) =
                        item.get("@id").and_then(Value::as_str).filter(|_| is_node_reference(item))
                    {
                        for embedded in
                            self.frame_subjects(&[reference.to_owned()], &subframe, true)?
                        {
                            add_value(&mut output, property, embedded, true, false);
                        }
                    } else if value_match(&subframe, item) {
                        add_value(&mut output, property, item.clone(), true, false);
                    }
                }
            }

            for property in sorted_keys(frame) {
                if is_keyword(property) {
                    continue;
                }
                let empty = Map::new();
                let next = frame.get(property).and_then(first_frame).unwrap_or(&empty);
                let omit_default =
                    bool_flag(next, "@omitDefault")?.unwrap_or(self.options.omit_default);
                if !omit_default && !output.contains_key(property) {
                    let preserve = match next.get("@default") {
                        Some(Value::Array(default)) => Value::Array(default.clone()),
                        Some(default) => Value::Array(vec![default.clone()]),
                        None => Value::Array(vec![Value::String("@null".to_owned())]),
                    };
                    let mut preserved = Map::new();
                    preserved.insert("@preserve".to_owned(), preserve);
                    output.insert(
                        property.clone(),
                        Value::Array(vec![Value::Object(preserved)]),
                    );
                }
            }

            outputs.push(Value::Object(output));
            self.subject_stack.pop();
        }
        Ok(outputs)
    }

    /// Checks whether `subject` matches `frame`.
    ///
    /// `@id` and `@type` in the frame must match. A frame without properties matches every node,
    /// otherwise some property must match, or all of them with `require_all`.
    fn filter_subject(
        &self,
        subject: &Map<String, Value>,
        frame: &Map<String, Value>,
        require_all: bool,
    ) -> bool {
        let mut wildcard = true;
        let mut matches_some = false;

        for (key, frame_value) in frame {
            let node_values = subject.get(key).map(as_slice).unwrap_or_default();
            let frame_values = as_slice(frame_value);
            let match_this = match key.as_str() {
                "@id" => {
                    let matched = frame_values.first().map_or(true, is_empty_object)
                        || node_values
                            .first()
                            .is_some_and(|id| frame_values.contains(id));
                    if !require_all {
                        return matched;
                    }
                    matched
                }
                "@type" => {
                    wildcard = false;
                    if frame_values.is_empty() {
                        if !node_values.is_empty() {
                            return false;
                        }
                        true
                    } else if frame_values.len() == 1 && is_empty_object(&frame_values[0]) {
                        !node_values.is_empty()
                    } else {
                        let matched = frame_values.iter().any(|t| node_values.contains(t));
                        if !require_all {
                            return matched;
                        }
                        matched
                    }
                }
                key if is_keyword(key) => continue,
                _ => {
                    let pattern = frame_values.first();
                    let has_default = pattern
                        .and_then(Value::as_object)
                        .is_some_and(|pattern| pattern.contains_key("@default"));
                    wildcard = false;
                    if node_values.is_empty() && has_default {
                        continue;
                    }
                    if !node_values.is_empty() && frame_values.is_empty() {
                        return false;
                    }
                    match pattern {
                        None => true,
                        Some(pattern) => self.property_match(pattern, node_values, require_all),
                    }
                }
            };
            if !match_this && require_all {
                return false;
            }
            matches_some |= match_this;
        }
        wildcard || matches_some
    }

    fn property_match(&self, pattern: &Value, node_values: &[Value], require_all: bool) -> bool {
        if is_list_object(pattern) {
            let Some(list_pattern) = as_slice(&pattern["@list"]).first() else {
                return false;
            };
            let Some(list) = node_values.first().filter(|value| is_list_object(value)) else {
                return false;
            };
            let items = as_slice(&list["@list"]);
            if is_value_object(list_pattern) {
                items.iter().any(|item| value_match_pattern(list_pattern, item))
            } else if let Some(list_pattern) = list_pattern.as_object() {
                items
                    .iter()
                    .any(|item| self.node_match(list_pattern, item, require_all))
            } else {
                false
            }
        } else if is_value_object(pattern) {
            node_values
                .iter()
                .any(|value| value_match_pattern(pattern, value))
        } else if is_node_reference(pattern) {
            let Some(pattern) = pattern.as_object() else {
                return false;
            };
            node_values
                .iter()
                .any(|value| self.node_match(pattern, value, require_all))
        } else {
            pattern.is_object() && !node_values.is_empty()
        }
    }

    fn node_match(&self, pattern: &Map<String, Value>, value: &Value, require_all: bool) -> bool {
        value
            .get("@id")
            .and_then(Value::as_str)
            .and_then(|id| self.subjects.get(id))
            .is_some_and(|node| self.filter_subject(node, pattern, require_all))
    }
}

fn value_match(frame: &Map<String, Value>, value: &Value) -> bool {
    let patterns = |key: &str| frame.get(key).map(as_slice).unwrap_or_default();
    let (values, types, languages) = (patterns("@value"), patterns("@type"), patterns("@language"));
    if values.is_empty() && types.is_empty() && languages.is_empty() {
        return true;
    }
    let Some(value) = value.as_object() else {
        return false;
    };
    let matches = |patterns: &[Value], actual: Option<&Value>| match actual {
        None => patterns.is_empty(),
        Some(actual) => {
            patterns.contains(actual) || patterns.first().is_some_and(is_empty_object)
        }
    };
    let value_matches = value
        .get("@value")
        .is_some_and(|actual| values.contains(actual))
        || values.first().is_some_and(is_empty_object);
    value_matches
        && matches(types, value.get("@type"))
        && matches(languages, value.get("@language"))
}

fn value_match_pattern(pattern: &Value, value: &Value) -> bool {
    pattern
        .as_object()
        .is_some_and(|pattern| value_match(pattern, value))
}

/// Removes the `@id` of blank nodes that occur only once in the framed output.
fn prune_blank_node_identifiers(framed: &mut Value) {
    fn count<'a>(value: &'a Value, counts: &mut HashMap<&'a str, usize>) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| count(item, counts)),
            Value::Object(map) => {
                if let Some(id) = map.get("@id").and_then(Value::as_str) {
                    if is_blank_node_id(id) {
                        *counts.entry(id).or_default() += 1;
                    }
                }
                map.values().for_each(|value| count(value, counts));
            }
            _ => {}
        }
    }

    fn prune(value: &mut Value, single: &HashSet<String>) {
        match value {
            Value::Array(items) => items.iter_mut().for_each(|item| prune(item, single)),
            Value::Object(map) => {
                if map
                    .get("@id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| single.contains(id))
                {
                    map.remove("@id");
                }
                map.values_mut().for_each(|value| prune(value, single));
            }
            _ => {}
        }
    }

    let mut counts = HashMap::new();
    count(framed, &mut counts);
    let single: HashSet<String> = counts
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(id, _)| id.to_owned())
        .collect();
    prune(framed, &single);
}
