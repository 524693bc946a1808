use crate::context::{ActiveContext, Container, TermDefinition};
use crate::error::Result;
use crate::expand::{expand, ExpandOptions};
use crate::util::{
    add_value, as_slice, is_blank_node_id, is_keyword, is_list_object, is_node_reference,
    sorted_keys,
};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactOptions {
    /// Always puts the top-level nodes into an `@graph` array, even if there is only one.
    pub graph: bool,
}

/// Compacts `input` with `context`.
///
/// `context` may be the context itself or an object carrying it in `@context`. The input is
/// expanded first, so it may already be compacted with a different context.
pub fn compact(input: &Value, context: &Value, options: CompactOptions) -> Result<Value> {
    let context = local_context(context);
    let active = ActiveContext::new().parse(context)?;
    let expanded = expand(input, &ActiveContext::new(), ExpandOptions::default())?;
    compact_expanded(&expanded, context, &active, options)
}

/// Unwraps `{"@context": ...}` wrappers.
pub(crate) fn local_context(context: &Value) -> &Value {
    match context {
        Value::Object(map) if map.contains_key("@context") => &map["@context"],
        other => other,
    }
}

/// Compacts an already expanded document and attaches `context` to the result.
pub(crate) fn compact_expanded(
    expanded: &Value,
    context: &Value,
    active: &ActiveContext,
    options: CompactOptions,
) -> Result<Value> {
    let compactor = Compactor { ctx: active };
    let mut items = compactor.compact_items(None, as_slice(expanded))?;
    let compacted = if options.graph {
        Value::Array(items)
    } else {
        match items.len() {
            0 => Value::Object(Map::new()),
            1 => items.remove(0),
            _ => Value::Array(items),
        }
    };

    let mut result = Map::new();
    if has_content(context) {
        result.insert("@context".to_owned(), context.clone());
    }
    match compacted {
        Value::Array(items) => {
            result.insert(compactor.compact_iri("@graph", None, true), Value::Array(items));
        }
        Value::Object(map) => result.extend(map),
        _ => {}
    }
    Ok(Value::Object(result))
}

fn has_content(context: &Value) -> bool {
    match context {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Replaces `{"@preserve": value}` by the value and `"@null"` defaults by `null`.
pub(crate) fn remove_preserve(ctx: &ActiveContext, input: Value) -> Value {
    match input {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| remove_preserve(ctx, item))
                .filter(|item| !item.is_null())
                .collect(),
        ),
        Value::Object(mut map) => {
            if let Some(preserved) = map.remove("@preserve") {
                return match preserved {
                    Value::String(value) if value == "@null" => Value::Null,
                    other => other,
                };
            }
            if map.contains_key("@value") {
                return Value::Object(map);
            }
            let mut result = Map::with_capacity(map.len());
            for (property, value) in map {
                if property == "@context" {
                    result.insert(property, value);
                    continue;
                }
                let mut value = remove_preserve(ctx, value);
                if let Value::Array(items) = &mut value {
                    if items.len() == 1
                        && ctx.container(Some(&property)).is_none()
                        && !matches!(
                            ctx.expand_iri(&property, true, false).as_deref(),
                            Some("@graph" | "@list")
                        )
                    {
                        value = items.remove(0);
                    }
                }
                result.insert(property, value);
            }
            Value::Object(result)
        }
        other => other,
    }
}

struct Compactor<'a> {
    ctx: &'a ActiveContext,
}

impl Compactor<'_> {
    fn compact_items(&self, property: Option<&str>, items: &[Value]) -> Result<Vec<Value>> {
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let compacted = self.compact_element(property, item)?;
            if !compacted.is_null() {
                result.push(compacted);
            }
        }
        Ok(result)
    }

    fn compact_element(&self, property: Option<&str>, element: &Value) -> Result<Value> {
        match element {
            Value::Array(items) => {
                let mut result = self.compact_items(property, items)?;
                if result.len() == 1 && self.ctx.container(property).is_none() {
                    return Ok(result.remove(0));
                }
                Ok(Value::Array(result))
            }
            Value::Object(map) => self.compact_object(property, map),
            scalar => Ok(scalar.clone()),
        }
    }

    fn compact_object(&self, property: Option<&str>, map: &Map<String, Value>) -> Result<Value> {
        let node_reference = map.len() == 1 && map.get("@id").is_some_and(Value::is_string);
        if map.contains_key("@value") || node_reference {
            if let Some(compacted) = self.compact_value(property, map) {
                return Ok(compacted);
            }
        }
        if map.contains_key("@list") && self.ctx.container(property) == Some(Container::List) {
            return Ok(Value::Array(
                self.compact_items(property, as_slice(&map["@list"]))?,
            ));
        }

        let mut result = Map::new();
        for key in sorted_keys(map) {
            let value = &map[key];
            match key.as_str() {
                "@id" => {
                    let id = value
                        .as_str()
                        .map(|id| Value::String(self.compact_iri(id, None, false)))
                        .unwrap_or_else(|| value.clone());
                    result.insert(self.compact_iri("@id", None, true), id);
                }
                "@type" => {
                    let mut types: Vec<Value> = as_slice(value)
                        .iter()
                        .map(|t| match t.as_str() {
                            Some(t) => Value::String(self.compact_iri(t, None, true)),
                            None => t.clone(),
                        })
                        .collect();
                    let types = if types.len() == 1 {
                        types.remove(0)
                    } else {
                        Value::Array(types)
                    };
                    result.insert(self.compact_iri("@type", None, true), types);
                }
                "@value" | "@language" | "@index" => {
                    result.insert(self.compact_iri(key, None, true), value.clone());
                }
                "@graph" => {
                    let graph = self.compact_items(Some("@graph"), as_slice(value))?;
                    result.insert(self.compact_iri("@graph", None, true), Value::Array(graph));
                }
                "@list" => {
                    let list = self.compact_items(property, as_slice(value))?;
                    result.insert(self.compact_iri("@list", None, true), Value::Array(list));
                }
                "@preserve" => {
                    let preserved = self.compact_element(property, value)?;
                    if preserved.as_array().map_or(true, |items| !items.is_empty()) {
                        result.insert("@preserve".to_owned(), preserved);
                    }
                }
                key if is_keyword(key) => {}
                _ => self.compact_property(&mut result, key, value)?,
            }
        }
        Ok(Value::Object(result))
    }

    fn compact_property(
        &self,
        result: &mut Map<String, Value>,
        iri: &str,
        values: &Value,
    ) -> Result<()> {
        let values = as_slice(values);
        if values.is_empty() {
            let term = self.compact_iri(iri, None, true);
            add_value(result, &term, Value::Array(Vec::new()), true, false);
            return Ok(());
        }
        for item in values {
            let term = self.compact_iri(iri, Some(item), true);
            let container = self.ctx.container(Some(&term));
            let compacted = if is_list_object(item) && container != Some(Container::List) {
                let list = self.compact_items(Some(&term), as_slice(&item["@list"]))?;
                let mut object = Map::new();
                object.insert(self.compact_iri("@list", None, true), Value::Array(list));
                if let Some(index) = item.get("@index") {
                    object.insert(self.compact_iri("@index", None, true), index.clone());
                }
                Value::Object(object)
            } else {
                self.compact_element(Some(&term), item)?
            };
            let as_array = matches!(container, Some(Container::Set | Container::List));
            if container == Some(Container::List) {
                result.insert(term, compacted);
            } else {
                add_value(result, &term, compacted, as_array, false);
            }
        }
        Ok(())
    }

    /// Compacts value objects and node references to a scalar if the term allows it.
    fn compact_value(&self, property: Option<&str>, map: &Map<String, Value>) -> Option<Value> {
        if map.contains_key("@index") {
            return None;
        }
        let term = property.and_then(|property| self.ctx.term(property));
        let type_mapping = term.and_then(|term| term.type_mapping.as_deref());

        if let Some(id) = map.get("@id").and_then(Value::as_str) {
            return match type_mapping {
                Some("@id") => Some(Value::String(self.compact_iri(id, None, false))),
                Some("@vocab") => Some(Value::String(self.compact_iri(id, None, true))),
                _ => None,
            };
        }

        let value = map.get("@value")?;
        if let Some(datatype) = map.get("@type").and_then(Value::as_str) {
            return (type_mapping == Some(datatype)).then(|| value.clone());
        }
        if type_mapping.is_some_and(|t| t != "@none") {
            return None;
        }
        let language = self.effective_language(term);
        match map.get("@language").and_then(Value::as_str) {
            Some(tag) => (language == Some(tag)).then(|| value.clone()),
            None if value.is_string() => language.is_none().then(|| value.clone()),
            None => Some(value.clone()),
        }
    }

    fn effective_language<'b>(&'b self, term: Option<&'b TermDefinition>) -> Option<&'b str> {
        match term.and_then(|term| term.language.as_ref()) {
            Some(language) => language.as_deref(),
            None => self.ctx.language.as_deref(),
        }
    }

    /// Compacts `iri` to a term, a `@vocab` relative IRI, a compact IRI or an IRI relative to
    /// `@base`, in that order of preference.
    fn compact_iri(&self, iri: &str, value: Option<&Value>, vocab: bool) -> String {
        if is_keyword(iri) {
            return self
                .ctx
                .terms()
                .filter(|(_, def)| def.iri.as_deref() == Some(iri))
                .map(|(term, _)| term)
                .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
                .map_or_else(|| iri.to_owned(), str::to_owned);
        }
        if is_blank_node_id(iri) {
            return iri.to_owned();
        }

        if vocab {
            if let Some(term) = self.select_term(iri, value) {
                return term;
            }
            if let Some(suffix) = self
                .ctx
                .vocab
                .as_deref()
                .and_then(|vocab| iri.strip_prefix(vocab))
            {
                if !suffix.is_empty() && !self.ctx.has_term(suffix) {
                    return suffix.to_owned();
                }
            }
        }

        let mut best: Option<String> = None;
        for (term, def) in self.ctx.terms() {
            let Some(prefix_iri) = def.iri.as_deref() else {
                continue;
            };
            if !def.prefix || is_keyword(prefix_iri) || prefix_iri == iri {
                continue;
            }
            let Some(suffix) = iri.strip_prefix(prefix_iri) else {
                continue;
            };
            let candidate = format!("{term}:{suffix}");
            if self.ctx.has_term(&candidate) {
                continue;
            }
            let shorter = best.as_ref().map_or(true, |best| {
                candidate.len() < best.len() || (candidate.len() == best.len() && candidate < *best)
            });
            if shorter {
                best = Some(candidate);
            }
        }
        if let Some(best) = best {
            return best;
        }

        if !vocab {
            if let Some(relative) = self.ctx.base.as_deref().and_then(|base| remove_base(base, iri))
            {
                return relative;
            }
        }
        iri.to_owned()
    }

    /// Picks the term for `iri` that round-trips `value`, preferring exact type and language
    /// matches, then the shortest term.
    fn select_term(&self, iri: &str, value: Option<&Value>) -> Option<String> {
        self.ctx
            .terms()
            .filter(|(_, def)| def.iri.as_deref() == Some(iri) && !def.reverse)
            .filter_map(|(term, def)| Some((self.term_rank(def, value)?, term)))
            .max_by(|(rank_a, a), (rank_b, b)| {
                rank_a
                    .cmp(rank_b)
                    .then_with(|| b.len().cmp(&a.len()))
                    .then_with(|| b.cmp(a))
            })
            .map(|(_, term)| term.to_owned())
    }

    /// `2` for a preferred term, `1` for a usable one, `None` if the value would not survive a
    /// round trip through the term.
    fn term_rank(&self, def: &TermDefinition, value: Option<&Value>) -> Option<u8> {
        let Some(value) = value else {
            return Some(1);
        };
        if is_list_object(value) {
            return match def.container {
                Some(Container::List) => Some(2),
                None if def.type_mapping.is_none() => Some(1),
                _ => None,
            };
        }
        if matches!(
            def.container,
            Some(Container::List | Container::Language | Container::Index)
        ) {
            return None;
        }
        let map = value.as_object()?;

        let Some(literal) = map.get("@value") else {
            return match def.type_mapping.as_deref() {
                Some("@id" | "@vocab") if is_node_reference(value) => Some(2),
                Some("@id" | "@vocab") => Some(1),
                None if is_node_reference(value) => Some(1),
                None => Some(2),
                Some(_) => None,
            };
        };

        if let Some(datatype) = map.get("@type").and_then(Value::as_str) {
            return match def.type_mapping.as_deref() {
                Some(mapping) if mapping == datatype => Some(2),
                None => Some(1),
                Some(_) => None,
            };
        }
        if def.type_mapping.is_some() {
            return None;
        }
        let language = self.effective_language(Some(def));
        match map.get("@language").and_then(Value::as_str) {
            Some(tag) if language == Some(tag) => Some(2),
            Some(_) => Some(1),
            None if literal.is_string() && language.is_some() => Some(1),
            None => Some(2),
        }
    }
}

/// Makes `iri` relative to the directory of `base`, if it lives below it.
fn remove_base(base: &str, iri: &str) -> Option<String> {
    let base = base.split(['#', '?']).next().unwrap_or(base);
    if let Some(rest) = iri.strip_prefix(base) {
        if rest.starts_with(['#', '?']) {
            return Some(rest.to_owned());
        }
    }
    let authority = base.find("://")? + 3;
    if !base[authority..].contains('/') {
        return None;
    }
    let directory = &base[..=base.rfind('/')?];
    let rest = iri.strip_prefix(directory)?;
    if rest.is_empty() {
        return Some("./".to_owned());
    }
    let first_segment = rest.split('/').next().unwrap_or(rest);
    if first_segment.contains(':') {
        return Some(format!("./{rest}"));
    }
    Some(rest.to_owned())
}
