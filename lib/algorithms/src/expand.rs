use crate::context::{ActiveContext, Container};
use crate::error::{JsonLdError, Result};
use crate::util::{add_value, as_slice, is_absolute_iri, is_keyword, is_list_object, sorted_keys};
use serde_json::{Map, Value};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Keeps framing keywords and empty objects that only make sense in a frame.
    pub frame_expansion: bool,
}

/// Expands `input` against `context`. The result is always an array of node objects.
pub fn expand(input: &Value, context: &ActiveContext, options: ExpandOptions) -> Result<Value> {
    let expanded = expand_element(context, None, input, options, false)?;
    let expanded = match expanded {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("@graph") => {
            map.remove("@graph").unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(match expanded {
        Value::Null => Value::Array(Vec::new()),
        Value::Array(items) => Value::Array(items),
        other => Value::Array(vec![other]),
    })
}

fn expand_element(
    ctx: &ActiveContext,
    property: Option<&str>,
    element: &Value,
    options: ExpandOptions,
    inside_list: bool,
) -> Result<Value> {
    match element {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items {
                let expanded = expand_element(ctx, property, item, options, inside_list)?;
                if inside_list && (expanded.is_array() || is_list_object(&expanded)) {
                    return Err(JsonLdError::unsupported("lists of lists"));
                }
                match expanded {
                    Value::Null => {}
                    Value::Array(expanded) => result.extend(expanded),
                    other => result.push(other),
                }
            }
            Ok(Value::Array(result))
        }
        Value::Object(map) => expand_object(ctx, property, map, options),
        scalar => match property {
            None | Some("@graph") => Ok(Value::Null),
            Some(property) => Ok(expand_value(ctx, property, scalar)),
        },
    }
}

fn expand_object(
    ctx: &ActiveContext,
    property: Option<&str>,
    map: &Map<String, Value>,
    options: ExpandOptions,
) -> Result<Value> {
    let ctx = match map.get("@context") {
        Some(local) => Cow::Owned(ctx.parse(local)?),
        None => Cow::Borrowed(ctx),
    };
    let mut result = Map::new();

    for key in sorted_keys(map) {
        if key == "@context" {
            continue;
        }
        let value = &map[key];
        let Some(expanded_property) = ctx.expand_iri(key, true, false) else {
            continue;
        };
        if !is_keyword(&expanded_property) && !expanded_property.contains(':') {
            continue;
        }

        if is_keyword(&expanded_property) {
            if result.contains_key(&expanded_property) {
                return Err(JsonLdError::CollidingKeywords {
                    keyword: expanded_property,
                });
            }
            let expanded = match expanded_property.as_str() {
                "@id" => expand_id(&ctx, value, options)?,
                "@type" => expand_type(&ctx, value, options)?,
                "@graph" => to_array(expand_element(&ctx, Some("@graph"), value, options, false)?),
                "@value" => {
                    if !options.frame_expansion && (value.is_object() || value.is_array()) {
                        return Err(JsonLdError::InvalidValueObject {
                            value: value.clone(),
                        });
                    }
                    value.clone()
                }
                "@language" => match value {
                    Value::String(language) => Value::String(language.to_lowercase()),
                    other if options.frame_expansion => other.clone(),
                    other => {
                        return Err(JsonLdError::InvalidLanguageTaggedValue {
                            value: other.clone(),
                        })
                    }
                },
                "@index" => match value {
                    Value::String(_) => value.clone(),
                    other => {
                        return Err(JsonLdError::InvalidValueObject {
                            value: other.clone(),
                        })
                    }
                },
                "@list" => {
                    if matches!(property, None | Some("@graph")) {
                        continue;
                    }
                    to_array(expand_element(&ctx, property, value, options, true)?)
                }
                "@set" => expand_element(&ctx, property, value, options, false)?,
                "@preserve" => expand_element(&ctx, property, value, options, false)?,
                "@default" if options.frame_expansion => match value {
                    Value::Object(_) | Value::Array(_) => {
                        expand_element(&ctx, property, value, options, false)?
                    }
                    other => other.clone(),
                },
                "@embed" | "@explicit" | "@omitDefault" | "@requireAll"
                    if options.frame_expansion =>
                {
                    value.clone()
                }
                "@reverse" | "@included" | "@nest" | "@json" => {
                    return Err(JsonLdError::unsupported(expanded_property))
                }
                _ => continue,
            };
            result.insert(expanded_property, expanded);
            continue;
        }

        let term = ctx.term(key);
        if term.is_some_and(|term| term.reverse) {
            return Err(JsonLdError::unsupported("reverse properties"));
        }
        let container = term.and_then(|term| term.container);
        let expanded = match (container, value) {
            (Some(Container::Language), Value::Object(languages)) => {
                expand_language_map(languages)?
            }
            (Some(Container::Index), Value::Object(indexes)) => {
                expand_index_map(&ctx, key, indexes, options)?
            }
            _ => expand_element(&ctx, Some(key), value, options, false)?,
        };
        if expanded.is_null() {
            continue;
        }
        let expanded = if container == Some(Container::List) && !is_list_object(&expanded) {
            let mut list = Map::new();
            list.insert("@list".to_owned(), to_array(expanded));
            Value::Object(list)
        } else {
            expanded
        };
        add_value(&mut result, &expanded_property, expanded, true, false);
    }

    finish_object(result, property, options)
}

/// Validates the expanded object and applies the rules for free-floating and empty objects.
fn finish_object(
    mut result: Map<String, Value>,
    property: Option<&str>,
    options: ExpandOptions,
) -> Result<Value> {
    if let Some(value) = result.get("@value") {
        let invalid_key = result
            .keys()
            .any(|key| !matches!(key.as_str(), "@value" | "@type" | "@language" | "@index"));
        if invalid_key || (result.contains_key("@type") && result.contains_key("@language")) {
            return Err(JsonLdError::InvalidValueObject {
                value: Value::Object(result),
            });
        }
        if value.is_null() {
            return Ok(Value::Null);
        }
        if !options.frame_expansion {
            if result.contains_key("@language") && !value.is_string() {
                return Err(JsonLdError::InvalidLanguageTaggedValue {
                    value: value.clone(),
                });
            }
            if let Some(datatype) = result.get("@type") {
                if !datatype.as_str().is_some_and(is_absolute_iri) {
                    return Err(JsonLdError::InvalidTypedValue {
                        value: datatype.clone(),
                    });
                }
            }
        }
    } else if let Some(types) = result.get_mut("@type") {
        if !types.is_array() {
            *types = Value::Array(vec![types.take()]);
        }
    } else if result.contains_key("@set") || result.contains_key("@list") {
        if result.len() > 2 || (result.len() == 2 && !result.contains_key("@index")) {
            return Err(JsonLdError::InvalidValueObject {
                value: Value::Object(result),
            });
        }
        if let Some(set) = result.remove("@set") {
            return Ok(set);
        }
    }

    if result.len() == 1 && result.contains_key("@language") {
        return Ok(Value::Null);
    }

    if matches!(property, None | Some("@graph")) && !options.frame_expansion {
        if result.is_empty() || result.contains_key("@value") || result.contains_key("@list") {
            return Ok(Value::Null);
        }
        if result.len() == 1 && result.contains_key("@id") {
            return Ok(Value::Null);
        }
    }

    Ok(Value::Object(result))
}

fn expand_id(ctx: &ActiveContext, value: &Value, options: ExpandOptions) -> Result<Value> {
    match value {
        Value::String(id) => Ok(Value::String(
            ctx.expand_iri(id, false, true)
                .unwrap_or_else(|| id.clone()),
        )),
        Value::Object(map) if options.frame_expansion && map.is_empty() => Ok(value.clone()),
        Value::Array(ids) if options.frame_expansion => ids
            .iter()
            .map(|id| expand_id(ctx, id, options))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Err(JsonLdError::InvalidIdValue {
            value: other.clone(),
        }),
    }
}

fn expand_type(ctx: &ActiveContext, value: &Value, options: ExpandOptions) -> Result<Value> {
    let expand_one = |value: &Value| match value {
        Value::String(iri) => Ok(Value::String(
            ctx.expand_iri(iri, true, true)
                .unwrap_or_else(|| iri.clone()),
        )),
        Value::Object(map) if options.frame_expansion && map.is_empty() => Ok(value.clone()),
        other => Err(JsonLdError::InvalidTypeValue {
            value: other.clone(),
        }),
    };
    match value {
        Value::Array(items) => items
            .iter()
            .map(expand_one)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => expand_one(other),
    }
}

fn expand_language_map(languages: &Map<String, Value>) -> Result<Value> {
    let mut result = Vec::new();
    for language in sorted_keys(languages) {
        for item in as_slice(&languages[language]) {
            let Value::String(text) = item else {
                if item.is_null() {
                    continue;
                }
                return Err(JsonLdError::InvalidLanguageTaggedValue {
                    value: item.clone(),
                });
            };
            let mut value = Map::new();
            value.insert("@value".to_owned(), Value::String(text.clone()));
            if language != "@none" {
                value.insert(
                    "@language".to_owned(),
                    Value::String(language.to_lowercase()),
                );
            }
            result.push(Value::Object(value));
        }
    }
    Ok(Value::Array(result))
}

fn expand_index_map(
    ctx: &ActiveContext,
    property: &str,
    indexes: &Map<String, Value>,
    options: ExpandOptions,
) -> Result<Value> {
    let mut result = Vec::new();
    for index in sorted_keys(indexes) {
        let items = into_vec(expand_element(
            ctx,
            Some(property),
            &indexes[index],
            options,
            false,
        )?);
        for mut item in items {
            if let Value::Object(item) = &mut item {
                item.entry("@index")
                    .or_insert_with(|| Value::String(index.clone()));
            }
            result.push(item);
        }
    }
    Ok(Value::Array(result))
}

/// Expands a scalar in the position of `property`, applying its type and language mappings.
fn expand_value(ctx: &ActiveContext, property: &str, value: &Value) -> Value {
    let term = ctx.term(property);
    let type_mapping = term.and_then(|term| term.type_mapping.as_deref());

    if let Value::String(text) = value {
        let id = match type_mapping {
            Some("@id") => ctx.expand_iri(text, false, true),
            Some("@vocab") => ctx.expand_iri(text, true, true),
            _ => None,
        };
        if let Some(id) = id {
            let mut node = Map::new();
            node.insert("@id".to_owned(), Value::String(id));
            return Value::Object(node);
        }
    }

    let mut result = Map::new();
    result.insert("@value".to_owned(), value.clone());
    match type_mapping {
        Some(datatype) if !matches!(datatype, "@id" | "@vocab" | "@none" | "@json") => {
            result.insert("@type".to_owned(), Value::String(datatype.to_owned()));
        }
        _ if value.is_string() => {
            let language = match term.and_then(|term| term.language.clone()) {
                Some(language) => language,
                None => ctx.language.clone(),
            };
            if let Some(language) = language {
                result.insert("@language".to_owned(), Value::String(language));
            }
        }
        _ => {}
    }
    Value::Object(result)
}

fn into_vec(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn to_array(value: Value) -> Value {
    Value::Array(into_vec(value))
}
