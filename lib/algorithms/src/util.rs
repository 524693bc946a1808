use serde_json::{Map, Value};

const KEYWORDS: &[&str] = &[
    "@base",
    "@container",
    "@context",
    "@default",
    "@direction",
    "@embed",
    "@explicit",
    "@graph",
    "@id",
    "@import",
    "@included",
    "@index",
    "@json",
    "@language",
    "@list",
    "@nest",
    "@none",
    "@null",
    "@omitDefault",
    "@prefix",
    "@preserve",
    "@propagate",
    "@protected",
    "@requireAll",
    "@reverse",
    "@set",
    "@type",
    "@value",
    "@version",
    "@vocab",
];

/// Returns `true` if `value` is one of the JSON-LD keywords (framing keywords included).
pub fn is_keyword(value: &str) -> bool {
    KEYWORDS.contains(&value)
}

/// Returns `true` for strings that have the form of a keyword (`@` followed by letters) without
/// being one. JSON-LD processors ignore those.
pub(crate) fn has_keyword_form(value: &str) -> bool {
    value
        .strip_prefix('@')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Returns `true` if `value` is a blank node identifier (`_:` prefix).
pub fn is_blank_node_id(value: &str) -> bool {
    value.starts_with("_:")
}

/// Returns `true` if `value` starts with an IRI scheme followed by `:`.
pub fn is_absolute_iri(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub(crate) fn is_value_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.contains_key("@value"))
}

pub(crate) fn is_list_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.contains_key("@list"))
}

/// A node reference is a node object that only carries an `@id`.
pub(crate) fn is_node_reference(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.len() == 1 && map.get("@id").is_some_and(Value::is_string))
}

/// Views a value as a slice, treating a non-array value as a one-element slice.
pub(crate) fn as_slice(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Adds `value` to the entry `key` of `map`.
///
/// Arrays are added element-wise. If `as_array` is set, the entry is always an array. Existing
/// single values are promoted to an array when a second value arrives. With `unique`, values
/// that are already present are skipped.
pub(crate) fn add_value(
    map: &mut Map<String, Value>,
    key: &str,
    value: Value,
    as_array: bool,
    unique: bool,
) {
    if let Value::Array(items) = value {
        if items.is_empty() && as_array && !map.contains_key(key) {
            map.insert(key.to_owned(), Value::Array(Vec::new()));
        }
        for item in items {
            add_value(map, key, item, as_array, unique);
        }
        return;
    }

    match map.get_mut(key) {
        Some(Value::Array(existing)) => {
            if !unique || !existing.contains(&value) {
                existing.push(value);
            }
        }
        Some(existing) => {
            if unique && *existing == value {
                return;
            }
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
        None => {
            let value = if as_array {
                Value::Array(vec![value])
            } else {
                value
            };
            map.insert(key.to_owned(), value);
        }
    }
}

/// Sorted keys of a map. The algorithms iterate in code point order to be deterministic.
pub(crate) fn sorted_keys(map: &Map<String, Value>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}
