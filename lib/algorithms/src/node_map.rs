use crate::util::{add_value, as_slice, is_blank_node_id, is_keyword, sorted_keys};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

pub(crate) const DEFAULT_GRAPH: &str = "@default";

/// Node objects of a single graph, keyed by identifier.
pub type NodeMap = BTreeMap<String, Map<String, Value>>;

/// All graphs of a document, keyed by graph name. The default graph is `@default`.
pub type GraphMap = BTreeMap<String, NodeMap>;

/// Issues fresh blank node identifiers and remembers the mapping of relabeled ones.
#[derive(Debug, Clone)]
pub struct BlankNodeIssuer {
    prefix: String,
    counter: usize,
    issued: HashMap<String, String>,
}

impl Default for BlankNodeIssuer {
    fn default() -> Self {
        Self::new("_:b")
    }
}

impl BlankNodeIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            issued: HashMap::new(),
        }
    }

    /// Returns the identifier issued for `existing`, issuing a new one on first use. Without an
    /// existing identifier a fresh one is always issued.
    pub fn issue(&mut self, existing: Option<&str>) -> String {
        if let Some(issued) = existing.and_then(|existing| self.issued.get(existing)) {
            return issued.clone();
        }
        let issued = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        if let Some(existing) = existing {
            self.issued.insert(existing.to_owned(), issued.clone());
        }
        issued
    }
}

/// Generates the node map of an expanded document. Blank nodes are relabeled with `issuer`.
pub fn generate_node_map(expanded: &Value, issuer: &mut BlankNodeIssuer) -> GraphMap {
    let mut generator = Generator {
        graphs: GraphMap::new(),
        issuer,
    };
    generator
        .graphs
        .insert(DEFAULT_GRAPH.to_owned(), NodeMap::new());
    generator.visit(expanded, DEFAULT_GRAPH, None, None);
    generator.graphs
}

/// Merges all graphs of `graphs` into a single node map.
pub fn merge_node_maps(graphs: &GraphMap) -> NodeMap {
    let mut merged = NodeMap::new();
    for nodes in graphs.values() {
        for (id, node) in nodes {
            let merged_node = merged.entry(id.clone()).or_insert_with(|| {
                let mut merged_node = Map::new();
                merged_node.insert("@id".to_owned(), Value::String(id.clone()));
                merged_node
            });
            for property in sorted_keys(node) {
                let value = &node[property];
                if is_keyword(property) && property != "@type" {
                    merged_node.insert(property.clone(), value.clone());
                } else {
                    add_value(merged_node, property, value.clone(), true, true);
                }
            }
        }
    }
    merged
}

struct Generator<'a> {
    graphs: GraphMap,
    issuer: &'a mut BlankNodeIssuer,
}

impl Generator<'_> {
    fn visit(
        &mut self,
        element: &Value,
        graph: &str,
        subject: Option<(&str, &str)>,
        mut list: Option<&mut Vec<Value>>,
    ) {
        let map = match element {
            Value::Array(items) => {
                for item in items {
                    self.visit(item, graph, subject, list.as_deref_mut());
                }
                return;
            }
            Value::Object(map) => map,
            scalar => {
                if let Some(list) = list {
                    list.push(scalar.clone());
                }
                return;
            }
        };

        if map.contains_key("@value") {
            self.add_to_subject(graph, subject, list, element.clone(), true);
            return;
        }

        if let Some(items) = map.get("@list") {
            let mut result = Vec::new();
            self.visit(items, graph, subject, Some(&mut result));
            let mut list_object = Map::new();
            list_object.insert("@list".to_owned(), Value::Array(result));
            if let Some(index) = map.get("@index") {
                list_object.insert("@index".to_owned(), index.clone());
            }
            self.add_to_subject(graph, subject, list, Value::Object(list_object), false);
            return;
        }

        let id = match map.get("@id").and_then(Value::as_str) {
            Some(id) if is_blank_node_id(id) => self.issuer.issue(Some(id)),
            Some(id) => id.to_owned(),
            None => self.issuer.issue(None),
        };
        self.node(graph, &id);

        let mut reference = Map::new();
        reference.insert("@id".to_owned(), Value::String(id.clone()));
        self.add_to_subject(graph, subject, list, Value::Object(reference), true);

        if let Some(types) = map.get("@type") {
            let types: Vec<Value> = as_slice(types)
                .iter()
                .map(|t| match t.as_str() {
                    Some(t) if is_blank_node_id(t) => Value::String(self.issuer.issue(Some(t))),
                    _ => t.clone(),
                })
                .collect();
            add_value(self.node(graph, &id), "@type", Value::Array(types), true, true);
        }
        if let Some(index) = map.get("@index") {
            self.node(graph, &id)
                .entry("@index")
                .or_insert_with(|| index.clone());
        }
        if let Some(graph_value) = map.get("@graph") {
            self.graphs.entry(id.clone()).or_default();
            self.visit(graph_value, &id, None, None);
        }

        for key in sorted_keys(map) {
            if is_keyword(key) {
                continue;
            }
            let property = if is_blank_node_id(key) {
                self.issuer.issue(Some(key.as_str()))
            } else {
                key.clone()
            };
            let node = self.node(graph, &id);
            if !node.contains_key(&property) {
                node.insert(property.clone(), Value::Array(Vec::new()));
            }
            self.visit(&map[key], graph, Some((id.as_str(), property.as_str())), None);
        }
    }

    fn node(&mut self, graph: &str, id: &str) -> &mut Map<String, Value> {
        self.graphs
            .entry(graph.to_owned())
            .or_default()
            .entry(id.to_owned())
            .or_insert_with(|| {
                let mut node = Map::new();
                node.insert("@id".to_owned(), Value::String(id.to_owned()));
                node
            })
    }

    /// Adds a value either to the list under construction or to the active subject's property.
    fn add_to_subject(
        &mut self,
        graph: &str,
        subject: Option<(&str, &str)>,
        list: Option<&mut Vec<Value>>,
        value: Value,
        unique: bool,
    ) {
        if let Some(list) = list {
            list.push(value);
        } else if let Some((subject, property)) = subject {
            add_value(self.node(graph, subject), property, value, true, unique);
        }
    }
}
