use crate::rdf::{
    RdfQuad, RdfTerm, RDF_FIRST, RDF_LIST, RDF_NIL, RDF_REST, RDF_TYPE, XSD_STRING,
};
use crate::util::{add_value, is_blank_node_id};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const DEFAULT_GRAPH: &str = "@default";

/// An occurrence of a node as the object of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Usage {
    node: String,
    property: String,
    index: usize,
}

/// Converts a dataset into an expanded JSON-LD document.
///
/// Subjects are emitted in code point order of their identifiers. Named graphs become the
/// `@graph` of the node that carries the graph name. `rdf:type` statements with a node object
/// are mapped to `@type`, literals are kept as strings (no native type conversion) and
/// duplicate statements are collapsed. Well-formed `rdf:first`/`rdf:rest` chains ending in
/// `rdf:nil` become `@list` objects.
pub fn from_rdf(quads: &[RdfQuad]) -> Value {
    let mut graphs: BTreeMap<String, BTreeMap<String, Map<String, Value>>> = BTreeMap::new();
    let mut usages: BTreeMap<String, BTreeMap<String, Vec<Usage>>> = BTreeMap::new();
    graphs.insert(DEFAULT_GRAPH.to_owned(), BTreeMap::new());

    for quad in quads {
        let Some(subject) = quad.subject.node_id() else {
            tracing::trace!(%quad, "Skipping quad with a literal subject");
            continue;
        };
        let RdfTerm::NamedNode(predicate) = &quad.predicate else {
            tracing::trace!(%quad, "Skipping quad with a non-IRI predicate");
            continue;
        };
        let graph_name = quad.graph.node_id().unwrap_or(DEFAULT_GRAPH);
        if graph_name != DEFAULT_GRAPH {
            graphs
                .entry(DEFAULT_GRAPH.to_owned())
                .or_default()
                .entry(graph_name.to_owned())
                .or_insert_with(|| new_node(graph_name));
        }

        let nodes = graphs.entry(graph_name.to_owned()).or_default();
        if let Some(object) = quad.object.node_id() {
            nodes
                .entry(object.to_owned())
                .or_insert_with(|| new_node(object));
        }
        let node = nodes
            .entry(subject.to_owned())
            .or_insert_with(|| new_node(subject));

        match &quad.object {
            RdfTerm::NamedNode(object) | RdfTerm::BlankNode(object) if predicate == RDF_TYPE => {
                add_value(node, "@type", Value::String(object.clone()), true, true);
            }
            object => {
                let value = object_to_value(object);
                add_value(node, predicate, value.clone(), true, true);
                let index = node
                    .get(predicate)
                    .and_then(Value::as_array)
                    .and_then(|values| values.iter().position(|v| *v == value));
                if let (Some(object), Some(index)) = (object.node_id(), index) {
                    let usage = Usage {
                        node: subject.to_owned(),
                        property: predicate.clone(),
                        index,
                    };
                    let object_usages = usages
                        .entry(graph_name.to_owned())
                        .or_default()
                        .entry(object.to_owned())
                        .or_default();
                    if !object_usages.contains(&usage) {
                        object_usages.push(usage);
                    }
                }
            }
        }
    }

    for (name, nodes) in &mut graphs {
        if let Some(usages) = usages.get(name) {
            fold_lists(nodes, usages);
        }
    }

    let Some(mut default_graph) = graphs.remove(DEFAULT_GRAPH) else {
        return Value::Array(Vec::new());
    };
    for (name, nodes) in graphs {
        let node = default_graph
            .entry(name.clone())
            .or_insert_with(|| new_node(&name));
        node.insert("@graph".to_owned(), Value::Array(into_node_list(nodes)));
    }
    Value::Array(into_node_list(default_graph))
}

/// Replaces the chains of list nodes ending in `rdf:nil` with `@list` objects at their head.
fn fold_lists(
    nodes: &mut BTreeMap<String, Map<String, Value>>,
    usages: &BTreeMap<String, Vec<Usage>>,
) {
    let Some(nil_usages) = usages.get(RDF_NIL) else {
        return;
    };
    let mut lists = Vec::new();
    for usage in nil_usages {
        let mut head = usage;
        // Walks from the last list node back to the first one.
        let mut list_nodes = Vec::new();
        while head.property == RDF_REST && is_list_node(nodes, usages, &head.node) {
            list_nodes.push(head.node.clone());
            match usages.get(&head.node).and_then(|node_usages| node_usages.first()) {
                Some(usage) => head = usage,
                None => break,
            }
        }
        lists.push((head.clone(), list_nodes));
    }

    // A list nested in another one is folded first, the outer list then picks up the result.
    while !lists.is_empty() {
        let position = lists
            .iter()
            .position(|(_, list_nodes)| {
                !lists
                    .iter()
                    .any(|(head, _)| list_nodes.contains(&head.node))
            })
            .unwrap_or(0);
        let (head, list_nodes) = lists.swap_remove(position);
        let items = list_nodes
            .iter()
            .rev()
            .filter_map(|id| nodes.get(id))
            .filter_map(|node| node.get(RDF_FIRST)?.as_array()?.first().cloned())
            .collect::<Vec<_>>();
        let slot = nodes
            .get_mut(&head.node)
            .and_then(|node| node.get_mut(&head.property))
            .and_then(Value::as_array_mut)
            .and_then(|values| values.get_mut(head.index));
        let Some(slot) = slot else {
            continue;
        };
        let mut list = Map::new();
        list.insert("@list".to_owned(), Value::Array(items));
        *slot = Value::Object(list);
        for id in list_nodes {
            nodes.remove(&id);
        }
    }
}

/// A blank node used exactly once that only carries one `rdf:first` and one `rdf:rest`.
fn is_list_node(
    nodes: &BTreeMap<String, Map<String, Value>>,
    usages: &BTreeMap<String, Vec<Usage>>,
    id: &str,
) -> bool {
    if !is_blank_node_id(id) || usages.get(id).map_or(0, Vec::len) != 1 {
        return false;
    }
    let Some(node) = nodes.get(id) else {
        return false;
    };
    let single =
        |key: &str| matches!(node.get(key), Some(Value::Array(values)) if values.len() == 1);
    single(RDF_FIRST)
        && single(RDF_REST)
        && node.iter().all(|(key, value)| match key.as_str() {
            "@id" | RDF_FIRST | RDF_REST => true,
            "@type" => {
                matches!(value, Value::Array(types) if types.len() == 1 && types[0] == RDF_LIST)
            }
            _ => false,
        })
}

/// Collects the nodes in identifier order, leaving out nodes that only carry an `@id`.
pub(crate) fn into_node_list(nodes: BTreeMap<String, Map<String, Value>>) -> Vec<Value> {
    nodes
        .into_values()
        .filter(|node| !(node.len() == 1 && node.contains_key("@id")))
        .map(Value::Object)
        .collect()
}

fn new_node(id: &str) -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("@id".to_owned(), Value::String(id.to_owned()));
    node
}

fn object_to_value(object: &RdfTerm) -> Value {
    let mut value = Map::new();
    match object {
        RdfTerm::NamedNode(id) | RdfTerm::BlankNode(id) => {
            value.insert("@id".to_owned(), Value::String(id.clone()));
        }
        RdfTerm::Literal {
            value: lexical,
            language,
            datatype,
        } => {
            value.insert("@value".to_owned(), Value::String(lexical.clone()));
            if let Some(language) = language {
                value.insert("@language".to_owned(), Value::String(language.clone()));
            } else if datatype != XSD_STRING {
                value.insert("@type".to_owned(), Value::String(datatype.clone()));
            }
        }
        RdfTerm::DefaultGraph => {}
    }
    Value::Object(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn iri(value: &str) -> RdfTerm {
        RdfTerm::NamedNode(format!("http://example.org/{value}"))
    }

    fn literal(value: &str) -> RdfTerm {
        RdfTerm::Literal {
            value: value.to_owned(),
            language: None,
            datatype: XSD_STRING.to_owned(),
        }
    }

    #[test]
    fn test_single_literal() {
        let quads = [RdfQuad::new(
            iri("subject"),
            iri("predicate"),
            literal("object1"),
            RdfTerm::DefaultGraph,
        )];
        assert_eq!(
            serde_json::to_string(&from_rdf(&quads)).ok().as_deref(),
            Some(r#"[{"@id":"http://example.org/subject","http://example.org/predicate":[{"@value":"object1"}]}]"#)
        );
    }

    #[test]
    fn test_types_languages_and_datatypes() {
        let quads = [
            RdfQuad::new(
                RdfTerm::BlankNode("_:b0".to_owned()),
                RdfTerm::NamedNode(RDF_TYPE.to_owned()),
                iri("Thing"),
                RdfTerm::DefaultGraph,
            ),
            RdfQuad::new(
                RdfTerm::BlankNode("_:b0".to_owned()),
                iri("label"),
                RdfTerm::Literal {
                    value: "chat".to_owned(),
                    language: Some("fr".to_owned()),
                    datatype: crate::rdf::RDF_LANG_STRING.to_owned(),
                },
                RdfTerm::DefaultGraph,
            ),
            RdfQuad::new(
                RdfTerm::BlankNode("_:b0".to_owned()),
                iri("count"),
                RdfTerm::Literal {
                    value: "3".to_owned(),
                    language: None,
                    datatype: "http://www.w3.org/2001/XMLSchema#integer".to_owned(),
                },
                RdfTerm::DefaultGraph,
            ),
        ];
        assert_eq!(
            from_rdf(&quads),
            json!([{
                "@id": "_:b0",
                "@type": ["http://example.org/Thing"],
                "http://example.org/label": [{"@value": "chat", "@language": "fr"}],
                "http://example.org/count": [{
                    "@value": "3",
                    "@type": "http://www.w3.org/2001/XMLSchema#integer"
                }]
            }])
        );
    }

    #[test]
    fn test_duplicates_and_references() {
        let quad = RdfQuad::new(
            iri("a"),
            iri("knows"),
            iri("b"),
            RdfTerm::DefaultGraph,
        );
        let quads = [quad.clone(), quad];
        assert_eq!(
            from_rdf(&quads),
            json!([{
                "@id": "http://example.org/a",
                "http://example.org/knows": [{"@id": "http://example.org/b"}]
            }])
        );
    }

    #[test]
    fn test_named_graph() {
        let quads = [RdfQuad::new(
            iri("s"),
            iri("p"),
            literal("o"),
            iri("g"),
        )];
        assert_eq!(
            from_rdf(&quads),
            json!([{
                "@id": "http://example.org/g",
                "@graph": [{
                    "@id": "http://example.org/s",
                    "http://example.org/p": [{"@value": "o"}]
                }]
            }])
        );
    }

    fn blank(id: &str) -> RdfTerm {
        RdfTerm::BlankNode(format!("_:{id}"))
    }

    fn rdf(local: &str) -> RdfTerm {
        RdfTerm::NamedNode(format!("http://www.w3.org/1999/02/22-rdf-syntax-ns#{local}"))
    }

    fn list_quads(head: &RdfTerm, items: &[(&str, RdfTerm)]) -> Vec<RdfQuad> {
        let mut quads = Vec::new();
        for (position, (id, item)) in items.iter().enumerate() {
            let rest = items
                .get(position + 1)
                .map_or_else(|| rdf("nil"), |(next, _)| blank(next));
            let node = blank(id);
            if position == 0 {
                quads.push(RdfQuad::new(
                    head.clone(),
                    iri("list"),
                    node.clone(),
                    RdfTerm::DefaultGraph,
                ));
            }
            quads.push(RdfQuad::new(
                node.clone(),
                rdf("first"),
                item.clone(),
                RdfTerm::DefaultGraph,
            ));
            quads.push(RdfQuad::new(node, rdf("rest"), rest, RdfTerm::DefaultGraph));
        }
        quads
    }

    #[test]
    fn test_collection_becomes_list() {
        let quads = list_quads(&iri("s"), &[("l0", literal("a")), ("l1", literal("b"))]);
        assert_eq!(
            from_rdf(&quads),
            json!([{
                "@id": "http://example.org/s",
                "http://example.org/list": [{"@list": [{"@value": "a"}, {"@value": "b"}]}]
            }])
        );
    }

    #[test]
    fn test_empty_collection() {
        let quads = [RdfQuad::new(
            iri("s"),
            iri("list"),
            rdf("nil"),
            RdfTerm::DefaultGraph,
        )];
        assert_eq!(
            from_rdf(&quads),
            json!([{
                "@id": "http://example.org/s",
                "http://example.org/list": [{"@list": []}]
            }])
        );
    }

    #[test]
    fn test_nested_collection() {
        let mut quads = list_quads(
            &iri("s"),
            &[("outer0", blank("inner0")), ("outer1", literal("c"))],
        );
        // The inner list hangs off `rdf:first`, so its head statement is dropped.
        let inner = list_quads(
            &iri("unused"),
            &[("inner0", literal("a")), ("inner1", literal("b"))],
        );
        quads.extend(inner.into_iter().skip(1));
        assert_eq!(
            from_rdf(&quads),
            json!([{
                "@id": "http://example.org/s",
                "http://example.org/list": [{"@list": [
                    {"@list": [{"@value": "a"}, {"@value": "b"}]},
                    {"@value": "c"}
                ]}]
            }])
        );
    }

    #[test]
    fn test_shared_list_node_is_kept() {
        let mut quads = list_quads(&iri("s"), &[("l0", literal("a"))]);
        quads.push(RdfQuad::new(
            iri("t"),
            iri("other"),
            blank("l0"),
            RdfTerm::DefaultGraph,
        ));
        assert_eq!(
            from_rdf(&quads),
            json!([
                {
                    "@id": "_:l0",
                    "http://www.w3.org/1999/02/22-rdf-syntax-ns#first": [{"@value": "a"}],
                    "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest": [{"@list": []}]
                },
                {
                    "@id": "http://example.org/s",
                    "http://example.org/list": [{"@id": "_:l0"}]
                },
                {
                    "@id": "http://example.org/t",
                    "http://example.org/other": [{"@id": "_:l0"}]
                }
            ])
        );
    }

    #[test]
    fn test_empty_dataset() {
        assert_eq!(from_rdf(&[]), json!([]));
    }
}
