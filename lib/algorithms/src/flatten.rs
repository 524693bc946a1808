use crate::compact::{compact_expanded, local_context, CompactOptions};
use crate::context::ActiveContext;
use crate::error::Result;
use crate::expand::{expand, ExpandOptions};
use crate::from_rdf::into_node_list;
use crate::node_map::{generate_node_map, BlankNodeIssuer, DEFAULT_GRAPH};
use serde_json::{Map, Value};

/// Flattens `input` into a list of top-level nodes.
///
/// Embedded nodes are moved to the top level and blank nodes are relabeled. Without a context
/// (`null`) the flattened expanded array is returned, otherwise the result is compacted and the
/// nodes always appear under `@graph`.
pub fn flatten(input: &Value, context: &Value) -> Result<Value> {
    let expanded = expand(input, &ActiveContext::new(), ExpandOptions::default())?;
    let mut graphs = generate_node_map(&expanded, &mut BlankNodeIssuer::default());
    let mut default_graph = graphs.remove(DEFAULT_GRAPH).unwrap_or_default();
    for (name, nodes) in graphs {
        let node = default_graph.entry(name.clone()).or_insert_with(|| {
            let mut node = Map::new();
            node.insert("@id".to_owned(), Value::String(name));
            node
        });
        node.insert("@graph".to_owned(), Value::Array(into_node_list(nodes)));
    }
    let flattened = Value::Array(into_node_list(default_graph));

    if context.is_null() {
        return Ok(flattened);
    }
    let context = local_context(context);
    let active = ActiveContext::new().parse(context)?;
    compact_expanded(&flattened, context, &active, CompactOptions { graph: true })
}
