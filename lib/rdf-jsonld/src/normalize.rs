use rdf_jsonld_algorithms::{RdfQuad, RdfTerm};
use rdf_jsonld_model::{BlankNodeRef, GraphNameRef, LiteralRef, QuadRef, SubjectRef, TermRef};

/// Converts a quad into the representation expected by the RDF to JSON-LD conversion.
///
/// Blank node identifiers get the `_:` prefix, all other terms keep their value.
pub fn normalize_quad<'a>(quad: impl Into<QuadRef<'a>>) -> RdfQuad {
    let quad = quad.into();
    RdfQuad::new(
        normalize_subject(quad.subject),
        RdfTerm::NamedNode(quad.predicate.as_str().to_owned()),
        normalize_object(quad.object),
        normalize_graph_name(quad.graph_name),
    )
}

fn normalize_subject(subject: SubjectRef<'_>) -> RdfTerm {
    match subject {
        SubjectRef::NamedNode(node) => RdfTerm::NamedNode(node.as_str().to_owned()),
        SubjectRef::BlankNode(node) => blank_node(node),
    }
}

fn normalize_object(object: TermRef<'_>) -> RdfTerm {
    match object {
        TermRef::NamedNode(node) => RdfTerm::NamedNode(node.as_str().to_owned()),
        TermRef::BlankNode(node) => blank_node(node),
        TermRef::Literal(literal) => normalize_literal(literal),
    }
}

fn normalize_graph_name(graph_name: GraphNameRef<'_>) -> RdfTerm {
    match graph_name {
        GraphNameRef::NamedNode(node) => RdfTerm::NamedNode(node.as_str().to_owned()),
        GraphNameRef::BlankNode(node) => blank_node(node),
        GraphNameRef::DefaultGraph => RdfTerm::DefaultGraph,
    }
}

fn normalize_literal(literal: LiteralRef<'_>) -> RdfTerm {
    RdfTerm::Literal {
        value: literal.value().to_owned(),
        language: literal.language().map(ToOwned::to_owned),
        datatype: literal.datatype().as_str().to_owned(),
    }
}

fn blank_node(node: BlankNodeRef<'_>) -> RdfTerm {
    RdfTerm::BlankNode(format!("_:{}", node.as_str()))
}
