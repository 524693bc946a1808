//! The RDF term representation consumed by [`from_rdf`](crate::from_rdf).

use std::fmt;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LIST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#List";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// A term as understood by the RDF to JSON-LD conversion.
///
/// Blank node labels carry the `_:` marker so that they can be used directly as node
/// identifiers and graph names in the produced document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RdfTerm {
    NamedNode(String),
    BlankNode(String),
    Literal {
        value: String,
        language: Option<String>,
        datatype: String,
    },
    DefaultGraph,
}

impl RdfTerm {
    /// The node identifier of named and blank nodes.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NamedNode(iri) => Some(iri),
            Self::BlankNode(id) => Some(id),
            Self::Literal { .. } | Self::DefaultGraph => None,
        }
    }
}

impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(iri) => write!(f, "<{iri}>"),
            Self::BlankNode(id) => f.write_str(id),
            Self::Literal {
                value,
                language: Some(language),
                ..
            } => write!(f, "{value:?}@{language}"),
            Self::Literal {
                value, datatype, ..
            } => write!(f, "{value:?}^^<{datatype}>"),
            Self::DefaultGraph => f.write_str("DEFAULT"),
        }
    }
}

/// A subject, predicate, object, graph tuple ready for conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RdfQuad {
    pub subject: RdfTerm,
    pub predicate: RdfTerm,
    pub object: RdfTerm,
    pub graph: RdfTerm,
}

impl RdfQuad {
    pub fn new(subject: RdfTerm, predicate: RdfTerm, object: RdfTerm, graph: RdfTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }
}

impl fmt::Display for RdfQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.subject, self.predicate, self.object, self.graph
        )
    }
}
