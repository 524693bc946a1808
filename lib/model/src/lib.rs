mod error;

pub use error::*;

// Re-export some oxrdf types.
pub use oxiri::{Iri, IriParseError};
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, Literal, LiteralRef, NamedNode,
    NamedNodeRef, Quad, QuadRef, Subject, SubjectRef, Term, TermRef,
};
pub use oxrdfio::{RdfFormat, RdfParseError, RdfParser};
