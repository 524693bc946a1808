//! The JSON-LD algorithms used to turn RDF datasets into JSON-LD documents.
//!
//! The crate covers conversion from RDF, context processing, expansion, compaction,
//! flattening and framing over [`serde_json::Value`] documents. Remote contexts, scoped contexts,
//! reverse properties and `@included`/`@nest`/`@json` are reported as
//! [`JsonLdError::Unsupported`].
//!
//! ```
//! use rdf_jsonld_algorithms::{compact, from_rdf, CompactOptions, RdfQuad, RdfTerm, XSD_STRING};
//! use serde_json::json;
//!
//! let quads = [RdfQuad::new(
//!     RdfTerm::NamedNode("http://example.org/subject".into()),
//!     RdfTerm::NamedNode("http://example.org/predicate".into()),
//!     RdfTerm::Literal { value: "object1".into(), language: None, datatype: XSD_STRING.into() },
//!     RdfTerm::DefaultGraph,
//! )];
//! let compacted = compact(
//!     &from_rdf(&quads),
//!     &json!({"ex": "http://example.org/"}),
//!     CompactOptions::default(),
//! )?;
//! assert_eq!(compacted["@id"], "ex:subject");
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

mod compact;
mod context;
mod error;
mod expand;
mod flatten;
mod frame;
mod from_rdf;
mod node_map;
mod processor;
mod rdf;
mod util;

pub use compact::{compact, CompactOptions};
pub use context::{ActiveContext, Container, TermDefinition};
pub use error::{JsonLdError, Result};
pub use expand::{expand, ExpandOptions};
pub use flatten::flatten;
pub use frame::{frame, Embed, FrameOptions};
pub use from_rdf::from_rdf;
pub use node_map::{generate_node_map, merge_node_maps, BlankNodeIssuer, GraphMap, NodeMap};
pub use processor::{DefaultJsonLdProcessor, JsonLdProcessor};
pub use rdf::{
    RdfQuad, RdfTerm, RDF_FIRST, RDF_LANG_STRING, RDF_LIST, RDF_NIL, RDF_REST, RDF_TYPE,
    XSD_STRING,
};
pub use util::{is_absolute_iri, is_blank_node_id, is_keyword};
