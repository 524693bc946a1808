#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod collect;
mod context;
mod error;
mod normalize;
mod options;
mod serializer;
mod source;
mod stream;
mod transform;

pub use collect::collect_quads;
pub use context::ContextAccumulator;
pub use error::SerializerError;
pub use normalize::normalize_quad;
pub use options::{BaseIri, Encoding, PipelineConfig, ProcessStep, SerializerOptions};
pub use serializer::{serialize_quads, JsonLdSerializer};
pub use source::{
    ParserSource, PrefixEmitter, PrefixEvent, PrefixReceiver, QuadSource, QuadStreamSource,
};
pub use stream::SerializerStream;
pub use transform::{strip_context, unwrap_single_graph, SerializedOutput, TransformChain};

pub mod model {
    pub use rdf_jsonld_model::*;
}

pub mod algorithms {
    pub use rdf_jsonld_algorithms::*;
}
