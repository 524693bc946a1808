use crate::context::ContextAccumulator;
use crate::normalize::normalize_quad;
use crate::source::QuadSource;
use futures::StreamExt;
use rdf_jsonld_algorithms::RdfQuad;
use rdf_jsonld_model::SourceError;
use tracing::debug;

/// Drains `source` into an ordered list of normalized quads.
///
/// The prefixes declared by the source are added to `context` while the quads are collected,
/// and once more after the source ended so that no declaration is missed. The first error
/// yielded by the source is returned and nothing is collected.
pub async fn collect_quads<S: QuadSource>(
    mut source: S,
    context: &mut ContextAccumulator,
) -> Result<Vec<RdfQuad>, SourceError> {
    let mut prefixes = source.prefixes();
    let mut quads = Vec::with_capacity(source.size_hint().0);
    while let Some(quad) = source.next().await {
        context.drain(&mut prefixes);
        quads.push(normalize_quad(&quad?));
    }
    drop(source);
    context.drain(&mut prefixes);
    debug!("Collected {} quads", quads.len());
    Ok(quads)
}
