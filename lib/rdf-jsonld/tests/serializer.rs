#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use async_trait::async_trait;
use futures::{poll, StreamExt};
use rdf_jsonld::algorithms::{DefaultJsonLdProcessor, JsonLdError, JsonLdProcessor, RdfQuad};
use rdf_jsonld::model::vocab::rdf;
use rdf_jsonld::model::{
    BlankNode, GraphName, Iri, Literal, NamedNode, Quad, RdfFormat, SourceError,
};
use rdf_jsonld::{
    Encoding, JsonLdSerializer, ParserSource, ProcessStep, QuadSource, QuadStreamSource,
    SerializedOutput, SerializerError, SerializerOptions,
};
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;
use std::task::Poll;

fn ex(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.org/{local}"))
}

fn subject_quad() -> Quad {
    Quad::new(
        ex("subject"),
        ex("predicate"),
        Literal::new_simple_literal("object1"),
        GraphName::DefaultGraph,
    )
}

fn nested_things() -> Vec<Quad> {
    let root = BlankNode::new_unchecked("b0");
    let property = BlankNode::new_unchecked("b1");
    vec![
        Quad::new(root.clone(), rdf::TYPE, ex("Thing"), GraphName::DefaultGraph),
        Quad::new(root, ex("property0"), property.clone(), GraphName::DefaultGraph),
        Quad::new(
            property.clone(),
            rdf::TYPE,
            ex("OtherThing"),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            property,
            ex("property1"),
            Literal::new_simple_literal("value1"),
            GraphName::DefaultGraph,
        ),
    ]
}

fn subject_source() -> QuadStreamSource {
    QuadStreamSource::from_quads([subject_quad()])
}

fn nested_source() -> QuadStreamSource {
    QuadStreamSource::from_quads(nested_things())
}

fn thing_frame() -> Value {
    json!({
        "@context": {"@vocab": "http://example.org/"},
        "@type": "Thing"
    })
}

/// Collects every item of the output stream and checks that there is exactly one.
async fn single_output(
    serializer: &JsonLdSerializer,
    source: impl QuadSource + 'static,
) -> Result<SerializedOutput, SerializerError> {
    let mut items = serializer.import(source).collect::<Vec<_>>().await;
    assert_eq!(items.len(), 1);
    items.remove(0)
}

async fn single_object(
    serializer: &JsonLdSerializer,
    source: impl QuadSource + 'static,
) -> Result<Value, Box<dyn Error>> {
    match single_output(serializer, source).await? {
        SerializedOutput::Object(value) => Ok(value),
        SerializedOutput::Text(text) => Err(format!("unexpected text output {text}").into()),
    }
}

#[tokio::test]
async fn test_string_output() -> Result<(), Box<dyn Error>> {
    let serializer =
        JsonLdSerializer::new(SerializerOptions::new().with_encoding(Encoding::String));
    let output = single_output(&serializer, subject_source()).await?;
    assert_eq!(
        output,
        SerializedOutput::Text(
            r#"[{"@id":"http://example.org/subject","http://example.org/predicate":[{"@value":"object1"}]}]"#
                .to_owned()
        )
    );
    Ok(())
}

#[tokio::test]
async fn test_without_steps_emits_rdf_conversion() -> Result<(), Box<dyn Error>> {
    let serializer = JsonLdSerializer::default();
    let document = single_object(&serializer, subject_source()).await?;
    assert_eq!(
        document,
        json!([{
            "@id": "http://example.org/subject",
            "http://example.org/predicate": [{"@value": "object1"}]
        }])
    );
    Ok(())
}

#[tokio::test]
async fn test_compact() -> Result<(), Box<dyn Error>> {
    let context = json!({"ex": "http://example.org/"});
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new()
            .with_compact(true)
            .with_context(context.clone()),
    );
    let document = single_object(&serializer, subject_source()).await?;
    assert_eq!(
        document,
        json!({
            "@context": context,
            "@id": "ex:subject",
            "ex:predicate": "object1"
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_frame() -> Result<(), Box<dyn Error>> {
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new()
            .with_frame(true)
            .with_context(thing_frame()),
    );
    let document = single_object(&serializer, nested_source()).await?;
    assert_eq!(
        document,
        json!({
            "@context": {"@vocab": "http://example.org/"},
            "@graph": [{
                "@type": "Thing",
                "property0": {
                    "@type": "OtherThing",
                    "property1": "value1"
                }
            }]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_skip_graph_property_with_single_entry() -> Result<(), Box<dyn Error>> {
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new()
            .with_frame(true)
            .with_context(thing_frame())
            .with_skip_graph_property(true),
    );
    let document = single_object(&serializer, nested_source()).await?;
    assert_eq!(
        document,
        json!({
            "@context": {"@vocab": "http://example.org/"},
            "@type": "Thing",
            "property0": {
                "@type": "OtherThing",
                "property1": "value1"
            }
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_skip_graph_property_with_several_entries() -> Result<(), Box<dyn Error>> {
    let subject0 = BlankNode::new_unchecked("b0");
    let subject1 = BlankNode::new_unchecked("b1");
    let quads = [
        Quad::new(
            subject0.clone(),
            rdf::TYPE,
            ex("Thing"),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            subject0,
            ex("property0"),
            Literal::new_simple_literal("value0"),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            subject1.clone(),
            rdf::TYPE,
            ex("OtherThing"),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            subject1,
            ex("property1"),
            Literal::new_simple_literal("value1"),
            GraphName::DefaultGraph,
        ),
    ];
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new()
            .with_frame(true)
            .with_context(json!({"@context": {"@vocab": "http://example.org/"}}))
            .with_skip_graph_property(true),
    );
    let document = single_object(&serializer, QuadStreamSource::from_quads(quads)).await?;
    assert_eq!(
        document,
        json!({
            "@context": {"@vocab": "http://example.org/"},
            "@graph": [
                {"@type": "Thing", "property0": "value0"},
                {"@type": "OtherThing", "property1": "value1"}
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_skip_context() -> Result<(), Box<dyn Error>> {
    let subject = BlankNode::new_unchecked("b0");
    let quads = [
        Quad::new(
            subject.clone(),
            rdf::TYPE,
            ex("Thing"),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            subject,
            ex("property0"),
            Literal::new_simple_literal("value0"),
            GraphName::DefaultGraph,
        ),
    ];
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new()
            .with_frame(true)
            .with_context(thing_frame())
            .with_skip_context(true),
    );
    let document = single_object(&serializer, QuadStreamSource::from_quads(quads)).await?;
    assert_eq!(
        document,
        json!({"@graph": [{"@type": "Thing", "property0": "value0"}]})
    );
    Ok(())
}

#[tokio::test]
async fn test_prefixes() -> Result<(), Box<dyn Error>> {
    let serializer = JsonLdSerializer::new(SerializerOptions::new().with_compact(true));
    let source = QuadStreamSource::from_quads([subject_quad()]);
    let emitter = source.prefix_emitter();
    let output = serializer.import(source);

    assert!(emitter.emit("ex", ex("")));
    assert!(emitter.emit("ex", NamedNode::new("http://example.com/")?));

    let items = output.collect::<Vec<_>>().await;
    let [Ok(SerializedOutput::Object(document))] = items.as_slice() else {
        return Err(format!("unexpected output {items:?}").into());
    };
    assert_eq!(
        document,
        &json!({
            "@context": {"ex": "http://example.org/"},
            "@id": "ex:subject",
            "ex:predicate": "object1"
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_configured_context_wins_over_prefixes() -> Result<(), Box<dyn Error>> {
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new()
            .with_compact(true)
            .with_context(json!({"ex": "http://example.org/"})),
    );
    let source = QuadStreamSource::from_quads([subject_quad()]);
    source
        .prefix_emitter()
        .emit("ex", NamedNode::new("http://example.com/")?);
    let document = single_object(&serializer, source).await?;
    assert_eq!(document["@context"], json!({"ex": "http://example.org/"}));
    assert_eq!(document["@id"], "ex:subject");
    Ok(())
}

#[tokio::test]
async fn test_base_iri_forms() -> Result<(), Box<dyn Error>> {
    let forms = [
        SerializerOptions::new().with_base_iri(ex("")),
        SerializerOptions::new().with_base_iri(Iri::parse("http://example.org/".to_owned())?),
        SerializerOptions::new().with_base_iri("http://example.org/"),
    ];
    let mut documents = Vec::new();
    for options in forms {
        let serializer = JsonLdSerializer::new(options.with_compact(true));
        documents.push(
            single_object(&serializer, subject_source()).await?,
        );
    }
    assert_eq!(
        documents[0],
        json!({
            "@context": {"@base": "http://example.org/"},
            "@id": "subject",
            "http://example.org/predicate": "object1"
        })
    );
    assert_eq!(documents[0], documents[1]);
    assert_eq!(documents[1], documents[2]);
    Ok(())
}

#[tokio::test]
async fn test_error_in_the_middle_of_the_stream() {
    let serializer = JsonLdSerializer::new(SerializerOptions::new().with_compact(true));
    let source = QuadStreamSource::from_results([
        Ok(subject_quad()),
        Err(SourceError::msg("connection lost")),
        Ok(subject_quad()),
    ]);
    let mut output = serializer.import(source);
    let Some(Err(error)) = output.next().await else {
        panic!("expected an error");
    };
    assert!(matches!(error, SerializerError::Source(_)));
    assert_eq!(error.to_string(), "connection lost");
    assert!(output.next().await.is_none());
}

#[tokio::test]
async fn test_string_reparses_to_object() -> Result<(), Box<dyn Error>> {
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new()
            .with_frame(true)
            .with_context(thing_frame()),
    );
    let object = single_object(&serializer, nested_source()).await?;
    let text = serializer
        .import_with(
            QuadStreamSource::from_quads(nested_things()),
            SerializerOptions::new().with_encoding(Encoding::String),
        )
        .next()
        .await
        .ok_or("no output")??;
    assert!(text.as_text().is_some());
    assert_eq!(text.into_value()?, object);
    Ok(())
}

#[tokio::test]
async fn test_pretty_print() -> Result<(), Box<dyn Error>> {
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new()
            .with_compact(true)
            .with_context(json!({"ex": "http://example.org/"}))
            .with_encoding(Encoding::String)
            .with_pretty_print(true),
    );
    let output = single_output(&serializer, subject_source()).await?;
    let text = output.as_text().ok_or("expected text output")?;
    insta::assert_snapshot!(text, @r#"
    {
      "@context": {
        "ex": "http://example.org/"
      },
      "@id": "ex:subject",
      "ex:predicate": "object1"
    }
    "#);
    Ok(())
}

#[tokio::test]
async fn test_process_steps_run_in_order() -> Result<(), Box<dyn Error>> {
    let options = SerializerOptions::new()
        .with_context(json!({"@vocab": "http://example.org/"}))
        .with_compact(true)
        .with_process_steps([ProcessStep::Compact, ProcessStep::Flatten]);
    let serializer = JsonLdSerializer::new(options);
    let document = single_object(&serializer, nested_source()).await?;
    assert_eq!(
        document,
        json!({
            "@context": {"@vocab": "http://example.org/"},
            "@graph": [
                {"@id": "_:b0", "@type": "Thing", "property0": {"@id": "_:b1"}},
                {"@id": "_:b1", "@type": "OtherThing", "property1": "value1"}
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_import_with_overrides() -> Result<(), Box<dyn Error>> {
    let serializer = JsonLdSerializer::new(
        SerializerOptions::new().with_context(json!({"ex": "http://example.org/"})),
    );
    let output = serializer
        .import_with(
            QuadStreamSource::from_quads([subject_quad()]),
            SerializerOptions::new().with_compact(true),
        )
        .next()
        .await
        .ok_or("no output")??;
    assert_eq!(
        output.into_value()?,
        json!({
            "@context": {"ex": "http://example.org/"},
            "@id": "ex:subject",
            "ex:predicate": "object1"
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_turtle_prefixes_reach_compaction() -> Result<(), Box<dyn Error>> {
    let turtle = br#"
@prefix ex: <http://example.org/> .
@prefix schema: <http://schema.org/> .

ex:subject schema:name "Subject" ;
    ex:predicate ex:object .
"#;
    let serializer = JsonLdSerializer::new(SerializerOptions::new().with_compact(true));
    let document = single_object(
        &serializer,
        ParserSource::new(RdfFormat::Turtle, turtle.as_slice()),
    )
    .await?;
    assert_eq!(
        document,
        json!({
            "@context": {
                "ex": "http://example.org/",
                "schema": "http://schema.org/"
            },
            "@id": "ex:subject",
            "ex:predicate": {"@id": "ex:object"},
            "schema:name": "Subject"
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_turtle_collection_is_compacted_to_a_list() -> Result<(), Box<dyn Error>> {
    let turtle = br#"
@prefix ex: <http://example.org/> .

ex:subject ex:items ( "a" "b" ) .
"#;
    let serializer = JsonLdSerializer::new(SerializerOptions::new().with_compact(true));
    let document = single_object(
        &serializer,
        ParserSource::new(RdfFormat::Turtle, turtle.as_slice()),
    )
    .await?;
    assert_eq!(
        document,
        json!({
            "@context": {"ex": "http://example.org/"},
            "@id": "ex:subject",
            "ex:items": {"@list": ["a", "b"]}
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_dropping_the_output_releases_the_source() {
    let source = QuadStreamSource::new(futures::stream::pending());
    let emitter = source.prefix_emitter();
    let mut output = JsonLdSerializer::default().import(source);

    assert!(matches!(poll!(output.next()), Poll::Pending));
    assert!(emitter.emit("ex", ex("")));

    drop(output);
    assert!(!emitter.emit("ex", ex("")));
}

#[derive(Debug, Default)]
struct FailingFlatten {
    inner: DefaultJsonLdProcessor,
}

#[async_trait]
impl JsonLdProcessor for FailingFlatten {
    async fn from_rdf(&self, quads: &[RdfQuad]) -> Result<Value, JsonLdError> {
        self.inner.from_rdf(quads).await
    }

    async fn compact(&self, document: Value, context: &Value) -> Result<Value, JsonLdError> {
        self.inner.compact(document, context).await
    }

    async fn flatten(&self, _document: Value, _context: &Value) -> Result<Value, JsonLdError> {
        Err(JsonLdError::Unsupported {
            feature: "flatten".to_owned(),
        })
    }

    async fn frame(&self, document: Value, frame: &Value) -> Result<Value, JsonLdError> {
        self.inner.frame(document, frame).await
    }
}

#[tokio::test]
async fn test_failing_step_is_emitted_once() {
    let serializer = JsonLdSerializer::with_processor(
        SerializerOptions::new().with_process_steps([ProcessStep::Compact, ProcessStep::Flatten]),
        Arc::new(FailingFlatten::default()),
    );
    let items = serializer
        .import(QuadStreamSource::from_quads([subject_quad()]))
        .collect::<Vec<_>>()
        .await;
    assert_eq!(items.len(), 1);
    assert!(matches!(
        &items[0],
        Err(SerializerError::Transform {
            step: ProcessStep::Flatten,
            ..
        })
    ));
}

#[derive(Debug, Default)]
struct FailingConversion {
    inner: DefaultJsonLdProcessor,
}

#[async_trait]
impl JsonLdProcessor for FailingConversion {
    async fn from_rdf(&self, _quads: &[RdfQuad]) -> Result<Value, JsonLdError> {
        Err(JsonLdError::Unsupported {
            feature: "fromRdf".to_owned(),
        })
    }

    async fn compact(&self, document: Value, context: &Value) -> Result<Value, JsonLdError> {
        self.inner.compact(document, context).await
    }

    async fn flatten(&self, document: Value, context: &Value) -> Result<Value, JsonLdError> {
        self.inner.flatten(document, context).await
    }

    async fn frame(&self, document: Value, frame: &Value) -> Result<Value, JsonLdError> {
        self.inner.frame(document, frame).await
    }
}

#[tokio::test]
async fn test_failing_conversion_is_emitted_once() {
    let serializer = JsonLdSerializer::with_processor(
        SerializerOptions::new().with_compact(true),
        Arc::new(FailingConversion::default()),
    );
    let mut output = serializer.import(QuadStreamSource::from_quads([subject_quad()]));
    assert!(matches!(
        output.next().await,
        Some(Err(SerializerError::Conversion(JsonLdError::Unsupported { .. })))
    ));
    assert!(output.next().await.is_none());
}
