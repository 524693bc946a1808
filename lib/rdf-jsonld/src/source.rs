use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use oxrdfio::ReaderQuadParser;
use rdf_jsonld_model::{NamedNode, Quad, RdfParser, SourceError};
use std::collections::HashSet;
use std::io::Read;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// A prefix declared by a quad source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefixEvent {
    pub prefix: String,
    pub namespace: NamedNode,
}

/// The receiving end of the prefix side channel of a [`QuadSource`].
///
/// Events sent before the receiver was taken stay buffered in the channel.
#[derive(Debug)]
pub struct PrefixReceiver {
    inner: Option<UnboundedReceiver<PrefixEvent>>,
}

impl PrefixReceiver {
    /// A receiver that never yields an event.
    pub fn closed() -> Self {
        Self { inner: None }
    }

    fn new(inner: UnboundedReceiver<PrefixEvent>) -> Self {
        Self { inner: Some(inner) }
    }

    /// Returns the next buffered event without waiting.
    pub fn try_next(&mut self) -> Option<PrefixEvent> {
        let receiver = self.inner.as_mut()?;
        match receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.inner = None;
                None
            }
        }
    }
}

/// Declares prefixes on the side channel of a [`QuadStreamSource`].
#[derive(Debug, Clone)]
pub struct PrefixEmitter {
    sender: UnboundedSender<PrefixEvent>,
}

impl PrefixEmitter {
    /// Sends a prefix declaration.
    ///
    /// Returns `false` if the serializer no longer listens.
    pub fn emit(&self, prefix: impl Into<String>, namespace: NamedNode) -> bool {
        self.sender
            .send(PrefixEvent {
                prefix: prefix.into(),
                namespace,
            })
            .is_ok()
    }
}

/// An asynchronous sequence of quads with a side channel of prefix declarations.
///
/// The sequence ends with `None`. An error item ends the serialization.
pub trait QuadSource: Stream<Item = Result<Quad, SourceError>> + Send + Unpin {
    /// Takes the receiver of the prefix declarations.
    ///
    /// The first call returns the channel of the source, later calls return a closed receiver.
    fn prefixes(&mut self) -> PrefixReceiver;
}

/// A [`QuadSource`] wrapping an arbitrary stream of quads.
///
/// ```
/// use futures::StreamExt;
/// use rdf_jsonld::{QuadSource, QuadStreamSource};
/// use rdf_jsonld::model::{GraphName, Literal, NamedNode, Quad};
///
/// let quad = Quad::new(
///     NamedNode::new("http://example.org/subject")?,
///     NamedNode::new("http://example.org/predicate")?,
///     Literal::new_simple_literal("object"),
///     GraphName::DefaultGraph,
/// );
/// let mut source = QuadStreamSource::from_quads([quad.clone()]);
/// source
///     .prefix_emitter()
///     .emit("ex", NamedNode::new("http://example.org/")?);
///
/// let mut prefixes = source.prefixes();
/// assert_eq!(prefixes.try_next().map(|event| event.prefix), Some("ex".to_owned()));
/// # tokio_test::block_on(async {
/// assert_eq!(source.next().await.transpose()?, Some(quad));
/// assert!(source.next().await.is_none());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct QuadStreamSource {
    quads: BoxStream<'static, Result<Quad, SourceError>>,
    sender: UnboundedSender<PrefixEvent>,
    receiver: Option<UnboundedReceiver<PrefixEvent>>,
}

impl QuadStreamSource {
    pub fn new(quads: impl Stream<Item = Result<Quad, SourceError>> + Send + 'static) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            quads: quads.boxed(),
            sender,
            receiver: Some(receiver),
        }
    }

    /// A source yielding the given quads.
    pub fn from_quads<I>(quads: I) -> Self
    where
        I: IntoIterator<Item = Quad>,
        I::IntoIter: Send + 'static,
    {
        Self::new(stream::iter(quads.into_iter().map(Ok)))
    }

    /// A source yielding the given items, errors included.
    pub fn from_results<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<Quad, SourceError>>,
        I::IntoIter: Send + 'static,
    {
        Self::new(stream::iter(items))
    }

    /// A handle declaring prefixes on the side channel of this source.
    pub fn prefix_emitter(&self) -> PrefixEmitter {
        PrefixEmitter {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for QuadStreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadStreamSource").finish_non_exhaustive()
    }
}

impl Stream for QuadStreamSource {
    type Item = Result<Quad, SourceError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.quads.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.quads.size_hint()
    }
}

impl QuadSource for QuadStreamSource {
    fn prefixes(&mut self) -> PrefixReceiver {
        self.receiver
            .take()
            .map_or_else(PrefixReceiver::closed, PrefixReceiver::new)
    }
}

/// A [`QuadSource`] parsing an RDF document.
///
/// Every prefix reported by the parser is sent once on the side channel, as soon as the parser
/// has read it. The reader is read synchronously while polling, so the source is meant for
/// in-memory buffers and local files. A slow reader blocks the executor thread: read it into
/// memory first, or drive the serialization inside [`tokio::task::spawn_blocking`].
///
/// ```
/// use futures::StreamExt;
/// use rdf_jsonld::{ParserSource, QuadSource};
/// use rdf_jsonld::model::RdfFormat;
///
/// let turtle = b"@prefix ex: <http://example.org/> . ex:subject ex:predicate \"object\" .";
/// let mut source = ParserSource::new(RdfFormat::Turtle, turtle.as_slice());
/// let mut prefixes = source.prefixes();
/// # tokio_test::block_on(async {
/// assert!(source.next().await.transpose()?.is_some());
/// assert_eq!(prefixes.try_next().map(|event| event.prefix), Some("ex".to_owned()));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// ```
pub struct ParserSource<R: Read> {
    parser: ReaderQuadParser<R>,
    sender: UnboundedSender<PrefixEvent>,
    receiver: Option<UnboundedReceiver<PrefixEvent>>,
    announced: HashSet<String>,
}

impl<R: Read> ParserSource<R> {
    pub fn new(parser: impl Into<RdfParser>, reader: R) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            parser: parser.into().for_reader(reader),
            sender,
            receiver: Some(receiver),
            announced: HashSet::new(),
        }
    }

    fn announce_prefixes(&mut self) {
        for (prefix, namespace) in self.parser.prefixes() {
            if self.announced.contains(prefix) {
                continue;
            }
            let namespace = match NamedNode::new(namespace) {
                Ok(namespace) => namespace,
                Err(e) => {
                    debug!("Skipping prefix '{prefix}' with invalid namespace: {e}");
                    continue;
                }
            };
            self.announced.insert(prefix.to_owned());
            let event = PrefixEvent {
                prefix: prefix.to_owned(),
                namespace,
            };
            if self.sender.send(event).is_err() {
                debug!("Prefix '{prefix}' is not forwarded, nobody listens anymore");
            }
        }
    }
}

impl<R: Read> std::fmt::Debug for ParserSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserSource")
            .field("announced", &self.announced)
            .finish_non_exhaustive()
    }
}

impl<R: Read + Unpin> Stream for ParserSource<R> {
    type Item = Result<Quad, SourceError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let next = this.parser.next();
        this.announce_prefixes();
        Poll::Ready(next.map(|quad| quad.map_err(SourceError::from)))
    }
}

impl<R: Read + Send + Unpin> QuadSource for ParserSource<R> {
    fn prefixes(&mut self) -> PrefixReceiver {
        self.receiver
            .take()
            .map_or_else(PrefixReceiver::closed, PrefixReceiver::new)
    }
}
