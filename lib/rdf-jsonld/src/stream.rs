use crate::error::SerializerError;
use crate::transform::SerializedOutput;
use futures::future::BoxFuture;
use futures::stream::FusedStream;
use futures::{ready, FutureExt, Stream};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The output of a serialization: exactly one document or exactly one error.
///
/// Nothing is yielded before the whole source has been consumed. Dropping the stream cancels the
/// run and drops the source.
pub struct SerializerStream {
    run: Option<BoxFuture<'static, Result<SerializedOutput, SerializerError>>>,
}

impl SerializerStream {
    pub(crate) fn new(
        run: impl Future<Output = Result<SerializedOutput, SerializerError>> + Send + 'static,
    ) -> Self {
        Self {
            run: Some(run.boxed()),
        }
    }
}

impl fmt::Debug for SerializerStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerStream")
            .field("terminated", &self.run.is_none())
            .finish()
    }
}

impl Stream for SerializerStream {
    type Item = Result<SerializedOutput, SerializerError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(run) = self.run.as_mut() else {
            return Poll::Ready(None);
        };
        let result = ready!(run.poll_unpin(cx));
        self.run = None;
        Poll::Ready(Some(result))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.run.is_some() {
            (1, Some(1))
        } else {
            (0, Some(0))
        }
    }
}

impl FusedStream for SerializerStream {
    fn is_terminated(&self) -> bool {
        self.run.is_none()
    }
}
