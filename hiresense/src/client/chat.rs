//! Streaming chat replies.

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Error, Result, ServiceError, StatusWording};
use crate::message::{ChatRequestBody, Message};
use crate::parser::{DeltaParser, ParserLimits, Progress};
use crate::stream::{ChatEvent, DeltaSink};

use super::{Client, has_no_body};

impl Client {
    /// Stream the assistant's reply to `history` into `history` itself.
    ///
    /// The reply appears as a trailing assistant message that grows as
    /// deltas arrive. Returns the full reply text. On error the history may
    /// hold a partial reply (and always holds the caller's own turns); the
    /// caller decides what to roll back.
    pub async fn stream_chat(&self, history: &mut Vec<Message>) -> Result<String> {
        self.stream_chat_cancellable(history, &CancellationToken::new())
            .await
    }

    /// [`stream_chat`](Self::stream_chat) that stops when `cancel` fires.
    pub async fn stream_chat_cancellable(
        &self,
        history: &mut Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let snapshot = history.clone();
        self.stream_chat_with(&snapshot, history, cancel).await
    }

    /// Send `history` and report each delta of the reply to `sink`.
    pub async fn stream_chat_with<S>(
        &self,
        history: &[Message],
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<String>
    where
        S: DeltaSink + Send + ?Sized,
    {
        if history.is_empty() {
            return Err(ServiceError::request_failed("Cannot send an empty conversation").into());
        }

        let url = &self.endpoints.chat;
        debug!(url = %url, messages = history.len(), "sending chat request");

        let request = self.post(url).json(&ChatRequestBody { messages: history });
        let response = Self::send(request, cancel).await?;
        let response = Self::check_status(response, &StatusWording::CHAT).await?;

        if has_no_body(&response) {
            return Err(ServiceError::protocol("No response body").into());
        }

        let reply = consume_stream(
            response.bytes_stream(),
            sink,
            self.config.parser_limits(),
            cancel,
        )
        .await?;

        debug!(chars = reply.chars().count(), "chat reply complete");
        Ok(reply)
    }

    /// Stream a reply on a background task, delivering [`ChatEvent`]s.
    ///
    /// The receiver yields one `Delta` per fragment and a final `Completed`
    /// on success. The task's own result carries the error, if any.
    #[must_use]
    pub fn stream_chat_channel(
        &self,
        history: Vec<Message>,
        cancel: CancellationToken,
    ) -> (
        mpsc::UnboundedReceiver<ChatEvent>,
        JoinHandle<Result<String>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();

        let handle = tokio::spawn(async move {
            let mut sink = tx;
            let reply = client
                .stream_chat_with(&history, &mut sink, &cancel)
                .await?;
            let _ = sink.send(ChatEvent::Completed {
                content: reply.clone(),
            });
            Ok(reply)
        });

        (rx, handle)
    }
}

/// Read a response body chunk by chunk and feed it through a [`DeltaParser`].
///
/// Stops at end of stream, at the `[DONE]` sentinel, or when `cancel`
/// fires. The body stream is dropped on return, which releases the
/// underlying connection. Returns the full reply text.
pub async fn consume_stream<St, B, E, S>(
    body: St,
    sink: &mut S,
    limits: ParserLimits,
    cancel: &CancellationToken,
) -> Result<String>
where
    St: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ServiceError>,
    S: DeltaSink + ?Sized,
{
    let mut body = std::pin::pin!(body);
    let mut parser = DeltaParser::new(limits);
    let mut chunks = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(chunks, "chat stream cancelled");
                return Err(ServiceError::Cancelled.into());
            }
            next = body.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return Err(Error::Service(e.into())),
            None => {
                trace!(chunks, "chat stream ended");
                break;
            }
        };

        chunks += 1;
        if parser.feed(chunk.as_ref(), sink)? == Progress::Done {
            trace!(chunks, "chat stream reached [DONE]");
            break;
        }
    }

    Ok(parser.finish())
}
