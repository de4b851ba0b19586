//! Lazy event stream over one streamed chat response.
//!
//! Reads body chunks on demand, frames them into records, decodes each
//! record and yields the events in arrival order. The response body is
//! owned by the stream and dropped as soon as a terminal event, an error or
//! the end of the body is reached; dropping the stream early drops it too.

use futures_util::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{ChatError, TransportError};
use crate::sse::{decode_record, LineFramer, StreamEvent};
use crate::traits::ByteStream;

/// Single-pass sequence of decoded events for one chat turn.
///
/// At most one terminal item is produced: a `Done` or `Error` event, or an
/// `Err`. After it the stream is exhausted and keeps returning `None`.
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = Result<StreamEvent, ChatError>> + Send>>,
}

struct Decoding {
    /// `None` once the turn has ended; dropping it closes the connection.
    body: Option<ByteStream>,
    framer: LineFramer,
    received: usize,
}

impl Decoding {
    fn close(&mut self) {
        if self.body.take().is_some() {
            tracing::debug!(bytes = self.received, "Closed response stream");
        }
    }

    /// Handle end of body without a terminal event.
    fn finish(&mut self) -> Result<StreamEvent, ChatError> {
        let Some(tail) = self.framer.finish() else {
            tracing::warn!("Stream closed before a terminal event");
            return Err(TransportError::StreamClosed { trailing: None }.into());
        };

        match decode_record(&tail) {
            Ok(Some(event)) if event.is_terminal() => {
                tracing::debug!("Accepted undelimited terminal record");
                Ok(event)
            }
            _ => {
                tracing::warn!(trailing = %tail, "Discarded undelimited tail at end of stream");
                Err(TransportError::StreamClosed {
                    trailing: Some(tail),
                }
                .into())
            }
        }
    }

    /// Decode the next buffered record that carries an event.
    fn next_buffered(&mut self) -> Option<Result<StreamEvent, ChatError>> {
        while let Some(record) = self.framer.next_record() {
            let decoded = record.and_then(|r| {
                let event = decode_record(&r);
                if let Ok(None) = event {
                    tracing::trace!(record = %r, "Ignored record without payload");
                }
                event
            });
            match decoded {
                Ok(None) => continue,
                Ok(Some(event)) => return Some(Ok(event)),
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }
}

impl EventStream {
    /// Wrap a response body.
    pub fn new(body: ByteStream) -> Self {
        let state = Decoding {
            body: Some(body),
            framer: LineFramer::new(),
            received: 0,
        };

        let events = stream::unfold(state, |mut state| async move {
            loop {
                state.body.as_ref()?;

                if let Some(item) = state.next_buffered() {
                    if !matches!(item, Ok(ref event) if !event.is_terminal()) {
                        state.close();
                    }
                    return Some((item, state));
                }

                let next = match state.body.as_mut() {
                    Some(body) => body.next().await,
                    None => return None,
                };
                match next {
                    Some(Ok(chunk)) => {
                        state.received += chunk.len();
                        tracing::trace!(bytes = chunk.len(), "Received chunk");
                        state.framer.push(&chunk);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Response stream failed");
                        state.close();
                        return Some((Err(e.into()), state));
                    }
                    None => {
                        state.close();
                        let item = state.finish();
                        return Some((item, state));
                    }
                }
            }
        })
        .fuse();

        Self {
            inner: Box::pin(events),
        }
    }
}

impl Stream for EventStream {
    type Item = Result<StreamEvent, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use bytes::Bytes;

    fn body(chunks: &[&str]) -> ByteStream {
        let chunks: Vec<Result<Bytes, TransportError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect();
        Box::pin(stream::iter(chunks))
    }

    async fn collect(stream: EventStream) -> Vec<Result<StreamEvent, ChatError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_record_split_across_chunks() {
        let events = collect(EventStream::new(body(&[
            "data: {\"type\":\"content\",\"delta\":\"Hel",
            "lo\"}\n",
            "data: {\"type\":\"done\"}\n",
        ])))
        .await;

        assert_eq!(
            events,
            vec![Ok(StreamEvent::delta("Hello")), Ok(StreamEvent::Done)]
        );
    }

    #[tokio::test]
    async fn test_nothing_read_after_done() {
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(b"data: {\"type\":\"done\"}\n")),
            Err(TransportError::Interrupted {
                message: "must not be read".to_string(),
            }),
        ];
        let events = collect(EventStream::new(Box::pin(stream::iter(chunks)))).await;
        assert_eq!(events, vec![Ok(StreamEvent::Done)]);
    }

    #[tokio::test]
    async fn test_records_after_done_in_same_chunk_are_dropped() {
        let events = collect(EventStream::new(body(&[
            "data: {\"type\":\"done\"}\ndata: {\"type\":\"content\",\"delta\":\"late\"}\n",
        ])))
        .await;
        assert_eq!(events, vec![Ok(StreamEvent::Done)]);
    }

    #[tokio::test]
    async fn test_unknown_type_ends_stream() {
        let events = collect(EventStream::new(body(&[
            "data: {\"type\":\"content\",\"delta\":\"a\"}\n",
            "data: {\"type\":\"unknown\"}\n",
            "data: {\"type\":\"done\"}\n",
        ])))
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            Err(ChatError::Protocol(ProtocolError::UnknownEventType {
                event_type: "unknown".to_string()
            }))
        );
    }

    #[tokio::test]
    async fn test_server_error_record_is_terminal() {
        let events = collect(EventStream::new(body(&[
            "data: {\"type\":\"error\",\"message\":\"quota\"}\n",
            "data: {\"type\":\"done\"}\n",
        ])))
        .await;
        assert_eq!(
            events,
            vec![Ok(StreamEvent::Error {
                message: "quota".to_string()
            })]
        );
    }

    #[tokio::test]
    async fn test_non_data_records_ignored() {
        let events = collect(EventStream::new(body(&[
            ": keepalive\n\nevent: message\r\n",
            "data: {\"type\":\"done\"}\r\n",
        ])))
        .await;
        assert_eq!(events, vec![Ok(StreamEvent::Done)]);
    }

    #[tokio::test]
    async fn test_undelimited_done_is_accepted() {
        let events = collect(EventStream::new(body(&["data: {\"type\":\"done\"}"]))).await;
        assert_eq!(events, vec![Ok(StreamEvent::Done)]);
    }

    #[tokio::test]
    async fn test_truncated_tail_is_an_error() {
        let events = collect(EventStream::new(body(&[
            "data: {\"type\":\"content\",\"delta\":\"a\"}\n",
            "data: {\"type\":\"cont",
        ])))
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            Err(ChatError::Transport(TransportError::StreamClosed {
                trailing: Some("data: {\"type\":\"cont".to_string())
            }))
        );
    }

    #[tokio::test]
    async fn test_close_without_terminal_event() {
        let events = collect(EventStream::new(body(&[
            "data: {\"type\":\"content\",\"delta\":\"a\"}\n",
        ])))
        .await;
        assert_eq!(
            events.last(),
            Some(&Err(ChatError::Transport(TransportError::StreamClosed {
                trailing: None
            })))
        );
    }

    #[tokio::test]
    async fn test_transport_failure_mid_stream() {
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(b"data: {\"type\":\"content\",\"delta\":\"par\"}\n")),
            Err(TransportError::Interrupted {
                message: "connection reset".to_string(),
            }),
        ];
        let events = collect(EventStream::new(Box::pin(stream::iter(chunks)))).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            Err(ChatError::Transport(TransportError::Interrupted { .. }))
        ));
    }

    #[tokio::test]
    async fn test_exhausted_stream_stays_exhausted() {
        let mut stream = EventStream::new(body(&["data: {\"type\":\"done\"}\n"]));
        assert_eq!(stream.next().await, Some(Ok(StreamEvent::Done)));
        assert_eq!(stream.next().await, None);
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        let record = "data: {\"type\":\"content\",\"delta\":\"caf\u{e9}\"}\n".as_bytes();
        let split = record.len() - 4;
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::copy_from_slice(&record[..split])),
            Ok(Bytes::copy_from_slice(&record[split..])),
            Ok(Bytes::from_static(b"data: {\"type\":\"done\"}\n")),
        ];
        let events = collect(EventStream::new(Box::pin(stream::iter(chunks)))).await;
        assert_eq!(events[0], Ok(StreamEvent::delta("caf\u{e9}")));
    }
}
