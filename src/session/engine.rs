//! Async driver for a [`Conversation`].
//!
//! `ChatSession` submits to the state machine, opens the streaming call and
//! folds every decoded event back in, in arrival order. The conversation
//! lock is only ever held for a synchronous step, never across a network
//! await, so readers see progress while a turn streams.
//!
//! Presentation layers subscribe to a push sequence of [`SessionUpdate`]s
//! instead of being called from inside the read loop.

use futures_util::StreamExt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::conversation::{Conversation, SessionStatus, TurnUpdate};
use crate::backend::BackendClient;
use crate::error::{ChatError, ChatResult, StorageError, TransportError};
use crate::models::{ChatOptions, ChatRequest, Turn, VocabEntry};
use crate::traits::BookmarkSink;

/// Progress notification pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Status(SessionStatus),
    /// Text appended to the live answer
    Delta(String),
    /// The answer is final
    Completed(Turn),
    Failed(ChatError),
}

struct Shared {
    conversation: Conversation,
    /// Set while a turn is in flight
    cancel: Option<CancellationToken>,
    subscribers: Vec<mpsc::UnboundedSender<SessionUpdate>>,
}

impl Shared {
    fn publish(&mut self, update: SessionUpdate) {
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}

/// A chat session bound to a backend.
///
/// At most one turn is in flight at a time: a second `send` while one is
/// sending or streaming is rejected without touching the network. Share the
/// session behind an `Arc` to cancel or observe it from another task.
pub struct ChatSession {
    backend: BackendClient,
    options: ChatOptions,
    shared: Mutex<Shared>,
    /// Parent of every turn token; cancelled once the session is closed.
    closed: CancellationToken,
}

/// Fails the turn if `send` is dropped before it settles.
struct InFlight<'a> {
    session: &'a ChatSession,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("Turn abandoned by caller");
            let _ = self.session.settle(Err(ChatError::Cancelled));
        }
    }
}

impl ChatSession {
    pub fn new(backend: BackendClient) -> Self {
        Self::with_conversation(backend, Conversation::new())
    }

    /// Drive an existing conversation.
    pub fn with_conversation(backend: BackendClient, conversation: Conversation) -> Self {
        Self {
            backend,
            options: ChatOptions::default(),
            shared: Mutex::new(Shared {
                conversation,
                cancel: None,
                subscribers: Vec::new(),
            }),
            closed: CancellationToken::new(),
        }
    }

    /// Per-call options sent with every turn.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> String {
        self.lock().conversation.id().to_string()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().conversation.status()
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.lock().conversation.turns().to_vec()
    }

    pub fn last_error(&self) -> Option<ChatError> {
        self.lock().conversation.last_error().cloned()
    }

    /// Copy of the current conversation state.
    pub fn snapshot(&self) -> Conversation {
        self.lock().conversation.clone()
    }

    /// Receive every update from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Leave the `Error` state without sending anything.
    pub fn dismiss_error(&self) -> bool {
        let mut shared = self.lock();
        let dismissed = shared.conversation.dismiss_error();
        if dismissed {
            shared.publish(SessionUpdate::Status(SessionStatus::Idle));
        }
        dismissed
    }

    /// Ask the in-flight turn to stop. Returns `false` if nothing is in
    /// flight.
    ///
    /// The turn ends with [`ChatError::Cancelled`] and its connection is
    /// closed; content received so far is kept.
    pub fn cancel(&self) -> bool {
        match &self.lock().cancel {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Close the session for good: the in-flight turn, if any, is
    /// cancelled and later sends fail with [`ChatError::Cancelled`].
    ///
    /// Returns `true` if a turn was in flight.
    pub fn close(&self) -> bool {
        let in_flight = self.lock().cancel.is_some();
        self.closed.cancel();
        in_flight
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Send one user message and stream the answer to completion.
    ///
    /// Returns the completed assistant turn. Empty input and submissions
    /// while a turn is in flight fail with [`ChatError::Validation`] and
    /// leave the session unchanged. On a closed session `send` fails with
    /// [`ChatError::Cancelled`], also without changing anything.
    pub async fn send(&self, text: &str) -> ChatResult<Turn> {
        let (request, token) = {
            let mut shared = self.lock();
            if self.closed.is_cancelled() {
                tracing::debug!("Send on closed session");
                return Err(ChatError::Cancelled);
            }
            let request = match shared.conversation.submit(text, &self.options) {
                Ok(request) => request,
                Err(e) => {
                    tracing::debug!(reason = e.error_code(), "Submission rejected");
                    return Err(e.into());
                }
            };
            let token = self.closed.child_token();
            shared.cancel = Some(token.clone());
            shared.publish(SessionUpdate::Status(SessionStatus::Sending));
            (request, token)
        };

        let mut in_flight = InFlight {
            session: self,
            armed: true,
        };
        let outcome = self.drive(&request, &token).await;
        in_flight.armed = false;
        self.settle(outcome)
    }

    async fn drive(&self, request: &ChatRequest, token: &CancellationToken) -> ChatResult<Turn> {
        let mut events = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ChatError::Cancelled),
            opened = self.backend.stream_chat(request) => opened?,
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ChatError::Cancelled),
                next = events.next() => next,
            };

            let event = match next {
                Some(item) => item?,
                None => return Err(TransportError::StreamClosed { trailing: None }.into()),
            };

            {
                let mut shared = self.lock();
                match shared.conversation.apply(&event) {
                    TurnUpdate::Delta { text, started } => {
                        if started {
                            shared.publish(SessionUpdate::Status(SessionStatus::Streaming));
                        }
                        shared.publish(SessionUpdate::Delta(text));
                    }
                    TurnUpdate::Completed(answer) => return Ok(answer),
                    TurnUpdate::Failed(error) => return Err(error),
                    // Nothing else ends a turn while the token is held.
                    TurnUpdate::Ignored => return Err(ChatError::Cancelled),
                }
            }
        }
    }

    fn settle(&self, outcome: ChatResult<Turn>) -> ChatResult<Turn> {
        let mut shared = self.lock();
        shared.cancel = None;

        match outcome {
            Ok(answer) => {
                tracing::debug!(
                    session_id = %shared.conversation.id(),
                    chars = answer.content.len(),
                    "Turn completed"
                );
                shared.publish(SessionUpdate::Completed(answer.clone()));
                shared.publish(SessionUpdate::Status(SessionStatus::Idle));
                Ok(answer)
            }
            Err(error) => {
                shared.conversation.fail(error.clone());
                shared.publish(SessionUpdate::Failed(error.clone()));
                let status = shared.conversation.status();
                shared.publish(SessionUpdate::Status(status));
                Err(error)
            }
        }
    }

    /// Save the last completed answer as a vocabulary entry.
    ///
    /// The term is the user message the answer replied to. Returns
    /// `Ok(None)` when there is no completed answer to save.
    pub async fn bookmark_last_answer(
        &self,
        sink: &dyn BookmarkSink,
    ) -> Result<Option<VocabEntry>, StorageError> {
        let candidate = self.lock().conversation.bookmark_candidate();
        match candidate {
            Some((term, explanation)) => sink.add(&term, &explanation).await.map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.lock();
        f.debug_struct("ChatSession")
            .field("id", &shared.conversation.id())
            .field("status", &shared.conversation.status())
            .field("turns", &shared.conversation.turns().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryBookmarks, MockHttpClient, MockResponse};
    use crate::error::ValidationError;
    use bytes::Bytes;
    use std::sync::Arc;

    const CHAT_URL: &str = "http://backend.test/api/chat/stream";

    fn session(mock: &MockHttpClient) -> ChatSession {
        ChatSession::new(BackendClient::new(Arc::new(mock.clone()), "http://backend.test"))
    }

    fn chunks(parts: &[&'static str]) -> MockResponse {
        MockResponse::Stream(parts.iter().map(|p| Bytes::from_static(p.as_bytes())).collect())
    }

    #[tokio::test]
    async fn test_send_returns_completed_answer() {
        let mock = MockHttpClient::new();
        mock.set_response(
            CHAT_URL,
            chunks(&[
                "data: {\"type\":\"content\",\"delta\":\"Hel\"}\n",
                "data: {\"type\":\"content\",\"delta\":\"lo\"}\n",
                "data: {\"type\":\"done\"}\n",
            ]),
        );
        let session = session(&mock);
        let mut updates = session.subscribe();

        let answer = session.send("greet me").await.unwrap();

        assert_eq!(answer, Turn::assistant("Hello"));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.turns(), vec![Turn::user("greet me"), Turn::assistant("Hello")]);

        let mut seen = Vec::new();
        while let Ok(update) = updates.try_recv() {
            seen.push(update);
        }
        assert_eq!(
            seen,
            vec![
                SessionUpdate::Status(SessionStatus::Sending),
                SessionUpdate::Status(SessionStatus::Streaming),
                SessionUpdate::Delta("Hel".to_string()),
                SessionUpdate::Delta("lo".to_string()),
                SessionUpdate::Completed(Turn::assistant("Hello")),
                SessionUpdate::Status(SessionStatus::Idle),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_message_makes_no_request() {
        let mock = MockHttpClient::new();
        let session = session(&mock);

        let err = session.send("").await.unwrap_err();

        assert_eq!(err, ChatError::Validation(ValidationError::EmptyMessage));
        assert!(session.turns().is_empty());
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(mock.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_without_turn() {
        let mock = MockHttpClient::new();
        assert!(!session(&mock).cancel());
    }

    #[tokio::test]
    async fn test_request_failure_moves_to_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            CHAT_URL,
            MockResponse::Error(TransportError::Status {
                status: 500,
                body: "overloaded".to_string(),
            }),
        );
        let session = session(&mock);

        let err = session.send("hello").await.unwrap_err();

        assert_eq!(err.category(), crate::error::ErrorCategory::Server);
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.last_error(), Some(err));
        assert_eq!(session.turns(), vec![Turn::user("hello")]);

        assert!(session.dismiss_error());
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn test_bookmark_last_answer() {
        let mock = MockHttpClient::new();
        mock.set_response(
            CHAT_URL,
            chunks(&[
                "data: {\"type\":\"content\",\"delta\":\"A shared reference\"}\n",
                "data: {\"type\":\"done\"}\n",
            ]),
        );
        let session = session(&mock);
        let sink = InMemoryBookmarks::new();

        assert_eq!(session.bookmark_last_answer(&sink).await.unwrap(), None);

        session.send("&T").await.unwrap();
        let entry = session.bookmark_last_answer(&sink).await.unwrap().unwrap();

        assert_eq!(entry.term, "&T");
        assert_eq!(entry.explanation, "A shared reference");
        assert_eq!(sink.get_entries(), vec![entry]);
    }

    #[tokio::test]
    async fn test_closed_session_makes_no_request() {
        let mock = MockHttpClient::new();
        let session = session(&mock);

        assert!(!session.close());
        assert!(session.is_closed());

        assert_eq!(session.send("hello").await, Err(ChatError::Cancelled));
        assert!(session.turns().is_empty());
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(mock.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_close_cancels_in_flight_turn() {
        let mock = MockHttpClient::new();
        mock.set_response(
            CHAT_URL,
            MockResponse::Stall(vec![Bytes::from_static(
                b"data: {\"type\":\"content\",\"delta\":\"wait\"}\n",
            )]),
        );
        let session = Arc::new(session(&mock));
        let mut updates = session.subscribe();

        let turn = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send("slow").await })
        };
        while let Some(update) = updates.recv().await {
            if update == SessionUpdate::Status(SessionStatus::Streaming) {
                break;
            }
        }

        assert!(session.close());
        assert_eq!(turn.await.unwrap(), Err(ChatError::Cancelled));
        assert_eq!(mock.streams_closed(), 1);
        assert_eq!(session.send("again").await, Err(ChatError::Cancelled));
        assert_eq!(mock.get_requests().len(), 1);
    }
}
