//! Application context.
//!
//! Everything a running client shares (configuration, the backend client,
//! the bookmark sink, open sessions) lives in one explicitly constructed
//! `AppContext`. Create it at startup, pass it where it is needed, and call
//! [`AppContext::shutdown`] on the way out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use crate::adapters::{JsonFileBookmarks, ReqwestHttpClient};
use crate::backend::BackendClient;
use crate::config::{ConfigError, GlossaConfig};
use crate::session::ChatSession;
use crate::traits::{BookmarkSink, HttpClient};

/// Shared state for one client process.
pub struct AppContext {
    config: GlossaConfig,
    backend: BackendClient,
    bookmarks: Arc<dyn BookmarkSink>,
    sessions: Mutex<Vec<Weak<ChatSession>>>,
    shut_down: AtomicBool,
}

impl AppContext {
    /// Assemble a context from explicit parts.
    pub fn new(
        config: GlossaConfig,
        http: Arc<dyn HttpClient>,
        bookmarks: Arc<dyn BookmarkSink>,
    ) -> Self {
        let mut backend = BackendClient::new(http, config.base_url.clone());
        if let Some(key) = &config.api_key {
            backend = backend.with_api_key(key.clone());
        }

        Self {
            config,
            backend,
            bookmarks,
            sessions: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Production wiring: reqwest for HTTP, `vocabulary.json` in the data
    /// directory for bookmarks.
    pub fn from_config(config: GlossaConfig) -> Result<Self, ConfigError> {
        let http = ReqwestHttpClient::with_connect_timeout(Duration::from_secs(
            config.request_timeout_secs,
        ))
        .map_err(ConfigError::Client)?;
        let bookmarks = JsonFileBookmarks::in_dir(config.data_dir()?);

        tracing::debug!(
            base_url = %config.base_url,
            vocabulary = %bookmarks.path().display(),
            "Created application context"
        );

        Ok(Self::new(config, Arc::new(http), Arc::new(bookmarks)))
    }

    pub fn config(&self) -> &GlossaConfig {
        &self.config
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn bookmarks(&self) -> &dyn BookmarkSink {
        self.bookmarks.as_ref()
    }

    /// Open a new chat session using the configured per-call options.
    ///
    /// After [`shutdown`](Self::shutdown) the session comes back already
    /// closed: every send on it fails with `ChatError::Cancelled` without
    /// reaching the backend.
    pub fn open_session(&self) -> Arc<ChatSession> {
        let session = Arc::new(
            ChatSession::new(self.backend.clone()).with_options(self.config.chat_options()),
        );

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        // Checked under the lock so shutdown cannot miss a new session.
        if self.is_shut_down() {
            session.close();
            tracing::debug!(session_id = %session.id(), "Opened closed session after shutdown");
            return session;
        }
        sessions.retain(|s| s.strong_count() > 0);
        sessions.push(Arc::downgrade(&session));

        tracing::debug!(session_id = %session.id(), "Opened session");
        session
    }

    /// Close every open session, cancelling in-flight turns. Returns how
    /// many turns were cancelled.
    ///
    /// Calling it again is harmless.
    pub fn shutdown(&self) -> usize {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let sessions: Vec<Weak<ChatSession>> = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *sessions)
        };
        let cancelled = sessions
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|session| session.close())
            .count();

        tracing::info!(cancelled, "Shut down");
        cancelled
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("backend", &self.backend)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryBookmarks, MockHttpClient, MockResponse};
    use crate::error::ChatError;
    use crate::session::SessionStatus;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn context(mock: &MockHttpClient, config: GlossaConfig) -> AppContext {
        AppContext::new(
            config.with_base_url("http://backend.test"),
            Arc::new(mock.clone()),
            Arc::new(InMemoryBookmarks::new()),
        )
    }

    #[test]
    fn test_from_config_uses_data_dir() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::from_config(GlossaConfig::default().with_data_dir(dir.path())).unwrap();
        assert_eq!(ctx.backend().base_url(), "http://localhost:8000");
        assert!(!ctx.is_shut_down());
    }

    #[tokio::test]
    async fn test_sessions_carry_config_options() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Stream(vec![Bytes::from_static(
            b"data: {\"type\":\"done\"}\n",
        )]));
        let ctx = context(
            &mock,
            GlossaConfig::default().with_model("m-1").with_api_key("key"),
        );

        ctx.open_session().send("hello").await.unwrap();

        let request = &mock.get_requests()[0];
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["model"], "m-1");
        assert_eq!(request.headers.get("Authorization"), Some(&"Bearer key".to_string()));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let mock = MockHttpClient::new();
        let ctx = context(&mock, GlossaConfig::default());
        let a = ctx.open_session();
        let b = ctx.open_session();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_turns() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Stall(vec![Bytes::from_static(
            b"data: {\"type\":\"content\",\"delta\":\"par\"}\n",
        )]));
        let ctx = context(&mock, GlossaConfig::default());
        let session = ctx.open_session();
        let mut updates = session.subscribe();

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send("long question").await })
        };
        while let Some(update) = updates.recv().await {
            if matches!(update, crate::session::SessionUpdate::Delta(_)) {
                break;
            }
        }

        assert_eq!(ctx.shutdown(), 1);
        assert_eq!(ctx.shutdown(), 0);

        let result = task.await.unwrap();
        assert_eq!(result, Err(ChatError::Cancelled));
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.turns()[1].content, "par");
        assert_eq!(mock.streams_closed(), 1);
    }

    #[tokio::test]
    async fn test_open_session_after_shutdown_is_closed() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Stall(Vec::new()));
        let ctx = context(&mock, GlossaConfig::default());
        assert_eq!(ctx.shutdown(), 0);

        let session = ctx.open_session();
        assert!(session.is_closed());

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), session.send("hi"))
            .await
            .expect("send on a closed session must not block");
        assert_eq!(result, Err(ChatError::Cancelled));
        assert!(mock.get_requests().is_empty());
        assert_eq!(mock.streams_opened(), 0);
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_sessions() {
        let mock = MockHttpClient::new();
        let ctx = context(&mock, GlossaConfig::default());
        let session = ctx.open_session();

        assert_eq!(ctx.shutdown(), 0);

        assert!(session.is_closed());
        assert_eq!(session.send("late").await, Err(ChatError::Cancelled));
        assert!(mock.get_requests().is_empty());
    }
}
