//! Session lifecycle over one endpoint
//!
//! A session walks `Disconnected -> Connecting -> Ready -> Closed` and owns its
//! transport exclusively. The transport is released exactly once: on `close`,
//! on a failed or interrupted handshake, or from `Drop` when the owner never
//! closed it. A release that is itself cancelled halfway is rescheduled.

use std::fmt;
use std::future::{self, Future};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::error::{SessionError, SessionResult};
use super::transport::{Connector, Transport};
use crate::logging::Logger;
use crate::tools::ToolMetadata;

/// Instruction used when the endpoint cannot provide one
pub const FALLBACK_INSTRUCTION: &str = "You are a helpful assistant using the provided tools.";

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Ready,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Tools and system instruction published by an endpoint
#[derive(Debug, Clone)]
pub struct Catalog {
    pub tools: Vec<ToolMetadata>,
    pub instruction: String,
    /// True when `instruction` is `FALLBACK_INSTRUCTION` because the fetch failed
    pub used_fallback: bool,
}

impl Catalog {
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A transport whose release has not completed yet
///
/// Dropping it before `run` finishes spawns the release on the current runtime.
struct PendingRelease {
    transport: Option<Box<dyn Transport>>,
    url: String,
    logger: Arc<dyn Logger>,
}

impl PendingRelease {
    fn new(transport: Box<dyn Transport>, url: &str, logger: Arc<dyn Logger>) -> Self {
        Self {
            transport: Some(transport),
            url: url.to_string(),
            logger,
        }
    }

    /// Give the transport back unreleased
    fn disarm(mut self) -> Option<Box<dyn Transport>> {
        self.transport.take()
    }

    async fn run(mut self) -> Vec<String> {
        let failures = match self.transport.as_mut() {
            Some(transport) => transport.release().await,
            None => Vec::new(),
        };
        self.transport = None;
        failures
    }
}

impl Drop for PendingRelease {
    fn drop(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let logger = Arc::clone(&self.logger);
                let url = self.url.clone();
                handle.spawn(async move {
                    for failure in transport.release().await {
                        logger.warn(&format!("[Session] release of {}: {}", url, failure));
                    }
                });
            }
            Err(_) => self.logger.error(&format!(
                "[Session] dropped outside a runtime, {} not released",
                self.url
            )),
        }
    }
}

/// Live connection to one tool-serving endpoint
pub struct Session {
    url: String,
    state: Mutex<SessionState>,
    transport: tokio::sync::Mutex<Option<Box<dyn Transport>>>,
    logger: Arc<dyn Logger>,
}

impl Session {
    /// Connect and run the initialize handshake
    ///
    /// On a handshake failure the transport is released before the error is
    /// returned, so a failed open never leaks.
    pub async fn open(
        connector: &dyn Connector,
        url: &str,
        logger: Arc<dyn Logger>,
    ) -> SessionResult<Self> {
        Self::open_until(connector, url, logger, &mut future::pending::<()>()).await
    }

    /// `open`, giving up with `Interrupted` once `cancel` resolves
    async fn open_until<C>(
        connector: &dyn Connector,
        url: &str,
        logger: Arc<dyn Logger>,
        cancel: &mut C,
    ) -> SessionResult<Self>
    where
        C: Future<Output = ()> + Unpin,
    {
        let mut session = Self {
            url: url.to_string(),
            state: Mutex::new(SessionState::Disconnected),
            transport: tokio::sync::Mutex::new(None),
            logger,
        };
        session.logger.info(&format!("[Session] connecting to {}", url));
        session.set_state(SessionState::Connecting);

        let connected = tokio::select! {
            biased;
            _ = &mut *cancel => Err(session.interrupted()),
            connected = connector.connect(url) => connected,
        };
        let transport = match connected {
            Ok(transport) => transport,
            Err(e) => {
                session.logger.error(&format!("[Session] {}", e));
                session.set_state(SessionState::Closed);
                return Err(e);
            }
        };

        let mut pending = PendingRelease::new(transport, url, Arc::clone(&session.logger));
        let initialized = match pending.transport.as_deref_mut() {
            Some(transport) => tokio::select! {
                biased;
                _ = &mut *cancel => Err(session.interrupted()),
                initialized = transport.initialize() => initialized,
            },
            None => Ok(()),
        };

        if let Err(e) = initialized {
            session.logger.error(&format!("[Session] {}", e));
            session.set_state(SessionState::Closed);
            for failure in pending.run().await {
                session.logger.warn(&format!(
                    "[Session] release after failed handshake: {}",
                    failure
                ));
            }
            return Err(e);
        }

        *session.transport.get_mut() = pending.disarm();
        session.set_state(SessionState::Ready);
        session
            .logger
            .info(&format!("[Session] ready: {}", session.url));
        Ok(session)
    }

    /// Open a session, run `body` with it, and always close it afterwards
    ///
    /// Teardown failures after `body` completed are logged; the body's value
    /// is still returned. If the enclosing task is cancelled mid-body, the
    /// `Drop` impl schedules the release.
    pub async fn scoped<F, Fut, T>(
        connector: &dyn Connector,
        url: &str,
        logger: Arc<dyn Logger>,
        body: F,
    ) -> SessionResult<T>
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = T>,
    {
        Self::scoped_until(connector, url, logger, future::pending::<()>(), body).await
    }

    /// `scoped`, abandoning the open or the body once `cancel` resolves
    ///
    /// The session is closed, and its release awaited, before
    /// `Interrupted` is returned.
    pub async fn scoped_until<F, Fut, T, C>(
        connector: &dyn Connector,
        url: &str,
        logger: Arc<dyn Logger>,
        cancel: C,
        body: F,
    ) -> SessionResult<T>
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = T>,
        C: Future<Output = ()>,
    {
        let mut cancel = std::pin::pin!(cancel);
        let session = Arc::new(Self::open_until(connector, url, logger, &mut cancel).await?);

        let output = tokio::select! {
            biased;
            _ = &mut cancel => None,
            output = body(Arc::clone(&session)) => Some(output),
        };

        if let Err(e) = session.close().await {
            session.logger.warn(&format!("[Session] {}", e));
        }
        match output {
            Some(output) => Ok(output),
            None => {
                session
                    .logger
                    .warn(&format!("[Session] interrupted, closed {}", session.url));
                Err(session.interrupted())
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }

    fn interrupted(&self) -> SessionError {
        SessionError::Interrupted {
            url: self.url.clone(),
        }
    }

    fn ensure_ready(&self) -> SessionResult<()> {
        match self.state() {
            SessionState::Ready => Ok(()),
            state => Err(SessionError::NotReady { state }),
        }
    }

    /// List tools and fetch the instruction prompt `instruction_prompt`
    ///
    /// Any failure of the prompt fetch degrades to `FALLBACK_INSTRUCTION`.
    pub async fn fetch_catalog(&self, instruction_prompt: &str) -> SessionResult<Catalog> {
        self.ensure_ready()?;
        let mut guard = self.transport.lock().await;
        let transport = guard.as_mut().ok_or(SessionError::NotReady {
            state: SessionState::Closed,
        })?;

        let tools = transport
            .list_tools()
            .await?
            .iter()
            .map(ToolMetadata::from_tool)
            .collect::<Vec<_>>();
        self.logger.info(&format!(
            "[Session] {} tool(s) available",
            tools.len()
        ));

        let (instruction, used_fallback) = match transport.get_prompt(instruction_prompt).await {
            Ok(text) if !text.trim().is_empty() => (text, false),
            Ok(_) => {
                self.logger.warn(&format!(
                    "[Session] prompt '{}' is empty, using fallback instruction",
                    instruction_prompt
                ));
                (FALLBACK_INSTRUCTION.to_string(), true)
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "[Session] could not fetch prompt '{}' ({}), using fallback instruction",
                    instruction_prompt, e
                ));
                (FALLBACK_INSTRUCTION.to_string(), true)
            }
        };

        Ok(Catalog {
            tools,
            instruction,
            used_fallback,
        })
    }

    /// Call a remote tool and return the text of its first content item
    pub async fn invoke(&self, name: &str, arguments: Map<String, Value>) -> SessionResult<String> {
        self.ensure_ready()?;
        let mut guard = self.transport.lock().await;
        let transport = guard.as_mut().ok_or(SessionError::NotReady {
            state: SessionState::Closed,
        })?;

        self.logger
            .debug(&format!("[Session] calling tool '{}'", name));
        let reply = transport.call_tool(name, arguments).await?;

        if reply.content.is_empty() {
            return Err(SessionError::tool_invocation(name, "empty result"));
        }
        let text = reply.first_text().ok_or_else(|| {
            SessionError::tool_invocation(name, "first content item is not text")
        })?;
        if reply.is_error {
            return Err(SessionError::tool_invocation(name, text));
        }
        Ok(text.to_string())
    }

    /// Release the transport
    ///
    /// Idempotent: only the first call releases anything. Every release step
    /// is attempted; failures come back together as `Teardown`.
    pub async fn close(&self) -> SessionResult<()> {
        self.set_state(SessionState::Closed);
        let Some(transport) = self.transport.lock().await.take() else {
            return Ok(());
        };

        let failures = PendingRelease::new(transport, &self.url, Arc::clone(&self.logger))
            .run()
            .await;
        self.logger
            .info(&format!("[Session] closed: {}", self.url));
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SessionError::Teardown(failures))
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.get_mut().take() {
            self.logger.warn(&format!(
                "[Session] dropped while open, releasing {}",
                self.url
            ));
            drop(PendingRelease::new(transport, &self.url, Arc::clone(&self.logger)));
        }
    }
}
