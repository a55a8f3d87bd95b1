use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::config::SessionConfig;
use super::stream::{SessionError, SessionEvent, SessionState, StreamSession};
use super::transport::Connector;
use crate::audio::{CaptureError, CaptureSource};
use crate::protocol::ProtocolVariant;
use crate::reconcile::{IncrementalItem, Reconciler};

/// Errors fatal to starting or running a recording activity
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActivityError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Lifecycle notifications for external observers (rendering layer)
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Opened,
    Closed,
    /// Service-reported or transport failure, human-readable
    Error(String),
}

/// Statistics about a recording activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether an activity is currently running
    pub is_active: bool,

    /// When the activity started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Frames handed to the session so far
    pub frames_forwarded: usize,

    /// Entries in the reconciled view
    pub item_count: usize,

    /// Entries marked final
    pub finalized_count: usize,
}

/// Orchestrates one recording activity at a time: capture → session on
/// the way out, session → reconciler on the way in.
///
/// Dependencies are injected, so independent controller instances can
/// coexist and tests tear down deterministically.
pub struct SessionController {
    variant: ProtocolVariant,
    config: SessionConfig,
    connector: Arc<dyn Connector>,
    capture: Box<dyn CaptureSource>,

    session: Option<StreamSession>,
    reconciler: Arc<Mutex<Reconciler>>,

    /// Handle for the frame forwarding task
    forward_task: Option<JoinHandle<()>>,

    /// Handle for the inbound event consuming task
    consume_task: Option<JoinHandle<()>>,

    lifecycle_tx: broadcast::Sender<LifecycleEvent>,
    frames_forwarded: Arc<AtomicUsize>,
    started_at: DateTime<Utc>,
    is_active: bool,
}

impl SessionController {
    pub fn new(
        variant: ProtocolVariant,
        config: SessionConfig,
        capture: Box<dyn CaptureSource>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (lifecycle_tx, _) = broadcast::channel(16);
        Self {
            variant,
            config,
            connector,
            capture,
            session: None,
            reconciler: Arc::new(Mutex::new(Reconciler::new())),
            forward_task: None,
            consume_task: None,
            lifecycle_tx,
            frames_forwarded: Arc::new(AtomicUsize::new(0)),
            started_at: Utc::now(),
            is_active: false,
        }
    }

    /// Subscribe to lifecycle events (opened, closed, error)
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle_tx.subscribe()
    }

    /// Start a recording activity: open the session, then capture.
    ///
    /// The session reaches `Open` before any frame is forwarded; a
    /// frame that races ahead of that is dropped by the session's
    /// admission rule, never queued.
    pub async fn start(&mut self) -> Result<(), ActivityError> {
        if self.is_active {
            warn!("Recording already started");
            return Ok(());
        }

        info!("Starting recording activity: {}", self.config.activity_id);

        let mut session = StreamSession::new(
            self.variant,
            self.config.options.clone(),
            self.config.timing.clone(),
        );
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        session.open(self.connector.as_ref(), events_tx).await?;

        let handle = match session.handle() {
            Some(handle) => handle,
            None => {
                session.close().await;
                return Err(SessionError::Configuration(
                    "session opened without a send handle".to_string(),
                )
                .into());
            }
        };

        let mut frames_rx = match self.capture.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Failed to start capture: {}", e);
                session.close().await;
                return Err(e.into());
            }
        };

        // Forward task: capture frames → session, paced by the
        // hardware clock.
        self.frames_forwarded.store(0, Ordering::SeqCst);
        let frames_forwarded = Arc::clone(&self.frames_forwarded);
        let forward_task = tokio::spawn(async move {
            while let Some(frame) = frames_rx.recv().await {
                handle.send_frame(&frame);
                frames_forwarded.fetch_add(1, Ordering::SeqCst);
            }
            info!("Frame forwarding stopped");
        });

        // Consume task: inbound events → reconciled view, paced by the
        // network. The reconciler mutex makes each apply atomic to
        // snapshot readers.
        let reconciler = Arc::clone(&self.reconciler);
        let lifecycle = self.lifecycle_tx.clone();
        let consume_task = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                match event {
                    SessionEvent::Opened => {
                        let _ = lifecycle.send(LifecycleEvent::Opened);
                    }
                    SessionEvent::Item(update) => {
                        let mut view = reconciler.lock().await;
                        if let Err(e) = view.apply(update) {
                            warn!("Ignoring inconsistent update: {}", e);
                        }
                    }
                    SessionEvent::ServiceError(message) => {
                        let _ = lifecycle.send(LifecycleEvent::Error(message));
                    }
                    SessionEvent::TransportError(message) => {
                        let _ = lifecycle.send(LifecycleEvent::Error(message));
                    }
                    SessionEvent::Closed => {
                        let _ = lifecycle.send(LifecycleEvent::Closed);
                    }
                }
            }
            info!("Event consuming stopped");
        });

        self.session = Some(session);
        self.forward_task = Some(forward_task);
        self.consume_task = Some(consume_task);
        self.started_at = Utc::now();
        self.is_active = true;

        info!("Recording activity started");
        Ok(())
    }

    /// Stop the activity: capture first (no new frames), then drive the
    /// session through its graceful close. Idempotent and safe to call
    /// after a partial start.
    pub async fn stop(&mut self) -> SessionStats {
        if self.is_active {
            info!("Stopping recording activity: {}", self.config.activity_id);
        }

        self.capture.stop().await;

        if let Some(task) = self.forward_task.take() {
            if let Err(e) = task.await {
                error!("Forward task panicked: {}", e);
            }
        }

        if let Some(mut session) = self.session.take() {
            session.close().await;
        }

        if let Some(task) = self.consume_task.take() {
            if let Err(e) = task.await {
                error!("Consume task panicked: {}", e);
            }
        }

        self.is_active = false;
        self.stats().await
    }

    /// Pause the activity. The stream ends (the service finalizes what
    /// it has) but the reconciled view is kept, so a follow-up `start`
    /// appends to the same transcript.
    pub async fn pause(&mut self) -> SessionStats {
        info!("Pausing recording activity: {}", self.config.activity_id);
        self.stop().await
    }

    /// Current session state, `Idle` before the first start
    pub fn session_state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(SessionState::Idle)
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Stable snapshot of the reconciled view
    pub async fn transcript(&self) -> Vec<IncrementalItem> {
        self.reconciler.lock().await.snapshot()
    }

    /// Clear the reconciled view for a new activity
    pub async fn reset_view(&mut self) {
        self.reconciler.lock().await.reset();
        info!("Reconciled view cleared");
    }

    /// Current activity statistics
    pub async fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        let (item_count, finalized_count) = {
            let view = self.reconciler.lock().await;
            (view.len(), view.finalized_count())
        };

        SessionStats {
            is_active: self.is_active,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            frames_forwarded: self.frames_forwarded.load(Ordering::SeqCst),
            item_count,
            finalized_count,
        }
    }
}
