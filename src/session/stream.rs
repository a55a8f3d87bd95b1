use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::config::SessionTiming;
use super::transport::{Connector, Transport};
use crate::audio::AudioFrame;
use crate::protocol::{InboundEvent, ItemUpdate, ProtocolVariant, StreamOptions};

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    ShuttingDown,
    Closed,
}

/// Errors fatal to the current recording activity
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("connection did not open within {0:?}")]
    ConnectTimeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Events the session emits towards its consumer loop
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Opened,
    Item(ItemUpdate),
    ServiceError(String),
    TransportError(String),
    Closed,
}

/// One bidirectional streaming session for the lifetime of one
/// recording activity.
///
/// Owns the connection, performs the handshake (sub-protocol tokens on
/// the connect plus an opening configuration message), demultiplexes
/// inbound messages by their discriminant, forwards outbound frames in
/// arrival order, and drives graceful shutdown with a bounded wait for
/// the peer to close.
pub struct StreamSession {
    variant: ProtocolVariant,
    options: StreamOptions,
    timing: SessionTiming,
    state_tx: Arc<watch::Sender<SessionState>>,
    state_rx: watch::Receiver<SessionState>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    shutdown: Option<broadcast::Sender<()>>,
    io_task: Option<JoinHandle<()>>,
}

/// Clonable sending handle for the frame forwarding task
#[derive(Clone)]
pub struct SessionHandle {
    variant: ProtocolVariant,
    outbound: mpsc::UnboundedSender<String>,
    state_rx: watch::Receiver<SessionState>,
}

impl StreamSession {
    pub fn new(variant: ProtocolVariant, options: StreamOptions, timing: SessionTiming) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        Self {
            variant,
            options,
            timing,
            state_tx: Arc::new(state_tx),
            state_rx,
            outbound: None,
            shutdown: None,
            io_task: None,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Handle for pushing frames from another task; available once open.
    pub fn handle(&self) -> Option<SessionHandle> {
        self.outbound.as_ref().map(|tx| SessionHandle {
            variant: self.variant,
            outbound: tx.clone(),
            state_rx: self.state_rx.clone(),
        })
    }

    /// Open the connection and perform the handshake.
    ///
    /// Fails with `ConnectTimeout` if the transport does not come up
    /// within the configured bound; the session is then `Closed`.
    pub async fn open(
        &mut self,
        connector: &dyn Connector,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<(), SessionError> {
        if self.state() != SessionState::Idle {
            return Err(SessionError::Configuration(
                "session was already opened".to_string(),
            ));
        }

        self.state_tx.send_replace(SessionState::Connecting);
        info!("Opening {:?} stream", self.variant);

        let mut transport =
            match timeout(self.timing.connect_timeout, connector.connect(self.variant)).await {
                Ok(Ok(transport)) => transport,
                Ok(Err(e)) => {
                    self.state_tx.send_replace(SessionState::Closed);
                    return Err(e);
                }
                Err(_) => {
                    self.state_tx.send_replace(SessionState::Closed);
                    return Err(SessionError::ConnectTimeout(self.timing.connect_timeout));
                }
            };

        let opening = self.variant.opening_message(&self.options).map_err(|e| {
            self.state_tx.send_replace(SessionState::Closed);
            SessionError::Configuration(format!("failed to encode configuration: {e}"))
        })?;
        if let Err(e) = transport.send(opening).await {
            self.state_tx.send_replace(SessionState::Closed);
            return Err(e);
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        self.outbound = Some(outbound_tx);
        self.shutdown = Some(shutdown_tx);
        self.io_task = Some(tokio::spawn(run_io(
            transport,
            outbound_rx,
            shutdown_rx,
            events.clone(),
            self.state_tx.clone(),
            self.variant,
        )));

        self.state_tx.send_replace(SessionState::Open);
        let _ = events.send(SessionEvent::Opened);

        info!("Stream open");
        Ok(())
    }

    /// Forward one encoded frame; a no-op with a warning when the
    /// session is not open (capture and session lifecycles are only
    /// loosely coupled in time).
    pub fn send(&self, frame: &AudioFrame) {
        match self.handle() {
            Some(handle) => handle.send_frame(frame),
            None => warn!("Session not open, dropping audio frame"),
        }
    }

    /// Graceful shutdown: send the terminal end message, then wait for
    /// the peer to close the transport for up to the configured bound.
    /// Proceeds regardless on timeout; never blocks the caller
    /// indefinitely. Idempotent from any state.
    pub async fn close(&mut self) {
        match self.state() {
            SessionState::Idle => {
                self.state_tx.send_replace(SessionState::Closed);
                return;
            }
            SessionState::Closed | SessionState::ShuttingDown => return,
            SessionState::Connecting | SessionState::Open => {}
        }

        self.state_tx.send_replace(SessionState::ShuttingDown);
        info!("Closing stream");

        if let Some(outbound) = &self.outbound {
            match self.variant.end_message() {
                Ok(end) => {
                    let _ = outbound.send(end);
                }
                Err(e) => warn!("Failed to encode end message: {}", e),
            }
        }

        // Wait for the I/O task to observe the peer close.
        let mut state_rx = self.state_rx.clone();
        let closed = state_rx.wait_for(|state| *state == SessionState::Closed);
        if timeout(self.timing.close_wait, closed).await.is_err() {
            warn!(
                "Peer did not close within {:?}, forcing teardown",
                self.timing.close_wait
            );
            if let Some(shutdown) = &self.shutdown {
                let _ = shutdown.send(());
            }
        }

        if let Some(mut task) = self.io_task.take() {
            if timeout(Duration::from_millis(250), &mut task).await.is_err() {
                task.abort();
            }
        }

        self.outbound = None;
        self.shutdown = None;
        self.state_tx.send_replace(SessionState::Closed);
        info!("Stream closed");
    }
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Push one frame onto the outbound queue.
    ///
    /// Frames sent while the session is not open are discarded with a
    /// warning — real-time audio has no use for stale retransmission,
    /// and a transient gap must not abort capture.
    pub fn send_frame(&self, frame: &AudioFrame) {
        if self.state() != SessionState::Open {
            warn!("Session not open, dropping audio frame");
            return;
        }

        match self.variant.chunk_message(&frame.pcm_bytes()) {
            Ok(message) => {
                if self.outbound.send(message).is_err() {
                    warn!("Session I/O stopped, dropping audio frame");
                }
            }
            Err(e) => error!("Failed to encode audio chunk: {}", e),
        }
    }
}

enum Step {
    Outbound(String),
    Inbound(Option<Result<String, SessionError>>),
    Shutdown,
}

/// Session I/O loop: pumps the outbound queue into the transport and
/// demultiplexes inbound messages into events. Producer and consumer
/// sides stay independent — neither blocks the other.
async fn run_io(
    mut transport: Box<dyn Transport>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: broadcast::Receiver<()>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: Arc<watch::Sender<SessionState>>,
    variant: ProtocolVariant,
) {
    loop {
        let step = tokio::select! {
            Some(text) = outbound_rx.recv() => Step::Outbound(text),
            inbound = transport.recv() => Step::Inbound(inbound),
            _ = shutdown_rx.recv() => Step::Shutdown,
        };

        match step {
            Step::Outbound(text) => {
                if let Err(e) = transport.send(text).await {
                    error!("Transport send failed: {}", e);
                    let _ = events.send(SessionEvent::TransportError(e.to_string()));
                    break;
                }
            }
            Step::Inbound(Some(Ok(text))) => match variant.parse_inbound(&text) {
                Ok(InboundEvent::Item(item)) => {
                    let _ = events.send(SessionEvent::Item(item));
                }
                Ok(InboundEvent::ServiceError(message)) => {
                    warn!("Service reported error: {}", message);
                    let _ = events.send(SessionEvent::ServiceError(message));
                }
                Err(e) => {
                    warn!("Dropping unrecognized message: {}", e);
                }
            },
            Step::Inbound(Some(Err(e))) => {
                error!("Transport failed: {}", e);
                let _ = events.send(SessionEvent::TransportError(e.to_string()));
                break;
            }
            Step::Inbound(None) => {
                debug!("Peer closed transport");
                break;
            }
            Step::Shutdown => {
                if let Err(e) = transport.close().await {
                    debug!("Transport close failed: {}", e);
                }
                break;
            }
        }
    }

    state.send_replace(SessionState::Closed);
    let _ = events.send(SessionEvent::Closed);
}
