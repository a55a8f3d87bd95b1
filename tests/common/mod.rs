// Shared mocks for the integration tests: an in-memory transport the
// tests drive from the peer side, and a capture source that replays a
// scripted frame list.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ambient_scribe::{
    AudioFrame, CaptureError, CaptureSource, Connector, ProtocolVariant, SessionError, Transport,
};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Peer-side controls for one mock transport
pub struct PeerSide {
    /// Everything the session sends
    pub sent_rx: mpsc::UnboundedReceiver<String>,
    /// Feed inbound messages; drop to simulate the peer closing
    pub inbound_tx: mpsc::UnboundedSender<Result<String, SessionError>>,
    /// Set once the session called close() on the transport
    pub closed: Arc<AtomicBool>,
}

pub struct MockTransport {
    sent_tx: mpsc::UnboundedSender<String>,
    inbound_rx: mpsc::UnboundedReceiver<Result<String, SessionError>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, text: String) -> Result<(), SessionError> {
        self.sent_tx
            .send(text)
            .map_err(|_| SessionError::Transport("peer gone".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        self.inbound_rx.recv().await
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub enum ConnectMode {
    /// Hand out the prepared transport
    Connect,
    /// Never resolve (for connect-timeout tests)
    Hang,
    /// Fail immediately
    Refuse,
}

pub struct MockConnector {
    mode: ConnectMode,
    transport: Mutex<Option<MockTransport>>,
}

impl MockConnector {
    /// A connector that yields one working mock transport, plus the
    /// peer-side controls for it.
    pub fn connecting() -> (Self, PeerSide) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let transport = MockTransport {
            sent_tx,
            inbound_rx,
            closed: closed.clone(),
        };
        let connector = Self {
            mode: ConnectMode::Connect,
            transport: Mutex::new(Some(transport)),
        };
        let peer = PeerSide {
            sent_rx,
            inbound_tx,
            closed,
        };
        (connector, peer)
    }

    pub fn hanging() -> Self {
        Self {
            mode: ConnectMode::Hang,
            transport: Mutex::new(None),
        }
    }

    pub fn refusing() -> Self {
        Self {
            mode: ConnectMode::Refuse,
            transport: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _variant: ProtocolVariant) -> Result<Box<dyn Transport>, SessionError> {
        match self.mode {
            ConnectMode::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
            ConnectMode::Refuse => Err(SessionError::Transport("connection refused".to_string())),
            ConnectMode::Connect => {
                let transport = self
                    .transport
                    .lock()
                    .expect("transport lock")
                    .take()
                    .expect("mock transport already taken");
                Ok(Box::new(transport))
            }
        }
    }
}

/// Capture source replaying a fixed frame list; the channel stays open
/// until `stop` so the pipeline shuts down the way the microphone does.
pub struct ScriptedCapture {
    frames: Vec<AudioFrame>,
    hold: Option<mpsc::Sender<AudioFrame>>,
    capturing: bool,
}

impl ScriptedCapture {
    pub fn new(frames: Vec<AudioFrame>) -> Self {
        Self {
            frames,
            hold: None,
            capturing: false,
        }
    }
}

#[async_trait]
impl CaptureSource for ScriptedCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        let (tx, rx) = mpsc::channel(self.frames.len().max(1));
        for frame in self.frames.drain(..) {
            let _ = tx.send(frame).await;
        }
        self.hold = Some(tx);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) {
        self.hold = None;
        self.capturing = false;
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A frame of silence at 16 kHz mono
pub fn silent_frame(samples: usize, timestamp_ms: u64) -> AudioFrame {
    AudioFrame {
        samples: vec![0i16; samples],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}
