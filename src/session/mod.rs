//! Streaming session management
//!
//! This module provides the streaming core:
//! - `StreamSession`: one websocket per recording activity, with the
//!   open/shutdown state machine and inbound demultiplexing
//! - `Transport`/`Connector`: the seam between the session and the
//!   wire, with the tungstenite implementation
//! - `SessionController`: wires capture → session → reconciler and
//!   exposes start/stop/pause plus snapshot reads

mod config;
mod controller;
mod stream;
mod transport;

pub use config::{SessionConfig, SessionTiming};
pub use controller::{ActivityError, LifecycleEvent, SessionController, SessionStats};
pub use stream::{SessionError, SessionEvent, SessionHandle, SessionState, StreamSession};
pub use transport::{Connector, Transport, WsConnector, WsTransport};
