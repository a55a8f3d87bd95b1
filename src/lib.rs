pub mod audio;
pub mod config;
pub mod note;
pub mod protocol;
pub mod reconcile;
pub mod session;

pub use audio::{
    AudioFrame, CaptureConfig, CaptureError, CaptureSource, FileCapture, MicrophoneCapture,
    PcmEncoder,
};
pub use config::Config;
pub use note::{Note, NoteClient, NoteError, NoteSection};
pub use protocol::{InboundEvent, ItemUpdate, ProtocolVariant, StreamOptions};
pub use reconcile::{IncrementalItem, ReconcileError, Reconciler};
pub use session::{
    ActivityError, Connector, LifecycleEvent, SessionConfig, SessionController, SessionError,
    SessionEvent, SessionState, SessionStats, SessionTiming, StreamSession, Transport, WsConnector,
};
