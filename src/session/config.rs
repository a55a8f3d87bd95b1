use std::time::Duration;

use crate::protocol::StreamOptions;

/// Bounds on the session's two finite waits
#[derive(Debug, Clone)]
pub struct SessionTiming {
    /// How long to wait for the transport to come up before failing
    pub connect_timeout: Duration,
    /// How long to wait for the peer to close after the end message
    pub close_wait: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            close_wait: Duration::from_secs(5),
        }
    }
}

/// Configuration for one recording activity
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique activity identifier (e.g. "activity-<uuid>")
    pub activity_id: String,

    /// Stream format and locale sent in the opening configuration
    pub options: StreamOptions,

    /// Connect/close wait bounds
    pub timing: SessionTiming,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            activity_id: format!("activity-{}", uuid::Uuid::new_v4()),
            options: StreamOptions::default(),
            timing: SessionTiming::default(),
        }
    }
}
