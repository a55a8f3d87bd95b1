use async_trait::async_trait;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Samples as little-endian PCM bytes, the on-wire representation.
    pub fn pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// Configuration for a capture source
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (the encoder resamples if the device differs)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono)
    pub target_channels: u16,
    /// Duration of each emitted frame in milliseconds
    pub frame_duration_ms: u64,
    /// Capacity of the frame channel between capture and consumer
    pub channel_capacity: usize,
}

impl CaptureConfig {
    /// Number of target-rate samples per emitted frame.
    pub fn frame_samples(&self) -> usize {
        (self.target_sample_rate as u64 * self.frame_duration_ms / 1000) as usize
            * self.target_channels as usize
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // what the speech service expects
            target_channels: 1,        // Mono
            frame_duration_ms: 100,    // 100ms frames
            channel_capacity: 32,
        }
    }
}

/// Errors raised while acquiring or running a capture source
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),
    #[error("no usable input device: {0}")]
    DeviceUnavailable(String),
    #[error("capture stream error: {0}")]
    Stream(String),
}

/// Audio capture seam
///
/// Implementations:
/// - `MicrophoneCapture`: default input device via cpal
/// - `FileCapture`: WAV file replayed as a capture source (tests/batch)
#[async_trait]
pub trait CaptureSource: Send {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive encoded frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;

    /// Stop capturing audio
    ///
    /// Idempotent and safe to call even if `start` failed partway;
    /// every acquired resource gets its own best-effort release.
    async fn stop(&mut self);

    /// Check if the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}
