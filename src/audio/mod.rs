pub mod capture;
pub mod encoder;
pub mod file;
pub mod microphone;

pub use capture::{AudioFrame, CaptureConfig, CaptureError, CaptureSource};
pub use encoder::PcmEncoder;
pub use file::FileCapture;
pub use microphone::MicrophoneCapture;
