use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hound::WavReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::capture::{AudioFrame, CaptureConfig, CaptureError, CaptureSource};
use super::encoder::PcmEncoder;

/// A WAV file replayed as a capture source.
///
/// Frames come out in the same shape the microphone produces, so the
/// rest of the pipeline cannot tell the difference. With `realtime`
/// set, emission is paced at one frame per frame duration; otherwise
/// the file drains as fast as the consumer reads.
pub struct FileCapture {
    path: PathBuf,
    config: CaptureConfig,
    realtime: bool,
    stop_flag: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    capturing: bool,
}

impl FileCapture {
    pub fn new(path: impl AsRef<Path>, config: CaptureConfig, realtime: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
            realtime,
            stop_flag: Arc::new(AtomicBool::new(false)),
            task: None,
            capturing: false,
        }
    }

    fn read_samples(path: &Path) -> Result<(Vec<i16>, u32, u16), CaptureError> {
        let reader = WavReader::open(path)
            .map_err(|e| CaptureError::DeviceUnavailable(format!("{}: {e}", path.display())))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CaptureError::Stream(format!("failed to read samples: {e}")))?;

        info!(
            "Audio file loaded: {} ({}Hz, {} channels, {} samples)",
            path.display(),
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok((samples, spec.sample_rate, spec.channels))
    }
}

/// Send one frame, backing off while the channel is full so a stop
/// request is never stuck behind a consumer that went away.
async fn deliver(
    frame_tx: &mpsc::Sender<AudioFrame>,
    stop_flag: &AtomicBool,
    frame: AudioFrame,
) -> bool {
    let mut pending = Some(frame);
    while let Some(frame) = pending.take() {
        match frame_tx
            .send_timeout(frame, Duration::from_millis(50))
            .await
        {
            Ok(()) => {}
            Err(mpsc::error::SendTimeoutError::Timeout(frame)) => {
                if stop_flag.load(Ordering::Acquire) {
                    return false;
                }
                pending = Some(frame);
            }
            Err(mpsc::error::SendTimeoutError::Closed(_)) => return false,
        }
    }
    true
}

#[async_trait]
impl CaptureSource for FileCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.capturing {
            return Err(CaptureError::Stream("already capturing".to_string()));
        }

        let (samples, sample_rate, channels) = Self::read_samples(&self.path)?;

        self.stop_flag.store(false, Ordering::Release);

        let (frame_tx, frame_rx) = mpsc::channel(self.config.channel_capacity);
        let stop_flag = self.stop_flag.clone();
        let config = self.config.clone();
        let realtime = self.realtime;

        let task = tokio::spawn(async move {
            let mut encoder = PcmEncoder::new(
                sample_rate,
                channels,
                config.target_sample_rate,
                config.frame_samples(),
            );

            // Feed the encoder in source-side slices matching one frame
            // duration, like a device callback would.
            let tick = (sample_rate as u64 * config.frame_duration_ms / 1000) as usize
                * channels.max(1) as usize;
            let pace = Duration::from_millis(config.frame_duration_ms);

            let mut frames = Vec::new();
            for slice in samples.chunks(tick.max(1)) {
                if stop_flag.load(Ordering::Acquire) {
                    break;
                }
                encoder.push_i16(slice, &mut frames);
                for frame in frames.drain(..) {
                    if !deliver(&frame_tx, &stop_flag, frame).await {
                        return;
                    }
                }
                if realtime {
                    tokio::time::sleep(pace).await;
                }
            }

            if let Some(tail) = encoder.flush() {
                if !deliver(&frame_tx, &stop_flag, tail).await {
                    return;
                }
            }

            info!("File capture drained");
        });

        self.task = Some(task);
        self.capturing = true;

        Ok(frame_rx)
    }

    async fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("File capture task failed during teardown: {}", e);
            }
        }

        self.capturing = false;
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "wav file"
    }
}
