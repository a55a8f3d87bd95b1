use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::capture::{AudioFrame, CaptureConfig, CaptureError, CaptureSource};
use super::encoder::PcmEncoder;

/// Microphone capture via the default cpal input device.
///
/// The cpal stream is not `Send`, so it lives on a dedicated worker
/// thread for the duration of the capture; frames flow back over a
/// bounded channel. A full channel drops the frame with a warning
/// rather than stalling the audio callback.
pub struct MicrophoneCapture {
    config: CaptureConfig,
    stop_flag: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
    capturing: bool,
}

impl MicrophoneCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            capturing: false,
        }
    }

    fn run_worker(
        config: CaptureConfig,
        stop_flag: Arc<AtomicBool>,
        frame_tx: mpsc::Sender<AudioFrame>,
        ready_tx: std::sync::mpsc::Sender<Result<(), CaptureError>>,
    ) {
        let encoder = Arc::new(Mutex::new(None::<PcmEncoder>));

        let stream = match Self::build_stream(
            &config,
            frame_tx.clone(),
            stop_flag.clone(),
            encoder.clone(),
        ) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(CaptureError::Stream(e.to_string())));
            return;
        }

        let _ = ready_tx.send(Ok(()));

        while !stop_flag.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(50));
        }

        // Stop flag is set: the callback no longer touches the encoder,
        // so the tail partial frame can be flushed out before the device
        // handle goes away.
        if let Ok(mut guard) = encoder.lock() {
            if let Some(tail) = guard.as_mut().and_then(|enc| enc.flush()) {
                deliver(&frame_tx, vec![tail]);
            }
        }

        drop(stream);
        info!("Microphone worker stopped");
    }

    fn build_stream(
        config: &CaptureConfig,
        frame_tx: mpsc::Sender<AudioFrame>,
        stop_flag: Arc<AtomicBool>,
        encoder: Arc<Mutex<Option<PcmEncoder>>>,
    ) -> Result<cpal::Stream, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            CaptureError::DeviceUnavailable("no default input device".to_string())
        })?;

        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| classify_device_error(e.to_string()))?;

        info!(
            "Opening input device '{}' ({}Hz, {} channels, {:?})",
            device_name,
            supported.sample_rate().0,
            supported.channels(),
            supported.sample_format()
        );

        if let Ok(mut guard) = encoder.lock() {
            *guard = Some(PcmEncoder::new(
                supported.sample_rate().0,
                supported.channels(),
                config.target_sample_rate,
                config.frame_samples(),
            ));
        }
        let stream_config: cpal::StreamConfig = supported.config();

        let err_fn = |err: cpal::StreamError| {
            error!("Capture stream error: {}", err);
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => {
                let stop = stop_flag.clone();
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if stop.load(Ordering::Acquire) {
                            return;
                        }
                        let mut frames = Vec::new();
                        if let Ok(mut guard) = encoder.lock() {
                            if let Some(enc) = guard.as_mut() {
                                enc.push_f32(data, &mut frames);
                            }
                        }
                        deliver(&frame_tx, frames);
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::I16 => {
                let stop = stop_flag.clone();
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if stop.load(Ordering::Acquire) {
                            return;
                        }
                        let mut frames = Vec::new();
                        if let Ok(mut guard) = encoder.lock() {
                            if let Some(enc) = guard.as_mut() {
                                enc.push_i16(data, &mut frames);
                            }
                        }
                        deliver(&frame_tx, frames);
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(CaptureError::Stream(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        };

        stream.map_err(classify_build_error)
    }
}

/// Frame admission into the bounded channel: never block the audio
/// callback, drop with a warning when the consumer falls behind.
fn deliver(frame_tx: &mpsc::Sender<AudioFrame>, frames: Vec<AudioFrame>) {
    for frame in frames {
        if let Err(e) = frame_tx.try_send(frame) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!("Frame channel full, dropping capture frame");
                }
                mpsc::error::TrySendError::Closed(_) => return,
            }
        }
    }
}

fn classify_build_error(e: cpal::BuildStreamError) -> CaptureError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("input device disappeared".to_string())
        }
        other => classify_device_error(other.to_string()),
    }
}

/// cpal reports OS permission refusals as backend-specific errors;
/// keyword-match so they surface as `PermissionDenied` to the caller.
fn classify_device_error(message: String) -> CaptureError {
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") || lowered.contains("access") {
        CaptureError::PermissionDenied(message)
    } else {
        CaptureError::DeviceUnavailable(message)
    }
}

#[async_trait]
impl CaptureSource for MicrophoneCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.capturing {
            return Err(CaptureError::Stream("already capturing".to_string()));
        }

        self.stop_flag.store(false, Ordering::Release);

        let (frame_tx, frame_rx) = mpsc::channel(self.config.channel_capacity);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        let config = self.config.clone();
        let stop_flag = self.stop_flag.clone();
        let worker = std::thread::spawn(move || {
            Self::run_worker(config, stop_flag, frame_tx, ready_tx);
        });

        // The worker reports device acquisition synchronously; wait for
        // it off the async executor.
        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| CaptureError::Stream(e.to_string()))?
            .map_err(|_| CaptureError::Stream("capture worker exited early".to_string()))?;

        match ready {
            Ok(()) => {
                self.worker = Some(worker);
                self.capturing = true;
                info!("Microphone capture started");
                Ok(frame_rx)
            }
            Err(e) => {
                // The worker has already bailed; reap it so a failed
                // start leaves nothing behind.
                let _ = worker.join();
                Err(e)
            }
        }
    }

    async fn stop(&mut self) {
        // Safe to call at any point, including before/after a failed
        // start. Each teardown step is independent and best-effort.
        self.stop_flag.store(true, Ordering::Release);

        if let Some(worker) = self.worker.take() {
            let joined = tokio::task::spawn_blocking(move || worker.join()).await;
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(_)) => error!("Capture worker panicked during teardown"),
                Err(e) => error!("Failed to join capture worker: {}", e),
            }
        }

        self.capturing = false;
        info!("Microphone capture stopped");
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "microphone"
    }
}
