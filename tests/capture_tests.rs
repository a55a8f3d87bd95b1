use ambient_scribe::{CaptureConfig, CaptureError, CaptureSource, FileCapture, MicrophoneCapture};
use hound::{SampleFormat, WavSpec, WavWriter};

fn write_wav(path: &std::path::Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

#[tokio::test]
async fn test_microphone_stop_before_start_is_safe() {
    // No device is ever touched; teardown must be a quiet no-op.
    let mut capture = MicrophoneCapture::new(CaptureConfig::default());
    assert!(!capture.is_capturing());

    capture.stop().await;
    capture.stop().await;
    assert!(!capture.is_capturing());
}

#[tokio::test]
async fn test_file_capture_missing_file_is_device_unavailable() {
    let mut capture = FileCapture::new("does/not/exist.wav", CaptureConfig::default(), false);

    match capture.start().await {
        Err(CaptureError::DeviceUnavailable(_)) => {}
        other => panic!("Expected DeviceUnavailable, got {other:?}"),
    }

    // A failed start leaves nothing to tear down, and stop stays safe.
    capture.stop().await;
    assert!(!capture.is_capturing());
}

#[tokio::test]
async fn test_file_capture_streams_fixed_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.wav");

    // 16kHz mono, 4000 samples: two full 100ms frames + an 800 sample tail
    let samples: Vec<i16> = (0..4000).map(|i| (i % 128) as i16).collect();
    write_wav(&path, 16000, 1, &samples);

    let mut capture = FileCapture::new(&path, CaptureConfig::default(), false);
    let mut rx = capture.start().await.unwrap();
    assert!(capture.is_capturing());

    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        frames.push(frame);
    }

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].samples.len(), 1600);
    assert_eq!(frames[1].samples.len(), 1600);
    assert_eq!(frames[2].samples.len(), 800);

    assert_eq!(frames[0].timestamp_ms, 0);
    assert_eq!(frames[1].timestamp_ms, 100);
    assert_eq!(frames[2].timestamp_ms, 200);

    for frame in &frames {
        assert_eq!(frame.sample_rate, 16000);
        assert_eq!(frame.channels, 1);
    }

    // Content passed through untouched at the native rate.
    assert_eq!(frames[0].samples[..10], samples[..10]);

    capture.stop().await;
    assert!(!capture.is_capturing());
}

#[tokio::test]
async fn test_file_capture_downsamples_stereo_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");

    // 48kHz stereo, one second: decimation by 3 plus mono fold
    let samples: Vec<i16> = vec![100; 48000 * 2];
    write_wav(&path, 48000, 2, &samples);

    let mut capture = FileCapture::new(&path, CaptureConfig::default(), false);
    let mut rx = capture.start().await.unwrap();

    let mut total = 0usize;
    while let Some(frame) = rx.recv().await {
        assert_eq!(frame.sample_rate, 16000);
        assert_eq!(frame.channels, 1);
        // Stereo fold sums the two channels
        assert!(frame.samples.iter().all(|&s| s == 200));
        total += frame.samples.len();
    }

    // One second of audio at the target rate
    assert_eq!(total, 16000);

    capture.stop().await;
}

#[tokio::test]
async fn test_file_capture_stop_mid_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.wav");

    let samples: Vec<i16> = vec![0; 16000 * 10];
    write_wav(&path, 16000, 1, &samples);

    // Real-time pacing so the stream is still running when we stop it.
    let mut capture = FileCapture::new(&path, CaptureConfig::default(), true);
    let mut rx = capture.start().await.unwrap();

    let first = rx.recv().await;
    assert!(first.is_some());

    capture.stop().await;
    assert!(!capture.is_capturing());

    // Channel drains whatever was in flight, then closes.
    while rx.recv().await.is_some() {}
}
