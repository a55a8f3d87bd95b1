use ambient_scribe::PcmEncoder;

#[test]
fn test_chunks_into_fixed_frames_with_tail() {
    let mut encoder = PcmEncoder::new(16000, 1, 16000, 1600);

    let mut frames = Vec::new();
    let samples: Vec<i16> = (0..3300).map(|i| i as i16).collect();
    encoder.push_i16(&samples, &mut frames);

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].samples.len(), 1600);
    assert_eq!(frames[1].samples.len(), 1600);

    let tail = encoder.flush().expect("partial tail frame");
    assert_eq!(tail.samples.len(), 100);
    assert!(encoder.flush().is_none(), "flush drains completely");
}

#[test]
fn test_frame_timestamps_advance_with_emitted_audio() {
    let mut encoder = PcmEncoder::new(16000, 1, 16000, 1600);

    let mut frames = Vec::new();
    encoder.push_i16(&vec![0i16; 4000], &mut frames);

    assert_eq!(frames[0].timestamp_ms, 0);
    assert_eq!(frames[1].timestamp_ms, 100);

    let tail = encoder.flush().unwrap();
    assert_eq!(tail.timestamp_ms, 200);
}

#[test]
fn test_accumulates_across_pushes() {
    let mut encoder = PcmEncoder::new(16000, 1, 16000, 1600);

    let mut frames = Vec::new();
    encoder.push_i16(&vec![1i16; 1000], &mut frames);
    assert!(frames.is_empty());

    encoder.push_i16(&vec![1i16; 1000], &mut frames);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].samples.len(), 1600);
}

#[test]
fn test_decimates_integer_ratio() {
    // 48kHz → 16kHz: every third sample survives
    let mut encoder = PcmEncoder::new(48000, 1, 16000, 1600);

    let samples: Vec<i16> = (0..4800).map(|i| (i % 1000) as i16).collect();
    let mut frames = Vec::new();
    encoder.push_i16(&samples, &mut frames);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].samples.len(), 1600);
    assert_eq!(frames[0].samples[0], samples[0]);
    assert_eq!(frames[0].samples[1], samples[3]);
    assert_eq!(frames[0].samples[2], samples[6]);
}

#[test]
fn test_decimation_phase_survives_push_boundaries() {
    let mut encoder = PcmEncoder::new(48000, 1, 16000, 16);

    // 32 samples pushed as 31 + 1: the phase must carry over so the
    // output is identical to a single 32-sample push.
    let samples: Vec<i16> = (0..32).collect();
    let mut split_frames = Vec::new();
    encoder.push_i16(&samples[..31], &mut split_frames);
    encoder.push_i16(&samples[31..], &mut split_frames);
    let split_tail = encoder.flush().unwrap();

    let mut whole = PcmEncoder::new(48000, 1, 16000, 16);
    let mut whole_frames = Vec::new();
    whole.push_i16(&samples, &mut whole_frames);
    let whole_tail = whole.flush().unwrap();

    assert_eq!(split_tail.samples, whole_tail.samples);
}

#[test]
fn test_stereo_folds_to_mono_by_summing() {
    let mut encoder = PcmEncoder::new(16000, 2, 16000, 4);

    // Interleaved L/R pairs
    let samples: Vec<i16> = vec![100, 50, -10, -20, 1000, 2000, 0, 7];
    let mut frames = Vec::new();
    encoder.push_i16(&samples, &mut frames);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].samples, vec![150, -30, 3000, 7]);
}

#[test]
fn test_stereo_fold_clamps_overflow() {
    let mut encoder = PcmEncoder::new(16000, 2, 16000, 2);

    let samples: Vec<i16> = vec![i16::MAX, i16::MAX, i16::MIN, i16::MIN];
    let mut frames = Vec::new();
    encoder.push_i16(&samples, &mut frames);

    assert_eq!(frames[0].samples, vec![i16::MAX, i16::MIN]);
}

#[test]
fn test_f32_input_scales_to_i16() {
    let mut encoder = PcmEncoder::new(16000, 1, 16000, 4);

    let mut frames = Vec::new();
    encoder.push_f32(&[0.0, 1.0, -1.0, 0.5], &mut frames);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].samples[0], 0);
    assert_eq!(frames[0].samples[1], i16::MAX);
    assert_eq!(frames[0].samples[2], -i16::MAX);
    assert_eq!(frames[0].samples[3], i16::MAX / 2);
}

#[test]
fn test_interpolates_non_integer_ratio() {
    // 44.1kHz → 16kHz has no integer ratio; a second of input must
    // come out as (almost exactly) a second of output.
    let mut encoder = PcmEncoder::new(44100, 1, 16000, 1600);

    let samples: Vec<i16> = vec![500; 44100];
    let mut frames = Vec::new();
    encoder.push_i16(&samples, &mut frames);
    let tail_len = encoder.flush().map(|f| f.samples.len()).unwrap_or(0);

    let total: usize = frames.iter().map(|f| f.samples.len()).sum::<usize>() + tail_len;
    assert!(
        (15990..=16010).contains(&total),
        "expected ~16000 samples, got {total}"
    );

    // Constant input stays constant through interpolation
    for frame in &frames {
        assert!(frame.samples.iter().all(|&s| s == 500));
    }
}

#[test]
fn test_passthrough_preserves_content() {
    let mut encoder = PcmEncoder::new(16000, 1, 16000, 8);

    let samples: Vec<i16> = vec![3, 1, 4, 1, 5, 9, 2, 6];
    let mut frames = Vec::new();
    encoder.push_i16(&samples, &mut frames);

    assert_eq!(frames[0].samples, samples);
    assert_eq!(frames[0].sample_rate, 16000);
    assert_eq!(frames[0].channels, 1);
}
