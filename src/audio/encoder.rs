use tracing::warn;

use super::capture::AudioFrame;

/// Converts a continuous stream of device-native samples into fixed-size
/// 16 kHz mono 16-bit PCM frames.
///
/// Conversion order per push: interleaved → mono (channel sum with
/// clamp), then source rate → target rate (decimation when the ratio
/// divides evenly, linear interpolation otherwise). Converted samples
/// accumulate until a full frame is ready; `flush` drains the tail.
pub struct PcmEncoder {
    source_rate: u32,
    source_channels: u16,
    target_rate: u32,
    frame_samples: usize,
    pending: Vec<i16>,
    /// Fractional read position into the mono source stream, carried
    /// across pushes so interpolation stays continuous at buffer seams.
    cursor: f64,
    /// Decimation phase carried across pushes (integer-ratio path).
    decim_phase: usize,
    prev_sample: i16,
    primed: bool,
    emitted_samples: u64,
}

impl PcmEncoder {
    pub fn new(
        source_rate: u32,
        source_channels: u16,
        target_rate: u32,
        frame_samples: usize,
    ) -> Self {
        if source_rate < target_rate {
            warn!(
                "Capture rate {}Hz below target {}Hz; output will repeat samples",
                source_rate, target_rate
            );
        }

        Self {
            source_rate,
            source_channels,
            target_rate,
            frame_samples,
            pending: Vec::with_capacity(frame_samples * 2),
            cursor: 0.0,
            decim_phase: 0,
            prev_sample: 0,
            primed: false,
            emitted_samples: 0,
        }
    }

    /// Push interleaved f32 samples in [-1.0, 1.0], emitting any
    /// completed frames into `out`.
    pub fn push_f32(&mut self, samples: &[f32], out: &mut Vec<AudioFrame>) {
        let mono: Vec<i16> = samples
            .chunks(self.source_channels.max(1) as usize)
            .map(|chunk| {
                let sum: f32 = chunk.iter().sum();
                (sum.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
            })
            .collect();
        self.push_mono(&mono, out);
    }

    /// Push interleaved i16 samples, emitting any completed frames into `out`.
    pub fn push_i16(&mut self, samples: &[i16], out: &mut Vec<AudioFrame>) {
        let mono: Vec<i16> = samples
            .chunks(self.source_channels.max(1) as usize)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16
            })
            .collect();
        self.push_mono(&mono, out);
    }

    /// Emit the partial tail frame, if any. Called on capture stop.
    pub fn flush(&mut self) -> Option<AudioFrame> {
        if self.pending.is_empty() {
            return None;
        }
        let samples = std::mem::take(&mut self.pending);
        Some(self.make_frame(samples))
    }

    fn push_mono(&mut self, mono: &[i16], out: &mut Vec<AudioFrame>) {
        if mono.is_empty() {
            return;
        }

        if self.source_rate == self.target_rate {
            self.pending.extend_from_slice(mono);
        } else if self.source_rate % self.target_rate == 0 {
            // Decimate: take every Nth sample
            let ratio = (self.source_rate / self.target_rate) as usize;
            for &sample in mono {
                if self.decim_phase == 0 {
                    self.pending.push(sample);
                }
                self.decim_phase = (self.decim_phase + 1) % ratio;
            }
        } else {
            self.interpolate(mono);
        }

        self.drain_frames(out);
    }

    /// Linear interpolation for non-integer rate ratios (e.g. 44.1 kHz
    /// devices). `cursor` indexes the virtual mono stream where index 0
    /// is `prev_sample`, 1.. are this push's samples.
    fn interpolate(&mut self, mono: &[i16]) {
        if !self.primed {
            self.prev_sample = mono[0];
            self.primed = true;
        }

        let step = self.source_rate as f64 / self.target_rate as f64;
        // Window of available samples: prev_sample followed by `mono`.
        let len = mono.len() as f64;
        while self.cursor < len {
            let idx = self.cursor.floor();
            let frac = self.cursor - idx;
            let left = if idx < 1.0 {
                self.prev_sample
            } else {
                mono[idx as usize - 1]
            };
            let right = mono[idx as usize];
            let value = left as f64 + (right as f64 - left as f64) * frac;
            self.pending.push(value.round() as i16);
            self.cursor += step;
        }
        self.cursor -= len;
        self.prev_sample = mono[mono.len() - 1];
    }

    fn drain_frames(&mut self, out: &mut Vec<AudioFrame>) {
        while self.pending.len() >= self.frame_samples {
            let rest = self.pending.split_off(self.frame_samples);
            let samples = std::mem::replace(&mut self.pending, rest);
            out.push(self.make_frame(samples));
        }
    }

    fn make_frame(&mut self, samples: Vec<i16>) -> AudioFrame {
        let timestamp_ms = self.emitted_samples * 1000 / self.target_rate as u64;
        self.emitted_samples += samples.len() as u64;
        AudioFrame {
            samples,
            sample_rate: self.target_rate,
            channels: 1,
            timestamp_ms,
        }
    }
}
