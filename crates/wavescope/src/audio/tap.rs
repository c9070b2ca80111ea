//! Shared analysis tap
//!
//! `SignalTap` is the single point in the audio path that visualization
//! reads from. A [`TapSource`] pushes mono samples in from the playback
//! thread; renderer views pull byte buffers out. The tap outlives any
//! individual route, so swapping songs never tears the analysis point down.
//!
//! Pull semantics follow the usual analyser conventions: the time-domain
//! buffer is the most recent window scaled to bytes around a mid value of
//! 128, and the frequency-domain buffer is a Hann-windowed FFT magnitude
//! spectrum, exponentially smoothed across pulls and mapped from a fixed
//! decibel range onto 0..=255. Absence of signal reads as 128s and 0s
//! respectively, never as an error.

use std::num::NonZero;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rodio::Source;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::audio::TAP_FLUSH_SAMPLES;
use crate::config::viz::{FFT_SIZE, MAX_DECIBELS, MIN_DECIBELS, SMOOTHING, TAP_LENGTH};

struct TapState {
    /// Most recent `FFT_SIZE` mono samples, oldest at `write`
    ring: Vec<f32>,
    write: usize,
    /// Smoothed per-bin magnitudes carried across pulls
    smoothed: Vec<f32>,
    fft_planner: FftPlanner<f32>,
}

impl TapState {
    /// Run the FFT over the current window and fold the magnitudes into
    /// the smoothed spectrum
    fn analyze(&mut self) {
        let mut buf: Vec<Complex<f32>> = (0..FFT_SIZE)
            .map(|i| {
                let sample = self.ring[(self.write + i) % FFT_SIZE];
                // Hann window
                let window = 0.5
                    * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / FFT_SIZE as f32).cos());
                Complex::new(sample * window, 0.0)
            })
            .collect();

        let fft = self.fft_planner.plan_fft_forward(FFT_SIZE);
        fft.process(&mut buf);

        let norm = 1.0 / FFT_SIZE as f32;
        for (bin, slot) in self.smoothed.iter_mut().enumerate() {
            let mag = buf[bin].norm() * norm;
            *slot = SMOOTHING * *slot + (1.0 - SMOOTHING) * mag;
        }
    }
}

/// Shared analysis point with a fixed buffer length. Cloning hands out
/// another handle to the same tap.
#[derive(Clone)]
pub struct SignalTap {
    state: Arc<Mutex<TapState>>,
}

impl SignalTap {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TapState {
                ring: vec![0.0; FFT_SIZE],
                write: 0,
                smoothed: vec![0.0; TAP_LENGTH],
                fft_planner: FftPlanner::new(),
            })),
        }
    }

    /// Length of both pull buffers, fixed for the lifetime of the tap
    pub fn buffer_len(&self) -> usize {
        TAP_LENGTH
    }

    fn lock(&self) -> MutexGuard<'_, TapState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append mono samples to the analysis window
    pub fn push(&self, samples: &[f32]) {
        let mut guard = self.lock();
        let state = &mut *guard;
        for &sample in samples {
            state.ring[state.write] = sample;
            state.write = (state.write + 1) % FFT_SIZE;
        }
    }

    /// Fill `out` with the current time-domain bytes, oldest sample first.
    /// A silent tap yields the mid value 128.
    pub fn time_domain(&self, out: &mut [u8]) {
        let guard = self.lock();
        for (i, byte) in out.iter_mut().enumerate().take(FFT_SIZE) {
            let sample = guard.ring[(guard.write + i) % FFT_SIZE];
            *byte = ((128.0 * (1.0 + sample)) as i32).clamp(0, 255) as u8;
        }
    }

    /// Fill `out` with the current frequency-domain bytes. A silent tap
    /// yields zeros.
    pub fn frequency_domain(&self, out: &mut [u8]) {
        let mut guard = self.lock();
        guard.analyze();
        let scale = 255.0 / (MAX_DECIBELS - MIN_DECIBELS);
        for (bin, byte) in out.iter_mut().enumerate().take(TAP_LENGTH) {
            let db = 20.0 * guard.smoothed[bin].log10();
            *byte = ((scale * (db - MIN_DECIBELS)) as i32).clamp(0, 255) as u8;
        }
    }

    /// Drop all captured signal and smoothing history
    pub fn reset(&self) {
        let mut guard = self.lock();
        guard.ring.fill(0.0);
        guard.write = 0;
        guard.smoothed.fill(0.0);
    }
}

impl Default for SignalTap {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapper source that feeds every played sample into a [`SignalTap`]
/// while passing the signal through unchanged. Multi-channel frames are
/// folded to mono for analysis.
pub struct TapSource<S> {
    inner: S,
    tap: SignalTap,
    channels: NonZero<u16>,
    sample_rate: NonZero<u32>,
    pending: Vec<f32>,
    frame_acc: f32,
    frame_pos: u16,
}

impl<S> TapSource<S>
where
    S: Source<Item = f32>,
{
    pub fn new(source: S, tap: SignalTap) -> Self {
        let channels = source.channels();
        let sample_rate = source.sample_rate();
        Self {
            inner: source,
            tap,
            channels,
            sample_rate,
            pending: Vec::with_capacity(TAP_FLUSH_SAMPLES),
            frame_acc: 0.0,
            frame_pos: 0,
        }
    }
}

impl<S> Iterator for TapSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.inner.next()?;
        self.frame_acc += sample;
        self.frame_pos += 1;

        if self.frame_pos == self.channels.get() {
            self.pending.push(self.frame_acc / self.channels.get() as f32);
            self.frame_acc = 0.0;
            self.frame_pos = 0;

            if self.pending.len() >= TAP_FLUSH_SAMPLES {
                self.tap.push(&self.pending);
                self.pending.clear();
            }
        }

        Some(sample)
    }
}

impl<S> Source for TapSource<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> NonZero<u16> {
        self.channels
    }

    fn sample_rate(&self) -> NonZero<u32> {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), rodio::source::SeekError> {
        self.inner.try_seek(pos)
    }
}
