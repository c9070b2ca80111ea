//! Per-frame buffer sampler
//!
//! `Sampler` owns the two byte arrays a renderer view reads from and
//! refills them from the tap once per tick. Sampling never fails: with no
//! live route the tap hands back its idle values, a 128 mid line for the
//! time domain and zero magnitudes for the frequency domain.

use crate::config::viz::TAP_LENGTH;

use super::tap::SignalTap;

pub struct Sampler {
    time_domain: Vec<u8>,
    frequency_domain: Vec<u8>,
}

impl Sampler {
    pub fn new() -> Self {
        Self {
            time_domain: vec![128; TAP_LENGTH],
            frequency_domain: vec![0; TAP_LENGTH],
        }
    }

    /// Refill both buffers from the tap
    pub fn sample(&mut self, tap: &SignalTap) {
        tap.time_domain(&mut self.time_domain);
        tap.frequency_domain(&mut self.frequency_domain);
    }

    /// Shared length of both buffers
    pub fn len(&self) -> usize {
        self.time_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_domain.is_empty()
    }

    pub fn time_domain(&self) -> &[u8] {
        &self.time_domain
    }

    pub fn frequency_domain(&self) -> &[u8] {
        &self.frequency_domain
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}
