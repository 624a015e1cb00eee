//! Software volume with logarithmic scaling
//!
//! Level 0-100 maps to -60 dB .. 0 dB, with 0 meaning silence. The gain lives
//! in a shared cell so the output stage can read it from its own thread.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tapedeck_core::VolumeControl;

/// Highest level
pub const MAX_LEVEL: u8 = 100;

/// Read side of a [`SoftwareVolume`]
#[derive(Debug, Clone)]
pub struct SharedGain {
    bits: Arc<AtomicU32>,
}

impl SharedGain {
    fn new(gain: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(gain.to_bits())),
        }
    }

    /// Current linear gain
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    fn set(&self, gain: f32) {
        self.bits.store(gain.to_bits(), Ordering::Relaxed);
    }

    /// Scale 16-bit samples in place
    pub fn apply_i16(&self, samples: &mut [i16]) {
        let gain = self.get();
        if gain == 0.0 {
            samples.fill(0);
        } else if (gain - 1.0).abs() > f32::EPSILON {
            for sample in samples.iter_mut() {
                *sample = (f32::from(*sample) * gain).round() as i16;
            }
        }
    }

    /// Scale float samples in place
    pub fn apply_f32(&self, samples: &mut [f32]) {
        let gain = self.get();
        if (gain - 1.0).abs() > f32::EPSILON {
            for sample in samples.iter_mut() {
                *sample *= gain;
            }
        }
    }
}

/// Volume collaborator applying gain in software
#[derive(Debug, Clone)]
pub struct SoftwareVolume {
    level: u8,
    gain: SharedGain,
}

impl SoftwareVolume {
    /// Create at `level` (clamped to 0-100)
    pub fn new(level: u8) -> Self {
        let level = level.min(MAX_LEVEL);
        Self {
            level,
            gain: SharedGain::new(Self::linear_gain(level)),
        }
    }

    /// Current level
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Handle for the output stage
    pub fn gain(&self) -> SharedGain {
        self.gain.clone()
    }

    /// Gain for `level`: `10^((level - 100) * 0.6 / 20)`, 0 at level 0
    ///
    /// - 0   -> silence
    /// - 50  -> -30 dB
    /// - 100 -> unity
    pub fn linear_gain(level: u8) -> f32 {
        if level == 0 {
            return 0.0;
        }
        let db = (f32::from(level.min(MAX_LEVEL)) - 100.0) * 0.6;
        10.0_f32.powf(db / 20.0)
    }
}

impl Default for SoftwareVolume {
    fn default() -> Self {
        Self::new(50)
    }
}

impl VolumeControl for SoftwareVolume {
    fn set_volume(&mut self, level: u8) -> tapedeck_core::Result<()> {
        self.level = level.min(MAX_LEVEL);
        self.gain.set(Self::linear_gain(self.level));
        tracing::debug!(level = self.level, gain = self.gain.get(), "Volume set");
        Ok(())
    }
}
