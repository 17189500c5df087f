//! Tuning constants for the governor.
//!
//! Nothing here is derived at runtime: thresholds, encoder geometry and the tick
//! period are fixed for the lifetime of a `ControlLoop`.

use serde::{Deserialize, Serialize};

use crate::utils::error::{GovernorError, GovernorResult};

/// Limits handed to the motor driver before it is allowed to start.
///
/// A speed limit of 1.0 represents 100% of the drive voltage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorLimits {
    pub speed: f32,
}

impl Default for MotorLimits {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Raw samples at or below this map to 0.0.
    pub adc_low: i32,
    /// Raw samples at or above this map to 1.0.
    pub adc_high: i32,
    /// Largest sample the converter can produce (12-bit by default).
    pub adc_max: i32,
    pub tick_ms: u32,
    /// Encoder resolution before the gearbox.
    pub base_pulses_per_rev: u32,
    pub gear_ratio: u32,
    /// Edge multiplier of the decoder (4 for X4 decoding).
    pub quad_factor: u32,
    pub limits: MotorLimits,
    /// Stop after this many ticks. `None` runs until stopped or failed.
    pub max_ticks: Option<u32>,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            adc_low: 100,
            adc_high: 2500,
            adc_max: 4095,
            tick_ms: 100,
            base_pulses_per_rev: 11,
            gear_ratio: 34,
            quad_factor: 4,
            limits: MotorLimits::default(),
            max_ticks: None,
        }
    }
}

impl GovernorConfig {
    /// Output-shaft pulses per revolution (`base_pulses_per_rev * gear_ratio`).
    pub fn pulses_per_revolution(&self) -> u32 {
        self.base_pulses_per_rev.saturating_mul(self.gear_ratio)
    }

    pub fn validate(&self) -> GovernorResult<()> {
        if self.adc_low >= self.adc_high {
            return Err(GovernorError::InvalidConfig {
                what: "adc_low must be below adc_high",
            });
        }
        if self.adc_low < 0 || self.adc_high > self.adc_max {
            return Err(GovernorError::InvalidConfig {
                what: "adc thresholds must lie within 0..=adc_max",
            });
        }
        if self.tick_ms == 0 {
            return Err(GovernorError::InvalidConfig {
                what: "tick_ms must be positive",
            });
        }
        if self.base_pulses_per_rev == 0 || self.gear_ratio == 0 {
            return Err(GovernorError::InvalidConfig {
                what: "pulses per revolution must be positive",
            });
        }
        if self.quad_factor == 0 {
            return Err(GovernorError::InvalidConfig {
                what: "quad_factor must be positive",
            });
        }
        if !(self.limits.speed > 0.0 && self.limits.speed <= 1.0) {
            return Err(GovernorError::InvalidConfig {
                what: "speed limit must be in (0, 1]",
            });
        }
        Ok(())
    }
}
