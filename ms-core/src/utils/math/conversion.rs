//! Signal conversions for the speed loop.
//!
//! Two pure mappings live here: a raw analog sample to a normalized speed
//! command, and an encoder pulse delta to a rotational rate.
//!
//! # Example
//! ```rust
//! use ms_core::utils::math::conversion::{adc_to_speed, calculate_rpm};
//! let speed = adc_to_speed(1300, 100, 2500);
//! assert!((speed.get() - 0.5).abs() < 1e-6);
//! let rpm = calculate_rpm(4 * 374, 60_000, 4, 374);
//! assert_eq!(rpm, 1.0);
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::error::{GovernorError, GovernorResult};

/// Motor command as a fraction of the maximum drive voltage, always in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct NormalizedSpeed(f32);

impl NormalizedSpeed {
    pub const ZERO: Self = Self(0.0);
    pub const FULL: Self = Self(1.0);

    /// Validate a raw value. Out-of-range values (and NaN) are rejected, never
    /// clamped.
    pub fn new(value: f32) -> GovernorResult<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(GovernorError::InvalidCommand { value })
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Command expressed in percent of full drive.
    pub fn percent(self) -> f32 {
        self.0 * 100.0
    }
}

impl TryFrom<f32> for NormalizedSpeed {
    type Error = GovernorError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NormalizedSpeed> for f32 {
    fn from(speed: NormalizedSpeed) -> Self {
        speed.0
    }
}

impl fmt::Display for NormalizedSpeed {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Map a raw analog sample onto [0, 1].
///
/// Samples at or below `low` give exactly 0.0, samples at or above `high`
/// give exactly 1.0, and samples in between interpolate linearly. The caller
/// guarantees `low < high`.
pub fn adc_to_speed(
    raw: i32,
    low: i32,
    high: i32,
) -> NormalizedSpeed {
    if raw <= low {
        NormalizedSpeed::ZERO
    } else if raw >= high {
        NormalizedSpeed::FULL
    } else {
        debug_assert!(low < high);
        // Widened so thresholds near the i32 limits cannot overflow.
        let span = (i64::from(high) - i64::from(low)) as f32;
        let offset = (i64::from(raw) - i64::from(low)) as f32;
        NormalizedSpeed((offset / span).clamp(0.0, 1.0))
    }
}

/// Convert a pulse delta measured over `elapsed_ms` into output-shaft RPM.
///
/// `rpm = (pulses / quad_factor) * (60000 / elapsed_ms) / pulses_per_rev`.
/// The sign follows `pulses`. `elapsed_ms`, `quad_factor` and
/// `pulses_per_rev` must be non-zero.
pub fn calculate_rpm(
    pulses: i32,
    elapsed_ms: u32,
    quad_factor: u32,
    pulses_per_rev: u32,
) -> f32 {
    let cycles = pulses as f32 / quad_factor as f32;
    cycles * (60_000.0 / elapsed_ms as f32) / pulses_per_rev as f32
}
