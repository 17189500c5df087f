//! Rotational rate from a quadrature encoder.
//!
//! The counter is drained every tick: read, then reset immediately. Each read
//! therefore represents pulses-per-tick, and the counter never runs long enough
//! to overflow. The order matters; resetting first would lose the pulses that
//! arrive between the reset and the read.

use crate::utils::{
    config::GovernorConfig,
    devices::EncoderSource,
    error::{Component, GovernorError, GovernorResult},
    math::conversion::calculate_rpm,
};

pub struct RotationSensor<Q> {
    encoder: Q,
    quad_factor: u32,
    pulses_per_rev: u32,
    last_pulses: i32,
    /// Set when a position read failed and the counter kept accumulating.
    stale: bool,
}

impl<Q> RotationSensor<Q>
where
    Q: EncoderSource,
{
    pub fn new(
        encoder: Q,
        config: &GovernorConfig,
    ) -> Self {
        Self {
            encoder,
            quad_factor: config.quad_factor,
            pulses_per_rev: config.pulses_per_revolution(),
            last_pulses: 0,
            stale: false,
        }
    }

    /// Zero the counter before the first tick so it only measures its own
    /// interval.
    pub fn open(&mut self) -> GovernorResult<()> {
        if self.quad_factor == 0 || self.pulses_per_rev == 0 {
            return Err(GovernorError::InvalidConfig {
                what: "quad_factor and pulses per revolution must be positive",
            });
        }
        self.encoder
            .reset()
            .map_err(|code| GovernorError::Startup {
                component: Component::RotationSensor,
                code,
            })?;
        self.stale = false;
        Ok(())
    }

    /// Reset the counter outside the tick cycle.
    pub fn reset_counter(&mut self) -> GovernorResult<()> {
        self.encoder
            .reset()
            .map_err(|code| GovernorError::ResetFailed { code })?;
        self.stale = false;
        Ok(())
    }

    /// Read-then-reset the counter and convert the delta into RPM.
    pub fn sample(
        &mut self,
        elapsed_ms: u32,
    ) -> GovernorResult<f32> {
        if elapsed_ms == 0 {
            return Err(GovernorError::InvalidConfig {
                what: "elapsed_ms must be positive",
            });
        }

        let pulses = match self.encoder.read_position() {
            Ok(p) => p,
            Err(code) => {
                // No reset happens here, so the next delta spans more than one
                // tick.
                self.stale = true;
                return Err(GovernorError::SensorUnavailable {
                    component: Component::RotationSensor,
                    code,
                });
            }
        };

        if let Err(code) = self.encoder.reset() {
            self.stale = true;
            return Err(GovernorError::ResetFailed { code });
        }

        if self.stale {
            tracing::warn!(
                pulses,
                "encoder delta spans a failed read; rate over-reported for this tick"
            );
            self.stale = false;
        }

        self.last_pulses = pulses;
        let rpm = calculate_rpm(pulses, elapsed_ms, self.quad_factor, self.pulses_per_rev);
        tracing::debug!(pulses, rpm, "encoder sample");
        Ok(rpm)
    }

    /// Pulse delta from the last successful sample.
    pub fn last_pulses(&self) -> i32 {
        self.last_pulses
    }

    /// `true` while the counter holds pulses from more than one tick because a
    /// read failed and no reset followed.
    pub fn counter_stale(&self) -> bool {
        self.stale
    }

    pub fn free(self) -> Q {
        self.encoder
    }
}
