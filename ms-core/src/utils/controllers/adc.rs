//! Speed command sources.
//!
//! `SpeedCommandSource` turns a potentiometer reading into a normalized speed.
//! `ManualCommand` holds an operator-supplied speed that can be replaced between
//! ticks.

use crate::utils::{
    config::GovernorConfig,
    controllers::CommandSource,
    devices::AnalogSource,
    error::{Component, GovernorError, GovernorResult},
    math::conversion::{adc_to_speed, NormalizedSpeed},
};

/// Reads one analog sample per tick and maps it onto [0, 1].
///
/// No smoothing is applied; every read is independent of the previous one.
pub struct SpeedCommandSource<A> {
    adc: A,
    low: i32,
    high: i32,
    max: i32,
}

impl<A> SpeedCommandSource<A>
where
    A: AnalogSource,
{
    pub fn new(
        adc: A,
        config: &GovernorConfig,
    ) -> Self {
        Self {
            adc,
            low: config.adc_low,
            high: config.adc_high,
            max: config.adc_max,
        }
    }

    /// Trigger a conversion and read the raw sample.
    pub fn read_raw(&mut self) -> GovernorResult<i32> {
        self.adc
            .trigger()
            .map_err(|code| GovernorError::SensorTimeout { code })?;
        self.adc
            .read()
            .map_err(|code| GovernorError::SensorUnavailable {
                component: Component::SpeedCommandSource,
                code,
            })
    }

    /// Hand the analog device back.
    pub fn free(self) -> A {
        self.adc
    }
}

impl<A> CommandSource for SpeedCommandSource<A>
where
    A: AnalogSource,
{
    fn open(&mut self) -> GovernorResult<()> {
        if self.low >= self.high || self.low < 0 || self.high > self.max {
            return Err(GovernorError::InvalidConfig {
                what: "adc thresholds must satisfy 0 <= low < high <= max",
            });
        }
        Ok(())
    }

    fn read_command(&mut self) -> GovernorResult<NormalizedSpeed> {
        let raw = self.read_raw()?;
        let speed = adc_to_speed(raw, self.low, self.high);
        tracing::debug!(raw, speed = speed.get(), "adc sample");
        Ok(speed)
    }
}

/// Operator override: the same speed every tick until replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualCommand {
    speed: NormalizedSpeed,
}

impl ManualCommand {
    pub fn new(speed: NormalizedSpeed) -> Self {
        Self { speed }
    }

    /// Replace the held speed. Out-of-range values are rejected and the
    /// previous speed is kept.
    pub fn set(
        &mut self,
        value: f32,
    ) -> GovernorResult<()> {
        self.speed = NormalizedSpeed::new(value)?;
        tracing::info!(speed = value, "manual speed updated");
        Ok(())
    }

    pub fn speed(&self) -> NormalizedSpeed {
        self.speed
    }
}

impl CommandSource for ManualCommand {
    fn read_command(&mut self) -> GovernorResult<NormalizedSpeed> {
        Ok(self.speed)
    }
}
