//! Module Exports
//!
//! This file exports the governor components composed by the control loop.
//!
//! - `adc`: speed command from an analog input, or a manual override.
//! - `encoder`: rotational rate from a quadrature pulse counter.
//! - `motor`: state-aware speed commands to the motor driver.
//! - `control_loop`: the fixed-period loop tying the three together.

pub mod adc;
pub mod control_loop;
pub mod encoder;
pub mod motor;

pub use adc::{ManualCommand, SpeedCommandSource};
pub use control_loop::{ControlLoop, ControlTick, LoopState, StopSignal, StopToken};
pub use encoder::RotationSensor;
pub use motor::MotorActuator;

use crate::utils::{error::GovernorResult, math::conversion::NormalizedSpeed};

/// Anything the control loop can pull a speed command from once per tick.
pub trait CommandSource {
    /// Check that the source is usable before the first tick.
    fn open(&mut self) -> GovernorResult<()> {
        Ok(())
    }

    fn read_command(&mut self) -> GovernorResult<NormalizedSpeed>;
}
