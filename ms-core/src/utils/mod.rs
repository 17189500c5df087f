//! Utility re-exports for the motor sensing governor.
//!
//! - `config`: tuning constants for the ADC map, encoder and tick period
//! - `controllers`: the speed command source, rotation sensor, motor actuator
//!   and the control loop that composes them
//! - `devices`: narrow capability traits implemented by device adapters
//! - `error`: the governor's error taxonomy
//! - `math`: ADC-to-speed mapping and pulse-to-RPM conversion

pub mod config;
pub mod controllers;
pub mod devices;
pub mod error;
pub mod math;

pub use config::{GovernorConfig, MotorLimits};
pub use controllers::{
    CommandSource, ControlLoop, ControlTick, LoopState, ManualCommand, MotorActuator,
    RotationSensor, SpeedCommandSource, StopSignal, StopToken,
};
pub use devices::{AnalogSource, DeviceCode, EncoderSource, MotorMode, MotorRunState, MotorSink};
pub use error::{Component, GovernorError, GovernorResult, MotorStep};
pub use math::conversion::{adc_to_speed, calculate_rpm, NormalizedSpeed};
