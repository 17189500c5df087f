//! Error taxonomy for the motor governor.
//!
//! Every failure surfaces to the control loop unchanged; the loop treats all of
//! them as tick-fatal. The variants only exist so reports can name the failing
//! component and the device code behind it.

use core::fmt;

use thiserror::Error;

use crate::utils::devices::DeviceCode;

/// Result type for governor operations.
pub type GovernorResult<T> = Result<T, GovernorError>;

/// Governor component that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    SpeedCommandSource,
    RotationSensor,
    MotorActuator,
    ControlLoop,
}

impl fmt::Display for Component {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Component::SpeedCommandSource => "speed command source",
            Component::RotationSensor => "rotation sensor",
            Component::MotorActuator => "motor actuator",
            Component::ControlLoop => "control loop",
        };
        f.write_str(name)
    }
}

/// Motor driver sub-operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorStep {
    GetState,
    SetMode,
    SetParams,
    SetLimits,
    Start,
    Stop,
}

impl fmt::Display for MotorStep {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            MotorStep::GetState => "get state",
            MotorStep::SetMode => "set mode",
            MotorStep::SetParams => "set params",
            MotorStep::SetLimits => "set limits",
            MotorStep::Start => "start",
            MotorStep::Stop => "stop",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GovernorError {
    /// Speed outside [0, 1]; rejected before any device call.
    #[error("invalid speed command {value} (must be between 0.0 and 1.0)")]
    InvalidCommand { value: f32 },

    #[error("{component} unavailable: device error {code}")]
    SensorUnavailable { component: Component, code: DeviceCode },

    #[error("analog conversion trigger timed out: device error {code}")]
    SensorTimeout { code: DeviceCode },

    /// The encoder counter was read but could not be zeroed; the next delta
    /// would be corrupt.
    #[error("encoder reset failed: device error {code}")]
    ResetFailed { code: DeviceCode },

    #[error("motor {step} failed: device error {code}")]
    DeviceError { step: MotorStep, code: DeviceCode },

    #[error("{component} failed to open: device error {code}")]
    Startup { component: Component, code: DeviceCode },

    #[error("invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("control loop already terminated")]
    LoopTerminated,
}

impl GovernorError {
    /// Component the failure is attributed to.
    pub fn component(&self) -> Component {
        match self {
            GovernorError::InvalidCommand { .. } | GovernorError::DeviceError { .. } => {
                Component::MotorActuator
            }
            GovernorError::SensorUnavailable { component, .. }
            | GovernorError::Startup { component, .. } => *component,
            GovernorError::SensorTimeout { .. } => Component::SpeedCommandSource,
            GovernorError::ResetFailed { .. } => Component::RotationSensor,
            GovernorError::InvalidConfig { .. } | GovernorError::LoopTerminated => {
                Component::ControlLoop
            }
        }
    }

    /// Underlying device code, if the failure came from a device call.
    pub fn device_code(&self) -> Option<DeviceCode> {
        match self {
            GovernorError::SensorUnavailable { code, .. }
            | GovernorError::SensorTimeout { code }
            | GovernorError::ResetFailed { code }
            | GovernorError::DeviceError { code, .. }
            | GovernorError::Startup { code, .. } => Some(*code),
            _ => None,
        }
    }
}
