//! Device capability traits for the motor governor.
//!
//! Each physical device is reached through one narrow trait. Concrete adapters
//! (a NuttX character device, a simulated plant, a test fake) implement these,
//! and the governor components own exactly one adapter each.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::{config::MotorLimits, math::conversion::NormalizedSpeed};

/// Errno-style code reported by a device call (negative on failure, like an
/// ioctl return value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceCode(pub i32);

impl DeviceCode {
    /// I/O error.
    pub const EIO: Self = Self(-5);
    /// Device or resource busy.
    pub const EBUSY: Self = Self(-16);
    /// No such device.
    pub const ENODEV: Self = Self(-19);
    /// Invalid argument.
    pub const EINVAL: Self = Self(-22);
    /// Timer expired.
    pub const ETIMEDOUT: Self = Self(-110);
}

impl fmt::Display for DeviceCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run-state reported by the motor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorRunState {
    Stopped,
    Running,
    Fault,
}

/// Operating mode of the motor driver. Only speed mode is used by the governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorMode {
    Speed,
}

/// Analog input that produces one raw sample per triggered conversion.
pub trait AnalogSource {
    /// Start a conversion.
    fn trigger(&mut self) -> Result<(), DeviceCode>;

    /// Read the result of the last conversion.
    fn read(&mut self) -> Result<i32, DeviceCode>;
}

/// Free-running quadrature pulse counter.
pub trait EncoderSource {
    /// Signed pulse count accumulated since the last reset.
    fn read_position(&mut self) -> Result<i32, DeviceCode>;

    /// Zero the counter.
    fn reset(&mut self) -> Result<(), DeviceCode>;
}

/// Motor driver sink.
pub trait MotorSink {
    fn get_state(&mut self) -> Result<MotorRunState, DeviceCode>;

    fn set_mode(
        &mut self,
        mode: MotorMode,
    ) -> Result<(), DeviceCode>;

    fn set_params(
        &mut self,
        speed: NormalizedSpeed,
    ) -> Result<(), DeviceCode>;

    /// Install the driver limits. Drivers refuse to start until one is set.
    fn set_limits(
        &mut self,
        limits: MotorLimits,
    ) -> Result<(), DeviceCode>;

    fn start(&mut self) -> Result<(), DeviceCode>;

    fn stop(&mut self) -> Result<(), DeviceCode>;
}
