//! Math utilities for the motor governor.
//!
//! This module provides the ADC-to-speed map and the pulse-to-RPM conversion.

pub mod conversion;
