//! Simulated DC motor bench: potentiometer, geared motor and quadrature encoder
//! sharing one plant model.

use std::{cell::RefCell, time::Instant};

use ms_core::utils::{
    AnalogSource, DeviceCode, EncoderSource, GovernorConfig, MotorLimits, MotorMode,
    MotorRunState, MotorSink, NormalizedSpeed,
};

/// Output-shaft speed at full drive.
const FREE_RPM: f64 = 300.0;
/// Mechanical time constant of the motor (ms).
const TAU_MS: f64 = 150.0;
/// Potentiometer travel per conversion while sweeping.
const POT_STEP: i32 = 37;

pub struct SimPlant {
    limits: Option<MotorLimits>,
    mode: Option<MotorMode>,
    drive: f64,
    running: bool,
    shaft_rpm: f64,
    /// Encoder edges per output revolution (quadrature included).
    edges_per_rev: f64,
    counter: f64,
    last_update: Instant,
    pot: i32,
    pot_dir: i32,
    adc_max: i32,
    reads: u32,
    fault_after: Option<u32>,
}

impl SimPlant {
    pub fn new(
        config: &GovernorConfig,
        fault_after: Option<u32>,
    ) -> Self {
        Self {
            limits: None,
            mode: None,
            drive: 0.0,
            running: false,
            shaft_rpm: 0.0,
            edges_per_rev: f64::from(config.pulses_per_revolution())
                * f64::from(config.quad_factor),
            counter: 0.0,
            last_update: Instant::now(),
            pot: 0,
            pot_dir: 1,
            adc_max: config.adc_max,
            reads: 0,
            fault_after,
        }
    }

    /// Integrate shaft speed and encoder edges up to now.
    fn advance(&mut self) {
        let now = Instant::now();
        let dt_ms = now.duration_since(self.last_update).as_secs_f64() * 1000.0;
        self.last_update = now;

        let limit = self.limits.map_or(0.0, |l| f64::from(l.speed));
        let target = if self.running {
            self.drive.min(limit) * FREE_RPM
        } else {
            0.0
        };
        self.shaft_rpm += (target - self.shaft_rpm) * (dt_ms / (TAU_MS + dt_ms));
        self.counter += self.shaft_rpm / 60_000.0 * dt_ms * self.edges_per_rev;
    }

    fn sweep_pot(&mut self) -> i32 {
        self.pot += POT_STEP * self.pot_dir;
        if self.pot >= self.adc_max {
            self.pot = self.adc_max;
            self.pot_dir = -1;
        } else if self.pot <= 0 {
            self.pot = 0;
            self.pot_dir = 1;
        }
        self.pot
    }
}

pub struct SimAdc<'a>(pub &'a RefCell<SimPlant>);

impl AnalogSource for SimAdc<'_> {
    fn trigger(&mut self) -> Result<(), DeviceCode> {
        Ok(())
    }

    fn read(&mut self) -> Result<i32, DeviceCode> {
        Ok(self.0.borrow_mut().sweep_pot())
    }
}

pub struct SimEncoder<'a>(pub &'a RefCell<SimPlant>);

impl EncoderSource for SimEncoder<'_> {
    fn read_position(&mut self) -> Result<i32, DeviceCode> {
        let mut plant = self.0.borrow_mut();
        plant.reads += 1;
        if plant.fault_after.is_some_and(|n| plant.reads > n) {
            return Err(DeviceCode::EIO);
        }
        plant.advance();
        Ok(plant.counter.trunc() as i32)
    }

    fn reset(&mut self) -> Result<(), DeviceCode> {
        let mut plant = self.0.borrow_mut();
        plant.advance();
        // Partial edges have not happened yet; only whole counts are cleared.
        plant.counter = plant.counter.fract();
        Ok(())
    }
}

pub struct SimMotor<'a>(pub &'a RefCell<SimPlant>);

impl MotorSink for SimMotor<'_> {
    fn get_state(&mut self) -> Result<MotorRunState, DeviceCode> {
        let plant = self.0.borrow();
        Ok(if plant.running {
            MotorRunState::Running
        } else {
            MotorRunState::Stopped
        })
    }

    fn set_mode(
        &mut self,
        mode: MotorMode,
    ) -> Result<(), DeviceCode> {
        self.0.borrow_mut().mode = Some(mode);
        Ok(())
    }

    fn set_params(
        &mut self,
        speed: NormalizedSpeed,
    ) -> Result<(), DeviceCode> {
        let mut plant = self.0.borrow_mut();
        plant.advance();
        plant.drive = f64::from(speed.get());
        Ok(())
    }

    fn set_limits(
        &mut self,
        limits: MotorLimits,
    ) -> Result<(), DeviceCode> {
        self.0.borrow_mut().limits = Some(limits);
        Ok(())
    }

    fn start(&mut self) -> Result<(), DeviceCode> {
        let mut plant = self.0.borrow_mut();
        if plant.limits.is_none() || plant.mode.is_none() {
            return Err(DeviceCode::EINVAL);
        }
        plant.advance();
        plant.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceCode> {
        let mut plant = self.0.borrow_mut();
        plant.advance();
        plant.running = false;
        Ok(())
    }
}
