//! Motor driver actuation.
//!
//! `MotorActuator` owns the motor sink and issues the mode/parameter/start
//! sequence for each speed command. The run-state is read fresh on every call,
//! so a start that failed on one tick is retried on the next.

use crate::utils::{
    config::MotorLimits,
    devices::{DeviceCode, MotorMode, MotorRunState, MotorSink},
    error::{Component, GovernorError, GovernorResult, MotorStep},
    math::conversion::NormalizedSpeed,
};

pub struct MotorActuator<M> {
    motor: M,
    limits: MotorLimits,
    last_state: Option<MotorRunState>,
}

impl<M> MotorActuator<M>
where
    M: MotorSink,
{
    pub fn new(
        motor: M,
        limits: MotorLimits,
    ) -> Self {
        Self {
            motor,
            limits,
            last_state: None,
        }
    }

    /// Install the driver limits. The driver will not start without them.
    pub fn open(&mut self) -> GovernorResult<()> {
        self.motor
            .set_limits(self.limits)
            .map_err(|code| GovernorError::Startup {
                component: Component::MotorActuator,
                code,
            })?;
        tracing::info!(limit = self.limits.speed, "motor limits set");
        Ok(())
    }

    /// Drive the motor at `value` (fraction of full drive).
    ///
    /// The range check happens before any device call. Start is skipped while
    /// the driver already reports `Running`. The first failing step aborts the
    /// rest and is returned.
    pub fn set_speed(
        &mut self,
        value: f32,
    ) -> GovernorResult<()> {
        let speed = NormalizedSpeed::new(value)?;

        let state = self
            .motor
            .get_state()
            .map_err(|code| step_error(MotorStep::GetState, code))?;
        self.last_state = Some(state);
        if state == MotorRunState::Fault {
            tracing::warn!("motor driver reports fault, attempting restart");
        }

        self.motor
            .set_mode(MotorMode::Speed)
            .map_err(|code| step_error(MotorStep::SetMode, code))?;
        self.motor
            .set_params(speed)
            .map_err(|code| step_error(MotorStep::SetParams, code))?;

        if state != MotorRunState::Running {
            self.motor
                .start()
                .map_err(|code| step_error(MotorStep::Start, code))?;
            tracing::info!(speed = speed.get(), "motor started");
        }

        Ok(())
    }

    /// Unconditionally stop the motor, whatever its current state.
    pub fn stop(&mut self) -> GovernorResult<()> {
        tracing::info!("stopping motor");
        self.motor
            .stop()
            .map_err(|code| step_error(MotorStep::Stop, code))
    }

    /// Run-state observed by the most recent `set_speed`.
    pub fn last_state(&self) -> Option<MotorRunState> {
        self.last_state
    }

    pub fn free(self) -> M {
        self.motor
    }
}

fn step_error(
    step: MotorStep,
    code: DeviceCode,
) -> GovernorError {
    GovernorError::DeviceError { step, code }
}
