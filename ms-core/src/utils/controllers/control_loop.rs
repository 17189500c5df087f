//! Fixed-period control loop for the motor governor.
//!
//! One tick reads a speed command, pushes it to the motor, samples the encoder
//! and yields the `(command, rate)` pair. Ticks run strictly one after another
//! on the caller's thread; every device call blocks until it returns.
//!
//! The loop moves through `Init -> Running -> Stopping -> Terminated`. Any error
//! from any component is tick-fatal: the loop makes a best-effort motor stop
//! and terminates. Retry policy, if wanted, belongs to whoever wraps the loop.

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embedded_hal::delay::DelayNs;
use serde::Serialize;

use crate::utils::{
    config::GovernorConfig,
    controllers::{encoder::RotationSensor, motor::MotorActuator, CommandSource},
    devices::{EncoderSource, MotorSink},
    error::{GovernorError, GovernorResult},
    math::conversion::NormalizedSpeed,
};

/// Signal backing a [`StopToken`].
pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Lifecycle of a [`ControlLoop`]. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Init,
    Running,
    Stopping,
    Terminated,
}

/// One loop iteration: what was commanded and what was measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlTick {
    pub index: u32,
    pub command: NormalizedSpeed,
    pub pulses: i32,
    pub rpm: f32,
}

impl ControlTick {
    pub fn speed_percent(&self) -> f32 {
        self.command.percent()
    }
}

/// Cancellation handle checked by the loop between ticks.
///
/// Copies share the same underlying signal, so one copy can be handed to the
/// loop and another kept by whoever decides to stop it.
#[derive(Clone, Copy)]
pub struct StopToken<'a> {
    signal: &'a StopSignal,
}

impl<'a> StopToken<'a> {
    pub fn new(signal: &'a StopSignal) -> Self {
        Self { signal }
    }

    pub fn request_stop(&self) {
        self.signal.signal(());
    }

    pub fn is_stop_requested(&self) -> bool {
        self.signal.signaled()
    }
}

pub struct ControlLoop<'a, S, Q, M> {
    command: S,
    sensor: RotationSensor<Q>,
    actuator: MotorActuator<M>,
    tick_ms: u32,
    max_ticks: Option<u32>,
    state: LoopState,
    ticks: u32,
    stop: Option<StopToken<'a>>,
}

impl<'a, S, Q, M> ControlLoop<'a, S, Q, M>
where
    S: CommandSource,
    Q: EncoderSource,
    M: MotorSink,
{
    /// Take ownership of the three device paths. Nothing is touched until
    /// [`start`](Self::start).
    pub fn new(
        command: S,
        encoder: Q,
        motor: M,
        config: &GovernorConfig,
    ) -> Self {
        Self {
            command,
            sensor: RotationSensor::new(encoder, config),
            actuator: MotorActuator::new(motor, config.limits),
            tick_ms: config.tick_ms,
            max_ticks: config.max_ticks,
            state: LoopState::Init,
            ticks: 0,
            stop: None,
        }
    }

    pub fn with_stop_token(
        mut self,
        token: StopToken<'a>,
    ) -> Self {
        self.stop = Some(token);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of ticks completed successfully.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn sensor(&self) -> &RotationSensor<Q> {
        &self.sensor
    }

    pub fn actuator(&self) -> &MotorActuator<M> {
        &self.actuator
    }

    pub fn command_source(&mut self) -> &mut S {
        &mut self.command
    }

    /// Open every component. On failure the loop goes straight to
    /// `Terminated` and the startup error is returned.
    pub fn start(&mut self) -> GovernorResult<()> {
        match self.state {
            LoopState::Init => {}
            LoopState::Running => return Ok(()),
            LoopState::Stopping | LoopState::Terminated => {
                return Err(GovernorError::LoopTerminated)
            }
        }

        let opened = if self.tick_ms == 0 {
            Err(GovernorError::InvalidConfig {
                what: "tick_ms must be positive",
            })
        } else {
            self.command
                .open()
                .and_then(|()| self.actuator.open())
                .and_then(|()| self.sensor.open())
        };

        match opened {
            Ok(()) => {
                self.state = LoopState::Running;
                tracing::info!(tick_ms = self.tick_ms, "control loop running");
                Ok(())
            }
            Err(error) => {
                self.state = LoopState::Terminated;
                tracing::error!(%error, component = %error.component(), "control loop failed to start");
                Err(error)
            }
        }
    }

    /// Run one tick. A loop still in `Init` is started first.
    ///
    /// On error the loop stops the motor (best effort) and terminates before
    /// the error is returned.
    #[tracing::instrument(level = "debug", skip(self), fields(tick = self.ticks))]
    pub fn tick(&mut self) -> GovernorResult<ControlTick> {
        match self.state {
            LoopState::Init => self.start()?,
            LoopState::Running => {}
            LoopState::Stopping | LoopState::Terminated => {
                return Err(GovernorError::LoopTerminated)
            }
        }

        match self.step() {
            Ok(tick) => {
                self.ticks = self.ticks.saturating_add(1);
                Ok(tick)
            }
            Err(error) => {
                tracing::error!(
                    %error,
                    component = %error.component(),
                    code = ?error.device_code(),
                    "tick failed"
                );
                if let Err(stop_error) = self.shutdown() {
                    tracing::warn!(%stop_error, "best-effort motor stop failed");
                }
                Err(error)
            }
        }
    }

    fn step(&mut self) -> GovernorResult<ControlTick> {
        let command = self.command.read_command()?;
        self.actuator.set_speed(command.get())?;
        let rpm = self.sensor.sample(self.tick_ms)?;
        Ok(ControlTick {
            index: self.ticks,
            command,
            pulses: self.sensor.last_pulses(),
            rpm,
        })
    }

    /// Tick until a failure, a stop request or `max_ticks`, waiting `tick_ms`
    /// between ticks. Each successful tick is passed to `report`.
    ///
    /// The wait is a plain blocking delay after each tick, so slow device
    /// calls make the loop drift rather than skip ticks. Returns the number of
    /// completed ticks.
    pub fn run<D, F>(
        &mut self,
        delay: &mut D,
        mut report: F,
    ) -> GovernorResult<u32>
    where
        D: DelayNs,
        F: FnMut(&ControlTick),
    {
        self.start()?;

        loop {
            if self.stop.is_some_and(|token| token.is_stop_requested()) {
                tracing::info!(ticks = self.ticks, "stop requested");
                self.shutdown()?;
                return Ok(self.ticks);
            }
            if self.max_ticks.is_some_and(|max| self.ticks >= max) {
                tracing::info!(ticks = self.ticks, "tick limit reached");
                self.shutdown()?;
                return Ok(self.ticks);
            }

            let tick = self.tick()?;
            report(&tick);
            delay.delay_ms(self.tick_ms);
        }
    }

    /// Operator stop: always commands the motor to stop, whatever the loop
    /// state, and terminates the loop.
    pub fn stop(&mut self) -> GovernorResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> GovernorResult<()> {
        self.state = LoopState::Stopping;
        let stopped = self.actuator.stop();
        self.state = LoopState::Terminated;
        tracing::info!(ticks = self.ticks, "control loop terminated");
        stopped
    }

    /// Release the device handles.
    pub fn into_parts(self) -> (S, Q, M) {
        (self.command, self.sensor.free(), self.actuator.free())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{
        config::MotorLimits,
        controllers::ManualCommand,
        devices::{DeviceCode, MotorMode, MotorRunState},
    };

    struct IdleEncoder;

    impl EncoderSource for IdleEncoder {
        fn read_position(&mut self) -> Result<i32, DeviceCode> {
            Ok(0)
        }

        fn reset(&mut self) -> Result<(), DeviceCode> {
            Ok(())
        }
    }

    struct IdleMotor;

    impl MotorSink for IdleMotor {
        fn get_state(&mut self) -> Result<MotorRunState, DeviceCode> {
            Ok(MotorRunState::Running)
        }

        fn set_mode(
            &mut self,
            _mode: MotorMode,
        ) -> Result<(), DeviceCode> {
            Ok(())
        }

        fn set_params(
            &mut self,
            _speed: NormalizedSpeed,
        ) -> Result<(), DeviceCode> {
            Ok(())
        }

        fn set_limits(
            &mut self,
            _limits: MotorLimits,
        ) -> Result<(), DeviceCode> {
            Ok(())
        }

        fn start(&mut self) -> Result<(), DeviceCode> {
            Ok(())
        }

        fn stop(&mut self) -> Result<(), DeviceCode> {
            Ok(())
        }
    }

    #[test]
    fn tick_counter_saturates() {
        let mut ctl = ControlLoop::new(
            ManualCommand::new(NormalizedSpeed::ZERO),
            IdleEncoder,
            IdleMotor,
            &GovernorConfig::default(),
        );
        ctl.start().unwrap();
        ctl.ticks = u32::MAX;

        let tick = ctl.tick().unwrap();
        assert_eq!(tick.index, u32::MAX);
        assert_eq!(ctl.ticks(), u32::MAX);
        assert_eq!(ctl.state(), LoopState::Running);
    }
}
