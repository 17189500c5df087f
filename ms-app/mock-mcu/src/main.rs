mod sim;
mod speed_file;

use clap::Parser;
use core::cell::RefCell;
use embedded_hal_mock::eh1::delay::StdSleep;
use ms_core::utils::{
    CommandSource, ControlLoop, ControlTick, GovernorConfig, GovernorError, ManualCommand,
    MotorActuator, NormalizedSpeed, RotationSensor, SpeedCommandSource, StopSignal, StopToken,
};
use sim::{SimAdc, SimEncoder, SimMotor, SimPlant};
use speed_file::SpeedFile;
use static_cell::StaticCell;
use std::{fs, path::PathBuf, process::ExitCode};
use tracing::{error, info};

#[derive(Parser)]
#[clap(version = "1.0", about = "Motor speed governor on a simulated DC motor bench")]
struct Opts
{
    /// Fixed speed (0.0 to 1.0) instead of the potentiometer
    #[clap(short, long)]
    speed: Option<f32>,
    /// Stop the motor and exit
    #[clap(short = 'x', long, conflicts_with_all = ["speed", "reset_encoder"])]
    stop: bool,
    /// Reset the encoder counter and exit
    #[clap(short, long)]
    reset_encoder: bool,
    /// File polled every tick for a new speed, or `stop`
    #[clap(long)]
    speed_file: Option<PathBuf>,
    /// Governor configuration (JSON)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Tick period in milliseconds
    #[clap(long)]
    tick_ms: Option<u32>,
    /// Stop after this many ticks
    #[clap(long)]
    ticks: Option<u32>,
    /// Fail encoder reads after this many samples
    #[clap(long)]
    fault_after: Option<u32>,
    /// Print each tick as a JSON line
    #[clap(long)]
    json: bool,
}

static PLANT: StaticCell<RefCell<SimPlant>> = StaticCell::new();
static STOP: StopSignal = StopSignal::new();

fn load_config(opts: &Opts) -> Result<GovernorConfig, String> {
    let mut cfg = match &opts.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            serde_json::from_str::<GovernorConfig>(&text)
                .map_err(|e| format!("cannot parse {}: {e}", path.display()))?
        }
        None => GovernorConfig::default(),
    };
    if let Some(tick_ms) = opts.tick_ms {
        cfg.tick_ms = tick_ms;
    }
    if opts.ticks.is_some() {
        cfg.max_ticks = opts.ticks;
    }
    cfg.validate().map_err(|e| e.to_string())?;
    Ok(cfg)
}

fn report(
    tick: &ControlTick,
    json: bool,
) {
    if json {
        match serde_json::to_string(tick) {
            Ok(line) => println!("{line}"),
            Err(error) => error!(%error, "failed to serialize tick"),
        }
    } else {
        println!(
            "speed: {:5.1} %  pulses: {:6}  rpm: {:8.2}",
            tick.speed_percent(),
            tick.pulses,
            tick.rpm
        );
    }
}

fn govern<S: CommandSource>(
    source: S,
    plant: &RefCell<SimPlant>,
    cfg: &GovernorConfig,
    json: bool,
) -> Result<u32, GovernorError> {
    let mut ctl = ControlLoop::new(source, SimEncoder(plant), SimMotor(plant), cfg)
        .with_stop_token(StopToken::new(&STOP));
    info!(tick_ms = cfg.tick_ms, "governor running");
    ctl.run(&mut StdSleep::new(), |tick| report(tick, json))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let cfg = match load_config(&opts) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let plant = &*PLANT.init(RefCell::new(SimPlant::new(&cfg, opts.fault_after)));

    let result = if opts.stop {
        let mut motor = MotorActuator::new(SimMotor(plant), cfg.limits);
        motor.open().and_then(|()| motor.stop()).map(|()| 0)
    } else if opts.reset_encoder {
        RotationSensor::new(SimEncoder(plant), &cfg)
            .reset_counter()
            .map(|()| 0)
    } else if let Some(path) = &opts.speed_file {
        let initial = opts.speed.unwrap_or(0.0);
        match NormalizedSpeed::new(initial) {
            Ok(initial) => match SpeedFile::create(path, initial, StopToken::new(&STOP)) {
                Ok(file) => {
                    info!(path = %path.display(), "write a speed or `stop` to this file");
                    govern(file, plant, &cfg, opts.json)
                }
                Err(e) => {
                    error!(path = %path.display(), "failed to create speed file: {e}");
                    return ExitCode::FAILURE;
                }
            },
            Err(e) => Err(e),
        }
    } else if let Some(speed) = opts.speed {
        NormalizedSpeed::new(speed)
            .and_then(|s| govern(ManualCommand::new(s), plant, &cfg, opts.json))
    } else {
        govern(SpeedCommandSource::new(SimAdc(plant), &cfg), plant, &cfg, opts.json)
    };

    match result {
        Ok(ticks) => {
            info!(ticks, "done");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(
                %error,
                component = %error.component(),
                code = ?error.device_code(),
                "motor governor failed"
            );
            ExitCode::FAILURE
        }
    }
}
