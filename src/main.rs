use std::error::Error;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rover_drive::config::{self, DriveConfig};
use rover_drive::hal::mock::MockHardware;
use rover_drive::motor::{Drivetrain, Motion, VehicleController};
use rover_drive::runtime;

#[derive(Parser)]
#[command(version, about = "Motion controller for a four-wheel skid-steer base")]
struct Cli {
    /// Motor driver binding
    #[arg(long, value_enum, default_value_t = Mode::Pwm, global = true)]
    mode: Mode,
    /// JSON file overriding the default pins/channels
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Drive simulated hardware (RUST_LOG=debug shows every write)
    #[arg(long, global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Direction-only motors on GPIO lines
    Gpio,
    /// Speed-scaled motors on a PCA9685
    Pwm,
}

#[derive(Clone, Copy, Subcommand)]
enum Command {
    /// Run every supported motion in turn
    Demo {
        #[arg(long, default_value_t = 1000)]
        step_ms: u64,
    },
    /// Run one motion, then stop
    Run {
        #[arg(value_enum)]
        motion: Motion,
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
    },
    /// Keyboard control
    Teleop,
    /// Validate the configuration and print it as JSON
    CheckConfig,
}

fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    if let Err(e) = run(Cli::parse()) {
        eprintln!("rover-drive error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => config::load(path)?,
        None => DriveConfig::default(),
    };

    if let Command::CheckConfig = cli.command {
        return check_config(&config);
    }

    if cli.dry_run {
        let hw = MockHardware::new();
        match cli.mode {
            Mode::Gpio => drive(VehicleController::with_gpio(hw.gpio(), &config.gpio)?, cli.command)?,
            Mode::Pwm => drive(VehicleController::with_pwm(hw.pwm_chip(), &config.pwm)?, cli.command)?,
        }
        info!("Dry run finished, {} simulated writes", hw.writes().len());
        return Ok(());
    }

    drive_hardware(cli.mode, &config, cli.command)
}

#[cfg(feature = "rpi")]
fn drive_hardware(mode: Mode, config: &DriveConfig, command: Command) -> Result<(), Box<dyn Error>> {
    use rover_drive::hal::rpi::{RpiGpio, open_pca9685};

    match mode {
        Mode::Gpio => drive(VehicleController::with_gpio(RpiGpio::open()?, &config.gpio)?, command),
        Mode::Pwm => drive(
            VehicleController::with_pwm(open_pca9685(&config.pwm)?, &config.pwm)?,
            command,
        ),
    }
}

#[cfg(not(feature = "rpi"))]
fn drive_hardware(_mode: Mode, _config: &DriveConfig, _command: Command) -> Result<(), Box<dyn Error>> {
    Err("built without hardware support: rebuild with `--features rpi` or pass --dry-run".into())
}

fn drive<D: Drivetrain>(car: VehicleController<D>, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Demo { step_ms } => runtime::run_demo(&car, Duration::from_millis(step_ms))?,
        Command::Run { motion, duration_ms } => {
            info!("{:?} for {}ms", motion, duration_ms);
            car.execute(motion)?;
            sleep(Duration::from_millis(duration_ms));
            car.stop_all()?;
        }
        Command::Teleop => runtime::run_teleop(&car)?,
        Command::CheckConfig => {}
    }

    car.shutdown()?;
    Ok(())
}

fn check_config(config: &DriveConfig) -> Result<(), Box<dyn Error>> {
    config.gpio.validate()?;
    config.pwm.validate()?;
    println!("{}", serde_json::to_string_pretty(config)?);
    info!("Configuration valid");
    Ok(())
}
