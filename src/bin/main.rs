#[macro_use]
extern crate slog;

use chip8vm::{Config, Emulator, KeyState, Step, TimerMode};
use clap::Parser;
use slog::Logger;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Run a CHIP-8 ROM without a window. No keys are ever pressed; the final
/// screen is printed to stdout
#[derive(Parser, Debug)]
#[command(name = "chip8vm", version, about, long_about = None)]
struct Args {
    /// The ROM image to run
    rom: PathBuf,

    /// JSON file with interpreter settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the random number generator
    #[arg(short, long)]
    seed: Option<u64>,

    /// Instructions executed per second
    #[arg(long, default_value_t = 500)]
    hz: u32,

    /// Stop after this many instructions. 0 runs until the program halts
    #[arg(short, long, default_value_t = 0)]
    ticks: u64,

    /// One of trace, debug, info, warning, error, critical
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn build_logger(level: &str) -> Result<Logger, Box<dyn Error>> {
    let severity: Severity = level.parse()?;

    let mut builder = TerminalLoggerBuilder::new();
    builder.level(severity);
    builder.destination(Destination::Stderr);
    Ok(builder.build()?)
}

fn run(args: Args) -> Result<bool, Box<dyn Error>> {
    let logger = build_logger(&args.log_level)?;

    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    config.timers = TimerMode::Clocked { hz: 60 };

    let mut emulator = Emulator::with_config(config, Some(logger.new(o!("rom" => args.rom.display().to_string()))));
    emulator.load_game_file(&args.rom)?;

    let keyboard = KeyState::new();
    let period = Duration::from_secs(1) / args.hz.max(1);
    let mut executed = 0u64;
    let mut faulted = false;

    while args.ticks == 0 || executed < args.ticks {
        let started = Instant::now();

        match emulator.cycle(&keyboard) {
            Ok(Step::Halted) => break,
            Ok(Step::WaitingForKey) => {
                warn!(logger, "program is waiting for a key, nothing will ever be pressed");
                break;
            }
            Ok(Step::Executed(_)) => executed += 1,
            Err(err) => {
                error!(logger, "program faulted"; "error" => %err, "executed" => executed);
                faulted = true;
                break;
            }
        }

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            sleep(rest);
        }
    }

    info!(logger, "stopped"; "executed" => executed, "pc" => format!("{:#05X}", emulator.pc()));
    print!("{}", emulator.graphics());

    Ok(!faulted)
}

fn main() {
    let args = Args::parse();

    match run(args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("chip8vm: {}", err);
            process::exit(2);
        }
    }
}
