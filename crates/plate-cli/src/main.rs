use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    age::{self, AgeArgs},
    calibrate::{self, CalibrateArgs},
    layout::{self, LayoutArgs},
    measure::{self, MeasureArgs},
    parse::{self, ParseArgs},
    sync::{self, SyncArgs},
};
use env_logger::Env;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "plate", about = "Plate reader calibration and culture synchronization")]
struct Cli {
    /// Log intermediate values.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a plate reader export into a well matrix.
    Parse(ParseArgs),
    /// Fit a calibration plate export and record it on the plate and plans.
    Calibrate(CalibrateArgs),
    /// Record experimental readings at a timepoint.
    Measure(MeasureArgs),
    /// Plan the synchronization of an input plate.
    Sync(SyncArgs),
    /// Lay out a fresh calibration plate.
    Layout(LayoutArgs),
    /// Check whether a calibration plate is still usable.
    Age(AgeArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
    match cli.command {
        Command::Parse(args) => parse::run(&args),
        Command::Calibrate(args) => calibrate::run(&args),
        Command::Measure(args) => measure::run(&args),
        Command::Sync(args) => sync::run(&args),
        Command::Layout(args) => layout::run(&args),
        Command::Age(args) => age::run(&args),
    }
}
