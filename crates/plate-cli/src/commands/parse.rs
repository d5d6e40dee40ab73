use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use plate_core::NO_DATA;
use plate_reader::parse_path;
use serde_json::json;

use super::write_json;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Plate reader CSV export.
    #[arg(long)]
    pub csv: PathBuf,
    /// Output directory for `plate.json`.
    #[arg(long)]
    pub out: PathBuf,
}

/// Parses one export and writes its readings with empty wells as -1.
pub fn run(args: &ParseArgs) -> Result<(), Box<dyn Error>> {
    let parsed = parse_path(&args.csv)?;
    let payload = json!({
        "shape": parsed.matrix.shape(),
        "filled": parsed.matrix.filled(),
        "rows": parsed.matrix.to_rows(NO_DATA),
        "skipped": parsed.skipped,
    });
    write_json(&args.out.join("plate.json"), &payload)?;
    println!(
        "{} readings on a {} plate, {} rows skipped",
        parsed.matrix.filled(),
        parsed.matrix.shape(),
        parsed.skipped.len()
    );
    Ok(())
}
