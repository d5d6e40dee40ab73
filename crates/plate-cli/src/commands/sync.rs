use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use csv::{ReaderBuilder, Writer};
use plate_cal::{load_od_corrections, VolumeBucket};
use plate_core::{ErrorInfo, Owner, PlateError, PlateShape, WellMatrix};
use plate_reader::parse_path;
use plate_sync::{
    record_actual_ods, sample_id_rows, synchronize, InputCorrection, SyncConfig, SyncInputs,
};
use serde::Deserialize;
use serde_json::json;

use super::{load_yaml, open_store, write_json};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// CSV with `well,sample_id` rows describing the input plate.
    #[arg(long)]
    pub samples: PathBuf,
    /// Plate reader OD export of the input plate.
    #[arg(long)]
    pub ods: PathBuf,
    /// Wells of the input plate. 24-well inputs need `controls: null` unless
    /// the GFP control well lies on them.
    #[arg(long, default_value_t = 96)]
    pub input_wells: usize,
    /// Optional YAML run configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// SQLite association store for calibrations and starting ODs.
    #[arg(long)]
    pub store: Option<PathBuf>,
    /// Plan carrying a LUDOX calibration to apply to the input ODs.
    #[arg(long, requires = "store", conflicts_with = "calibration_plate")]
    pub calibration_plan: Option<u64>,
    /// Calibration plate carrying a LUDOX calibration to apply.
    #[arg(long, requires = "store")]
    pub calibration_plate: Option<u64>,
    /// Volume the input plate was read at, µl.
    #[arg(long, default_value_t = 300)]
    pub reading_volume: u32,
    /// Output collection receiving the starting ODs.
    #[arg(long, requires = "store")]
    pub output_item: Option<u64>,
    /// Output directory for `plan.json`, `plan.csv` and `samples.json`.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    well: String,
    sample_id: u64,
}

fn load_samples(path: &Path, shape: PlateShape) -> Result<WellMatrix<u64>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut samples = WellMatrix::empty(shape);
    for row in reader.deserialize() {
        let row: SampleRow = row?;
        samples.set(row.well.as_str(), row.sample_id)?;
    }
    Ok(samples)
}

pub fn run(args: &SyncArgs) -> Result<(), Box<dyn Error>> {
    let config: SyncConfig = load_yaml(args.config.as_deref())?;
    let shape = PlateShape::from_well_count(args.input_wells)?;
    let samples = load_samples(&args.samples, shape)?;
    let parsed = parse_path(&args.ods)?;
    if parsed.matrix.shape() != shape {
        return Err(PlateError::OutOfBounds(
            ErrorInfo::new("sync.export_shape", "OD export does not match the input plate")
                .with_context("export", parsed.matrix.shape().to_string())
                .with_context("input", shape.to_string()),
        )
        .into());
    }

    let mut store = args.store.as_deref().map(open_store).transpose()?;
    let calibration_owner = args
        .calibration_plan
        .map(Owner::Plan)
        .or(args.calibration_plate.map(Owner::Item));
    let correction = match (calibration_owner, store.as_ref()) {
        (Some(owner), Some(store)) => {
            let correction = load_od_corrections(store, owner)?.ok_or_else(|| {
                PlateError::Store(
                    ErrorInfo::new("sync.no_calibration", "no OD calibration recorded")
                        .with_context("owner", owner.to_string()),
                )
            })?;
            Some(InputCorrection {
                correction,
                bucket: VolumeBucket::from_microliters(args.reading_volume)?,
            })
        }
        _ => None,
    };

    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &parsed.matrix,
            correction: correction.as_ref(),
        },
        &config,
    )?;

    if let (Some(item), Some(store)) = (args.output_item, store.as_mut()) {
        record_actual_ods(store, Owner::Item(item), &plan)?;
    }

    let hash = plan.plan_hash()?;
    write_json(
        &args.out.join("plan.json"),
        &json!({ "plan": plan, "plan_hash": hash }),
    )?;
    write_json(&args.out.join("samples.json"), &sample_id_rows(&plan)?)?;
    fs::create_dir_all(&args.out)?;
    let mut writer = Writer::from_path(args.out.join("plan.csv"))?;
    for row in plan.table()? {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!(
        "{} cultures x {} targets, {:.0} µl diluent total, {} warnings, {} wells out of range",
        plan.selected.len(),
        plan.targets.len(),
        plan.total_diluent_ul(),
        plan.warnings.len(),
        plan.out_of_range.len()
    );
    println!("plan {hash}");
    Ok(())
}
