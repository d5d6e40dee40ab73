use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use plate_cal::{
    blank_subtracted, fit_standard_curve, record_fluorescence, record_od, reference_ratios,
    CalibrationOpts, OdCorrection,
};
use plate_core::{ErrorInfo, Owner, PlateError};
use plate_reader::{parse_path, AssayMethod, UploadKind};
use serde_json::json;

use super::{load_yaml, open_store, upload_name, write_json};

#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Calibration plate CSV export.
    #[arg(long)]
    pub csv: PathBuf,
    /// Upload name used to classify the export; defaults to the file name.
    #[arg(long)]
    pub name: Option<String>,
    /// SQLite association store.
    #[arg(long)]
    pub store: PathBuf,
    /// Item id of the calibration plate.
    #[arg(long)]
    pub plate: u64,
    /// Plans receiving the calibration; repeatable.
    #[arg(long = "plan", value_name = "ID")]
    pub plans: Vec<u64>,
    /// Optional YAML calibration options.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output directory for `calibration.json`.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &CalibrateArgs) -> Result<(), Box<dyn Error>> {
    let name = upload_name(&args.csv, args.name.as_deref());
    let method = match UploadKind::classify(&name)? {
        UploadKind::Calibration(method) => method,
        UploadKind::Measurement(method) => {
            return Err(PlateError::Serde(
                ErrorInfo::new("calibrate.upload", "upload is not a calibration export")
                    .with_context("name", name.clone())
                    .with_context("method", method.as_str())
                    .with_hint("calibration uploads carry `cal` in their name"),
            )
            .into())
        }
    };
    let opts: CalibrationOpts = load_yaml(args.config.as_deref())?;
    let parsed = parse_path(&args.csv)?;
    let mut store = open_store(&args.store)?;
    let plate = Owner::Item(args.plate);
    let plans: Vec<Owner> = args.plans.iter().copied().map(Owner::Plan).collect();

    let report = match method {
        AssayMethod::CalGfp => {
            let curve = fit_standard_curve(&parsed.matrix, &opts)?;
            record_fluorescence(&mut store, plate, &plans, &curve)?;
            println!("{}", curve.trendline());
            json!({
                "method": method,
                "curve": curve,
                "trendline": curve.trendline(),
                "skipped": parsed.skipped,
            })
        }
        _ => {
            let correction = OdCorrection::from_plate(&parsed.matrix, &opts)?;
            record_od(&mut store, plate, &plans, &correction)?;
            println!("{:?} correction recorded on {plate}", correction.form);
            json!({
                "method": method,
                "correction": correction,
                "blank_subtracted": blank_subtracted(&parsed.matrix).ok(),
                "reference_ratio": reference_ratios(&parsed.matrix, opts.reference_od600).ok(),
                "skipped": parsed.skipped,
            })
        }
    };
    write_json(&args.out.join("calibration.json"), &report)
}
