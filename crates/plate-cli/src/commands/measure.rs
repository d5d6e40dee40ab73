use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use plate_core::{ErrorInfo, Owner, PlateError, PlateShape};
use plate_reader::{parse_path, record_measurement, UploadKind};

use super::{open_store, upload_name};

#[derive(Args, Debug)]
pub struct MeasureArgs {
    /// Plate reader CSV export.
    #[arg(long)]
    pub csv: PathBuf,
    /// Upload name used to classify the export; defaults to the file name.
    #[arg(long)]
    pub name: Option<String>,
    /// SQLite association store.
    #[arg(long)]
    pub store: PathBuf,
    /// Item id of the measured collection.
    #[arg(long)]
    pub item: u64,
    /// Hours since the cultures were synchronized.
    #[arg(long)]
    pub timepoint: u32,
    /// Wells of the measured collection.
    #[arg(long, default_value_t = 96)]
    pub collection_wells: usize,
}

pub fn run(args: &MeasureArgs) -> Result<(), Box<dyn Error>> {
    let name = upload_name(&args.csv, args.name.as_deref());
    let method = match UploadKind::classify(&name)? {
        UploadKind::Measurement(method) => method,
        UploadKind::Calibration(_) => {
            return Err(PlateError::Serde(
                ErrorInfo::new("measure.upload", "calibration exports are recorded by `calibrate`")
                    .with_context("name", name.clone()),
            )
            .into())
        }
    };
    let collection = PlateShape::from_well_count(args.collection_wells)?;
    let parsed = parse_path(&args.csv)?;
    let mut store = open_store(&args.store)?;
    record_measurement(
        &mut store,
        Owner::Item(args.item),
        method,
        args.timepoint,
        &parsed.matrix,
        collection,
    )?;
    println!(
        "recorded {} {} readings on item {} at {} h ({} rows skipped)",
        parsed.matrix.filled(),
        method.description(),
        args.item,
        args.timepoint,
        parsed.skipped.len()
    );
    Ok(())
}
