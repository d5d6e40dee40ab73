use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use csv::Writer;
use plate_cal::{
    calibration_layout, loading_volume_ul, parse_created, pbs_required_ml, pbs_wells,
    CalReagent, DATE_FORMAT, FLUORESCEIN_SEED_UL, PBS_VOLUME_UL,
};
use plate_core::{AssociationStore, Owner};
use serde::Serialize;
use serde_json::json;

use super::open_store;

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// SQLite association store receiving `date_created`.
    #[arg(long, requires = "plate")]
    pub store: Option<PathBuf>,
    /// Item id of the new calibration plate.
    #[arg(long)]
    pub plate: Option<u64>,
    /// Creation date as MMDDYYYY; defaults to today.
    #[arg(long)]
    pub date: Option<String>,
    /// Output directory for `layout.csv`.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Serialize)]
struct LayoutRow {
    well: String,
    reagent: CalReagent,
    reagent_ul: u32,
    pbs_ul: u32,
}

pub fn run(args: &LayoutArgs) -> Result<(), Box<dyn Error>> {
    let date = match &args.date {
        Some(date) => parse_created(date)?.format(DATE_FORMAT).to_string(),
        None => Local::now().date_naive().format(DATE_FORMAT).to_string(),
    };
    let layout = calibration_layout()?;
    let pbs = pbs_wells(&layout);

    fs::create_dir_all(&args.out)?;
    let mut writer = Writer::from_path(args.out.join("layout.csv"))?;
    for (well, reagent) in layout.iter() {
        let reagent_ul = match reagent {
            CalReagent::Fluorescein if well.col == 0 => FLUORESCEIN_SEED_UL,
            CalReagent::Fluorescein => PBS_VOLUME_UL,
            CalReagent::Ludox | CalReagent::Water => loading_volume_ul(well.col),
        };
        writer.serialize(LayoutRow {
            well: well.to_string(),
            reagent: *reagent,
            reagent_ul,
            pbs_ul: if pbs.contains(&well) { PBS_VOLUME_UL } else { 0 },
        })?;
    }
    writer.flush()?;

    if let (Some(path), Some(plate)) = (&args.store, args.plate) {
        let mut store = open_store(path)?;
        store.put(Owner::Item(plate), "date_created", json!(date))?;
    }
    println!(
        "calibration plate created {date}: prepare {} mL of 1X PBS for {} wells",
        pbs_required_ml(pbs.len()),
        pbs.len()
    );
    Ok(())
}
