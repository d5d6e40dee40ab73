use std::error::Error;
use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use plate_cal::{expiry_date, is_expired, parse_created};
use plate_core::{AssociationStore, ErrorInfo, Owner, PlateError};

use super::open_store;

#[derive(Args, Debug)]
pub struct AgeArgs {
    /// SQLite association store.
    #[arg(long)]
    pub store: PathBuf,
    /// Item id of the calibration plate.
    #[arg(long)]
    pub plate: u64,
    /// Reference date as MMDDYYYY; defaults to today.
    #[arg(long)]
    pub today: Option<String>,
}

pub fn run(args: &AgeArgs) -> Result<(), Box<dyn Error>> {
    let store = open_store(&args.store)?;
    let plate = Owner::Item(args.plate);
    let created = store
        .get(plate, "date_created")?
        .and_then(|value| value.as_str().map(str::to_string))
        .ok_or_else(|| {
            PlateError::Store(
                ErrorInfo::new("age.date_created", "plate has no creation date")
                    .with_context("plate", plate.to_string()),
            )
        })?;
    let created = parse_created(&created)?;
    let today = match &args.today {
        Some(today) => parse_created(today)?,
        None => Local::now().date_naive(),
    };
    if is_expired(created, today) {
        println!("expired: plate {plate} expired on {}", expiry_date(created));
    } else {
        println!("usable: plate {plate} expires on {}", expiry_date(created));
    }
    Ok(())
}
