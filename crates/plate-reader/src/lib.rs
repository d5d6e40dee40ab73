#![deny(missing_docs)]
#![doc = "Plate reader export parsing, assay classification and experimental measurement records."]

/// Export parsing into well matrices.
pub mod csv;
/// Assay methods and upload-name classification.
pub mod method;
/// Experimental measurement associations.
pub mod record;

pub use crate::csv::{
    parse_path, parse_reader, parse_rows, shape_for_data_rows, ParsedPlate, SkippedRow,
    READING_COLUMN, WELL_COLUMN,
};
pub use method::{AssayMethod, UploadKind};
pub use record::{load_measurement, record_measurement, timepoint_key};
