#![deny(missing_docs)]
#![doc = "Plate coordinates, well matrices and shared contracts for plate-reader workflows."]

/// Well label and coordinate conversion.
pub mod coords;
pub mod errors;
/// Canonical hashing and rounding helpers.
pub mod hash;
/// Fixed-shape well grids.
pub mod matrix;
pub mod serde;
pub mod store;

pub use coords::{PlateShape, Well};
pub use errors::{ErrorInfo, PlateError};
pub use hash::{round_to, stable_hash_string};
pub use matrix::{WellMatrix, WellRef};
pub use store::{AssociationStore, Owner};

/// Placeholder written for empty wells in persisted matrices.
pub const NO_DATA: f64 = -1.0;

/// Placeholder written for empty wells in persisted sample-id matrices.
pub const NO_SAMPLE: i64 = -1;
