pub mod age;
pub mod calibrate;
pub mod layout;
pub mod measure;
pub mod parse;
pub mod sync;

use std::error::Error;
use std::fs;
use std::path::Path;

use plate_core::serde::{from_yaml_slice, to_canonical_json_bytes};
use plate_store::SqliteStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn open_store(path: &Path) -> Result<SqliteStore, Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(SqliteStore::open(path)?)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_canonical_json_bytes(value)?)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

pub fn load_yaml<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, Box<dyn Error>> {
    match path {
        Some(path) => {
            let bytes = fs::read(path)?;
            log::info!("loaded configuration from {}", path.display());
            Ok(from_yaml_slice(&bytes)?)
        }
        None => Ok(T::default()),
    }
}

pub fn upload_name(path: &Path, name: Option<&str>) -> String {
    name.map(str::to_string).unwrap_or_else(|| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}
