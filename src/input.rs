//! Common routines for reading input files.
use crate::id::{HasID, IDLike};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

/// Read a TOML file from the specified path.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Could not parse TOML file {}", file_path.display()))
}

/// Read a series of type `T`s from a CSV file into a `Vec<T>`.
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Could not read CSV file {}", file_path.display()))?;

    let mut vec = Vec::new();
    for result in reader.deserialize() {
        let record: T = result
            .with_context(|| format!("Could not parse CSV file {}", file_path.display()))?;
        vec.push(record);
    }

    Ok(vec)
}

/// Read a CSV file of items with IDs into a map keyed by ID.
///
/// Item order in the file is preserved; duplicate IDs are an error.
pub fn read_csv_id_file<ID, T>(file_path: &Path) -> Result<IndexMap<ID, T>>
where
    ID: IDLike,
    T: HasID<ID> + DeserializeOwned,
{
    let mut map = IndexMap::new();
    for item in read_csv::<T>(file_path)? {
        let id = item.get_id().clone();
        ensure!(
            map.insert(id.clone(), item).is_none(),
            "Duplicate ID {} in file {}",
            id,
            file_path.display()
        );
    }

    Ok(map)
}

/// Read a proportion, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 1"))?;
    }

    Ok(Dimensionless(value))
}
