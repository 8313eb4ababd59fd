//! File and directory utilities.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::from_reader;

use crate::domain::Round;

/// Reads a JSON-encoded type from a given file `path`.
pub fn read_json<D: DeserializeOwned>(path: impl AsRef<Path>) -> Result<D, io::Error> {
    let file = File::open(path)?;
    Ok(from_reader(BufReader::new(file))?)
}

/// The directory holding the published tables of a given round, laid out as `<root>/GW<round>`.
pub fn round_dir(root: impl AsRef<Path>, round: Round) -> PathBuf {
    root.as_ref().join(format!("GW{round}"))
}
