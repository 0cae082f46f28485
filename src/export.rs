use std::{
    fs::{self, File},
    io,
    path::Path,
};

use anyhow::{Context, Result};

use crate::model::TowerRecord;

/// Write records as CSV. Absent fields become empty cells.
pub fn write_csv<W: io::Write>(writer: W, records: &[TowerRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write records to `path`, creating parent directories as needed.
///
/// Nothing is written for an empty slice; returns whether a file was written.
pub fn write_file(path: &Path, records: &[TowerRecord]) -> Result<bool> {
    if records.is_empty() {
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|x| !x.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, records).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<TowerRecord>> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in csv.deserialize() {
        let record: TowerRecord = result?;
        records.push(record);
    }
    Ok(records)
}
