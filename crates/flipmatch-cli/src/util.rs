use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use flipmatch_engine::{LevelCatalog, LevelConfig};

/// Writes `value` as pretty JSON to `path`, or to stdout when no path is given.
pub fn write_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let (mut writer, target): (Box<dyn Write>, String) = match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            (Box::new(BufWriter::new(file)), path.display().to_string())
        }
        None => (Box::new(io::stdout().lock()), "stdout".to_owned()),
    };

    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {target}"))?;
    writeln!(writer).with_context(|| format!("Failed to write newline to {target}"))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush output to {target}"))?;
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Looks up a level in the standard catalog.
pub fn standard_level(id: u32) -> anyhow::Result<LevelConfig> {
    let catalog = LevelCatalog::standard();
    catalog.get(id).copied().with_context(|| {
        format!(
            "Unknown level {id}: the catalog has levels 1 to {}",
            catalog.last_level_id()
        )
    })
}
