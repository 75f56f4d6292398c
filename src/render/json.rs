//! JSON rendering for artifacts that are written in one piece.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a value to a JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Serialize a value as JSON into a writer.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    mut out: W,
    value: &T,
    format: JsonFormat,
) -> Result<()> {
    match format {
        JsonFormat::Pretty => serde_json::to_writer_pretty(&mut out, value)?,
        JsonFormat::Compact => serde_json::to_writer(&mut out, value)?,
    }
    out.flush()?;
    Ok(())
}

/// Serialize a value as JSON into a new file at `path`.
pub fn save_json<P: AsRef<Path>, T: Serialize + ?Sized>(
    path: P,
    value: &T,
    format: JsonFormat,
) -> Result<()> {
    let out = BufWriter::new(File::create(path)?);
    write_json(out, value, format)
}
