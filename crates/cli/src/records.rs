// Record input/output for the CLI (JSON arrays and headed CSV)

use std::io::{self, Read, Write};
use std::path::Path;

use clap::ValueEnum;
use datagrid_config::ColumnHeader;
use datagrid_core::{FieldValue, Record};
use serde_json::{Map, Value};

use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    /// Infer from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "csv" => Some(Format::Csv),
            _ => None,
        }
    }
}

/// Pick the input format: explicit `-f` wins, then the extension.
pub fn resolve_format(path: &Path, explicit: Option<Format>) -> Result<Format, CliError> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    Format::from_path(path).ok_or_else(|| {
        CliError::args(format!("cannot infer input format of '{}'", path.display()))
            .with_hint("use -f json or -f csv")
    })
}

/// Read records from `path` ("-" = stdin).
pub fn load(path: &Path, format: Format) -> Result<Vec<Record>, CliError> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::io(format!("stdin: {}", e)))?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?
    };

    let records = match format {
        Format::Json => parse_json(&content),
        Format::Csv => parse_csv(&content),
    }
    .map_err(|e| CliError::parse(format!("{}: {}", path.display(), e.message)))?;

    log::debug!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// A JSON array of objects.
pub fn parse_json(content: &str) -> Result<Vec<Record>, CliError> {
    serde_json::from_str(content).map_err(|e| CliError::parse(format!("expected an array of objects: {}", e)))
}

/// CSV with a header row. Numeric cells become numbers.
pub fn parse_csv(content: &str) -> Result<Vec<Record>, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CliError::parse(e.to_string()))?
        .clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| CliError::parse(e.to_string()))?;
        let record = headers
            .iter()
            .zip(row.iter())
            .map(|(key, cell)| (key.to_string(), FieldValue::from_cell(cell)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// One output row: a record plus its search score, if any.
pub struct Row<'a> {
    pub record: &'a Record,
    pub score: Option<f64>,
}

/// Output columns: configured visible columns, else every key in first-seen order.
fn output_columns(rows: &[Row<'_>], columns: &[ColumnHeader]) -> Vec<(String, String)> {
    let configured: Vec<(String, String)> = columns
        .iter()
        .filter(|c| c.visible)
        .map(|c| (c.key.clone(), c.caption.clone()))
        .collect();
    if !configured.is_empty() {
        return configured;
    }

    let mut keys: Vec<String> = Vec::new();
    for row in rows {
        for key in row.record.keys() {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    keys.into_iter().map(|k| (k.clone(), k)).collect()
}

pub fn write_json(out: &mut impl Write, rows: &[Row<'_>], with_scores: bool) -> Result<(), CliError> {
    let values: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (key, value) in row.record.fields() {
                obj.insert(key.to_string(), Value::from(value.clone()));
            }
            if with_scores {
                obj.insert("_score".to_string(), row.score.map_or(Value::Null, Value::from));
            }
            Value::Object(obj)
        })
        .collect();

    let json = serde_json::to_string_pretty(&values).map_err(|e| CliError::io(e.to_string()))?;
    writeln!(out, "{}", json).map_err(|e| CliError::io(e.to_string()))
}

pub fn write_csv(
    out: &mut impl Write,
    rows: &[Row<'_>],
    columns: &[ColumnHeader],
    with_scores: bool,
) -> Result<(), CliError> {
    let columns = output_columns(rows, columns);
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = columns.iter().map(|(_, caption)| caption.as_str()).collect();
    if with_scores {
        header.push("_score");
    }
    writer.write_record(&header).map_err(|e| CliError::io(e.to_string()))?;

    for row in rows {
        let mut cells: Vec<String> = columns
            .iter()
            .map(|(key, _)| row.record.get(key).map(|v| v.display_string()).unwrap_or_default())
            .collect();
        if with_scores {
            cells.push(row.score.map(|s| format!("{:.4}", s)).unwrap_or_default());
        }
        writer.write_record(&cells).map_err(|e| CliError::io(e.to_string()))?;
    }

    let bytes = writer.into_inner().map_err(|e| CliError::io(e.to_string()))?;
    out.write_all(&bytes).map_err(|e| CliError::io(e.to_string()))
}
