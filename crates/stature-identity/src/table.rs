//! Flat-file table codec
//!
//! One row per record, no header, fields separated by `;`:
//!
//! ```text
//! id;height;leg;arm;shoulder;torso;count
//! ```
//!
//! Measurements are in store units (millimeters).

use std::io::{Read, Write};

use stature_core::{MeasurementVector, StatureError, StatureResult};

use crate::IdentityRecord;

/// Field delimiter
pub const DELIMITER: u8 = b';';

/// Fields per row: id, five measurements, count
pub const COLUMNS: usize = MeasurementVector::DIMENSIONS + 2;

fn csv_error(err: csv::Error) -> StatureError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => StatureError::Io(io),
        other => StatureError::Csv(format!("{:?}", other)),
    }
}

fn parse_measurement(field: &str, line: u64) -> StatureResult<f64> {
    let value: f64 = field.parse().map_err(|_| StatureError::MalformedRecord {
        line,
        reason: format!("not a number: {:?}", field),
    })?;
    if !value.is_finite() {
        return Err(StatureError::MalformedRecord {
            line,
            reason: format!("not finite: {:?}", field),
        });
    }
    Ok(value)
}

fn parse_count(field: &str, line: u64) -> StatureResult<u64> {
    if let Ok(count) = field.parse::<u64>() {
        return Ok(count);
    }
    // Older files wrote the counter as a float
    let value = parse_measurement(field, line)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(StatureError::MalformedRecord {
            line,
            reason: format!("bad counter: {:?}", field),
        });
    }
    Ok(value as u64)
}

fn decode_row(row: &csv::StringRecord, line: u64) -> StatureResult<IdentityRecord> {
    if row.len() != COLUMNS {
        return Err(StatureError::ColumnCount {
            line,
            expected: COLUMNS,
            actual: row.len(),
        });
    }

    let id = row[0].to_string();
    if id.is_empty() {
        return Err(StatureError::MalformedRecord {
            line,
            reason: "empty id".into(),
        });
    }

    let mut values = [0.0; MeasurementVector::DIMENSIONS];
    for (i, slot) in values.iter_mut().enumerate() {
        *slot = parse_measurement(&row[i + 1], line)?;
    }
    let count = parse_count(&row[COLUMNS - 1], line)?;

    Ok(IdentityRecord::new(
        id,
        MeasurementVector::from_array(values),
        count,
    ))
}

/// Read every record from a table. Blank lines are skipped.
pub fn read_records<R: Read>(reader: R) -> StatureResult<Vec<IdentityRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        records.push(decode_row(&row, line)?);
    }
    Ok(records)
}

/// Write records as table rows
pub fn write_records<W: Write>(writer: W, records: &[IdentityRecord]) -> StatureResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(writer);

    for record in records {
        let mut row = Vec::with_capacity(COLUMNS);
        row.push(record.id.clone());
        row.extend(record.measurements.iter().map(|v| v.to_string()));
        row.push(record.count.to_string());
        writer.write_record(&row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}
