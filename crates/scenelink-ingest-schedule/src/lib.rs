//! Schedule table ingestion for Scenelink
//!
//! Loads the host/object relationship schedule:
//! - UTF-16 on disk (BOM-sniffed, little-endian when there is no BOM),
//!   tab-separated, header row first
//! - columns located by name; anything beyond the five we use is ignored
//! - rows missing an id column are dropped (logged), surviving id fields
//!   are coerced to integers once, here
//!
//! Output is `Vec<RelationshipRow>` in input row order. Order does not
//! affect correctness, but downstream legacy-parity matching and the tests
//! depend on it being stable.

use std::fs;
use std::path::Path;

use encoding_rs::UTF_16LE;
use thiserror::Error;

use scenelink_model::{parse_id, RelationshipRow};

/// Conventional schedule file name used by the upstream export.
pub const DEFAULT_SCHEDULE_FILE: &str = "EXP_ObjectID_HostID.csv";

const HOST_COL: &str = "Host_ID";
const OBJECT_COL: &str = "Object_ID";
const IMAGE_COLS: [&str; 3] = ["Image1_Object_ID", "Image2_Object_ID", "Image3_Object_ID"];

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to read schedule: {0}")]
    Io(#[from] std::io::Error),
    #[error("schedule is not valid UTF-16")]
    Encoding,
    #[error("malformed schedule table: {0}")]
    Csv(#[from] csv::Error),
    #[error("schedule is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("schedule row {row}: column `{column}` has non-numeric id `{value}`")]
    BadId {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Load and normalize the schedule at `path`.
pub fn load_schedule(path: &Path) -> Result<Vec<RelationshipRow>, ScheduleError> {
    let bytes = fs::read(path)?;
    parse_schedule(&bytes)
}

/// Parse raw schedule bytes.
///
/// Decoding defaults to UTF-16LE; a BOM, when present, wins. A decode that
/// needed replacement characters is reported as an encoding mismatch rather
/// than passed on as garbage column names.
pub fn parse_schedule(bytes: &[u8]) -> Result<Vec<RelationshipRow>, ScheduleError> {
    let (text, _, had_errors) = UTF_16LE.decode(bytes);
    if had_errors {
        return Err(ScheduleError::Encoding);
    }
    parse_schedule_str(&text)
}

/// Parse an already-decoded schedule table.
pub fn parse_schedule_str(text: &str) -> Result<Vec<RelationshipRow>, ScheduleError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| -> Result<usize, ScheduleError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(ScheduleError::MissingColumn(name))
    };
    let host_idx = column(HOST_COL)?;
    let object_idx = column(OBJECT_COL)?;
    let image_idx = [
        column(IMAGE_COLS[0])?,
        column(IMAGE_COLS[1])?,
        column(IMAGE_COLS[2])?,
    ];

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // header is row 1 in the file
        let row_no = i + 2;

        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
        if field(host_idx).is_empty()
            || field(object_idx).is_empty()
            || image_idx.iter().any(|&idx| field(idx).is_empty())
        {
            tracing::warn!(row = row_no, "dropping schedule row with missing ids");
            dropped += 1;
            continue;
        }

        let id = |idx: usize, name: &'static str| {
            parse_id(field(idx)).ok_or_else(|| ScheduleError::BadId {
                row: row_no,
                column: name,
                value: field(idx).to_string(),
            })
        };

        rows.push(RelationshipRow {
            host_id: id(host_idx, HOST_COL)?,
            object_id: id(object_idx, OBJECT_COL)?,
            image_ids: [
                id(image_idx[0], IMAGE_COLS[0])?,
                id(image_idx[1], IMAGE_COLS[1])?,
                id(image_idx[2], IMAGE_COLS[2])?,
            ],
        });
    }

    if dropped > 0 {
        tracing::warn!(dropped, kept = rows.len(), "schedule rows dropped");
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Object_Name\tHost_ID\tObject_ID\tImage1_Object_ID\tImage2_Object_ID\tImage3_Object_ID";

    fn utf16le(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn parses_rows_in_input_order() {
        let table = format!("{HEADER}\nDoor\t10\t20\t1\t2\t3\nWall\t99\t10\t7.0\t8\t9\n");
        let rows = parse_schedule(&utf16le(&table)).expect("should parse");
        assert_eq!(
            rows,
            vec![
                RelationshipRow {
                    host_id: 10,
                    object_id: 20,
                    image_ids: [1, 2, 3]
                },
                RelationshipRow {
                    host_id: 99,
                    object_id: 10,
                    image_ids: [7, 8, 9]
                },
            ]
        );
    }

    #[test]
    fn drops_rows_missing_an_image_id() {
        let table = format!("{HEADER}\nDoor\t10\t20\t1\t\t3\nWall\t99\t10\t7\t8\t9\n");
        let rows = parse_schedule(&utf16le(&table)).expect("should parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].object_id, 10);
    }

    #[test]
    fn drops_rows_missing_host_or_object_id() {
        let table = format!("{HEADER}\nDoor\t\t20\t1\t2\t3\nWin\t10\t\t4\t5\t6\n");
        let rows = parse_schedule(&utf16le(&table)).expect("should parse");
        assert!(rows.is_empty());
    }

    #[test]
    fn non_numeric_id_after_filter_is_an_error() {
        let table = format!("{HEADER}\nDoor\t10\t20\t1\tbogus\t3\n");
        let err = parse_schedule(&utf16le(&table)).expect_err("should fail");
        match err {
            ScheduleError::BadId { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Image2_Object_ID");
                assert_eq!(value, "bogus");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_column_is_an_error() {
        let table = "Host_ID\tObject_ID\tImage1_Object_ID\n10\t20\t1\n";
        let err = parse_schedule(&utf16le(table)).expect_err("should fail");
        assert!(matches!(
            err,
            ScheduleError::MissingColumn("Image2_Object_ID")
        ));
    }

    #[test]
    fn big_endian_bom_is_honored() {
        let table = format!("{HEADER}\nDoor\t10\t20\t1\t2\t3\n");
        let mut bytes = vec![0xFE, 0xFF];
        for unit in table.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let rows = parse_schedule(&bytes).expect("should parse");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let table = format!("{HEADER}\tLevel\nDoor\t10\t20\t1\t2\t3\tL1\n");
        let rows = parse_schedule(&utf16le(&table)).expect("should parse");
        assert_eq!(rows[0].host_id, 10);
    }
}
