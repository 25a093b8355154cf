//! Reader and writer for comma-separated interaction logs.
//!
//! Format: a header row naming the columns, then one record per line:
//! `user_id,item_id,clicks`
//!
//! Column order is taken from the header, so files with extra columns or
//! reordered columns load as long as the three named columns are present.

use crate::error::{DataLoadError, Result};
use crate::types::{ColumnSpec, Interaction};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Positions of the user/item/weight columns within a row
struct ColumnPositions {
    user: usize,
    item: usize,
    weight: usize,
    width: usize,
}

fn locate_columns(header: &str, columns: &ColumnSpec, file: &str) -> Result<ColumnPositions> {
    let names: Vec<&str> = header.split(',').map(str::trim).collect();

    let find = |column: &str| {
        names
            .iter()
            .position(|name| *name == column)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            })
    };

    Ok(ColumnPositions {
        user: find(&columns.user)?,
        item: find(&columns.item)?,
        weight: find(&columns.weight)?,
        width: names.len(),
    })
}

fn parse_weight(raw: &str, file: &str, line: usize) -> Result<f64> {
    let weight: f64 = raw.parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid weight '{}': {}", raw, e),
    })?;

    if !weight.is_finite() || weight < 0.0 {
        return Err(DataLoadError::InvalidValue {
            field: "weight".to_string(),
            value: raw.to_string(),
        });
    }
    Ok(weight)
}

/// Parse an interaction log
///
/// Blank lines are skipped. Line numbers in errors are 1-based and count
/// the header.
pub fn parse_interactions(path: &Path, columns: &ColumnSpec) -> Result<Vec<Interaction>> {
    let file_name = path.display().to_string();
    let file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: file_name.clone(),
    })?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Ok(Vec::new()),
    };
    let positions = locate_columns(&header, columns, &file_name)?;

    let mut interactions = Vec::new();
    for (idx, line) in lines.enumerate() {
        // +2: one for the header, one for 1-based numbering
        let line_no = idx + 2;
        let line = line?;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line_trimmed.split(',').map(str::trim).collect();
        if fields.len() < positions.width {
            return Err(DataLoadError::FieldCountMismatch {
                expected: positions.width,
                found: fields.len(),
                line: line_no,
            });
        }

        let user_id = fields[positions.user];
        let item_id = fields[positions.item];
        if user_id.is_empty() || item_id.is_empty() {
            return Err(DataLoadError::ParseError {
                file: file_name.clone(),
                line: line_no,
                reason: "Empty user or item identifier".to_string(),
            });
        }

        interactions.push(Interaction {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            weight: parse_weight(fields[positions.weight], &file_name, line_no)?,
        });
    }

    debug!("Parsed {} interactions from {}", interactions.len(), file_name);
    Ok(interactions)
}

/// Write an interaction log in the format read by [`parse_interactions`]
pub fn write_interactions(
    path: &Path,
    interactions: &[Interaction],
    columns: &ColumnSpec,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "{},{},{}", columns.user, columns.item, columns.weight)?;
    for interaction in interactions {
        writeln!(
            writer,
            "{},{},{}",
            interaction.user_id, interaction.item_id, interaction.weight
        )?;
    }
    writer.flush()?;

    debug!("Wrote {} interactions to {}", interactions.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_default_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "log.csv", "user_id,item_id,clicks\nu1,i1,5\n\nu2,i2,3\n");

        let log = parse_interactions(&path, &ColumnSpec::default()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], Interaction::new("u1", "i1", 5.0));
        assert_eq!(log[1], Interaction::new("u2", "i2", 3.0));
    }

    #[test]
    fn test_parse_reordered_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "log.csv", "clicks,item_id,user_id\n7,i9,u3\n");

        let log = parse_interactions(&path, &ColumnSpec::default()).unwrap();
        assert_eq!(log, vec![Interaction::new("u3", "i9", 7.0)]);
    }

    #[test]
    fn test_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "log.csv", "user_id,item_id,plays\nu1,i1,5\n");

        let err = parse_interactions(&path, &ColumnSpec::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "clicks"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "log.csv", "user_id,item_id,clicks\nu1,i1,-2\n");

        let err = parse_interactions(&path, &ColumnSpec::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidValue { .. }));
    }

    #[test]
    fn test_bad_weight_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "log.csv", "user_id,item_id,clicks\nu1,i1,1\nu1,i2,lots\n");

        let err = parse_interactions(&path, &ColumnSpec::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 3, .. }));
    }

    #[test]
    fn test_short_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "log.csv", "user_id,item_id,clicks\nu1,i1\n");

        let err = parse_interactions(&path, &ColumnSpec::default()).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::FieldCountMismatch { expected: 3, found: 2, line: 2 }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_interactions(Path::new("does/not/exist.csv"), &ColumnSpec::default())
            .unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_write_then_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let log = vec![
            Interaction::new("a", "item_0", 2.0),
            Interaction::new("b", "item_1", 9.0),
        ];

        write_interactions(&path, &log, &ColumnSpec::default()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("user_id,item_id,clicks\n"));
        assert_eq!(parse_interactions(&path, &ColumnSpec::default()).unwrap(), log);
    }
}
