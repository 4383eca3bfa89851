//! CSV trial matrices.
//!
//! ```text
//! # mouse 12, 50% contrast, hits
//! time,-0.5,0.0,0.5,1.0
//! trial1,0.1,0.3,1.2,0.8
//! trial2,0.0,0.2,0.9,1.1
//! ```
//!
//! The header starts with `time` and lists the sample times. Every other row
//! starts with a trial label (ignored) followed by one value per sample.
//! Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use fipstat_core::{ContrastTrialGroup, TrialMatrix};

use super::DataError;

fn parse_values<'a>(
    fields: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec<f64>, DataError> {
    fields
        .map(|field| {
            let field = field.trim();
            field.parse::<f64>().map_err(|_| DataError::InvalidValue {
                line,
                value: field.to_string(),
            })
        })
        .collect()
}

/// Load one contrast group from a CSV trial matrix.
pub fn load_trial_matrix_csv(path: &Path, contrast: u32) -> Result<ContrastTrialGroup, DataError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut time: Option<Vec<f64>> = None;
    let mut values = Vec::new();
    let mut rows = 0;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split(',');
        let label = fields.next().unwrap_or_default().trim();

        match &time {
            None => {
                if !label.eq_ignore_ascii_case("time") {
                    return Err(DataError::Parse {
                        line: line_num + 1,
                        message: format!("expected a 'time' header, found '{}'", label),
                    });
                }
                let parsed = parse_values(fields, line_num + 1)?;
                if parsed.is_empty() {
                    return Err(DataError::Parse {
                        line: line_num + 1,
                        message: "header lists no sample times".to_string(),
                    });
                }
                time = Some(parsed);
            }
            Some(t) => {
                let row = parse_values(fields, line_num + 1)?;
                if row.len() != t.len() {
                    return Err(DataError::Parse {
                        line: line_num + 1,
                        message: format!(
                            "trial '{}' has {} samples, header has {}",
                            label,
                            row.len(),
                            t.len()
                        ),
                    });
                }
                values.extend(row);
                rows += 1;
            }
        }
    }

    let time = time.ok_or_else(|| DataError::Parse {
        line: 0,
        message: "file has no 'time' header".to_string(),
    })?;
    let trials = TrialMatrix::from_row_slice(rows, time.len(), &values);

    tracing::debug!(path = %path.display(), contrast, trials = rows, "trial matrix loaded");
    Ok(ContrastTrialGroup::new(contrast, trials, time)?)
}
