//! Cross-checking a survey catalog against a written no-data list

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::config::Delimiter;
use crate::sources::SourceRecord;
use crate::Result;
use crate::StarqueryError;

/// Read a no-data list written by `ResultWriter::write_no_data`
///
/// Lines are `identifier ra dec`; `None` coordinates load as absent.
pub fn load_no_data_list<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Vec<SourceRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StarqueryError::FileNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;

    let coordinate = |value: Option<&str>| -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != "None")
            .map(String::from)
    };

    Ok(text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let mut columns: Vec<&str> = match delimiter {
                Delimiter::Space => line.split_whitespace().collect(),
                Delimiter::Tab => line.split('\t').collect(),
            };
            // Identifiers may carry extra columns; coordinates are the last two
            let dec = if columns.len() >= 3 { columns.pop() } else { None };
            let ra = if columns.len() >= 2 { columns.pop() } else { None };
            SourceRecord::new(columns.join(" "), coordinate(ra), coordinate(dec))
        })
        .collect())
}

/// Identifiers compared with `_` and runs of whitespace treated alike
fn normalise(identifier: &str) -> String {
    identifier
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identifiers present in both lists, sorted
pub fn compare_by_identifier(survey: &[SourceRecord], no_data: &[SourceRecord]) -> Vec<String> {
    let survey: BTreeSet<String> = survey.iter().map(|r| normalise(&r.identifier)).collect();
    let listed: BTreeSet<String> = no_data.iter().map(|r| normalise(&r.identifier)).collect();
    survey.intersection(&listed).cloned().collect()
}

/// RA values present in both lists once rounded to `decimals` places, sorted
///
/// Records whose RA is absent or not numeric are ignored.
pub fn compare_by_ra(survey: &[SourceRecord], no_data: &[SourceRecord], decimals: usize) -> Vec<String> {
    let format = |records: &[SourceRecord]| -> BTreeSet<String> {
        records
            .iter()
            .filter_map(|r| r.ra_deg())
            .map(|ra| format!("{:.*}", decimals, ra))
            .collect()
    };
    format(survey).intersection(&format(no_data)).cloned().collect()
}
