//! Instrument archive queries
//!
//! Each archive is asked, target by target, whether it holds observations
//! taken with a given instrument. The answers are collected into one
//! `ArchiveSection` per archive; records that come back empty feed the
//! no-data list according to a `NoDataPolicy`.

mod eso;
mod gemini;

pub use eso::EsoArchive;
pub use gemini::GeminiArchive;

use log::{info, warn};

use crate::config::NoDataPolicy;
use crate::outcome::QueryOutcome;
use crate::simbad::ObjectDatabase;
use crate::sources::SourceRecord;
use crate::Result;

/// An archive that can be searched by target name
pub trait Archive {
    /// Section name used in reports, e.g. `SPHERE`
    fn name(&self) -> &str;

    /// Rows found for a target, rendered as text; empty when there are none
    fn query_target(&self, target: &SourceRecord) -> Result<Vec<String>>;
}

/// Everything one archive returned, one entry per target in input order
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSection {
    pub name: String,
    pub results: Vec<(String, QueryOutcome<Vec<String>>)>,
}

impl ArchiveSection {
    /// Number of targets this archive had data for
    pub fn found_count(&self) -> usize {
        self.results.iter().filter(|(_, o)| o.is_found()).count()
    }
}

/// Sky position of a target in degrees
///
/// The record's own RA/Dec are used when both parse as degrees; otherwise the
/// object database is asked for the position of the identifier. `None` when
/// neither knows it.
pub fn target_position<D: ObjectDatabase + ?Sized>(
    database: &D,
    record: &SourceRecord,
) -> Result<Option<(f64, f64)>> {
    if let (Some(ra), Some(dec)) = (record.ra_deg(), record.dec_deg()) {
        return Ok(Some((ra, dec)));
    }
    let fields = ["ra".to_string(), "dec".to_string()];
    let rows = database.query_objects(std::slice::from_ref(&record.identifier), &fields)?;
    Ok(rows
        .first()
        .and_then(|row| Some((row.attributes.number("ra")?, row.attributes.number("dec")?))))
}

/// Query one archive for every target, one request at a time
pub fn query_archive(archive: &dyn Archive, targets: &[SourceRecord]) -> ArchiveSection {
    let name = archive.name().to_string();
    let results = targets
        .iter()
        .map(|record| {
            let target = &record.identifier;
            let outcome = match archive.query_target(record) {
                Ok(rows) if rows.is_empty() => {
                    warn!("No data found for {}", target);
                    QueryOutcome::NotFound
                }
                Ok(rows) => {
                    info!("Found {} {} results for {}", rows.len(), name, target);
                    QueryOutcome::Found(rows)
                }
                Err(e) => {
                    warn!("Error querying {}: {}", target, e);
                    QueryOutcome::Error(e.to_string())
                }
            };
            (target.clone(), outcome)
        })
        .collect();

    ArchiveSection { name, results }
}

/// Query every archive for every record
pub fn query_archives(archives: &[Box<dyn Archive>], records: &[SourceRecord]) -> Vec<ArchiveSection> {
    archives
        .iter()
        .map(|archive| {
            info!("Querying {} for {} targets", archive.name(), records.len());
            query_archive(archive.as_ref(), records)
        })
        .collect()
}

/// Records that count as having no data across `sections`
///
/// Sections must be aligned with `records` (as `query_archives` produces
/// them). With no sections at all, every record has no data.
pub fn no_data_records<'r>(
    records: &'r [SourceRecord],
    sections: &[ArchiveSection],
    policy: NoDataPolicy,
) -> Vec<&'r SourceRecord> {
    records
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            if sections.is_empty() {
                return true;
            }
            let mut empty = sections.iter().map(|s| {
                s.results
                    .get(*i)
                    .map_or(true, |(_, outcome)| outcome.is_no_data())
            });
            match policy {
                NoDataPolicy::All => empty.all(|e| e),
                NoDataPolicy::Any => empty.any(|e| e),
            }
        })
        .map(|(_, record)| record)
        .collect()
}
