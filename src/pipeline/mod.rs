//! The cross-reference pipeline: resolve, fetch, filter
//!
//! Stages run strictly in sequence on the in-memory output of the previous
//! one. Remote failures stay attached to the record that caused them, so a
//! run always completes and always has something to write.

pub mod fetcher;
pub mod filter;
pub mod resolver;

pub use fetcher::Fetcher;
pub use filter::{Comparison, Condition, FilterPredicate};
pub use resolver::Resolver;

use log::info;
use std::path::PathBuf;

use crate::config::{QueryConfig, ResolveStrategy};
use crate::outcome::{AttributeSet, QueryOutcome};
use crate::output::ResultWriter;
use crate::simbad::ObjectDatabase;
use crate::sources::SourceRecord;
use crate::Result;

/// Everything learned about one input record
#[derive(Debug, Clone, PartialEq)]
pub struct CrossmatchRow {
    pub record: SourceRecord,
    pub resolved: QueryOutcome<String>,
    pub attributes: QueryOutcome<AttributeSet>,
}

impl CrossmatchRow {
    pub fn has_data(&self) -> bool {
        self.attributes.is_found()
    }

    /// Name written to target lists
    ///
    /// Position-resolved records are listed under the catalog name they
    /// resolved to; their input identifier is only a coordinate.
    pub fn listed_identifier(&self, strategy: ResolveStrategy) -> &str {
        match (strategy, &self.resolved) {
            (ResolveStrategy::ByPosition, QueryOutcome::Found(id)) => id.as_str(),
            _ => self.record.identifier.as_str(),
        }
    }
}

/// Tally of attribute outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub found: usize,
    pub not_found: usize,
    pub errors: usize,
}

/// Result of a cross-reference run, one row per input record in input order
#[derive(Debug, Clone, PartialEq)]
pub struct CrossmatchReport {
    pub fields: Vec<String>,
    pub rows: Vec<CrossmatchRow>,
}

impl CrossmatchReport {
    /// Rows passing the predicate
    pub fn filtered(&self, predicate: &FilterPredicate) -> Vec<&CrossmatchRow> {
        predicate.apply(&self.rows, |row| row.attributes.found())
    }

    /// Records nothing was found for (not resolved, not found, or failed)
    pub fn no_data(&self) -> Vec<&SourceRecord> {
        self.rows
            .iter()
            .filter(|row| !row.has_data())
            .map(|row| &row.record)
            .collect()
    }

    /// Identifier to report for each row: the resolved one when available
    pub fn identifiers(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| match &row.resolved {
                QueryOutcome::Found(id) => id.clone(),
                _ => row.record.identifier.clone(),
            })
            .collect()
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for row in &self.rows {
            match row.attributes {
                QueryOutcome::Found(_) => counts.found += 1,
                QueryOutcome::NotFound => counts.not_found += 1,
                QueryOutcome::Error(_) => counts.errors += 1,
            }
        }
        counts
    }
}

/// Resolve and fetch attributes for every record
pub fn crossmatch<D: ObjectDatabase + ?Sized>(
    database: &D,
    records: Vec<SourceRecord>,
    config: &QueryConfig,
) -> CrossmatchReport {
    info!(
        "Cross-matching {} sources ({:?} resolution, {:?} fetch)",
        records.len(),
        config.resolve,
        config.fetch_mode
    );

    let resolver = Resolver::new(database, config.resolve, config.search_radius_arcsec);
    let resolved = resolver.resolve_all(&records);

    let fetcher = Fetcher::new(database, &config.fields, config.fetch_mode);
    let attributes = fetcher.fetch(&resolved);

    let rows = records
        .into_iter()
        .zip(resolved)
        .zip(attributes)
        .map(|((record, resolved), attributes)| CrossmatchRow {
            record,
            resolved,
            attributes,
        })
        .collect();

    CrossmatchReport {
        fields: config.fields.clone(),
        rows,
    }
}

/// Paths of the files written for a cross-reference run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossmatchFiles {
    pub attributes: PathBuf,
    pub filtered: PathBuf,
    pub no_data: PathBuf,
}

/// Write the attribute table, the filtered list and the no-data list
pub fn write_crossmatch(
    report: &CrossmatchReport,
    predicate: &FilterPredicate,
    writer: &ResultWriter,
    config: &QueryConfig,
) -> Result<CrossmatchFiles> {
    let outcomes: Vec<QueryOutcome<AttributeSet>> =
        report.rows.iter().map(|r| r.attributes.clone()).collect();
    let attributes = writer.write_attribute_table(&report.identifiers(), &report.fields, &outcomes)?;

    let passed = report.filtered(predicate);
    info!(
        "{} of {} sources pass {}",
        passed.len(),
        report.rows.len(),
        if predicate.is_empty() {
            "(no conditions)".to_string()
        } else {
            predicate.to_string()
        }
    );
    let filtered = writer.write_filtered(&passed, &report.fields, config.resolve)?;

    let no_data = writer.write_no_data(report.no_data(), config.no_data_delimiter)?;

    Ok(CrossmatchFiles {
        attributes,
        filtered,
        no_data,
    })
}
