//! Identifier resolution against the object database

use log::{debug, info, warn};

use crate::config::ResolveStrategy;
use crate::outcome::QueryOutcome;
use crate::simbad::ObjectDatabase;
use crate::sources::SourceRecord;

/// Maps input records to canonical catalog identifiers
pub struct Resolver<'a, D: ObjectDatabase + ?Sized> {
    database: &'a D,
    strategy: ResolveStrategy,
    radius_arcsec: f64,
}

impl<'a, D: ObjectDatabase + ?Sized> Resolver<'a, D> {
    pub fn new(database: &'a D, strategy: ResolveStrategy, radius_arcsec: f64) -> Self {
        Self {
            database,
            strategy,
            radius_arcsec,
        }
    }

    /// Resolve one record; remote failures come back as `Error`, never `Err`
    pub fn resolve(&self, record: &SourceRecord) -> QueryOutcome<String> {
        match self.strategy {
            ResolveStrategy::Verbatim => QueryOutcome::Found(record.identifier.clone()),
            ResolveStrategy::ByName => self.by_name(&record.identifier),
            ResolveStrategy::ByPosition => self.by_position(record),
        }
    }

    /// Resolve every record, in order
    pub fn resolve_all(&self, records: &[SourceRecord]) -> Vec<QueryOutcome<String>> {
        let outcomes: Vec<_> = records.iter().map(|r| self.resolve(r)).collect();
        let resolved = outcomes.iter().filter(|o| o.is_found()).count();
        info!("Resolved {}/{} identifiers", resolved, records.len());
        outcomes
    }

    fn by_name(&self, identifier: &str) -> QueryOutcome<String> {
        match self.database.query_object_ids(identifier) {
            Ok(ids) => match ids.into_iter().next() {
                Some(id) => QueryOutcome::Found(id),
                None => {
                    warn!("Could not resolve {} to a SIMBAD identifier", identifier);
                    QueryOutcome::NotFound
                }
            },
            Err(e) => {
                warn!("Error resolving {}: {}", identifier, e);
                QueryOutcome::Error(e.to_string())
            }
        }
    }

    fn by_position(&self, record: &SourceRecord) -> QueryOutcome<String> {
        let (ra, dec) = match (record.ra_deg(), record.dec_deg()) {
            (Some(ra), Some(dec)) => (ra, dec),
            _ => {
                warn!(
                    "No usable coordinates for {} (RA={:?}, Dec={:?})",
                    record.identifier, record.ra, record.dec
                );
                return QueryOutcome::Error("missing or invalid coordinates".to_string());
            }
        };

        match self.database.query_region(ra, dec, self.radius_arcsec) {
            Ok(ids) if ids.len() > 1 => {
                debug!(
                    "{} candidates within {}\" of {}, taking {}",
                    ids.len(),
                    self.radius_arcsec,
                    record.identifier,
                    ids[0]
                );
                QueryOutcome::Found(ids[0].clone())
            }
            Ok(ids) => match ids.into_iter().next() {
                Some(id) => QueryOutcome::Found(id),
                None => {
                    warn!("No results found for RA={}, Dec={}", ra, dec);
                    QueryOutcome::NotFound
                }
            },
            Err(e) => {
                warn!("Error resolving RA={}, Dec={}: {}", ra, dec, e);
                QueryOutcome::Error(e.to_string())
            }
        }
    }
}
