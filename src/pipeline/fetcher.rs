//! Attribute fetching for resolved identifiers

use std::collections::HashMap;

use log::{info, warn};

use crate::config::FetchMode;
use crate::outcome::{AttributeSet, QueryOutcome};
use crate::simbad::ObjectDatabase;

/// Fetches the configured fields for resolved identifiers
pub struct Fetcher<'a, D: ObjectDatabase + ?Sized> {
    database: &'a D,
    fields: &'a [String],
    mode: FetchMode,
}

impl<'a, D: ObjectDatabase + ?Sized> Fetcher<'a, D> {
    pub fn new(database: &'a D, fields: &'a [String], mode: FetchMode) -> Self {
        Self {
            database,
            fields,
            mode,
        }
    }

    /// One outcome per input, in input order
    ///
    /// Inputs that were not resolved keep their outcome and are not sent.
    pub fn fetch(&self, resolved: &[QueryOutcome<String>]) -> Vec<QueryOutcome<AttributeSet>> {
        match self.mode {
            FetchMode::Batch => self.fetch_batch(resolved),
            FetchMode::PerIdentifier => resolved
                .iter()
                .map(|outcome| match outcome {
                    QueryOutcome::Found(id) => self.fetch_one(id),
                    QueryOutcome::NotFound => QueryOutcome::NotFound,
                    QueryOutcome::Error(e) => QueryOutcome::Error(e.clone()),
                })
                .collect(),
        }
    }

    fn fetch_batch(&self, resolved: &[QueryOutcome<String>]) -> Vec<QueryOutcome<AttributeSet>> {
        let identifiers: Vec<String> = resolved
            .iter()
            .filter_map(|o| o.found().cloned())
            .collect();

        let carry = |outcome: &QueryOutcome<String>| -> QueryOutcome<AttributeSet> {
            match outcome {
                QueryOutcome::Error(e) => QueryOutcome::Error(e.clone()),
                _ => QueryOutcome::NotFound,
            }
        };

        if identifiers.is_empty() {
            return resolved.iter().map(carry).collect();
        }

        info!("Batch querying {} identifiers", identifiers.len());
        let rows = match self.database.query_objects(&identifiers, self.fields) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Batch query failed: {}", e);
                let reason = e.to_string();
                return resolved
                    .iter()
                    .map(|o| match o {
                        QueryOutcome::Found(_) => QueryOutcome::Error(reason.clone()),
                        other => carry(other),
                    })
                    .collect();
            }
        };

        if rows.is_empty() {
            warn!("Batch query returned no results.");
        }

        // First row wins when the server returns an identifier twice
        let mut by_id: HashMap<String, AttributeSet> = HashMap::with_capacity(rows.len());
        for row in rows {
            by_id.entry(row.query_id).or_insert(row.attributes);
        }

        resolved
            .iter()
            .map(|outcome| match outcome {
                QueryOutcome::Found(id) => match by_id.get(id) {
                    Some(attributes) => QueryOutcome::Found(self.complete(attributes)),
                    None => {
                        warn!("No data found in SIMBAD for {}", id);
                        QueryOutcome::NotFound
                    }
                },
                other => carry(other),
            })
            .collect()
    }

    fn fetch_one(&self, id: &str) -> QueryOutcome<AttributeSet> {
        let ids = [id.to_string()];
        match self.database.query_objects(&ids, self.fields) {
            Ok(rows) => match rows.into_iter().next() {
                Some(row) => QueryOutcome::Found(self.complete(&row.attributes)),
                None => {
                    warn!("No data found in SIMBAD for {}", id);
                    QueryOutcome::NotFound
                }
            },
            Err(e) => {
                warn!("Error retrieving data for {}: {}", id, e);
                QueryOutcome::Error(e.to_string())
            }
        }
    }

    /// Re-key a returned row so it carries exactly the configured fields, in order
    fn complete(&self, attributes: &AttributeSet) -> AttributeSet {
        let mut set = AttributeSet::new();
        for field in self.fields {
            set.insert(field.as_str(), attributes.get(field).cloned());
        }
        set
    }
}
