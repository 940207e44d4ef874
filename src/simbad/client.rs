//! HTTP client for the SIMBAD TAP service

use log::debug;
use reqwest::blocking::Client;

use super::fields::{self, SimbadField, QUERY_ID_COLUMN};
use super::tap::TapTable;
use super::{ObjectDatabase, ObjectRow};
use crate::config::QueryConfig;
use crate::http::{build_client, read_text};
use crate::outcome::AttributeSet;
use crate::Result;
use crate::StarqueryError;

/// SIMBAD queried through synchronous ADQL requests
pub struct SimbadClient {
    client: Client,
    url: String,
}

impl SimbadClient {
    pub fn new(config: &QueryConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout())?,
            url: config.simbad_url.clone(),
        })
    }

    /// Run an ADQL query and parse the resulting table
    pub fn run_query(&self, adql: &str) -> Result<TapTable> {
        debug!("SIMBAD query: {}", adql);
        let params = [
            ("request", "doQuery"),
            ("lang", "adql"),
            ("format", "json"),
            ("query", adql),
        ];
        let response = self.client.post(&self.url).form(&params).send()?;
        let body = read_text(response)?;
        TapTable::from_json(&body)
    }
}

impl ObjectDatabase for SimbadClient {
    fn query_object_ids(&self, identifier: &str) -> Result<Vec<String>> {
        let table = self.run_query(&fields::object_ids_query(identifier))?;
        Ok(table.first_column_text())
    }

    fn query_region(&self, ra_deg: f64, dec_deg: f64, radius_arcsec: f64) -> Result<Vec<String>> {
        let table = self.run_query(&fields::region_query(ra_deg, dec_deg, radius_arcsec))?;
        Ok(table.first_column_text())
    }

    fn query_objects(&self, identifiers: &[String], field_names: &[String]) -> Result<Vec<ObjectRow>> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }
        let fields = fields::parse_fields(field_names)?;
        let table = self.run_query(&fields::objects_query(identifiers, &fields))?;
        rows_from_table(&table, &fields)
    }
}

/// Split a batch table into one `ObjectRow` per returned object
pub(crate) fn rows_from_table(table: &TapTable, fields: &[SimbadField]) -> Result<Vec<ObjectRow>> {
    let id_index = table.column_index(QUERY_ID_COLUMN).ok_or_else(|| {
        StarqueryError::ResponseError(format!("missing '{}' column", QUERY_ID_COLUMN))
    })?;
    let indices: Vec<Option<usize>> = fields
        .iter()
        .map(|f| table.column_index(f.name()))
        .collect();

    let mut rows = Vec::with_capacity(table.len());
    for row in &table.rows {
        let query_id = match &row[id_index] {
            Some(value) => value.to_string(),
            None => continue,
        };
        let mut attributes = AttributeSet::new();
        for (field, index) in fields.iter().zip(&indices) {
            let value = index.and_then(|i| row[i].clone());
            attributes.insert(field.name(), value);
        }
        rows.push(ObjectRow {
            query_id,
            attributes,
        });
    }
    Ok(rows)
}
