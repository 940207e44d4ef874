//! Object database access (SIMBAD)
//!
//! The pipeline only sees the `ObjectDatabase` trait: name lookup, cone
//! search and a batch attribute query. `SimbadClient` implements it over the
//! SIMBAD TAP service; `MemoryDatabase` answers from in-memory tables for
//! offline runs and tests.

mod client;
pub mod fields;
mod memory;
pub mod tap;

pub use client::SimbadClient;
pub use fields::{parse_fields, SimbadField};
pub use memory::MemoryDatabase;
pub use tap::TapTable;

use crate::outcome::AttributeSet;
use crate::Result;

/// One object returned by a batch query
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRow {
    /// The identifier from the request this row answers
    pub query_id: String,
    pub attributes: AttributeSet,
}

/// A remote catalog of astronomical objects
pub trait ObjectDatabase {
    /// Canonical identifiers for a name, best match first
    fn query_object_ids(&self, identifier: &str) -> Result<Vec<String>>;

    /// Canonical identifiers of objects within `radius_arcsec` of a position
    fn query_region(&self, ra_deg: f64, dec_deg: f64, radius_arcsec: f64) -> Result<Vec<String>>;

    /// Fetch `fields` for many identifiers in a single request
    ///
    /// Identifiers the database does not know are simply missing from the
    /// result.
    fn query_objects(&self, identifiers: &[String], fields: &[String]) -> Result<Vec<ObjectRow>>;
}
