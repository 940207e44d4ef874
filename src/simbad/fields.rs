//! SIMBAD field names and the ADQL built from them

use std::fmt;
use std::str::FromStr;

use crate::http::adql_quote;
use crate::StarqueryError;

/// Photometric bands SIMBAD keeps in its `flux` table
const FLUX_BANDS: &[&str] = &[
    "U", "B", "V", "R", "I", "G", "J", "H", "K", "u", "g", "r", "i", "z",
];

/// Column carrying the identifier that was asked for in batch results
pub const QUERY_ID_COLUMN: &str = "query_id";

/// A field that can be requested for every object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimbadField {
    /// A column of the `basic` table
    Basic {
        name: String,
        column: &'static str,
    },
    /// Magnitude in a photometric band
    Flux { name: String, band: String },
}

impl SimbadField {
    /// The name the field was requested under; used as output column name
    pub fn name(&self) -> &str {
        match self {
            SimbadField::Basic { name, .. } => name,
            SimbadField::Flux { name, .. } => name,
        }
    }

    fn select_expr(&self) -> String {
        match self {
            SimbadField::Basic { name, column } => format!("basic.{} AS \"{}\"", column, name),
            SimbadField::Flux { name, band } => format!("f_{}.flux AS \"{}\"", band, name),
        }
    }

    fn join_clause(&self) -> Option<String> {
        match self {
            SimbadField::Basic { .. } => None,
            SimbadField::Flux { band, .. } => Some(format!(
                "LEFT JOIN flux AS f_{band} ON f_{band}.oidref = basic.oid AND f_{band}.filter = {}",
                adql_quote(band),
                band = band
            )),
        }
    }
}

impl FromStr for SimbadField {
    type Err = StarqueryError;

    /// Accepts basic column names (`ra`, `main_id`, ...), bare band names
    /// (`G`, `H`) and the legacy `flux(G)` spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let basic = |column: &'static str| SimbadField::Basic {
            name: name.to_string(),
            column,
        };

        let field = match name.to_lowercase().as_str() {
            "main_id" => basic("main_id"),
            "ra" => basic("ra"),
            "dec" => basic("dec"),
            "otype" => basic("otype"),
            "sp_type" | "sptype" => basic("sp_type"),
            "plx" | "plx_value" | "parallax" => basic("plx_value"),
            "pmra" => basic("pmra"),
            "pmdec" => basic("pmdec"),
            "rv" | "rvz_radvel" | "rv_value" => basic("rvz_radvel"),
            _ => {
                let band = name
                    .strip_prefix("flux(")
                    .or_else(|| name.strip_prefix("FLUX("))
                    .and_then(|rest| rest.strip_suffix(')'))
                    .unwrap_or(name);
                if !FLUX_BANDS.contains(&band) {
                    return Err(StarqueryError::ConfigError(format!(
                        "unknown SIMBAD field '{}'",
                        s
                    )));
                }
                SimbadField::Flux {
                    name: name.to_string(),
                    band: band.to_string(),
                }
            }
        };
        Ok(field)
    }
}

impl fmt::Display for SimbadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a list of requested field names
pub fn parse_fields<S: AsRef<str>>(names: &[S]) -> crate::Result<Vec<SimbadField>> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

/// All SIMBAD identifiers of the object known under `identifier`, main id first
pub fn object_ids_query(identifier: &str) -> String {
    format!(
        "SELECT basic.main_id FROM ident JOIN basic ON basic.oid = ident.oidref WHERE ident.id = {}",
        adql_quote(identifier)
    )
}

/// Objects within `radius_arcsec` of a position, in server order
pub fn region_query(ra_deg: f64, dec_deg: f64, radius_arcsec: f64) -> String {
    format!(
        "SELECT basic.main_id FROM basic WHERE CONTAINS(POINT('ICRS', basic.ra, basic.dec), \
         CIRCLE('ICRS', {}, {}, {})) = 1",
        ra_deg,
        dec_deg,
        radius_arcsec / 3600.0
    )
}

/// One query fetching `fields` for every identifier; rows echo the identifier
/// they matched in `query_id`
pub fn objects_query(identifiers: &[String], fields: &[SimbadField]) -> String {
    let mut select = vec![format!("ident.id AS \"{}\"", QUERY_ID_COLUMN)];
    select.extend(fields.iter().map(SimbadField::select_expr));

    let joins: Vec<String> = fields.iter().filter_map(SimbadField::join_clause).collect();
    let ids: Vec<String> = identifiers.iter().map(|id| adql_quote(id)).collect();

    let mut query = format!(
        "SELECT {} FROM ident JOIN basic ON basic.oid = ident.oidref",
        select.join(", ")
    );
    for join in joins {
        query.push(' ');
        query.push_str(&join);
    }
    query.push_str(&format!(" WHERE ident.id IN ({})", ids.join(", ")));
    query
}
