//! ESO science archive (raw frames) via TAP
//!
//! Frames are matched by a cone search around the target. OBJECT headers are
//! free text chosen by the observer and rarely equal a catalogue name.

use log::{debug, warn};
use reqwest::blocking::Client;

use super::{target_position, Archive};
use crate::config::QueryConfig;
use crate::http::{adql_quote, build_client, read_text};
use crate::simbad::{ObjectDatabase, SimbadClient};
use crate::sources::SourceRecord;
use crate::Result;
use crate::StarqueryError;

const RAW_COLUMNS: &str = "dp_id, date_obs, object, ra, dec, exposure, dp_cat, dp_tech, prog_id";

/// Raw frames taken with one instrument at the ESO archive
pub struct EsoArchive {
    client: Client,
    url: String,
    instrument: String,
    radius_arcsec: f64,
    /// Positions for targets listed without usable coordinates
    positions: Box<dyn ObjectDatabase>,
}

impl EsoArchive {
    pub fn new(
        config: &QueryConfig,
        instrument: &str,
        positions: Box<dyn ObjectDatabase>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout())?,
            url: config.eso_url.clone(),
            instrument: instrument.to_uppercase(),
            radius_arcsec: config.archive_radius_arcsec,
            positions,
        })
    }

    /// VLT/SPHERE, with target positions looked up in SIMBAD
    pub fn sphere(config: &QueryConfig) -> Result<Self> {
        Self::new(config, "SPHERE", Box::new(SimbadClient::new(config)?))
    }
}

/// Raw frames taken with `instrument` within `radius_arcsec` of a position
pub fn raw_frames_query(instrument: &str, ra_deg: f64, dec_deg: f64, radius_arcsec: f64) -> String {
    format!(
        "SELECT {} FROM dbo.raw WHERE instrument = {} AND \
         CONTAINS(POINT('ICRS', ra, dec), CIRCLE('ICRS', {}, {}, {})) = 1",
        RAW_COLUMNS,
        adql_quote(instrument),
        ra_deg,
        dec_deg,
        radius_arcsec / 3600.0
    )
}

/// Data rows of a TSV response, header dropped
pub fn parse_tsv_rows(text: &str) -> Result<Vec<String>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    match lines.next() {
        None => Ok(Vec::new()),
        Some(header) if header.trim_start().starts_with('<') => Err(StarqueryError::ResponseError(
            "archive returned a VOTable error document".to_string(),
        )),
        Some(_) => Ok(lines.map(|l| l.trim_end().to_string()).collect()),
    }
}

impl Archive for EsoArchive {
    fn name(&self) -> &str {
        &self.instrument
    }

    fn query_target(&self, target: &SourceRecord) -> Result<Vec<String>> {
        let (ra, dec) = match target_position(self.positions.as_ref(), target)? {
            Some(position) => position,
            None => {
                warn!("No position known for {}", target.identifier);
                return Ok(Vec::new());
            }
        };
        let adql = raw_frames_query(&self.instrument, ra, dec, self.radius_arcsec);
        debug!("ESO query: {}", adql);
        let params = [
            ("REQUEST", "doQuery"),
            ("LANG", "ADQL"),
            ("FORMAT", "tsv"),
            ("QUERY", adql.as_str()),
        ];
        let response = self.client.get(&self.url).query(&params).send()?;
        parse_tsv_rows(&read_text(response)?)
    }
}
