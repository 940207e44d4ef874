//! Run configuration shared by every pipeline stage
//!
//! A `QueryConfig` is built once per run (defaults, optionally a JSON file,
//! then command-line overrides) and passed explicitly into each stage.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;
use crate::StarqueryError;

/// SIMBAD TAP synchronous endpoint
pub const SIMBAD_TAP_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap/sync";
/// ESO archive TAP synchronous endpoint
pub const ESO_TAP_URL: &str = "https://archive.eso.org/tap_obs/sync";
/// Gemini observatory archive JSON summary endpoint
pub const GEMINI_ARCHIVE_URL: &str = "https://archive.gemini.edu/jsonsummary";

/// Remote calls are allowed to take up to five minutes
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// Cone search radius for positional resolution
pub const DEFAULT_SEARCH_RADIUS_ARCSEC: f64 = 5.0;
/// Cone search radius around a target when searching archive frames
pub const DEFAULT_ARCHIVE_RADIUS_ARCSEC: f64 = 10.0;

/// How input identifiers are turned into SIMBAD identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    /// Look the identifier up by name
    ByName,
    /// Cone search around the record's RA/Dec
    ByPosition,
    /// Use the identifier as given, no lookup
    Verbatim,
}

/// How attributes are fetched for resolved identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// One request for every identifier
    Batch,
    /// One request per identifier
    PerIdentifier,
}

/// When a record counts as having no data across several archives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NoDataPolicy {
    /// Every archive came back empty
    All,
    /// At least one archive came back empty
    Any,
}

/// Column separator for no-data lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Space,
    Tab,
}

impl Delimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Space => " ",
            Delimiter::Tab => "\t",
        }
    }

    /// File extension used for lists written with this delimiter
    pub fn extension(&self) -> &'static str {
        match self {
            Delimiter::Space => "txt",
            Delimiter::Tab => "tsv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub simbad_url: String,
    pub eso_url: String,
    pub gemini_url: String,
    pub timeout_secs: u64,
    /// Attributes fetched for every identifier, fixed for the whole run
    pub fields: Vec<String>,
    pub resolve: ResolveStrategy,
    pub fetch_mode: FetchMode,
    pub search_radius_arcsec: f64,
    pub archive_radius_arcsec: f64,
    /// Directory under which `query_results/` and `data_lists/` are created
    pub output_root: PathBuf,
    pub no_data_policy: NoDataPolicy,
    pub no_data_delimiter: Delimiter,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            simbad_url: SIMBAD_TAP_URL.to_string(),
            eso_url: ESO_TAP_URL.to_string(),
            gemini_url: GEMINI_ARCHIVE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fields: ["ra", "dec", "G", "J", "H", "K"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            resolve: ResolveStrategy::ByName,
            fetch_mode: FetchMode::Batch,
            search_radius_arcsec: DEFAULT_SEARCH_RADIUS_ARCSEC,
            archive_radius_arcsec: DEFAULT_ARCHIVE_RADIUS_ARCSEC,
            output_root: PathBuf::from("."),
            no_data_policy: NoDataPolicy::All,
            no_data_delimiter: Delimiter::Space,
        }
    }
}

impl QueryConfig {
    /// Load a configuration from a JSON file; missing keys take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StarqueryError::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let config: QueryConfig = serde_json::from_str(&text).map_err(|e| {
            StarqueryError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(StarqueryError::ConfigError(
                "at least one field must be requested".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(StarqueryError::ConfigError(
                "timeout_secs must be positive".to_string(),
            ));
        }
        for (name, radius) in [
            ("search radius", self.search_radius_arcsec),
            ("archive radius", self.archive_radius_arcsec),
        ] {
            if radius.is_nan() || radius <= 0.0 {
                return Err(StarqueryError::ConfigError(format!(
                    "{} must be positive, got {}",
                    name, radius
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
