//! Gemini Observatory Archive via its JSON summary interface

use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;

use super::Archive;
use crate::config::QueryConfig;
use crate::http::{build_client, read_text};
use crate::sources::SourceRecord;
use crate::Result;
use crate::StarqueryError;

/// Keys of each summary entry written to the report, in order
const SUMMARY_KEYS: &[&str] = &[
    "data_label",
    "ut_datetime",
    "object",
    "observation_type",
    "filter_name",
    "exposure_time",
];

/// Files taken with one Gemini instrument
pub struct GeminiArchive {
    client: Client,
    base_url: String,
    instrument: String,
}

impl GeminiArchive {
    pub fn new(config: &QueryConfig, instrument: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout())?,
            base_url: config.gemini_url.clone(),
            instrument: instrument.to_uppercase(),
        })
    }

    /// Gemini Planet Imager
    pub fn gpi(config: &QueryConfig) -> Result<Self> {
        Self::new(config, "GPI")
    }

    /// `<base>/<INSTRUMENT>/notengineering/NotFail/object=<target>`, percent-encoded
    ///
    /// Engineering and failed frames are excluded.
    pub fn summary_url(&self, target: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StarqueryError::ConfigError(format!("invalid Gemini URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StarqueryError::ConfigError("Gemini URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&self.instrument)
            .push("notengineering")
            .push("NotFail")
            .push(&format!("object={}", target));
        Ok(url)
    }
}

/// Render every entry of a JSON summary as one tab-separated row
pub fn parse_summary(text: &str) -> Result<Vec<String>> {
    let entries: Vec<Value> = serde_json::from_str(text)?;
    Ok(entries
        .iter()
        .map(|entry| {
            SUMMARY_KEYS
                .iter()
                .map(|key| match entry.get(key) {
                    None | Some(Value::Null) => "None".to_string(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect())
}

impl Archive for GeminiArchive {
    fn name(&self) -> &str {
        &self.instrument
    }

    fn query_target(&self, target: &SourceRecord) -> Result<Vec<String>> {
        let url = self.summary_url(&target.identifier)?;
        debug!("Gemini query: {}", url);
        let response = self.client.get(url).send()?;
        parse_summary(&read_text(response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_url_excludes_engineering_and_failed_frames() {
        let archive = GeminiArchive::gpi(&QueryConfig::default()).unwrap();
        let url = archive.summary_url("HD 141569").unwrap();
        assert_eq!(
            url.as_str(),
            "https://archive.gemini.edu/jsonsummary/GPI/notengineering/NotFail/object=HD%20141569"
        );
    }

    #[test]
    fn test_parse_summary() {
        let text = r#"[
            {"data_label": "GS-2016A-Q-1-1-001", "ut_datetime": "2016-03-01 05:00:00",
             "object": "HD 141569", "observation_type": "OBJECT", "filter_name": "H",
             "exposure_time": 59.6},
            {"data_label": "GS-2016A-Q-1-1-002", "object": "HD 141569", "exposure_time": null}
        ]"#;
        let rows = parse_summary(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            "GS-2016A-Q-1-1-001\t2016-03-01 05:00:00\tHD 141569\tOBJECT\tH\t59.6"
        );
        assert_eq!(rows[1], "GS-2016A-Q-1-1-002\tNone\tHD 141569\tNone\tNone\tNone");
    }

    #[test]
    fn test_empty_summary() {
        assert!(parse_summary("[]").unwrap().is_empty());
        assert!(parse_summary("{\"error\": 1}").is_err());
    }
}
