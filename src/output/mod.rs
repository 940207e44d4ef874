//! Result files
//!
//! Every file written by one run shares a single capture timestamp
//! (`YYYYMMDD_HHMMSS`). Reports land under `query_results/`, target lists
//! under `data_lists/`, both in dated subfolders created on demand.
//!
//! Files are written in place; a crash mid-write leaves a truncated file.

use chrono::{DateTime, Local};
use log::info;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::archives::ArchiveSection;
use crate::config::{Delimiter, ResolveStrategy};
use crate::outcome::{AttributeSet, QueryOutcome};
use crate::pipeline::CrossmatchRow;
use crate::sources::SourceRecord;
use crate::Result;
use crate::StarqueryError;

/// Writes the files of one run under a common root and timestamp
#[derive(Debug, Clone)]
pub struct ResultWriter {
    root: PathBuf,
    tag: Option<String>,
    captured: DateTime<Local>,
}

impl ResultWriter {
    pub fn new<P: AsRef<Path>>(root: P, tag: Option<String>) -> Self {
        Self::with_timestamp(root, tag, Local::now())
    }

    pub fn with_timestamp<P: AsRef<Path>>(
        root: P,
        tag: Option<String>,
        captured: DateTime<Local>,
    ) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            tag: tag.filter(|t| !t.trim().is_empty()),
            captured,
        }
    }

    /// `YYYYMMDD_HHMMSS` of the capture time
    pub fn timestamp(&self) -> String {
        self.captured.format("%Y%m%d_%H%M%S").to_string()
    }

    fn date(&self) -> String {
        self.captured.format("%Y%m%d").to_string()
    }

    /// `<stem>[_<tag>]_<timestamp>.<ext>`
    fn file_name(&self, stem: &str, extension: &str) -> String {
        match &self.tag {
            Some(tag) => format!("{}_{}_{}.{}", stem, tag, self.timestamp(), extension),
            None => format!("{}_{}.{}", stem, self.timestamp(), extension),
        }
    }

    fn create(&self, dir: PathBuf, name: String) -> Result<(PathBuf, BufWriter<File>)> {
        fs::create_dir_all(&dir).map_err(|e| {
            StarqueryError::IoError(std::io::Error::new(
                e.kind(),
                format!("cannot create output directory {}: {}", dir.display(), e),
            ))
        })?;
        let path = dir.join(name);
        let file = File::create(&path).map_err(StarqueryError::IoError)?;
        Ok((path, BufWriter::new(file)))
    }

    /// Sectioned report of archive results
    pub fn write_archive_report(&self, sections: &[ArchiveSection]) -> Result<PathBuf> {
        let dir = self.root.join("query_results").join(self.date());
        let (path, mut out) = self.create(dir, self.file_name("archive_query_results", "txt"))?;

        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                write!(out, "\n\n")?;
            }
            writeln!(out, "{} Results:", section.name)?;
            for (target, outcome) in &section.results {
                writeln!(out, "{}:", target)?;
                match outcome {
                    QueryOutcome::Found(rows) => {
                        for row in rows {
                            writeln!(out, "\t{}", row)?;
                        }
                    }
                    _ => writeln!(out, "\tNo data found.")?,
                }
            }
        }
        out.flush()?;

        info!("Results saved to '{}'", path.display());
        Ok(path)
    }

    /// `identifier ra dec` for every record nothing was found for
    ///
    /// With `Delimiter::Space`, spaces inside identifiers become `_` so the
    /// file keeps three columns per line.
    pub fn write_no_data<'r, I>(&self, records: I, delimiter: Delimiter) -> Result<PathBuf>
    where
        I: IntoIterator<Item = &'r SourceRecord>,
    {
        let dir = self.root.join("data_lists").join(self.date());
        let (path, mut out) =
            self.create(dir, self.file_name("no_data_objects", delimiter.extension()))?;

        for record in records {
            writeln!(out, "{}", no_data_line(record, delimiter))?;
        }
        out.flush()?;

        info!("Objects with no data found saved to '{}'", path.display());
        Ok(path)
    }

    /// `Identifier\t<field>...` table, `None` for absent values
    pub fn write_attribute_table(
        &self,
        identifiers: &[String],
        fields: &[String],
        outcomes: &[QueryOutcome<AttributeSet>],
    ) -> Result<PathBuf> {
        let dir = self.root.join("query_results").join("simple_query");
        let (path, mut out) = self.create(dir, self.file_name("simple_query_results", "tsv"))?;

        writeln!(out, "Identifier\t{}", fields.join("\t"))?;
        for (identifier, outcome) in identifiers.iter().zip(outcomes) {
            let values: Vec<String> = fields
                .iter()
                .map(|f| match outcome.found() {
                    Some(attributes) => attributes.render(f),
                    None => "None".to_string(),
                })
                .collect();
            writeln!(out, "{}\t{}", identifier, values.join("\t"))?;
        }
        out.flush()?;

        info!("Results saved to '{}'", path.display());
        Ok(path)
    }

    /// `identifier ra dec <fields...>` list of filtered sources
    ///
    /// By-name and verbatim runs write the input identifier space-separated
    /// to a `.txt`, so two-token survey names load back with the whitespace
    /// format. By-position runs write the resolved catalog name, which can
    /// have any number of tokens, tab-separated to a `.tsv`. RA/Dec come from
    /// the fetched `ra`/`dec` attributes when present, otherwise from the
    /// input record.
    pub fn write_filtered(
        &self,
        rows: &[&CrossmatchRow],
        fields: &[String],
        resolve: ResolveStrategy,
    ) -> Result<PathBuf> {
        let delimiter = match resolve {
            ResolveStrategy::ByPosition => Delimiter::Tab,
            ResolveStrategy::ByName | ResolveStrategy::Verbatim => Delimiter::Space,
        };
        let dir = self.root.join("data_lists").join(self.date());
        let (path, mut out) =
            self.create(dir, self.file_name("filtered_sources", delimiter.extension()))?;

        let extra: Vec<&String> = fields
            .iter()
            .filter(|f| f.as_str() != "ra" && f.as_str() != "dec")
            .collect();

        for row in rows {
            let attributes = row.attributes.found();
            let coordinate = |name: &str, fallback: &Option<String>| -> String {
                attributes
                    .and_then(|a| a.get(name))
                    .map(|v| v.to_string())
                    .or_else(|| fallback.clone())
                    .unwrap_or_else(|| "None".to_string())
            };

            let mut columns = vec![
                row.listed_identifier(resolve).to_string(),
                coordinate("ra", &row.record.ra),
                coordinate("dec", &row.record.dec),
            ];
            for field in &extra {
                columns.push(match attributes {
                    Some(a) => a.render(field),
                    None => "None".to_string(),
                });
            }
            writeln!(out, "{}", columns.join(delimiter.as_str()))?;
        }
        out.flush()?;

        info!("Filtered list saved to '{}'", path.display());
        Ok(path)
    }
}

/// One no-data line; absent coordinates are written as `None`
pub fn no_data_line(record: &SourceRecord, delimiter: Delimiter) -> String {
    let identifier = match delimiter {
        Delimiter::Space => record.identifier.split_whitespace().collect::<Vec<_>>().join("_"),
        Delimiter::Tab => record.identifier.clone(),
    };
    let ra = record.ra.as_deref().unwrap_or("None");
    let dec = record.dec.as_deref().unwrap_or("None");
    [identifier.as_str(), ra, dec].join(delimiter.as_str())
}
