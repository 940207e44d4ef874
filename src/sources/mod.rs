//! Source list loading
//!
//! Target lists come in a handful of text shapes: whitespace-separated
//! `name-token name-token ra dec` lines, tab-separated survey exports (VizieR
//! TSV with `#` comments and column/unit/dash header rows), fixed-width
//! catalogue tables and plain identifier lists. All of them load into an
//! ordered `Vec<SourceRecord>`.

use flate2::read::GzDecoder;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::Result;
use crate::StarqueryError;

/// One astronomical target from an input list
///
/// RA and Dec are kept as the text found in the file so that they can be
/// written back out unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub identifier: String,
    pub ra: Option<String>,
    pub dec: Option<String>,
}

impl SourceRecord {
    pub fn new(identifier: impl Into<String>, ra: Option<String>, dec: Option<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ra,
            dec,
        }
    }

    /// Right ascension in degrees, if present and numeric
    pub fn ra_deg(&self) -> Option<f64> {
        self.ra.as_deref().and_then(|s| s.trim().parse().ok())
    }

    /// Declination in degrees, if present and numeric
    pub fn dec_deg(&self) -> Option<f64> {
        self.dec.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

/// Layout of an input target list
#[derive(Debug, Clone, PartialEq)]
pub enum InputFormat {
    /// `token1 token2 ra dec`; the identifier is the first two tokens
    Whitespace,
    /// Tab-separated columns with `#` comment lines
    Tab {
        identifier_column: usize,
        ra_column: Option<usize>,
        dec_column: Option<usize>,
        /// Leading non-comment rows to drop (VizieR exports carry three)
        header_rows: usize,
        /// Prepended to every identifier, e.g. `"2MASS "`
        identifier_prefix: Option<String>,
    },
    /// Identifier taken from a byte range of each line
    FixedWidth {
        start: usize,
        end: usize,
        /// Leading lines to drop (title, ReadMe and ruler lines), blank lines included
        header_rows: usize,
        identifier_prefix: Option<String>,
    },
    /// One identifier per line, no coordinates
    IdentifierList,
}

impl InputFormat {
    /// Tab layout with identifier, RA and Dec in the first three columns
    pub fn tab() -> Self {
        InputFormat::Tab {
            identifier_column: 0,
            ra_column: Some(1),
            dec_column: Some(2),
            header_rows: 0,
            identifier_prefix: None,
        }
    }

    /// Pick a format from the file extension: `.tsv` is tab-separated,
    /// anything else whitespace-separated
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let name = path.as_ref().to_string_lossy().to_lowercase();
        let name = name.trim_end_matches(".gz");
        if name.ends_with(".tsv") {
            Self::tab()
        } else {
            InputFormat::Whitespace
        }
    }
}

/// Create a reader for a file, handling gzip if needed
fn create_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(StarqueryError::IoError)?;

    let is_gzipped = path.to_string_lossy().ends_with(".gz");
    let reader: Box<dyn BufRead> = if is_gzipped {
        debug!("Reading gzipped source list {}", path.display());
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(reader)
}

/// Load a source list from a file
///
/// Fails with `FileNotFound` when the path does not exist. A file with no
/// parseable rows gives an empty list and a warning.
pub fn load_source_list<P: AsRef<Path>>(path: P, format: &InputFormat) -> Result<Vec<SourceRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StarqueryError::FileNotFound(path.to_path_buf()));
    }

    let reader = create_reader(path)?;
    let records = parse_source_list(reader, format)?;

    if records.is_empty() {
        warn!("No object names found in {}", path.display());
    } else {
        debug!("Loaded {} sources from {}", records.len(), path.display());
    }
    Ok(records)
}

/// Parse source records from any buffered reader
pub fn parse_source_list<R: BufRead>(reader: R, format: &InputFormat) -> Result<Vec<SourceRecord>> {
    let mut records = Vec::new();
    let mut headers_left = match format {
        InputFormat::Tab { header_rows, .. } => *header_rows,
        _ => 0,
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(StarqueryError::IoError)?;
        let line_number = index + 1;

        if line.trim().is_empty() {
            continue;
        }

        let record = match format {
            InputFormat::Whitespace => parse_whitespace_line(&line),
            InputFormat::Tab {
                identifier_column,
                ra_column,
                dec_column,
                identifier_prefix,
                ..
            } => {
                if line.starts_with('#') {
                    continue;
                }
                if headers_left > 0 {
                    headers_left -= 1;
                    continue;
                }
                parse_tab_line(
                    &line,
                    *identifier_column,
                    *ra_column,
                    *dec_column,
                    identifier_prefix.as_deref(),
                )
            }
            InputFormat::FixedWidth {
                start,
                end,
                header_rows,
                identifier_prefix,
            } => {
                // Counted in physical lines, blank ones included
                if index < *header_rows {
                    continue;
                }
                parse_fixed_width_line(&line, *start, *end, identifier_prefix.as_deref())
            }
            InputFormat::IdentifierList => Some(SourceRecord::new(line.trim(), None, None)),
        };

        match record {
            Some(record) => records.push(record),
            None => warn!("Skipping unparseable line {}: {:?}", line_number, line),
        }
    }

    Ok(records)
}

fn parse_whitespace_line(line: &str) -> Option<SourceRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let identifier = format!("{} {}", tokens[0], tokens[1]);
    let ra = tokens.get(2).map(|s| s.to_string());
    let dec = tokens.get(3).map(|s| s.to_string());
    Some(SourceRecord::new(identifier, ra, dec))
}

fn with_prefix(identifier: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("{}{}", prefix, identifier),
        None => identifier.to_string(),
    }
}

fn parse_tab_line(
    line: &str,
    identifier_column: usize,
    ra_column: Option<usize>,
    dec_column: Option<usize>,
    prefix: Option<&str>,
) -> Option<SourceRecord> {
    let cells: Vec<&str> = line.split('\t').collect();
    let cell = |column: Option<usize>| -> Option<String> {
        column
            .and_then(|c| cells.get(c))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    let identifier = cell(Some(identifier_column))?;
    Some(SourceRecord::new(
        with_prefix(&identifier, prefix),
        cell(ra_column),
        cell(dec_column),
    ))
}

fn parse_fixed_width_line(
    line: &str,
    start: usize,
    end: usize,
    prefix: Option<&str>,
) -> Option<SourceRecord> {
    if line.len() < end {
        return None;
    }
    let identifier = line.get(start..end)?.trim();
    if identifier.is_empty() {
        return None;
    }
    Some(SourceRecord::new(with_prefix(identifier, prefix), None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    #[test]
    fn test_whitespace_format() {
        let text = "2MASS J1 10.000 20.000\n\n2MASS J2 11.000 21.000\n";
        let records = parse_source_list(Cursor::new(text), &InputFormat::Whitespace).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "2MASS J1");
        assert_eq!(records[0].ra.as_deref(), Some("10.000"));
        assert_eq!(records[1].identifier, "2MASS J2");
        assert_eq!(records[1].dec.as_deref(), Some("21.000"));
        assert_eq!(records[1].dec_deg(), Some(21.0));
    }

    #[test]
    fn test_whitespace_without_coordinates() {
        let text = "HD 141569\nlonely\n";
        let records = parse_source_list(Cursor::new(text), &InputFormat::Whitespace).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "HD 141569");
        assert_eq!(records[0].ra, None);
        assert_eq!(records[0].ra_deg(), None);
    }

    #[test]
    fn test_tab_format_skips_comments() {
        let text = "#RESOURCE=yCat\n# comment\nJ1\t10.5\t-20.25\n\nJ2\t11.5\t-21.25\n";
        let records = parse_source_list(Cursor::new(text), &InputFormat::tab()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], SourceRecord::new("J1", Some("10.5".into()), Some("-20.25".into())));
        assert_eq!(records[1].identifier, "J2");
    }

    #[test]
    fn test_vizier_tsv_with_headers_and_prefix() {
        // Taurus class II layout: RA, 2MASS name, Dec
        let text = "# VizieR export\n\
                    RAJ2000\t2MASS\tDEJ2000\n\
                    deg\t\tdeg\n\
                    ---\t---\t---\n\
                    64.63\tJ04183110+2827162\t28.45\n\
                    65.49\tJ04215563+2755060\t27.91\n";
        let format = InputFormat::Tab {
            identifier_column: 1,
            ra_column: Some(0),
            dec_column: Some(2),
            header_rows: 3,
            identifier_prefix: Some("2MASS ".to_string()),
        };
        let records = parse_source_list(Cursor::new(text), &format).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "2MASS J04183110+2827162");
        assert_eq!(records[0].ra.as_deref(), Some("64.63"));
        assert_eq!(records[1].dec.as_deref(), Some("27.91"));
    }

    #[test]
    fn test_tab_format_without_identifier_column() {
        // ODISEA lists carry only coordinates; the identifier column doubles as RA
        let text = "246.60\t-24.39\n";
        let format = InputFormat::Tab {
            identifier_column: 0,
            ra_column: Some(0),
            dec_column: Some(1),
            header_rows: 0,
            identifier_prefix: None,
        };
        let records = parse_source_list(Cursor::new(text), &format).unwrap();
        assert_eq!(records[0].identifier, "246.60");
        assert_eq!(records[0].ra_deg(), Some(246.60));
    }

    #[test]
    fn test_fixed_width_format() {
        let mut line = " ".repeat(20);
        line.push_str("J040132.08+260733");
        line.push_str("   60.383698 26.125894");
        let short = "too short";
        let blank_name = " ".repeat(40);
        let text = format!("{}\n{}\n{}\n", line, short, blank_name);

        let format = InputFormat::FixedWidth {
            start: 20,
            end: 37,
            header_rows: 0,
            identifier_prefix: Some("2MASS ".to_string()),
        };
        let records = parse_source_list(Cursor::new(text), &format).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "2MASS J040132.08+260733");
    }

    #[test]
    fn test_fixed_width_skips_header_block() {
        let mut row = " ".repeat(20);
        row.push_str("J041831.10+282716");
        row.push_str("   64.629583 28.454556");
        let text = format!(
            "Title: Class II members of Taurus\n\n{}\n{}\n{}\n",
            "Byte-by-byte Description of file: table1.dat ------------------",
            "-".repeat(60),
            row
        );

        let skipping = InputFormat::FixedWidth {
            start: 20,
            end: 37,
            header_rows: 4,
            identifier_prefix: Some("2MASS ".to_string()),
        };
        let records = parse_source_list(Cursor::new(text.clone()), &skipping).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "2MASS J041831.10+282716");

        let reading_all = InputFormat::FixedWidth {
            start: 20,
            end: 37,
            header_rows: 0,
            identifier_prefix: Some("2MASS ".to_string()),
        };
        let records = parse_source_list(Cursor::new(text), &reading_all).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].identifier, "2MASS tion of file: tab");
    }

    #[test]
    fn test_identifier_list() {
        let text = "HD 141569\n  TW Hya  \n\nAB Aur\n";
        let records = parse_source_list(Cursor::new(text), &InputFormat::IdentifierList).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(names, vec!["HD 141569", "TW Hya", "AB Aur"]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_source_list("/nonexistent/targets.txt", &InputFormat::Whitespace);
        assert!(matches!(result, Err(StarqueryError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "\n\n").unwrap();

        let records = load_source_list(&path, &InputFormat::Whitespace).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_gzipped_tsv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("targets.tsv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"# header\nJ1\t1.0\t2.0\n").unwrap();
        encoder.finish().unwrap();

        let format = InputFormat::from_path(&path);
        assert_eq!(format, InputFormat::tab());
        let records = load_source_list(&path, &format).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "J1");
    }
}
