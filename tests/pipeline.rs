//! End-to-end runs over in-memory services, writing to a temporary root

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{Local, TimeZone};
use tempfile::tempdir;

use starquery::archives::{self, Archive};
use starquery::compare::{compare_by_identifier, load_no_data_list};
use starquery::config::{Delimiter, FetchMode, NoDataPolicy, ResolveStrategy};
use starquery::output::ResultWriter;
use starquery::pipeline::{self, FilterPredicate};
use starquery::simbad::MemoryDatabase;
use starquery::{
    load_source_list, AttributeValue, InputFormat, QueryConfig, SourceRecord, StarqueryError,
};

/// Archive answering from a fixed table
struct TableArchive {
    name: &'static str,
    rows: HashMap<&'static str, Vec<String>>,
}

impl TableArchive {
    fn new(name: &'static str, entries: &[(&'static str, &str)]) -> Self {
        let mut rows: HashMap<&'static str, Vec<String>> = HashMap::new();
        for (target, row) in entries {
            rows.entry(*target).or_default().push(row.to_string());
        }
        Self { name, rows }
    }
}

impl Archive for TableArchive {
    fn name(&self) -> &str {
        self.name
    }

    fn query_target(&self, target: &SourceRecord) -> starquery::Result<Vec<String>> {
        if target.identifier == "2MASS J9" {
            return Err(StarqueryError::RemoteError("connection reset".to_string()));
        }
        Ok(self
            .rows
            .get(target.identifier.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

fn writer(root: &Path, tag: &str) -> ResultWriter {
    let captured = Local.with_ymd_and_hms(2025, 3, 24, 23, 40, 2).unwrap();
    ResultWriter::with_timestamp(root, Some(tag.to_string()), captured)
}

fn write_input(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_archive_run_writes_report_and_no_data_list() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "taurus_sources_rev.txt",
        "2MASS J1 10.000 20.000\n2MASS J2 11.000 21.000\n",
    );
    let records = load_source_list(&input, &InputFormat::Whitespace).unwrap();
    assert_eq!(records.len(), 2);

    let archives: Vec<Box<dyn Archive>> = vec![
        Box::new(TableArchive::new("SPHERE", &[("2MASS J1", "SPHER.2016-06-01\tJ1")])),
        Box::new(TableArchive::new("GPI", &[])),
    ];
    let sections = archives::query_archives(&archives, &records);
    let no_data = archives::no_data_records(&records, &sections, NoDataPolicy::All);

    let w = writer(dir.path(), "taurus");
    let report = w.write_archive_report(&sections).unwrap();
    let list = w.write_no_data(no_data.iter().copied(), Delimiter::Space).unwrap();

    assert!(report.ends_with("query_results/20250324/archive_query_results_taurus_20250324_234002.txt"));
    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        "SPHERE Results:\n\
         2MASS J1:\n\tSPHER.2016-06-01\tJ1\n\
         2MASS J2:\n\tNo data found.\n\
         \n\n\
         GPI Results:\n\
         2MASS J1:\n\tNo data found.\n\
         2MASS J2:\n\tNo data found.\n"
    );
    assert_eq!(fs::read_to_string(&list).unwrap(), "2MASS_J2 11.000 21.000\n");
}

#[test]
fn test_archive_error_counts_as_no_data() {
    let records = vec![
        SourceRecord::new("2MASS J1", None, None),
        SourceRecord::new("2MASS J9", None, None),
    ];
    let archives: Vec<Box<dyn Archive>> = vec![Box::new(TableArchive::new(
        "SPHERE",
        &[("2MASS J1", "row")],
    ))];
    let sections = archives::query_archives(&archives, &records);
    assert!(matches!(
        sections[0].results[1].1,
        starquery::QueryOutcome::Error(_)
    ));

    let no_data = archives::no_data_records(&records, &sections, NoDataPolicy::Any);
    assert_eq!(no_data.len(), 1);
    assert_eq!(no_data[0].identifier, "2MASS J9");
}

fn database() -> MemoryDatabase {
    MemoryDatabase::new()
        .with_object(
            "V* FM Tau",
            63.5566,
            28.2166,
            &[
                ("G", AttributeValue::Number(12.0)),
                ("H", AttributeValue::Number(7.5)),
            ],
        )
        .with_object(
            "V* CW Tau",
            63.5711,
            28.182,
            &[
                ("G", AttributeValue::Number(10.0)),
                ("H", AttributeValue::Number(7.5)),
            ],
        )
        .with_alias("2MASS J1", "V* FM Tau")
        .with_alias("2MASS J2", "V* CW Tau")
}

fn config(root: &Path) -> QueryConfig {
    QueryConfig {
        fields: vec!["ra".into(), "dec".into(), "G".into(), "H".into()],
        resolve: ResolveStrategy::ByName,
        fetch_mode: FetchMode::Batch,
        output_root: root.to_path_buf(),
        ..QueryConfig::default()
    }
}

#[test]
fn test_crossmatch_run_filters_and_round_trips() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "taurus.tsv",
        "#Catalog export\n_2MASS\tRAJ2000\tDEJ2000\n\t\"deg\"\t\"deg\"\n----\t----\t----\n\
         J1\t63.55\t28.21\nJ2\t63.57\t28.18\nJ3\t64.00\t29.00\n",
    );
    let format = InputFormat::Tab {
        identifier_column: 0,
        ra_column: Some(1),
        dec_column: Some(2),
        header_rows: 3,
        identifier_prefix: Some("2MASS ".to_string()),
    };
    let records = load_source_list(&input, &format).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].identifier, "2MASS J1");

    let db = database();
    let config = config(dir.path());
    let report = pipeline::crossmatch(&db, records, &config);
    assert_eq!(db.batch_calls(), 1);

    let predicate = FilterPredicate::parse(&["G>11", "H<8"]).unwrap();
    let files = pipeline::write_crossmatch(&report, &predicate, &writer(dir.path(), "taurus"), &config)
        .unwrap();

    let filtered = fs::read_to_string(&files.filtered).unwrap();
    assert_eq!(filtered, "2MASS J1 63.5566 28.2166 12.0 7.5\n");

    let reloaded = load_source_list(&files.filtered, &InputFormat::Whitespace).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].identifier, "2MASS J1");
    approx::assert_relative_eq!(reloaded[0].ra_deg().unwrap(), 63.5566);
    approx::assert_relative_eq!(reloaded[0].dec_deg().unwrap(), 28.2166);

    assert_eq!(
        fs::read_to_string(&files.no_data).unwrap(),
        "2MASS_J3 64.00 29.00\n"
    );

    let table = fs::read_to_string(&files.attributes).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "Identifier\tra\tdec\tG\tH");
    assert_eq!(lines[3], "2MASS J3\tNone\tNone\tNone\tNone");
}

#[test]
fn test_no_data_list_feeds_survey_comparison() {
    let dir = tempdir().unwrap();
    let db = database();
    let config = config(dir.path());
    let records = vec![
        SourceRecord::new("2MASS J1", Some("63.55".into()), Some("28.21".into())),
        SourceRecord::new("2MASS J7", Some("70.1".into()), Some("25.0".into())),
    ];

    let report = pipeline::crossmatch(&db, records, &config);
    let files = pipeline::write_crossmatch(
        &report,
        &FilterPredicate::default(),
        &writer(dir.path(), "orion"),
        &config,
    )
    .unwrap();

    let listed = load_no_data_list(&files.no_data, Delimiter::Space).unwrap();
    let survey = vec![
        SourceRecord::new("2MASS J7", None, None),
        SourceRecord::new("2MASS J8", None, None),
    ];
    assert_eq!(compare_by_identifier(&survey, &listed), vec!["2MASS J7"]);
}

#[test]
fn test_position_run_lists_catalog_names() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "ODISEA_I.tsv",
        "#RA\tDec\n246.60\t-24.39\n247.10\t-24.80\n",
    );
    let format = InputFormat::Tab {
        identifier_column: 0,
        ra_column: Some(0),
        dec_column: Some(1),
        header_rows: 0,
        identifier_prefix: None,
    };
    let records = load_source_list(&input, &format).unwrap();
    assert_eq!(records.len(), 2);

    let db = MemoryDatabase::new().with_object(
        "V* WSB 60",
        246.6001,
        -24.3901,
        &[
            ("G", AttributeValue::Number(12.0)),
            ("H", AttributeValue::Number(7.0)),
        ],
    );
    let config = QueryConfig {
        resolve: ResolveStrategy::ByPosition,
        ..config(dir.path())
    };
    let report = pipeline::crossmatch(&db, records, &config);

    let predicate = FilterPredicate::parse(&["H<8"]).unwrap();
    let files = pipeline::write_crossmatch(
        &report,
        &predicate,
        &writer(dir.path(), "ophiuchus"),
        &config,
    )
    .unwrap();

    let filtered = fs::read_to_string(&files.filtered).unwrap();
    assert!(filtered.starts_with("V* WSB 60\t"));
    assert_eq!(filtered, "V* WSB 60\t246.6001\t-24.3901\t12.0\t7.0\n");

    // The list feeds straight into an archive run
    let reloaded =
        load_source_list(&files.filtered, &InputFormat::from_path(&files.filtered)).unwrap();
    assert_eq!(
        reloaded,
        vec![SourceRecord::new(
            "V* WSB 60",
            Some("246.6001".into()),
            Some("-24.3901".into())
        )]
    );

    let archives: Vec<Box<dyn Archive>> = vec![Box::new(TableArchive::new(
        "SPHERE",
        &[("V* WSB 60", "SPHER.2019-04-10\tV* WSB 60")],
    ))];
    let sections = archives::query_archives(&archives, &reloaded);
    assert_eq!(sections[0].found_count(), 1);
}
