//! Command-line front end for target list cross-referencing
//!
//! Subcommands:
//! - `archive`: look targets up in the SPHERE and GPI archives
//! - `crossmatch`: resolve against SIMBAD, fetch magnitudes, filter by limits
//! - `fetch`: fetch SIMBAD fields for a plain list of identifiers
//! - `compare`: cross-check a survey list against a no-data list
//!
//! Usage:
//!   starquery crossmatch taurus.tsv --format tab --id-column 1 --header-rows 3 \
//!       --prefix "2MASS " --where "G>11" --where "H<8" --tag taurus
//!   starquery archive taurus_sources_rev.txt --tag taurus

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};

use starquery::archives::{self, Archive, EsoArchive, GeminiArchive};
use starquery::compare::{compare_by_identifier, compare_by_ra, load_no_data_list};
use starquery::config::{Delimiter, FetchMode, NoDataPolicy, ResolveStrategy};
use starquery::output::ResultWriter;
use starquery::pipeline::{self, FilterPredicate};
use starquery::simbad::SimbadClient;
use starquery::{load_source_list, InputFormat, QueryConfig, StarqueryError};

#[derive(Debug, Parser)]
#[command(version, about = "Cross-reference target lists against SIMBAD and instrument archives")]
struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON configuration file; command-line options override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory under which query_results/ and data_lists/ are written
    #[arg(long, global = true)]
    output_root: Option<PathBuf>,

    /// Timeout for each remote call, in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Query the SPHERE (ESO) and GPI (Gemini) archives for every target
    Archive {
        #[command(flatten)]
        input: InputArgs,

        /// Archives to query
        #[arg(long, value_enum, value_delimiter = ',', default_values = ["sphere", "gpi"])]
        archives: Vec<ArchiveKind>,

        /// When a target goes on the no-data list
        #[arg(long, value_enum)]
        no_data_policy: Option<NoDataPolicy>,

        /// Cone search radius around each target for ESO frames, in arcsec
        #[arg(long)]
        archive_radius: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Resolve targets in SIMBAD, fetch magnitudes and filter by limits
    Crossmatch {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        query: SimbadArgs,

        /// Filter condition such as "G>11"; repeat to combine with AND
        #[arg(long = "where", value_name = "CONDITION")]
        conditions: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch SIMBAD fields for identifiers listed one per line
    Fetch {
        /// File with one identifier per line
        file: PathBuf,

        /// Fields to fetch (comma separated)
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        /// Free-text tag added to output file names
        #[arg(long)]
        tag: Option<String>,
    },

    /// Find survey targets that appear in a no-data list
    Compare {
        #[command(flatten)]
        input: InputArgs,

        /// No-data list written by a previous run
        no_data: PathBuf,

        /// Column separator of the no-data list
        #[arg(long, value_enum, default_value = "space")]
        no_data_delimiter: Delimiter,

        /// Compare identifiers or rounded RA values
        #[arg(long, value_enum, default_value = "identifier")]
        by: CompareBy,

        /// Decimal places kept when comparing RA
        #[arg(long, default_value_t = 3)]
        decimals: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ArchiveKind {
    Sphere,
    Gpi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompareBy {
    Identifier,
    Ra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatKind {
    /// Pick from the extension: .tsv is tab, anything else whitespace
    Auto,
    Whitespace,
    Tab,
    FixedWidth,
    List,
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Target list to read
    file: PathBuf,

    /// Layout of the target list
    #[arg(long, value_enum, default_value = "auto")]
    format: FormatKind,

    /// Tab format: column holding the identifier
    #[arg(long, default_value_t = 0)]
    id_column: usize,

    /// Tab format: column holding RA ("none" if absent)
    #[arg(long, default_value = "1")]
    ra_column: String,

    /// Tab format: column holding Dec ("none" if absent)
    #[arg(long, default_value = "2")]
    dec_column: String,

    /// Tab format: leading non-comment rows to skip.
    /// Fixed-width format: leading lines to skip
    #[arg(long, default_value_t = 0)]
    header_rows: usize,

    /// Fixed-width format: byte range of the identifier, e.g. 20:37
    #[arg(long, value_name = "START:END")]
    columns: Option<String>,

    /// Prefix added to every identifier, e.g. "2MASS "
    #[arg(long)]
    prefix: Option<String>,
}

impl InputArgs {
    fn input_format(&self) -> Result<InputFormat, StarqueryError> {
        let column = |value: &str| -> Result<Option<usize>, StarqueryError> {
            if value.eq_ignore_ascii_case("none") {
                return Ok(None);
            }
            value
                .parse()
                .map(Some)
                .map_err(|_| StarqueryError::ConfigError(format!("invalid column '{}'", value)))
        };

        let format = match self.format {
            FormatKind::Auto => InputFormat::from_path(&self.file),
            FormatKind::Whitespace => InputFormat::Whitespace,
            FormatKind::List => InputFormat::IdentifierList,
            FormatKind::Tab => InputFormat::Tab {
                identifier_column: self.id_column,
                ra_column: column(&self.ra_column)?,
                dec_column: column(&self.dec_column)?,
                header_rows: self.header_rows,
                identifier_prefix: self.prefix.clone(),
            },
            FormatKind::FixedWidth => {
                let range = self.columns.as_deref().ok_or_else(|| {
                    StarqueryError::ConfigError("--columns START:END is required".to_string())
                })?;
                let (start, end) = range
                    .split_once(':')
                    .and_then(|(s, e)| Some((s.trim().parse::<usize>().ok()?, e.trim().parse::<usize>().ok()?)))
                    .filter(|(s, e)| s < e)
                    .ok_or_else(|| {
                        StarqueryError::ConfigError(format!("invalid column range '{}'", range))
                    })?;
                InputFormat::FixedWidth {
                    start,
                    end,
                    header_rows: self.header_rows,
                    identifier_prefix: self.prefix.clone(),
                }
            }
        };
        Ok(format)
    }
}

#[derive(Debug, Args)]
struct SimbadArgs {
    /// How identifiers are resolved
    #[arg(long, value_enum)]
    resolve: Option<ResolveStrategy>,

    /// Cone search radius for positional resolution, in arcsec
    #[arg(long)]
    radius: Option<f64>,

    /// Batch request or one request per identifier
    #[arg(long, value_enum)]
    fetch: Option<FetchMode>,

    /// Fields to fetch (comma separated)
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Free-text tag added to output file names
    #[arg(long)]
    tag: Option<String>,

    /// Column separator of the no-data list
    #[arg(long, value_enum)]
    delimiter: Option<Delimiter>,
}

/// Activate a logger writing to stdout; `RUST_LOG` still applies on top
fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        _ => builder.filter_level(log::LevelFilter::Trace),
    };
    builder.init();
}

fn load_config(cli: &Cli) -> Result<QueryConfig, StarqueryError> {
    let mut config = match &cli.config {
        Some(path) => QueryConfig::from_json_file(path)?,
        None => QueryConfig::default(),
    };
    if let Some(root) = &cli.output_root {
        config.output_root = root.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Archive {
            input,
            archives: kinds,
            no_data_policy,
            archive_radius,
            output,
        } => {
            if let Some(policy) = no_data_policy {
                config.no_data_policy = policy;
            }
            if let Some(radius) = archive_radius {
                config.archive_radius_arcsec = radius;
            }
            if let Some(delimiter) = output.delimiter {
                config.no_data_delimiter = delimiter;
            }
            config.validate()?;

            let records = load_source_list(&input.file, &input.input_format()?)?;
            if records.is_empty() {
                warn!("Nothing to query in {}", input.file.display());
                return Ok(());
            }

            let mut clients: Vec<Box<dyn Archive>> = Vec::new();
            for kind in kinds {
                match kind {
                    ArchiveKind::Sphere => clients.push(Box::new(EsoArchive::sphere(&config)?)),
                    ArchiveKind::Gpi => clients.push(Box::new(GeminiArchive::gpi(&config)?)),
                }
            }

            info!("Querying archives for {} objects...", records.len());
            let sections = archives::query_archives(&clients, &records);
            let no_data = archives::no_data_records(&records, &sections, config.no_data_policy);

            let writer = ResultWriter::new(&config.output_root, output.tag);
            writer.write_archive_report(&sections)?;
            writer.write_no_data(no_data.iter().copied(), config.no_data_delimiter)?;
            info!("Done.");
        }

        Command::Crossmatch {
            input,
            query,
            conditions,
            output,
        } => {
            if let Some(resolve) = query.resolve {
                config.resolve = resolve;
            }
            if let Some(radius) = query.radius {
                config.search_radius_arcsec = radius;
            }
            if let Some(fetch) = query.fetch {
                config.fetch_mode = fetch;
            }
            if let Some(fields) = query.fields {
                config.fields = fields;
            }
            if let Some(delimiter) = output.delimiter {
                config.no_data_delimiter = delimiter;
            }
            config.validate()?;
            let predicate = FilterPredicate::parse(&conditions)?;

            let records = load_source_list(&input.file, &input.input_format()?)?;
            if records.is_empty() {
                warn!("Nothing to query in {}", input.file.display());
                return Ok(());
            }

            let simbad = SimbadClient::new(&config)?;
            let report = pipeline::crossmatch(&simbad, records, &config);
            let counts = report.counts();
            info!(
                "{} found, {} not found, {} errors",
                counts.found, counts.not_found, counts.errors
            );

            let writer = ResultWriter::new(&config.output_root, output.tag);
            pipeline::write_crossmatch(&report, &predicate, &writer, &config)?;
        }

        Command::Fetch { file, fields, tag } => {
            if let Some(fields) = fields {
                config.fields = fields;
            }
            config.resolve = ResolveStrategy::Verbatim;
            config.fetch_mode = FetchMode::Batch;
            config.validate()?;

            let records = load_source_list(&file, &InputFormat::IdentifierList)?;
            let identifiers: Vec<String> = records.iter().map(|r| r.identifier.clone()).collect();

            let simbad = SimbadClient::new(&config)?;
            let report = pipeline::crossmatch(&simbad, records, &config);
            let outcomes: Vec<_> = report.rows.iter().map(|r| r.attributes.clone()).collect();

            let writer = ResultWriter::new(&config.output_root, tag);
            writer.write_attribute_table(&identifiers, &config.fields, &outcomes)?;
        }

        Command::Compare {
            input,
            no_data,
            no_data_delimiter,
            by,
            decimals,
        } => {
            let survey = load_source_list(&input.file, &input.input_format()?)?;
            let listed = load_no_data_list(&no_data, no_data_delimiter)?;

            let common = match by {
                CompareBy::Identifier => compare_by_identifier(&survey, &listed),
                CompareBy::Ra => compare_by_ra(&survey, &listed, decimals),
            };
            info!(
                "{} of {} survey targets appear in {}",
                common.len(),
                survey.len(),
                no_data.display()
            );
            for entry in common {
                println!("{}", entry);
            }
        }
    }

    Ok(())
}
