// dgrid - fuzzy search, multi-key sort and selection geometry from the shell

mod exit_codes;
mod records;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use datagrid_config::{ConfigError, Settings};
use datagrid_core::{Cell, Selection};
use datagrid_engine::{shingles, GridView, SortCriterion};

use exit_codes::{EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};
use records::{Format, Row};

#[derive(Parser)]
#[command(name = "dgrid")]
#[command(about = "Fuzzy search, multi-key sort and selection geometry for tabular records")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/datagrid/settings.json)
    #[arg(long, global = true, env = "DGRID_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the n-grams of a text, one per line
    #[command(after_help = "\
Examples:
  dgrid shingles 'hello world'
  dgrid shingles 'hello world' -n 2")]
    Shingles {
        text: String,

        /// N-gram size (default: search.ngramSize)
        #[arg(short = 'n', long)]
        n: Option<usize>,
    },

    /// Keep records similar to a query, optionally ordered
    #[command(after_help = "\
Examples:
  dgrid search people.json --query 'alice smth'
  dgrid search people.csv --query smith --field name --threshold 0.4 --scores
  dgrid search people.json --query ali --by dept --by age:desc -t csv")]
    Search {
        /// Input file ("-" = stdin, requires -f)
        file: PathBuf,

        /// Text to match
        #[arg(long, short = 'q')]
        query: String,

        /// Restrict matching to these fields. Repeatable.
        #[arg(long, value_name = "FIELD")]
        field: Vec<String>,

        /// Minimum similarity in [0, 1] (default: search.threshold)
        #[arg(long)]
        threshold: Option<f64>,

        /// N-gram size (default: search.ngramSize)
        #[arg(short = 'n', long)]
        n: Option<usize>,

        /// Order results by key[:asc|desc]. Repeatable; earlier keys win.
        /// Without --by, results are ranked by score.
        #[arg(long, value_name = "KEY[:DIR]")]
        by: Vec<String>,

        /// Include each record's score as "_score"
        #[arg(long)]
        scores: bool,

        /// Input format (inferred from the extension when omitted)
        #[arg(long, short = 'f')]
        from: Option<Format>,

        /// Output format
        #[arg(long, short = 't', default_value = "json")]
        to: Format,
    },

    /// Order records by one or more keys
    #[command(after_help = "\
Examples:
  dgrid sort people.json --by age
  dgrid sort people.csv --by dept --by age:desc -t csv")]
    Sort {
        /// Input file ("-" = stdin, requires -f)
        file: PathBuf,

        /// Sort key as key[:asc|desc]. Repeatable; earlier keys win.
        /// A key may contain ':' unless it ends in a direction word.
        /// Default: sort.default from settings.
        #[arg(long, value_name = "KEY[:DIR]")]
        by: Vec<String>,

        /// Input format (inferred from the extension when omitted)
        #[arg(long, short = 'f')]
        from: Option<Format>,

        /// Output format
        #[arg(long, short = 't', default_value = "json")]
        to: Format,
    },

    /// Describe the rectangle spanned by an anchor and an optional end cell
    #[command(after_help = "\
Examples:
  dgrid select 2,3
  dgrid select 5,5 2,3
  dgrid select 5,5 2,3 --json")]
    Select {
        /// Anchor cell as row,col
        #[arg(allow_hyphen_values = true)]
        start: String,

        /// Drag end cell as row,col
        #[arg(allow_hyphen_values = true)]
        end: Option<String>,

        /// Print the four corners as JSON instead of the description
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = load_settings(cli.config.as_deref()).and_then(|settings| match cli.command {
        Commands::Shingles { text, n } => cmd_shingles(&settings, text, n),
        Commands::Search { file, query, field, threshold, n, by, scores, from, to } => {
            cmd_search(&settings, file, query, field, threshold, n, by, scores, from, to)
        }
        Commands::Sort { file, by, from, to } => cmd_sort(&settings, file, by, from, to),
        Commands::Select { start, end, json } => cmd_select(start, end, json),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        match err {
            ConfigError::Io(_) => CliError::io(message),
            ConfigError::Parse(_) | ConfigError::Invalid(_) => {
                CliError::parse(message).with_hint("fix or remove the settings file")
            }
        }
    }
}

// ============================================================================
// settings
// ============================================================================

/// An explicit settings path must load cleanly. The default path is optional
/// and falls back to defaults (with a warning) when broken.
fn load_settings(explicit: Option<&Path>) -> Result<Settings, CliError> {
    let mut settings = match explicit {
        Some(path) => Settings::try_load_from(path)?,
        None => {
            let path = Settings::config_path();
            if path.exists() {
                Settings::load_from(&path)
            } else {
                Settings::default()
            }
        }
    };
    settings.apply_env_overrides();
    Ok(settings)
}

fn parse_criteria(by: &[String], settings: &Settings) -> Result<Vec<SortCriterion>, CliError> {
    if by.is_empty() {
        return Ok(settings.default_sort.clone());
    }
    by.iter()
        .map(|spec| {
            SortCriterion::parse(spec).map_err(|e| {
                CliError::args(format!("--by '{}': {}", spec, e)).with_hint("use key, key:asc or key:desc")
            })
        })
        .collect()
}

fn resolve_ngram_size(n: Option<usize>, settings: &Settings) -> Result<usize, CliError> {
    match n.unwrap_or(settings.ngram_size) {
        0 => Err(CliError::args("n-gram size must be at least 1")),
        n => Ok(n),
    }
}

fn emit(rows: &[Row<'_>], to: Format, settings: &Settings, with_scores: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match to {
        Format::Json => records::write_json(&mut out, rows, with_scores),
        Format::Csv => records::write_csv(&mut out, rows, &settings.columns, with_scores),
    }?;
    out.flush().map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// shingles
// ============================================================================

fn cmd_shingles(settings: &Settings, text: String, n: Option<usize>) -> Result<(), CliError> {
    let n = resolve_ngram_size(n, settings)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for gram in shingles(&text, n) {
        writeln!(out, "{}", gram).map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// search
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_search(
    settings: &Settings,
    file: PathBuf,
    query: String,
    fields: Vec<String>,
    threshold: Option<f64>,
    n: Option<usize>,
    by: Vec<String>,
    with_scores: bool,
    from: Option<Format>,
    to: Format,
) -> Result<(), CliError> {
    if !settings.search_enabled {
        return Err(CliError::args("search is disabled")
            .with_hint("set DATAGRID_SEARCH=on or \"search.enabled\": true in settings"));
    }

    let threshold = threshold.unwrap_or(settings.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CliError::args(format!("--threshold must be within [0, 1], got {}", threshold)));
    }
    let n = resolve_ngram_size(n, settings)?;
    let criteria = parse_criteria(&by, settings)?;
    let scope = if fields.is_empty() {
        settings.search_scope()
    } else {
        datagrid_engine::FieldScope::from_keys(fields)
    };

    let format = records::resolve_format(&file, from)?;
    let data = records::load(&file, format)?;

    let mut view = GridView::new(data, n);
    view.set_query(&query, scope, threshold);
    view.set_sort(criteria);

    let mut ids = view.visible_ids();
    if view.sort_criteria().is_empty() {
        // Rank by score; the sort is stable so equal scores keep data order
        ids.sort_by(|&a, &b| {
            let (sa, sb) = (view.score(a).unwrap_or(0.0), view.score(b).unwrap_or(0.0));
            sb.total_cmp(&sa)
        });
    }

    log::info!("search {:?}: {} of {} records", query, ids.len(), view.records().len());

    let rows: Vec<Row<'_>> = ids
        .iter()
        .filter_map(|&id| view.record(id).map(|record| Row { record, score: view.score(id) }))
        .collect();
    emit(&rows, to, settings, with_scores)
}

// ============================================================================
// sort
// ============================================================================

fn cmd_sort(
    settings: &Settings,
    file: PathBuf,
    by: Vec<String>,
    from: Option<Format>,
    to: Format,
) -> Result<(), CliError> {
    let criteria = parse_criteria(&by, settings)?;
    if criteria.is_empty() {
        return Err(CliError::args("no sort keys").with_hint("pass --by key[:dir] or set \"sort.default\""));
    }

    let format = records::resolve_format(&file, from)?;
    let mut data = records::load(&file, format)?;
    datagrid_engine::sort_records(&mut data, &criteria);

    let rows: Vec<Row<'_>> = data.iter().map(|record| Row { record, score: None }).collect();
    emit(&rows, to, settings, false)
}

// ============================================================================
// select
// ============================================================================

/// Parse "row,col" (whitespace around either part is allowed).
fn parse_cell(s: &str) -> Result<Cell, CliError> {
    let invalid = || CliError::args(format!("invalid cell '{}'", s)).with_hint("cells are written row,col (e.g. 2,3)");
    let (row, col) = s.split_once(',').ok_or_else(invalid)?;
    let row = row.trim().parse::<i64>().map_err(|_| invalid())?;
    let col = col.trim().parse::<i64>().map_err(|_| invalid())?;
    Ok(Cell::new(row, col))
}

fn cmd_select(start: String, end: Option<String>, json: bool) -> Result<(), CliError> {
    let mut selection = Selection::at(parse_cell(&start)?);
    if let Some(end) = end {
        selection = selection.with_end(parse_cell(&end)?);
    }

    let text = if json {
        serde_json::to_string_pretty(&selection.rect()).map_err(|e| CliError::io(e.to_string()))?
    } else {
        selection.describe()
    };
    println!("{}", text);
    Ok(())
}
