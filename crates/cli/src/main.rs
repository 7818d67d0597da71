// PageGrid CLI - headless grid operations over the built-in sample sources

mod exit_codes;
mod logger;
mod render;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::json;

use pagegrid_config::{Locale, Settings};
use pagegrid_engine::columns::{presets, ColumnGroupSpec, LayoutError};
use pagegrid_engine::filter::SortKey;
use pagegrid_engine::notify::NoticeLog;
use pagegrid_engine::{
    FundSample, GridSession, RecordSource, SampleSales, SaveOutcome, VecSource, ViewportState,
};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE, EXIT_VALIDATION};

#[derive(Parser)]
#[command(name = "pgrid")]
#[command(about = "Paged data grid with validation and multi-level headers (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/pagegrid/settings.json)
    #[arg(long, global = true, value_name = "FILE", env = "PGRID_CONFIG")]
    config: Option<PathBuf>,

    /// Language for messages
    #[arg(long, global = true, value_enum)]
    locale: Option<LocaleArg>,

    /// More log output on stderr (repeatable)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a column layout and print its merged header
    #[command(after_help = "\
Examples:
  pgrid headers
  pgrid headers --preset fund --json
  pgrid headers --layout columns.toml")]
    Headers {
        /// Built-in layout
        #[arg(long, value_enum, default_value = "sales")]
        preset: Preset,

        /// Layout file (.json or .toml); overrides --preset
        #[arg(long, value_name = "FILE")]
        layout: Option<PathBuf>,

        /// Print columns, header grid and regions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate scrolling to the bottom and report each page load
    Scroll {
        /// Scroll-to-end events after the first page
        #[arg(long, default_value_t = 3)]
        pages: usize,

        /// Rows per page (default from settings)
        #[arg(long)]
        page_size: Option<usize>,

        /// Row cap (default from settings)
        #[arg(long)]
        max: Option<usize>,

        /// Sample data seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Validate loaded rows; exits 3 when any cell has an error
    #[command(after_help = "\
Examples:
  pgrid validate --pages 5
  pgrid validate --data rows.json --json --locale en")]
    Validate {
        /// Pages to load before validating
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Print errors as JSON
        #[arg(long)]
        json: bool,

        /// Sample data seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// JSON array of row objects to validate instead of sample data
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
    },

    /// Show the column picker tree after hiding/showing nodes
    #[command(after_help = "\
Examples:
  pgrid columns --preset fund --hide Performance
  pgrid columns --preset fund --hide Performance --show \"Short Term\"")]
    Columns {
        #[arg(long, value_enum, default_value = "sales")]
        preset: Preset,

        /// Node label to hide (full path or last segment). Repeatable.
        #[arg(long, value_name = "LABEL")]
        hide: Vec<String>,

        /// Node label to show, applied after --hide. Repeatable.
        #[arg(long, value_name = "LABEL")]
        show: Vec<String>,
    },

    /// Print loaded rows after search and sort
    #[command(after_help = "\
Examples:
  pgrid view --search 玩具 --limit 5
  pgrid view --sort sales:desc --sort product
  pgrid view --preset fund --sort perf.ytd:desc")]
    View {
        #[arg(long, value_enum, default_value = "sales")]
        preset: Preset,

        /// Case-insensitive text matched against every visible column
        #[arg(long)]
        search: Option<String>,

        /// Sort key, repeatable; earlier keys take precedence
        #[arg(long, value_name = "BINDING[:desc]")]
        sort: Vec<String>,

        /// Rows to print
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Pages to load first
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Sample data seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Sales,
    Fund,
}

#[derive(Clone, Copy, ValueEnum)]
enum LocaleArg {
    Ja,
    En,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::Ja => Locale::Ja,
            LocaleArg::En => Locale::En,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  pagegrid-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose, cli.quiet));

    let result = load_settings(cli.config.as_deref(), cli.locale).and_then(|settings| match cli.command {
        Commands::Headers { preset, layout, json } => cmd_headers(preset, layout, json),
        Commands::Scroll { pages, page_size, max, seed } => {
            cmd_scroll(settings, pages, page_size, max, seed)
        }
        Commands::Validate { pages, json, seed, data } => cmd_validate(settings, pages, json, seed, data),
        Commands::Columns { preset, hide, show } => cmd_columns(&settings, preset, hide, show),
        Commands::View { preset, search, sort, limit, pages, seed } => {
            cmd_view(&settings, preset, search, sort, limit, pages, seed)
        }
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

    pub fn error(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Validation found errors; they were already printed.
    pub fn validation() -> Self {
        Self { code: EXIT_VALIDATION, message: String::new(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<LayoutError> for CliError {
    fn from(err: LayoutError) -> Self {
        CliError::error(err.to_string())
    }
}

// ============================================================================
// Shared setup
// ============================================================================

fn load_settings(path: Option<&Path>, locale: Option<LocaleArg>) -> Result<Settings, CliError> {
    let mut settings = match path {
        Some(path) => Settings::load_from(path)
            .map_err(|e| CliError::error(format!("{}: {}", path.display(), e)))?,
        None => Settings::load(),
    };
    if let Some(locale) = locale {
        settings.locale = locale.into();
    }
    log::debug!("settings: page size {}, max {}", settings.page_size, settings.max_records);
    Ok(settings)
}

fn preset_specs(preset: Preset) -> Vec<ColumnGroupSpec> {
    match preset {
        Preset::Sales => presets::sales_layout(),
        Preset::Fund => presets::fund_layout(),
    }
}

fn preset_source(preset: Preset, settings: &Settings, seed: u64) -> Box<dyn RecordSource> {
    match preset {
        Preset::Sales => Box::new(SampleSales::new(settings.max_records, seed)),
        Preset::Fund => Box::new(FundSample),
    }
}

fn read_layout(path: &Path) -> Result<Vec<ColumnGroupSpec>, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::error(format!("{}: {}", path.display(), e)))?;
    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    let specs = if is_toml {
        ColumnGroupSpec::from_toml_str(&text)?
    } else {
        ColumnGroupSpec::from_json(&text)?
    };
    Ok(specs)
}

/// Scroll to the bottom `pages` times, stopping early once the loader is done.
fn load_pages<S: RecordSource>(session: &mut GridSession<S>, pages: usize) -> usize {
    session.load_initial();
    let mut loaded = 1;
    for _ in 1..pages {
        let len = session.loader().len();
        if session.on_scroll(ViewportState::new(len.saturating_sub(1), len)).is_none() {
            break;
        }
        loaded += 1;
    }
    loaded
}

// ============================================================================
// headers
// ============================================================================

fn cmd_headers(preset: Preset, layout: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let specs = match layout {
        Some(path) => read_layout(&path)?,
        None => preset_specs(preset),
    };
    let compiled = pagegrid_engine::columns::compile(&specs)?;
    let merged = pagegrid_engine::columns::merge(&compiled.headers, &compiled.columns);

    if json {
        let header_rows: Vec<Vec<&str>> =
            (0..merged.grid.row_count()).map(|r| merged.grid.row_labels(r)).collect();
        let out = json!({
            "columns": compiled.columns,
            "header_rows": header_rows,
            "regions": merged.regions,
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| CliError::error(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    print!("{}", render::header_table(&merged, &compiled.columns));
    println!(
        "{} column(s), {} header row(s), {} merged region(s)",
        compiled.columns.len(),
        merged.grid.row_count(),
        merged.regions.iter().filter(|r| !r.range.is_single()).count()
    );
    Ok(())
}

// ============================================================================
// scroll
// ============================================================================

fn cmd_scroll(
    mut settings: Settings,
    pages: usize,
    page_size: Option<usize>,
    max: Option<usize>,
    seed: u64,
) -> Result<(), CliError> {
    if let Some(n) = page_size {
        if n == 0 {
            return Err(CliError::args("--page-size must be at least 1"));
        }
        settings.page_size = n;
    }
    if let Some(n) = max {
        settings.max_records = n;
    }

    let mut session = GridSession::sales(&settings, seed)?;
    let first = session.load_initial();
    println!("page 1: +{} row(s), total {} (generation {})", first.len(), first.len(), first.generation());

    for page in 2..=pages + 1 {
        let before = session.loader().len();
        let viewport = ViewportState::new(before.saturating_sub(1), before);
        match session.on_scroll(viewport) {
            Some(view) => println!(
                "page {}: +{} row(s), total {} (generation {})",
                page,
                view.len() - before,
                view.len(),
                view.generation()
            ),
            None => {
                println!("no more rows");
                break;
            }
        }
    }

    let loader = session.loader();
    println!(
        "loaded {} of {} row(s){}",
        loader.len(),
        loader.max_records(),
        if loader.is_complete() { ", complete" } else { "" }
    );
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(
    settings: Settings,
    pages: usize,
    json: bool,
    seed: u64,
    data: Option<PathBuf>,
) -> Result<(), CliError> {
    let source: Box<dyn RecordSource> = match data {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .map_err(|e| CliError::error(format!("{}: {}", path.display(), e)))?;
            let rows = VecSource::from_json(&text)
                .map_err(|e| CliError::error(format!("{}: {}", path.display(), e)))?;
            Box::new(rows)
        }
        None => Box::new(SampleSales::new(settings.max_records, seed)),
    };

    let mut session = GridSession::new(source, &settings, &presets::sales_layout())?;
    load_pages(&mut session, pages.max(1));

    let mut notices = NoticeLog::new();
    let outcome = session.save(&mut notices);
    let rows = session.loader().len();
    let index = session.errors();

    if json {
        let out = json!({
            "rows": rows,
            "valid": outcome == SaveOutcome::Saved,
            "errors": index.errors(),
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| CliError::error(e.to_string()))?;
        println!("{}", text);
    } else {
        if let Some(notice) = notices.last() {
            println!("{}", notice.message);
        }
        for line in session.error_panel_lines() {
            println!("  {}", line.text);
        }
        println!("{} row(s) checked", rows);
    }

    match outcome {
        SaveOutcome::Saved => Ok(()),
        SaveOutcome::Rejected { .. } => Err(CliError::validation()),
    }
}

// ============================================================================
// columns
// ============================================================================

fn cmd_columns(settings: &Settings, preset: Preset, hide: Vec<String>, show: Vec<String>) -> Result<(), CliError> {
    let mut session = GridSession::new(preset_source(preset, settings, 0), settings, &preset_specs(preset))?;

    let steps = hide.into_iter().map(|l| (l, false)).chain(show.into_iter().map(|l| (l, true)));
    for (label, visible) in steps {
        let path = session.find_column_node(&label).ok_or_else(|| {
            CliError::args(format!("no column node labelled {:?}", label))
                .with_hint("use a full path like \"Performance > Return\" or an unambiguous last segment")
        })?;
        session.toggle_column_visibility(&path, visible);
    }

    print!("{}", render::picker_tree(session.picker().roots()));
    let visible: Vec<&str> = session
        .layout()
        .visible_columns()
        .map(|(_, c)| c.binding.as_str())
        .collect();
    println!("visible: {}", visible.join(", "));
    Ok(())
}

// ============================================================================
// view
// ============================================================================

fn cmd_view(
    settings: &Settings,
    preset: Preset,
    search: Option<String>,
    sort: Vec<String>,
    limit: usize,
    pages: usize,
    seed: u64,
) -> Result<(), CliError> {
    let mut session = GridSession::new(preset_source(preset, settings, seed), settings, &preset_specs(preset))?;

    let mut keys = Vec::new();
    for raw in &sort {
        let key: SortKey = raw.parse().map_err(CliError::args)?;
        if session.layout().column(&key.binding).is_none() {
            return Err(CliError::args(format!("unknown sort binding {:?}", key.binding)));
        }
        keys.push(key);
    }

    load_pages(&mut session, pages.max(1));
    if let Some(text) = search {
        session.set_search(&text);
    }
    session.set_sort(keys);

    let columns: Vec<usize> = session.layout().visible_columns().map(|(i, _)| i).collect();
    let headers: Vec<&str> = columns
        .iter()
        .map(|&i| session.layout().columns[i].header.as_str())
        .collect();
    println!("{}", headers.join("\t"));

    let rows: Vec<usize> = session.visible_rows().visible_data_rows().take(limit).collect();
    for &row in &rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|&col| session.cell_text(row, col).unwrap_or_default())
            .collect();
        println!("{}", cells.join("\t"));
    }

    println!(
        "{} of {} row(s) shown, {} loaded",
        rows.len(),
        session.visible_rows().visible_count(),
        session.loader().len()
    );
    Ok(())
}
