use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use rentreport::config::{
    config_dir, load_config, load_session, resolve_output_dir, save_session, Config, Session,
    CONFIG_TEMPLATE,
};
use rentreport::export::document::{meta_lines, summary_lines};
use rentreport::export::{extract_table, Extraction, NO_DATA_MESSAGE, NO_REPORT_MESSAGE};
use rentreport::report::DateRange;
use rentreport::{
    BrandingCache, CustomReportRequest, ExportFormat, ExportRenderer, ExportRequest, Filters,
    HttpApi, Report, ReportAggregator, ReportError, ReportRef, ReportType, Result,
};

#[derive(Parser)]
#[command(name = "rentreport")]
#[command(
    version,
    about = "Property management reports with branded PDF, Excel and CSV export",
    long_about = None
)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.rentreport)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Backend base URL, overrides [api].base_url
    #[arg(long, env = "RENTREPORT_API_URL", global = true)]
    api_url: Option<String>,

    /// Bearer token, overrides [api].token
    #[arg(long, env = "RENTREPORT_API_TOKEN", global = true, hide_env_values = true)]
    api_token: Option<String>,

    /// Log requests and cache decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Generate a report (financial, occupancy, payment or revenue)
    Generate {
        /// Report type
        report_type: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Generate a custom report from a title, description and filters
    Custom {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Data source the report draws from
        #[arg(long = "type", value_name = "TYPE")]
        source: Option<String>,

        /// Extra filter sent to the backend (can be repeated)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        extra: Vec<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show the current report
    Show,

    /// List historical reports with counts by type
    List {
        /// Re-fetch the list even if it was loaded before
        #[arg(long)]
        refresh: bool,
    },

    /// Export the current report as pdf, excel or csv
    Export {
        /// Output format
        format: String,

        /// Label and tabulate the report as this type
        #[arg(long = "type", value_name = "TYPE", conflicts_with = "report")]
        report_type: Option<String>,

        /// Export only if the current report has this id
        #[arg(long, value_name = "ID")]
        report: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Directory to write the file into (default: [export].output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Open the exported file with the system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Show company branding used on exports
    Company {
        /// Drop the cached entry and fetch again
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Reporting period, e.g. monthly or quarterly
    #[arg(long)]
    period: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Restrict to one property
    #[arg(long = "property", value_name = "ID")]
    property_id: Option<String>,

    /// Grouping key passed to the backend
    #[arg(long)]
    group_by: Option<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> Result<Filters> {
        Ok(Filters {
            period: self.period.clone(),
            start_date: self.from.as_deref().map(parse_date).transpose()?,
            end_date: self.to.as_deref().map(parse_date).transpose()?,
            property_id: self.property_id.clone(),
            group_by: self.group_by.clone(),
        })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ReportError::InvalidDate(raw.to_string()))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    if matches!(cli.command, Commands::Init) {
        return cmd_init(&cfg_dir);
    }

    if !cfg_dir.exists() {
        return Err(ReportError::ConfigNotFound(cfg_dir));
    }
    let mut config = load_config(&cfg_dir)?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(token) = cli.api_token {
        config.api.token = Some(token);
    }

    let mut session = load_session(&cfg_dir)?;
    let api = HttpApi::new(&config.api);
    let branding = BrandingCache::new(Duration::from_secs(config.branding.cache_ttl_secs));
    branding.restore(session.branding.take());

    let ctx = Context {
        cfg_dir: &cfg_dir,
        config: &config,
        api: &api,
        branding: &branding,
    };

    let result = match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Generate {
            report_type,
            filters,
        } => cmd_generate(&ctx, &mut session, &report_type, &filters),
        Commands::Custom {
            title,
            description,
            source,
            extra,
            filters,
        } => cmd_custom(&ctx, &mut session, title, description, source, &extra, &filters),
        Commands::Show => cmd_show(&ctx, &session),
        Commands::List { refresh } => cmd_list(&ctx, &mut session, refresh),
        Commands::Export {
            format,
            report_type,
            report,
            filters,
            output_dir,
            open,
        } => cmd_export(
            &ctx,
            &mut session,
            &format,
            report_type.as_deref(),
            report,
            &filters,
            output_dir,
            open,
        ),
        Commands::Company { refresh } => cmd_company(&ctx, refresh),
    };

    // Failures are part of the session too (error message, cleared report)
    session.branding = branding.snapshot();
    save_session(&cfg_dir, &session)?;
    result
}

struct Context<'a> {
    cfg_dir: &'a Path,
    config: &'a Config,
    api: &'a HttpApi,
    branding: &'a BrandingCache,
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(ReportError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("exports"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized rentreport config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point it at your backend:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Generate a report:         rentreport generate financial --period monthly");
    println!("  3. Export it:                 rentreport export pdf");

    Ok(())
}

/// Run the aggregator for one report type and print the result
fn cmd_generate(
    ctx: &Context,
    session: &mut Session,
    report_type: &str,
    args: &FilterArgs,
) -> Result<()> {
    let report_type: ReportType = report_type.parse()?;
    if report_type == ReportType::Custom {
        return Err(ReportError::CustomNeedsTitle);
    }
    let filters = args.to_filters()?;
    remember_filters(session, &filters);

    let aggregator = ReportAggregator::new(ctx.api);
    match aggregator.generate_report(&mut session.store, report_type, &filters) {
        Some(report) => {
            println!("Generated {} ({})", report.title, report.id);
            println!();
            print_report(&report, &ctx.config.export.currency_symbol);
            Ok(())
        }
        None => Err(generation_error(session)),
    }
}

fn cmd_custom(
    ctx: &Context,
    session: &mut Session,
    title: String,
    description: Option<String>,
    source: Option<String>,
    extra: &[String],
    args: &FilterArgs,
) -> Result<()> {
    let filters = args.to_filters()?;
    remember_filters(session, &filters);

    let mut fields = Map::new();
    for (key, value) in filters.query_pairs() {
        fields.insert(key.to_string(), Value::String(value));
    }
    for raw in extra {
        let (key, value) = raw
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| ReportError::InvalidFilter(raw.clone()))?;
        fields.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
    }

    let request = CustomReportRequest {
        title,
        description,
        source,
        filters: fields,
    };

    let aggregator = ReportAggregator::new(ctx.api);
    match aggregator.generate_custom_report(&mut session.store, &request) {
        Some(report) => {
            println!("Generated {} ({})", report.title, report.id);
            println!();
            print_report(&report, &ctx.config.export.currency_symbol);
            Ok(())
        }
        None => Err(generation_error(session)),
    }
}

fn remember_filters(session: &mut Session, filters: &Filters) {
    let range = match (filters.start_date, filters.end_date) {
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        _ => None,
    };
    session.store.set_date_range(range);
    session.store.set_filters(filters.clone());
}

fn generation_error(session: &Session) -> ReportError {
    ReportError::Generation(
        session
            .store
            .error()
            .unwrap_or("Report generation failed")
            .to_string(),
    )
}

/// Show the current report from the session
fn cmd_show(ctx: &Context, session: &Session) -> Result<()> {
    if let Some(error) = session.store.error() {
        eprintln!("Last error: {error}");
    }

    match session.store.current_report() {
        Some(report) => {
            println!("{} ({})", report.title, report.id);
            println!();
            print_report(report, &ctx.config.export.currency_symbol);
            Ok(())
        }
        None => Err(ReportError::NoReport(NO_REPORT_MESSAGE.to_string())),
    }
}

fn print_report(report: &Report, currency_symbol: &str) {
    for line in meta_lines(report.generated_at, &report.filters) {
        println!("{line}");
    }
    if let Some(description) = report.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{description}");
    }
    println!();

    let table = extract_table(
        report.report_type(),
        &report.payload,
        Extraction::WithGenericFallback,
    );
    if table.is_empty() {
        println!("{NO_DATA_MESSAGE}");
    } else {
        let mut builder = Builder::default();
        builder.push_record(table.headers.clone());
        for row in table.display_rows() {
            builder.push_record(row);
        }
        println!("{}", builder.build().with(Style::rounded()));
    }

    let summary = report
        .payload
        .summary()
        .map(|s| summary_lines(&s, currency_symbol))
        .unwrap_or_default();
    if !summary.is_empty() {
        println!();
        println!("Summary:");
        for line in summary {
            println!("  {}: {}", line.label, line.value);
        }
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "TYPE")]
    report_type: String,
    #[tabled(rename = "TITLE")]
    title: String,
    #[tabled(rename = "CREATED")]
    created: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "TYPE")]
    report_type: String,
    #[tabled(rename = "COUNT")]
    count: usize,
}

/// List historical reports
fn cmd_list(ctx: &Context, session: &mut Session, refresh: bool) -> Result<()> {
    ReportAggregator::new(ctx.api).load_reports(&mut session.store, refresh)?;

    let reports = session.store.reports();
    if reports.is_empty() {
        println!("No reports found.");
        return Ok(());
    }

    let rows: Vec<ReportRow> = reports
        .iter()
        .enumerate()
        .map(|(i, r)| ReportRow {
            index: i + 1,
            id: match &r.id {
                Value::String(s) => s.clone(),
                Value::Null => "-".to_string(),
                other => other.to_string(),
            },
            report_type: r.report_type.clone(),
            title: r.title.clone(),
            created: r
                .created_at
                .as_deref()
                .map(rentreport::format::format_display_date)
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    let stats = session.store.stats();
    let counts: Vec<CountRow> = stats
        .by_type
        .into_iter()
        .map(|(report_type, count)| CountRow { report_type, count })
        .collect();
    println!();
    println!("{}", Table::new(counts).with(Style::rounded()));
    println!("Total: {}", stats.total);

    Ok(())
}

/// Export the current report and write it to the export directory
#[allow(clippy::too_many_arguments)]
fn cmd_export(
    ctx: &Context,
    session: &mut Session,
    format: &str,
    report_type: Option<&str>,
    report_id: Option<String>,
    args: &FilterArgs,
    output_dir: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let report = match (report_id, report_type) {
        (Some(id), _) => ReportRef::Id(id),
        (None, Some(t)) => ReportRef::Type(t.parse()?),
        (None, None) => ReportRef::Current,
    };
    let request = ExportRequest::new(format, report).with_filters(args.to_filters()?);

    let renderer = ExportRenderer::new(ctx.api, ctx.branding)
        .with_currency_symbol(ctx.config.export.currency_symbol.clone());

    let Some(artifact) = renderer.export_report(&mut session.store, &request)? else {
        let message = session.store.error().unwrap_or(NO_REPORT_MESSAGE).to_string();
        return Err(ReportError::NoReport(message));
    };

    let dir = output_dir
        .unwrap_or_else(|| resolve_output_dir(&ctx.config.export.output_dir, ctx.cfg_dir));
    let path = artifact.save(&dir)?;
    println!("Exported {}", path.display());

    if open {
        open_path(&path)?;
    }
    Ok(())
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "FIELD")]
    field: &'static str,
    #[tabled(rename = "VALUE")]
    value: String,
}

/// Show branding through the cache
fn cmd_company(ctx: &Context, refresh: bool) -> Result<()> {
    if refresh {
        ctx.branding.clear_cache();
    }
    let company = ctx.branding.get_company_info(ctx.api);

    let rows = vec![
        FieldRow {
            field: "Name",
            value: company.name.clone(),
        },
        FieldRow {
            field: "Email",
            value: company.email.clone(),
        },
        FieldRow {
            field: "Phone",
            value: company.phone.clone(),
        },
        FieldRow {
            field: "Address",
            value: company.address.clone(),
        },
        FieldRow {
            field: "Logo",
            value: company.logo_url().unwrap_or("-").to_string(),
        },
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));

    if let Some(cached) = ctx.branding.snapshot() {
        println!(
            "Fetched at {}",
            cached.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}

fn open_path(path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(path)
            .spawn()?;
    }
    Ok(())
}
