use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser};
use tracing_subscriber::EnvFilter;

use ota_catalog::build::OsVersion;
use ota_catalog::catalog::Query;
use ota_catalog::config::{self, AppConfig};
use ota_catalog::report::{ReportFormat, ReportOptions, Reporter};
use ota_catalog::source::{AssetSource, GdmfSource, PaginatedParams, open_feed};

#[derive(Parser)]
#[command(name = "ota-catalog")]
#[command(version, about = "Lists OTA firmware releases for a device as text or a wiki table")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device identifier, e.g. iPhone10,3
    #[arg(long)]
    device: String,

    /// Board model, required for devices whose releases differ per model
    #[arg(long)]
    model: Option<String>,

    /// Lowest OS version to list
    #[arg(long, value_parser = parse_version)]
    min: Option<OsVersion>,

    /// Highest OS version to list
    #[arg(long, value_parser = parse_version)]
    max: Option<OsVersion>,

    /// Include beta releases
    #[arg(long)]
    beta: bool,

    /// Drop placeholder releases
    #[arg(long)]
    remove_stubs: bool,

    /// Render a wiki table instead of text
    #[arg(long)]
    wiki: bool,

    /// Wrap wiki rows in heading, header and closing rows
    #[arg(long, requires = "wiki")]
    full_table: bool,

    /// Write logs to the data directory instead of stderr
    #[arg(long)]
    log_file: bool,

    /// Static feed: local path or mesu URL
    #[arg(long, conflicts_with = "pallas", required_unless_present = "pallas")]
    feed: Option<String>,

    #[command(flatten)]
    paginated: PaginatedArgs,
}

#[derive(Args)]
struct PaginatedArgs {
    /// Query the paginated asset service
    #[arg(long)]
    pallas: bool,

    #[arg(long, requires = "pallas", default_value = "")]
    start_build: String,

    #[arg(long, requires = "pallas", default_value = "")]
    start_version: String,

    #[arg(long, requires = "pallas")]
    requested_version: Option<String>,

    #[arg(long, requires = "pallas")]
    supervised: bool,

    /// Query Rapid Security Responses
    #[arg(long, requires = "pallas")]
    rsr: bool,
}

fn parse_version(value: &str) -> Result<OsVersion, String> {
    OsVersion::parse(value).ok_or_else(|| format!("invalid OS version: {value}"))
}

fn initialize_tracing(level: &str, log_file: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if log_file {
        let log_path = config::log_path();
        let directory = log_path.parent().map(PathBuf::from).unwrap_or_default();
        let file_name = log_path.file_name().map(PathBuf::from).unwrap_or_default();
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(writer)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

fn build_source(cli: &Cli, config: &AppConfig) -> anyhow::Result<Option<AssetSource>> {
    if cli.paginated.pallas {
        let args = &cli.paginated;
        let source = GdmfSource::new(&config.sources.gdmf_url, config.timeout())?;
        return Ok(Some(AssetSource::Query {
            source: Arc::new(source),
            params: PaginatedParams {
                start_build: args.start_build.clone(),
                start_version: args.start_version.clone(),
                requested_version: args.requested_version.clone(),
                supervised: args.supervised,
                rapid_security_response: args.rsr,
            },
        }));
    }

    cli.feed
        .as_deref()
        .map(|location| Ok(AssetSource::Feed(open_feed(location, config.timeout())?)))
        .transpose()
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let source = build_source(&cli, &config)?;
    let reporter = Reporter::from_config(&config)?;

    let query = Query {
        model: cli.model.clone(),
        minimum: cli.min.clone(),
        maximum: cli.max.clone(),
        show_beta: cli.beta,
        remove_stubs: cli.remove_stubs,
        ..Query::for_device(cli.device.as_str())
    };
    let options = ReportOptions {
        format: if cli.wiki {
            ReportFormat::Wiki
        } else {
            ReportFormat::Text
        },
        full_table: cli.full_table,
    };

    let report = reporter.run(&query, source.as_ref(), options).await?;
    print!("{report}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let _guard = initialize_tracing(&config.log_level, cli.log_file);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli, config))
}
