mod config;
mod diff;
mod fanout;
mod inventory;
mod processor;
mod render;
mod xc;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use config::Config;
use inventory::{Inventory, SiteRecord};
use processor::ProcessorCtx;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use xc::client::XcClient;

/// Query F5 XC sites and the objects referencing them
#[derive(Parser, Debug)]
#[command(name = "xcsites", version, about, long_about = None)]
struct Args {
    /// Namespace to process (all namespaces when unset)
    #[arg(short, long)]
    namespace: Option<String>,

    /// F5 XC API URL
    #[arg(short, long)]
    apiurl: Option<String>,

    /// F5 XC API token
    #[arg(short, long)]
    token: Option<String>,

    /// Only process this site
    #[arg(short, long)]
    site: Option<String>,

    /// Maximum concurrent detail requests
    #[arg(short, long, default_value_t = 10)]
    workers: usize,

    /// Query the API and write a snapshot (default mode)
    #[arg(long)]
    query: bool,

    /// Compare a site between two snapshot files
    #[arg(long)]
    compare: bool,

    /// Render the object inventory of a snapshot file
    #[arg(long)]
    build_inventory: bool,

    /// Snapshot file to write (query) or read (build-inventory); `-` for stdout
    #[arg(short, long, default_value = "xcsites.json")]
    file: String,

    /// Snapshot file holding the older site state
    #[arg(long)]
    old_site_file: Option<PathBuf>,

    /// Snapshot file holding the newer site state
    #[arg(long)]
    new_site_file: Option<PathBuf>,

    /// Site name in the older snapshot (defaults to --site)
    #[arg(long)]
    old_site: Option<String>,

    /// Site name in the newer snapshot (defaults to --site)
    #[arg(long)]
    new_site: Option<String>,

    /// Write the comparison table to this CSV file
    #[arg(long)]
    diff_file_csv: Option<PathBuf>,

    /// Write the object inventory to this CSV file
    #[arg(long)]
    inventory_file_csv: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Log to stdout instead of the log file
    #[arg(long)]
    log_stdout: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    to_stdout: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    if to_stdout {
        tracing_subscriber::fmt()
            .with_max_level(tracing_level)
            .with_target(false)
            .init();
        return None;
    }

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Failed to open log file {}: {}", log_path.display(), err);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("xcsites started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("xcsites").join("xcsites.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".xcsites").join("xcsites.log");
    }
    PathBuf::from("xcsites.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_stdout);

    if args.query && (args.compare || args.build_inventory) {
        Args::command().print_help()?;
        bail!("--query conflicts with --compare and --build-inventory");
    }

    let result = if args.compare {
        run_compare(&args)
    } else if args.build_inventory {
        run_build_inventory(&args)
    } else {
        run_query(&args).await
    };

    if let Err(err) = result {
        tracing::error!("{:#}", err);
        eprintln!("{}", xc::http::format_api_error(&err));
        drop(_log_guard);
        std::process::exit(1);
    }
    Ok(())
}

/// Default mode: poll the tenant, build the tree, write the snapshot
async fn run_query(args: &Args) -> Result<()> {
    let mut config = Config::load();
    let api_url = config.effective_api_url(args.apiurl.as_deref());
    let api_token = config.effective_api_token(args.token.as_deref());

    let (Some(api_url), Some(api_token)) = (api_url, api_token) else {
        Args::command().print_help()?;
        bail!(
            "missing credentials: set {}/{} or pass --apiurl/--token",
            config::ENV_API_URL,
            config::ENV_API_TOKEN
        );
    };

    let client = XcClient::new(&api_url, &api_token)?;
    tracing::info!(
        "API URL: {} -- Processing Namespace: {}",
        api_url,
        args.namespace.as_deref().unwrap_or("ALL")
    );

    let mut inv = Inventory::default();
    inv.namespaces = discover_namespaces(&client, args.namespace.as_deref()).await?;
    tracing::info!("Processing {} namespace(s)", inv.namespaces.len());

    // Credentials passed on the command line are known good at this
    // point; remember them for the next run.
    if args.apiurl.is_some() && args.token.is_some() {
        if let Err(err) = config.set_credentials(&api_url, &api_token) {
            tracing::warn!("could not save credentials: {:#}", err);
        }
    }

    let cx = ProcessorCtx {
        client,
        site_filter: args.site.clone(),
        workers: args.workers,
    };
    processor::run_all(&cx, &mut inv).await?;

    inventory::snapshot::write(&inv, &args.file)?;

    Ok(())
}

/// Validate the requested namespace, or list them all. A failure here
/// means the credentials or the tenant URL are wrong, so it is fatal.
async fn discover_namespaces(client: &XcClient, namespace: Option<&str>) -> Result<Vec<String>> {
    match namespace {
        Some(namespace) => {
            client
                .get(&client.namespace_uri(namespace))
                .await
                .with_context(|| format!("validating namespace {}", namespace))?;
            Ok(vec![namespace.to_string()])
        }
        None => {
            let items = client
                .list(&client.namespaces_uri())
                .await
                .context("discovering namespaces")?;
            Ok(items
                .iter()
                .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
                .map(String::from)
                .collect())
        }
    }
}

/// Compare one site between two snapshots and print the change table
fn run_compare(args: &Args) -> Result<()> {
    let (Some(old_file), Some(new_file)) = (&args.old_site_file, &args.new_site_file) else {
        Args::command().print_help()?;
        bail!("--compare needs --old-site-file and --new-site-file");
    };

    let old_name = args.old_site.as_deref().or(args.site.as_deref());
    let new_name = args.new_site.as_deref().or(args.site.as_deref());
    let (Some(old_name), Some(new_name)) = (old_name, new_name) else {
        Args::command().print_help()?;
        bail!("--compare needs --site (or --old-site/--new-site)");
    };

    let old_inv = inventory::snapshot::read(old_file)?;
    let new_inv = inventory::snapshot::read(new_file)?;

    let old_rec = find_site(&old_inv, old_name)
        .with_context(|| format!("site {} not found in {}", old_name, old_file.display()))?;
    let new_rec = find_site(&new_inv, new_name)
        .with_context(|| format!("site {} not found in {}", new_name, new_file.display()))?;

    // A kind mismatch refuses the comparison but is not an error;
    // there is simply nothing to show.
    let Some(changes) = diff::compare_sites(old_rec, new_rec)? else {
        println!(
            "sites {} and {} are of incompatible kinds ({} vs {}), nothing to compare",
            old_name, new_name, old_rec.kind, new_rec.kind
        );
        return Ok(());
    };

    let table = render::diff_table(&changes);
    println!("{}", table.text());

    if let Some(csv_file) = &args.diff_file_csv {
        std::fs::write(csv_file, table.csv())
            .with_context(|| format!("writing {}", csv_file.display()))?;
        tracing::info!("comparison written to {}", csv_file.display());
    }

    Ok(())
}

fn find_site<'a>(inv: &'a Inventory, name: &str) -> Option<&'a SiteRecord> {
    inv.sites.get(name).or_else(|| inv.virtual_sites.get(name))
}

/// Render the object inventory of one snapshot
fn run_build_inventory(args: &Args) -> Result<()> {
    let inv = inventory::snapshot::read(&args.file)?;
    let table = render::inventory_table(&inv);
    println!("{}", table.text());

    if let Some(csv_file) = &args.inventory_file_csv {
        std::fs::write(csv_file, table.csv())
            .with_context(|| format!("writing {}", csv_file.display()))?;
        tracing::info!("inventory written to {}", csv_file.display());
    }

    Ok(())
}
