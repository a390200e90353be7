use clap::Parser;
use pmtlib::cache::Cache;
use pmtlib::migrate::{self, ResolverStrategy};
use pmtlib::registry::RegistryClient;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Pipeline Migration Tool
///
/// Discovers and applies Tekton task bundle migration scripts for a batch of
/// Renovate-produced upgrade records.
#[derive(Parser, Debug)]
#[command(name = "pmt")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file overriding the default locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Migrate pipeline definitions for a batch of task bundle upgrades.
    Migrate {
        /// Inline JSON array of Renovate upgrade records.
        #[arg(short = 'u', long = "renovate-upgrades", conflicts_with = "upgrades_file")]
        renovate_upgrades: Option<String>,

        /// Path to a file containing the upgrades JSON.
        #[arg(short = 'f', long = "upgrades-file", conflicts_with = "renovate_upgrades")]
        upgrades_file: Option<PathBuf>,

        /// Use the SimpleIteration resolver instead of the default LinkedMigrations one.
        #[arg(short = 'l', long = "use-legacy-resolver")]
        use_legacy_resolver: bool,
    },
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn read_upgrades_input(renovate_upgrades: Option<String>, upgrades_file: Option<PathBuf>) -> std::io::Result<String> {
    match (renovate_upgrades, upgrades_file) {
        (Some(inline), None) => Ok(inline),
        (None, Some(path)) => std::fs::read_to_string(path),
        _ => {
            eprintln!("exactly one of -u/--renovate-upgrades or -f/--upgrades-file must be given");
            std::process::exit(2);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = match pmtlib::Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Migrate {
            renovate_upgrades,
            upgrades_file,
            use_legacy_resolver,
        } => {
            let input = match read_upgrades_input(renovate_upgrades, upgrades_file) {
                Ok(s) => s,
                Err(e) => {
                    log::error!("failed to read upgrades input: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            let strategy = if use_legacy_resolver {
                ResolverStrategy::SimpleIteration
            } else {
                match cfg.default_resolver {
                    pmtlib::config::ResolverStrategy::Simple => ResolverStrategy::SimpleIteration,
                    pmtlib::config::ResolverStrategy::Linked => ResolverStrategy::Linked,
                }
            };

            if let Err(e) = run_migrate(&input, &cfg, strategy).await {
                log::error!("migration failed: {}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}

async fn run_migrate(input: &str, cfg: &pmtlib::Config, strategy: ResolverStrategy) -> pmtlib::Result<()> {
    let records = migrate::clean_upgrades(input)?;
    if records.is_empty() {
        log::info!("no task bundle upgrades to migrate");
        return Ok(());
    }

    let cache = Cache::new(cfg.cache_dir.clone())?;
    let registry = RegistryClient::new(cache, Duration::from_secs(cfg.registry_timeout_secs))?;
    let http = reqwest::Client::new();

    migrate::migrate(&records, &registry, &http, "https", strategy).await
}
