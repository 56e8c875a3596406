// effcalc-server - serves the calculator bundle
// Listens on $PORT (default 3000); unmatched routes get index.html.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use effcalc_config::{ConfigError, RawSettings, ServerSettings};
use effcalc_server::{ServerError, StaticServer};
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_USAGE: u8 = 2;
/// Listen address could not be bound.
const EXIT_SERVER_BIND: u8 = 20;
/// Static bundle directory does not exist.
const EXIT_STATIC_DIR_MISSING: u8 = 21;

#[derive(Parser)]
#[command(name = "effcalc-server")]
#[command(about = "Serve the efficiency calculator bundle (SPA fallback, gzip)")]
#[command(version)]
#[command(after_help = "\
Examples:
  effcalc-server
  PORT=8080 effcalc-server --static-dir ./dist
  effcalc-server --no-compression --max-connections 32
  effcalc-server --print-config")]
struct Args {
    /// Listen port (empty = 3000)
    #[arg(long, env = "PORT")]
    port: Option<String>,

    /// Directory holding the built bundle
    #[arg(long, env = "EFFCALC_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Concurrent connection cap, or 'max' to scale with cores
    #[arg(long, env = "EFFCALC_MAX_CONNECTIONS")]
    max_connections: Option<String>,

    /// Send every response uncompressed
    #[arg(long)]
    no_compression: bool,

    /// Print the resolved settings as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // The fmt subscriber also forwards `log` records.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let raw = RawSettings {
        port: args.port,
        static_dir: args.static_dir,
        max_connections: args.max_connections,
        no_compression: args.no_compression,
    };

    let code = match run(raw, args.print_config) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            e.exit_code()
        }
    };
    ExitCode::from(code)
}

fn run(raw: RawSettings, print_config: bool) -> Result<(), RunError> {
    let settings = ServerSettings::from_raw(raw)?;

    if print_config {
        println!("{}", settings.to_json()?);
        return Ok(());
    }

    settings.validate()?;
    if !settings.index_path().is_file() {
        log::warn!(
            "{} not found; unmatched routes will return 404",
            settings.index_path().display()
        );
    }

    let mut server = StaticServer::new();
    server.start(settings)?;
    server.wait()?;
    Ok(())
}

enum RunError {
    Config(ConfigError),
    Server(ServerError),
}

impl RunError {
    fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(ConfigError::StaticDirMissing(_)) => EXIT_STATIC_DIR_MISSING,
            RunError::Config(ConfigError::Serialize(_)) => EXIT_ERROR,
            RunError::Config(_) => EXIT_USAGE,
            RunError::Server(ServerError::Bind { .. }) => EXIT_SERVER_BIND,
            RunError::Server(_) => EXIT_ERROR,
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Config(e) => write!(f, "{}", e),
            RunError::Server(e) => write!(f, "{}", e),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}

impl From<ServerError> for RunError {
    fn from(e: ServerError) -> Self {
        RunError::Server(e)
    }
}
