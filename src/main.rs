use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use drbdmon::app;
use drbdmon::config::{Config, TuiMode};

/// Statistics for DRBD.
#[derive(Parser)]
#[command(name = "drbdmon", about, disable_version_flag = true)]
struct Cli {
    /// Path to a file containing output gathered from polling
    /// 'drbdsetup events2 --timestamps --statistics --now'.
    #[arg(short, long, value_name = "/path/to/file")]
    file: Option<PathBuf>,

    /// Time to wait between updating DRBD status, minimum 400ms.
    /// Valid units are 'ns', 'us', 'ms', 's', 'm', 'h'.
    #[arg(short, long, default_value = "1s")]
    interval: String,

    /// Set the TUI style.
    #[arg(short, long, value_enum, default_value = "interactive")]
    tui: TuiMode,

    /// Enable expert mode (does not prompt for confirmation).
    #[arg(short, long)]
    expert: bool,

    /// Print version information and exit.
    #[arg(short = 'v', long)]
    version: bool,
}

/// Build-time version info.
mod version {
    /// Release version string (set at build time).
    pub const RELEASE: &str = env!("CARGO_PKG_VERSION");

    /// Full version string with platform info.
    pub fn full() -> String {
        format!(
            "{} ({}/{})",
            RELEASE,
            std::env::consts::OS,
            std::env::consts::ARCH,
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("drbdmon {}", version::full());
        return Ok(());
    }

    // Logs go to stderr so they don't tear the rendered frames; raise
    // RUST_LOG for diagnostics.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (cfg, reports) = Config::resolve(cli.file, &cli.interval, cli.tui, cli.expert);

    tracing::info!(version = version::RELEASE, "starting drbdmon");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    rt.block_on(app::run(cfg, reports))
}
