use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;

mod backup;
mod collect;
mod config;
mod detail;
mod output;
mod pacing;
mod record;
mod report;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "kpi", about = "SNS keyword KPI collector")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Collect(collect::CollectCmd),
    Detail(detail::DetailCmd),
    Report(report::ReportCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // stderr logging; respects RUST_LOG and KPI_LOG_FORMAT
    telemetry::config::init_tracing();
    let cfg = config::AppConfig::from_env();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing current item and stopping");
            on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Collect(args) => collect::run(&cfg, args, cancel).await?,
        Commands::Detail(args) => detail::run(&cfg, args, cancel).await?,
        Commands::Report(args) => report::run(&cfg, args).await?,
    }

    Ok(())
}
