use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod analyze;
mod chunker;
mod llm;
mod split;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "docsplit", about = "Paragraph-aware text splitting and LLM analysis CLI")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Split(split::SplitCmd),
    Analyze(analyze::AnalyzeCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and DOCSPLIT_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Split(args) => split::run(args).await?,
        Commands::Analyze(args) => analyze::run(args).await?,
    }

    Ok(())
}
