mod cmd;
mod config;
mod error;
mod plan;

use std::fmt;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct Elapsed(Instant);

impl FormatTime for Elapsed {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let d = self.0.elapsed();
        let total_secs = d.as_secs();
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        let millis = d.subsec_millis();
        write!(w, "[{mins:02}:{secs:02}:{millis:03}]")
    }
}

#[derive(Parser)]
#[command(name = "provisioner", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print resolved VM specs and the feature set
    Resolve(cmd::ResolveArgs),
    /// Write one boot script per VM
    Render(cmd::RenderArgs),
    /// Print network, firewall and instance declarations
    Plan(cmd::PlanArgs),
    /// List catalogue sections and whether each is included for a VM
    Sections(cmd::SectionsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    // stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_timer(Elapsed(Instant::now()))
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Resolve(args) => cmd::run_resolve(args).await,
        Command::Render(args) => cmd::run_render(args).await,
        Command::Plan(args) => cmd::run_plan(args).await,
        Command::Sections(args) => cmd::run_sections(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
