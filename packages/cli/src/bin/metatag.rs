use clap::{Parser, Subcommand};
use colored::*;
use metatag_cli::{init_tracing, migrate, run_server};
use metatag_config::Settings;
use std::process;

#[derive(Parser)]
#[command(name = "metatag")]
#[command(about = "Metatag - tag groups, tags and entity tagging over HTTP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut settings = Settings::load()?;
    init_tracing(&settings.log_level);

    match command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                settings.port = port;
            }
            run_server(settings).await
        }
        Commands::Migrate => migrate(&settings).await,
    }
}
