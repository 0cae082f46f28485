use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod export;
mod extract;
mod lookup;
mod model;
mod pipeline;

#[derive(Debug, Parser)]
#[command(about = "Locate the cell towers found in a radio state dump")]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging, repeat for trace output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract towers, write them to CSV and look up their location (default)
    Run {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the towers found in a dump as CSV without looking them up
    Extract { file: PathBuf },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "celldump=info",
        1 => "celldump=debug",
        _ => "celldump=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match cli.config.as_deref() {
        Some(path) => config::load(path)?,
        None => config::Config::default(),
    };

    match cli.command.unwrap_or(Command::Run {
        input: None,
        output: None,
    }) {
        Command::Run { input, output } => {
            if let Some(input) = input {
                config.input = input;
            }
            if let Some(output) = output {
                config.output = output;
            }
            pipeline::run(&config).await?;
        }
        Command::Extract { file } => {
            let towers = pipeline::extract_only(&file)?;
            info!("Found {} unique cell towers in {}", towers.len(), file.display());
            export::write_csv(io::stdout().lock(), &towers)?;
        }
    }

    Ok(())
}
