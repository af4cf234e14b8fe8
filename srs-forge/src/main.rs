use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use srs_forge::config::PipelineConfig;
use srs_forge::generator::GroqGenerator;
use srs_forge::pipeline::run_generation_pipeline;
use srs_forge::server::{serve, AppState};

#[derive(Parser)]
#[command(name = "srs-forge", about = "Generate FastAPI projects from SRS documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the generation pipeline over one .docx file
    Run {
        /// Path to the SRS .docx document
        #[arg(long)]
        srs: PathBuf,
    },
    /// Serve the HTTP upload endpoint
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0:8000")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = PipelineConfig::from_env()?;
    let generator = Arc::new(GroqGenerator::new(&config));

    match cli.command {
        Command::Run { srs } => {
            let state = run_generation_pipeline(config, generator, &srs).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Serve { bind } => {
            let state = Arc::new(AppState { config, generator });
            serve(state, &bind).await?;
        }
    }
    Ok(())
}
