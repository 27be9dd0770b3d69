use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tube_tutor::cli::{Cli, Commands};
use tube_tutor::config::Config;
use tube_tutor::server::{self, AppState};
use tube_tutor::tutor::AnalysisPipeline;
use tube_tutor::{output, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "tube_tutor=debug" } else { "tube_tutor=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Serve { host, port } => {
            // Check for required external dependencies (non-fatal in Docker)
            for dep in utils::check_dependencies(&config.transcript.yt_dlp_path).await {
                tracing::warn!("Missing dependency: {}", dep);
            }

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let ip: IpAddr = host
                .parse()
                .with_context(|| format!("Invalid listen address: {}", host))?;
            let addr = SocketAddr::new(ip, port.unwrap_or(config.server.port));

            let state = AppState::new(
                AnalysisPipeline::from_config(&config),
                config.server.index_path.clone(),
            );
            server::serve(state, addr).await?;
        }
        Commands::Analyze { url, output, format } => {
            let pipeline = AnalysisPipeline::from_config(&config);

            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
            );
            progress.set_message("Fetching subtitles and asking Gemini...");
            progress.enable_steady_tick(Duration::from_millis(120));

            let result = pipeline.analyze(&url).await;
            progress.finish_and_clear();
            let sheet = result?;

            match output {
                Some(path) => {
                    output::save_to_file(&sheet, &path, &format).await?;
                    println!("Study sheet saved to: {}", path.display());
                }
                None => output::print_to_console(&sheet, &format),
            }
        }
        Commands::Config { show } => {
            if !show {
                println!("Edit config.yaml (or <config dir>/tube-tutor/config.yaml) to change settings.");
            }
            config.display();
        }
    }

    Ok(())
}
