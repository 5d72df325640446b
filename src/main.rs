//! Main entry point for the vscrape CLI

use anyhow::Context;
use clap::Parser;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vscrape::cli::{read_input, Cli, Command, OutputFormatter, VerbosityLevel};
use vscrape::config::Config;
use vscrape::core::{extract, unpack_blocking, DownloadRequest, Scraper};
use vscrape::utils::extract_video_id;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity_level();

    init_logging(verbosity)?;

    let config = cli.to_config(Config::from_env());
    debug!("Running {:?} with {:?}", cli.command, config);

    let mut formatter = OutputFormatter::new(verbosity);

    match cli.command.clone() {
        Command::Serve { .. } => {
            vscrape::server::serve(config).await?;
        }
        Command::Info { video } => {
            let video_id = extract_video_id(&video)?;
            let scraper = Scraper::new(config)?;
            let info = scraper.scrape(&video_id).await?;

            formatter.print_video_info(&info);
            println!("{}", serde_json::to_string_pretty(&*info)?);
        }
        Command::Download {
            video,
            source,
            name,
        } => {
            let start_time = Instant::now();
            let video_id = extract_video_id(&video)?;
            let scraper = Scraper::new(config)?;
            let request = DownloadRequest {
                source_index: source,
                file_name: name,
            };

            formatter.print_download_start(&video_id);
            formatter.create_progress_bar();
            let result = scraper
                .download(&video_id, &request, formatter.progress_callback())
                .await;

            match result {
                Ok(result) => {
                    formatter.finish_progress("Completed");
                    formatter.print_download_complete(&result, start_time.elapsed());
                    formatter.success(&format!("Available at {}", result.download_url));
                }
                Err(e) => {
                    formatter.error(&e.to_string());
                    return Err(e.into());
                }
            }
        }
        Command::Unpack { input } => {
            let packed = read_input(&input).with_context(|| format!("reading {}", input))?;
            if !vscrape::core::detect(&packed) {
                formatter.warning("Input does not look like packer output");
            }
            let source = unpack_blocking(config.engine, packed).await?;
            print!("{}", source);
        }
        Command::Extract { input } => {
            let packed = read_input(&input).with_context(|| format!("reading {}", input))?;
            let source = unpack_blocking(config.engine, packed).await?;
            let metadata = extract(&source);
            if metadata.is_empty() {
                formatter.warning("No player configuration found in the unpacked source");
            }
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }

    info!("Done");
    Ok(())
}

/// Initialize logging system
fn init_logging(verbosity: VerbosityLevel) -> anyhow::Result<()> {
    let log_level = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "info",
        VerbosityLevel::Verbose => "debug",
    };

    // RUST_LOG wins over the verbosity flags
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .try_init()
        .context("initializing logging")?;

    Ok(())
}
