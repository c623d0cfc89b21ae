use std::sync::Arc;

use color_eyre::Result;
use prompt_gallery::adapters::FileSessionStore;
use prompt_gallery::backend::RestBackend;
use prompt_gallery::cli::{parse_args, report, run_cli_command, version_line, CliCommand, USAGE};
use prompt_gallery::config::GalleryConfig;
use prompt_gallery::gallery::Gallery;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "prompt_gallery=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    // Handle --version and --help before touching configuration
    match command {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        _ => {}
    }

    let config = GalleryConfig::from_env().map_err(report)?;
    let backend = RestBackend::from_config(&config).map_err(report)?;
    let store = match &config.session_file {
        Some(path) => FileSessionStore::with_path(path.clone()),
        None => FileSessionStore::new().map_err(|e| report(e.into()))?,
    };

    let mut gallery = Gallery::new(Arc::new(backend), Box::new(store), &config);
    gallery.start().await;
    run_cli_command(command, &mut gallery).await
}
