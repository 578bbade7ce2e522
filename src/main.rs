// src/main.rs
mod cli;

use std::path::Path;

use clap::Parser;
use cli::Args;

use hoopsnap::config::Config;
use hoopsnap::error::AppError;
use hoopsnap::ingest::IngestPipeline;
use hoopsnap::logging::setup_logging;
use hoopsnap::snapshot::{SnapshotWriter, load_fixture_dir};
use hoopsnap::store::DomainStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    if args.get_only && args.load_only {
        return Err(AppError::config_error(
            "Cannot use both --get-only and --load-only simultaneously",
        ));
    }

    // Handle configuration operations before any logging or network setup
    if args.list_config {
        Config::display().await?;
        return Ok(());
    }

    if args.new_api_domain.is_some() || args.new_log_file_path.is_some() || args.clear_log_file_path
    {
        let mut config = Config::load().await.unwrap_or_default();

        if let Some(new_domain) = args.new_api_domain {
            config.api_domain = new_domain;
        }

        if let Some(new_log_path) = args.new_log_file_path {
            config.log_file_path = Some(new_log_path);
        } else if args.clear_log_file_path {
            config.log_file_path = None;
            println!("Custom log file path cleared. Using default location.");
        }

        config.save().await?;
        println!("Config updated successfully!");
        return Ok(());
    }

    let (log_file_path, _guard) = setup_logging(args.log_file.as_ref(), args.debug).await?;
    tracing::info!("Logs are being written to: {log_file_path}");

    let mut config = Config::load().await?;
    if let Some(database_path) = args.database_path {
        config.database_path = database_path;
    }

    let fixtures_dir = Path::new(&args.fixtures_dir);

    if args.load_only {
        // Bulk load previously written fixtures; no upstream calls
        let snapshot = load_fixture_dir(fixtures_dir, &args.season).await?;
        let store = DomainStore::connect(&config.database_path).await?;
        let counts = SnapshotWriter::new(&store).write(&snapshot).await?;
        println!(
            "Loaded fixtures for {}: {} rows persisted",
            args.season,
            counts.total()
        );
        return Ok(());
    }

    let database_path = config.database_path.clone();
    let pipeline = IngestPipeline::new(config, args.season.as_str())?;

    if args.get_only {
        let (snapshot, reports) = pipeline.run_fixtures(fixtures_dir).await?;
        for report in &reports {
            println!("{report}");
        }
        println!(
            "Wrote fixtures for {} ({} teams, {} players, {} games) to {}",
            snapshot.season,
            snapshot.teams.len(),
            snapshot.players.len(),
            snapshot.games.len(),
            fixtures_dir.display()
        );
        return Ok(());
    }

    let store = DomainStore::connect(&database_path).await?;
    let report = pipeline.run(&store).await?;
    for table in &report.tables {
        println!("{table}");
    }
    println!(
        "Ingestion run for {} complete: {} rows persisted",
        report.season,
        report.persisted.total()
    );

    Ok(())
}
