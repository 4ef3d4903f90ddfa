// src/main.rs

use article2notion::config::{log_level_from_env, CommandLineInput, MigrationConfig};
use article2notion::error::AppError;
use article2notion::{
    input, ArticleExtractor, BatchReport, DefaultTemplate, EntryOutcome, HttpFetcher,
    MediaRehoster, MigrationPipeline, NormalizeOptions, NotionHttpClient, S3ObjectStore,
};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(log_level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    let log_file_path = std::env::temp_dir().join("article2notion.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if log_level >= LevelFilter::Debug {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}"
    } else {
        "{d(%H:%M:%S)} [{l}] - {m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("stderr", Box::new(stderr_appender)),
        )
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level.max(LevelFilter::Debug)),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Wires every component from the resolved configuration and runs one batch.
async fn run_migration(config: MigrationConfig) -> Result<BatchReport, AppError> {
    let rows = input::read_rows(&config.input, config.content_type)?;
    log::info!(
        "Migrating {} as {} into {} collection database(s)",
        config.input.display(),
        config.content_type,
        config.databases.collections().count()
    );

    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout, config.max_media_bytes)?);
    let store = Arc::new(S3ObjectStore::new(&config.storage));
    let rehoster = MediaRehoster::new(fetcher.clone(), store, config.media_config());

    let extractor = ArticleExtractor::new(
        fetcher,
        Arc::new(DefaultTemplate::default()),
        rehoster.clone(),
        NormalizeOptions::default(),
    );

    let records = Arc::new(NotionHttpClient::new(
        &config.api_key,
        config.databases.clone(),
        config.properties.clone(),
        config.fetch_timeout,
    )?);

    let pipeline = MigrationPipeline::new(extractor, rehoster, records, config.pipeline_settings());
    Ok(pipeline.run(rows).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CommandLineInput::parse();
    dotenvy::dotenv().ok();

    if let Err(e) = setup_logging(log_level_from_env()) {
        eprintln!("Could not initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match MigrationConfig::resolve(cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_migration(config).await {
        Ok(report) => {
            for entry in report.failures() {
                if let EntryOutcome::Failed { stage, cause } = &entry.outcome {
                    log::warn!(
                        "Row {} ({}) failed during {}: {}",
                        entry.row,
                        entry.source_url,
                        stage,
                        cause
                    );
                }
            }
            println!("{}", report.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
