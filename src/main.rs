/*!
 * Webinator CLI - Command Line Interface
 */

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use webinator::{
    config::{ErrorMode, LogLevel, SyncConfig},
    error::{Result, EXIT_PARTIAL, EXIT_SUCCESS},
    logging,
    protocol::s3::{is_valid_bucket_name, S3Client, S3Config},
    protocol::StoreError,
    region, Manifest, SyncReport, Syncer,
};

#[derive(Parser)]
#[command(name = "webinator")]
#[command(version, about = "Incremental static-site deployment to S3", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long = "log-level", value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write logs to this file as JSON
    #[arg(long = "log", value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(flatten)]
    s3: S3Args,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct S3Args {
    /// AWS region of the bucket
    #[arg(long, global = true)]
    region: Option<String>,

    /// Custom S3 endpoint (MinIO, LocalStack, ...)
    #[arg(long, value_name = "URL", global = true)]
    endpoint: Option<String>,

    /// AWS profile name
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, global = true)]
    path_style: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload new and changed files from a directory to a bucket
    Sync {
        /// Local directory to publish
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Destination bucket
        #[arg(value_name = "BUCKET")]
        bucket: String,

        /// Concurrent file workers
        #[arg(short = 'w', long)]
        workers: Option<usize>,

        /// Stop at the first failed file
        #[arg(long)]
        fail_fast: bool,

        /// Report decisions without uploading
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Additional file-name glob patterns to ignore
        #[arg(long = "ignore", value_name = "PATTERN")]
        ignore: Vec<String>,
    },

    /// List the objects and ETags stored in a bucket
    List {
        /// Bucket to list
        #[arg(value_name = "BUCKET")]
        bucket: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            if let Some(report) = e.partial_report() {
                print_report(report);
            }
            tracing::error!(category = %e.category(), "{}", e);
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SyncConfig::from_file(path)?,
        None => SyncConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let s3_config = S3Config {
        region: cli.s3.region.clone(),
        endpoint: cli.s3.endpoint.clone(),
        aws_profile: cli.s3.profile.clone(),
        force_path_style: cli.s3.path_style,
        ..Default::default()
    };

    match cli.command {
        Commands::Sync {
            path,
            bucket,
            workers,
            fail_fast,
            dry_run,
            ignore,
        } => {
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if fail_fast {
                config.error_mode = ErrorMode::Abort;
            }
            config.dry_run |= dry_run;
            config.ignore_patterns.extend(ignore);

            run_sync(config, s3_config, path, bucket).await
        }
        Commands::List { bucket } => run_list(s3_config, bucket).await,
    }
}

fn check_bucket(bucket: &str) -> Result<()> {
    if is_valid_bucket_name(bucket) {
        Ok(())
    } else {
        Err(StoreError::InvalidBucketName(bucket.to_string()).into())
    }
}

async fn run_sync(
    config: SyncConfig,
    s3_config: S3Config,
    path: PathBuf,
    bucket: String,
) -> Result<i32> {
    check_bucket(&bucket)?;

    let client = Arc::new(S3Client::new(s3_config).await?);
    let syncer = Syncer::new(Arc::clone(&client), config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, finishing files in flight...");
            on_interrupt.cancel();
        }
    });

    let report = syncer.sync_with_cancel(&path, &bucket, cancel).await?;
    print_report(&report);

    match client.bucket_region(&bucket).await {
        Ok(bucket_region) => {
            if let Some(url) = region::website_url(&bucket, &bucket_region) {
                println!("Website: {}", url);
            }
        }
        Err(e) => tracing::debug!(error = %e, "bucket location unavailable"),
    }

    Ok(if report.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_PARTIAL
    })
}

async fn run_list(s3_config: S3Config, bucket: String) -> Result<i32> {
    check_bucket(&bucket)?;

    let client = S3Client::new(s3_config).await?;
    let manifest = Manifest::load(&client, &bucket).await?;

    let mut entries: Vec<(&str, &str)> = manifest.iter().collect();
    entries.sort_unstable();
    for (key, etag) in entries {
        println!("{}  {}", etag, key);
    }
    println!("{} objects", manifest.len());

    Ok(EXIT_SUCCESS)
}

fn print_report(report: &SyncReport) {
    let mut files: Vec<_> = report.files.iter().collect();
    files.sort_by(|a, b| a.key.cmp(&b.key));
    for file in files {
        println!("{}: {}", file.key, file.outcome);
    }
    println!("{} in {:.2}s", report, report.duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use webinator::WebinatorError;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync() {
        let cli = Cli::parse_from([
            "webinator", "sync", "./site", "my-bucket", "--workers", "8", "--fail-fast",
            "--region", "eu-west-1",
        ]);
        assert_eq!(cli.s3.region.as_deref(), Some("eu-west-1"));
        match cli.command {
            Commands::Sync {
                path,
                bucket,
                workers,
                fail_fast,
                dry_run,
                ..
            } => {
                assert_eq!(path, PathBuf::from("./site"));
                assert_eq!(bucket, "my-bucket");
                assert_eq!(workers, Some(8));
                assert!(fail_fast);
                assert!(!dry_run);
            }
            Commands::List { .. } => panic!("expected sync"),
        }
    }

    #[test]
    fn test_bucket_check() {
        assert!(check_bucket("my-site").is_ok());
        assert!(matches!(
            check_bucket("Bad_Bucket"),
            Err(WebinatorError::Store(StoreError::InvalidBucketName(_)))
        ));
    }
}
