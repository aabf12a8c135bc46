//! Kolibri Store CLI
//!
//! Command-line interface over a local Kolibri Store data directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kolibri_store::{Config, FileRecord, IntegrityMode, KolibriError, Pipeline};
use tracing_subscriber::{fmt, EnvFilter};

/// Kolibri Store CLI
#[derive(Parser, Debug)]
#[command(name = "kolibri-cli")]
#[command(about = "Quota-enforced compressed object store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./kolibri_data")]
    data_dir: PathBuf,

    /// Deflate level (1-9)
    #[arg(short = 'l', long, default_value = "9")]
    level: u32,

    /// Return data even if size or hash verification fails
    #[arg(long)]
    permissive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account
    Register {
        owner: String,

        /// Storage limit in MB (default 10240)
        #[arg(long, value_name = "MB")]
        limit: Option<u64>,
    },

    /// Upload one or more files (in parallel)
    Upload {
        owner: String,

        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// MIME type recorded for every file
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },

    /// Download a file
    Download {
        owner: String,
        file_id: String,
        out: PathBuf,
    },

    /// Delete a file
    Rm { owner: String, file_id: String },

    /// List files
    Ls { owner: String },

    /// Show quota and compression totals
    Info { owner: String },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kolibri_store=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .compression_level(args.level)
        .integrity_mode(if args.permissive {
            IntegrityMode::Permissive
        } else {
            IntegrityMode::Strict
        })
        .build();

    let pipeline = match Pipeline::open(config) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&pipeline, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(pipeline: &Pipeline, command: Commands) -> Result<(), KolibriError> {
    match command {
        Commands::Register { owner, limit } => {
            let limit = limit.map(megabytes_to_bytes).transpose()?;
            let quota = pipeline.register_user(&owner, limit)?;
            println!("registered {} (limit {} bytes)", owner, quota.limit);
        }
        Commands::Upload { owner, paths, mime } => {
            let mut failed = None;
            for (path, result) in upload_all(pipeline, &owner, &paths, &mime)? {
                match result {
                    Ok(record) => print_record(&record),
                    Err(e) => {
                        eprintln!("{}: {}", path.display(), e);
                        failed = Some(e);
                    }
                }
            }
            if let Some(e) = failed {
                return Err(e);
            }
        }
        Commands::Download { owner, file_id, out } => {
            let data = pipeline.download(&owner, &file_id)?;
            fs::write(&out, &data)?;
            println!("wrote {} bytes to {}", data.len(), out.display());
        }
        Commands::Rm { owner, file_id } => {
            let quota = pipeline.remove(&owner, &file_id)?;
            println!("removed {} ({} of {} bytes used)", file_id, quota.used, quota.limit);
        }
        Commands::Ls { owner } => {
            for record in pipeline.list(&owner)? {
                print_record(&record);
            }
        }
        Commands::Info { owner } => {
            let info = pipeline.storage_info(&owner)?;
            let stats = pipeline.codec_stats();
            println!("owner:          {}", info.owner_id);
            println!("files:          {}", info.file_count);
            println!(
                "used:           {} / {} bytes ({}%)",
                info.quota.used, info.quota.limit, info.usage_percent
            );
            println!("original total: {} bytes", info.total_original_size);
            println!("stored total:   {} bytes", info.total_compressed_size);
            println!("saved:          {} bytes", info.total_saved);
            println!("avg ratio:      {}%", info.average_compression_ratio);
            println!("codec:          {} (level {})", stats.algorithm, stats.compression_level);
        }
    }
    Ok(())
}

/// Upload every path on its own scoped thread
fn upload_all<'a>(
    pipeline: &Pipeline,
    owner: &str,
    paths: &'a [PathBuf],
    mime: &str,
) -> Result<Vec<(&'a Path, Result<FileRecord, KolibriError>)>, KolibriError> {
    let results = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = paths
            .iter()
            .map(|path| {
                scope.spawn(move |_| {
                    let outcome = upload_one(pipeline, owner, path, mime);
                    (path.as_path(), outcome)
                })
            })
            .collect();

        handles
            .into_iter()
            .zip(paths)
            .map(|(handle, path)| {
                handle.join().unwrap_or_else(|_| {
                    (
                        path.as_path(),
                        Err(KolibriError::StorageIo("upload worker panicked".to_string())),
                    )
                })
            })
            .collect::<Vec<_>>()
    });

    results.map_err(|_| KolibriError::StorageIo("upload scope panicked".to_string()))
}

fn megabytes_to_bytes(mb: u64) -> Result<u64, KolibriError> {
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| KolibriError::Config(format!("limit of {} MB is too large", mb)))
}

fn upload_one(
    pipeline: &Pipeline,
    owner: &str,
    path: &Path,
    mime: &str,
) -> Result<FileRecord, KolibriError> {
    let data = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    pipeline.upload(owner, &data, mime, &name)
}

fn print_record(record: &FileRecord) {
    println!(
        "{}  {:>10} -> {:>10} ({:>6.2}%)  {}",
        record.id,
        record.original_size,
        record.compressed_size,
        record.compression_ratio,
        record.original_name
    );
}
