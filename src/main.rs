// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use git_publish::utils::logging::{format_error, format_info, format_success, format_warning};
use git_publish::{
    Config, DirectoryWalker, GithubClient, RepositoryHost, SnapshotBuilder, SnapshotPublisher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const EXIT_CONFIG: i32 = 1;
const EXIT_PUBLISH_FAILED: i32 = 2;

#[derive(Parser)]
#[command(name = "git_publish")]
#[command(author = "cipher")]
#[command(version)]
#[command(about = "Publish a local folder to a GitHub branch as a single commit", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = git_publish::config::DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish every file under FOLDER as one new commit on the configured branch
    Publish {
        /// Folder to publish; defaults to publish.root_folder
        folder: Option<PathBuf>,

        /// Publish only these files (relative to FOLDER or absolute inside it)
        #[arg(long, value_name = "FILE", num_args = 1..)]
        only: Vec<PathBuf>,

        /// Commit message; defaults to github.commit_message
        #[arg(short, long)]
        message: Option<String>,

        /// Print the sync result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the commit the configured branch points at
    Head,

    /// List what a publish of FOLDER would submit, without contacting the remote
    Scan {
        folder: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    git_publish::utils::logging::init_logger(cli.color, cli.verbose);

    let config = load_config_or_exit(&cli.config);

    match cli.command {
        Commands::Publish {
            folder,
            only,
            message,
            json,
        } => {
            cmd_publish(&config, folder, only, message, json).await?;
        }
        Commands::Head => {
            cmd_head(&config).await?;
        }
        Commands::Scan { folder } => {
            cmd_scan(&config, folder).await?;
        }
    }

    Ok(())
}

/// Nothing can be published without credentials and a target, so a missing
/// or invalid configuration ends the process.
fn load_config_or_exit(path: &Path) -> Config {
    info!("Loading configuration from: {}", path.display());

    if !path.exists() {
        eprintln!(
            "{}",
            format_error(&format!(
                "Configuration file not found: {}. Please create it (see readme.md).",
                path.display()
            ))
        );
        std::process::exit(EXIT_CONFIG);
    }

    match Config::load(Some(path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            std::process::exit(EXIT_CONFIG);
        }
    }
}

fn resolve_folder(config: &Config, folder: Option<PathBuf>) -> Result<PathBuf> {
    folder
        .or_else(|| config.publish.root_folder.clone())
        .ok_or_else(|| anyhow!("No folder given and publish.root_folder is not configured"))
}

fn build_publisher(config: &Config) -> Result<SnapshotPublisher> {
    let host: Arc<dyn RepositoryHost> =
        Arc::new(GithubClient::new(&config.github).context("Failed to create GitHub client")?);
    let builder = SnapshotBuilder::new(config.publish.read_concurrency)
        .with_progress(config.publish.show_progress);
    Ok(SnapshotPublisher::new(host, builder))
}

async fn cmd_publish(
    config: &Config,
    folder: Option<PathBuf>,
    only: Vec<PathBuf>,
    message: Option<String>,
    json: bool,
) -> Result<()> {
    let folder = resolve_folder(config, folder)?;
    let message = message.unwrap_or_else(|| config.github.commit_message.clone());
    let coordinate = config.coordinate();

    let publisher = build_publisher(config)?;
    let result = if only.is_empty() {
        info!("Publishing {} to {}", folder.display(), coordinate);
        publisher.publish(&coordinate, &folder, &message).await
    } else {
        info!(
            "Publishing {} file(s) from {} to {}",
            only.len(),
            folder.display(),
            coordinate
        );
        publisher
            .publish_files(&coordinate, &folder, &only, &message)
            .await
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else if result.success {
        println!("{}", format_success(&result.message));
    } else {
        eprintln!("{}", format_error(&result.message));
        if result.retryable {
            eprintln!(
                "{}",
                format_warning("The branch moved while publishing; run the command again.")
            );
        }
    }

    if !result.success {
        std::process::exit(EXIT_PUBLISH_FAILED);
    }

    Ok(())
}

async fn cmd_head(config: &Config) -> Result<()> {
    let coordinate = config.coordinate();
    let publisher = build_publisher(config)?;

    match publisher.resolve_head(&coordinate).await? {
        Some(head) => {
            println!("{}", format_info(&format!("{} -> {}", coordinate, head.commit_sha)));
            println!("tree {}", head.tree_sha);
        }
        None => {
            warn!("Repository has no commits yet");
            println!("{}", format_info(&format!("{} has no commits", coordinate)));
        }
    }

    Ok(())
}

async fn cmd_scan(config: &Config, folder: Option<PathBuf>) -> Result<()> {
    let folder = resolve_folder(config, folder)?;
    let root = std::path::absolute(&folder)
        .with_context(|| format!("Cannot resolve {}", folder.display()))?;

    let files = DirectoryWalker::new().try_walk(&root)?;
    let snapshot = SnapshotBuilder::new(config.publish.read_concurrency)
        .with_progress(config.publish.show_progress)
        .build(None, &root, &files)
        .await?;

    for entry in &snapshot.entries {
        println!(
            "{} {:>10}  {}",
            entry.mode.as_str(),
            entry.content.len(),
            entry.relative_path
        );
    }

    println!(
        "{}",
        format_info(&format!(
            "{} file(s), {} bytes, digest {}",
            snapshot.len(),
            snapshot.total_bytes(),
            snapshot.content_digest()
        ))
    );

    Ok(())
}
