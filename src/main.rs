//! Launchpad build lane CLI.
//!
//! Entry point for the `lp-build` command-line tool.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use launchpad_lane::{
    ApiClient, AuthorInfo, BuildStatusAggregator, ConfigError, Error, GpgCipher, HttpSession,
    ImageBuildOptions, ImageBuilder, LaneConfig, Resolver, SnapBuilder, WebhookManager,
    WebhookOutcome,
};

#[derive(Parser)]
#[command(name = "lp-build")]
#[command(about = "Trigger snap and Ubuntu image builds through Launchpad", version)]
struct Cli {
    /// Path to the credentials file (default: ~/.config/lp-build/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a board/system pair to build coordinates (no remote calls)
    Resolve {
        board: String,
        system: String,

        /// Force a specific architecture
        #[arg(long)]
        arch: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Image build operations
    Image {
        #[command(subcommand)]
        action: ImageCommands,
    },

    /// Webhook management
    Webhook {
        #[command(subcommand)]
        action: WebhookCommands,
    },

    /// Snap recipe operations
    Snap {
        #[command(subcommand)]
        action: SnapCommands,
    },

    /// Show virtualized builder queues per architecture
    Builders {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImageCommands {
    /// Request an image build
    Build {
        board: String,
        system: String,

        /// Extra snap to preinstall (repeatable)
        #[arg(long = "snap")]
        snaps: Vec<String>,

        /// Channel the image tracks
        #[arg(long)]
        channel: Option<String>,

        #[arg(long)]
        image_format: Option<String>,

        /// Author name to embed (encrypted) in the build metadata
        #[arg(long, requires = "author_email", requires = "gpg_passphrase")]
        author_name: Option<String>,

        #[arg(long)]
        author_email: Option<String>,

        #[arg(long)]
        gpg_passphrase: Option<String>,

        /// Force a specific architecture
        #[arg(long)]
        arch: Option<String>,
    },
}

#[derive(Subcommand)]
enum WebhookCommands {
    /// Create or update the build webhook for a board/system target
    Ensure {
        board: String,
        system: String,
        delivery_url: String,

        #[arg(long)]
        secret: String,
    },
}

#[derive(Subcommand)]
enum SnapCommands {
    /// Register a snap recipe and authorize store uploads
    Create {
        store_name: String,
        git_url: String,

        /// Store upload macaroon
        #[arg(long)]
        macaroon: String,
    },

    /// Request builds for every configured architecture
    Build { store_name: String },

    /// Cancel all pending builds
    Cancel { store_name: String },

    /// Delete the recipe
    Delete { store_name: String },

    /// Look up a recipe by store name
    Find {
        store_name: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Whether any build is still pending
    Building { store_name: String },

    /// Latest build state per architecture
    Status {
        store_name: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lane(#[from] Error),

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Lane(Error::Resolve(_)) => 2,
            CliError::Lane(Error::SnapNotFound { .. }) => 4,
            CliError::Lane(_) => 3,
            CliError::Output(_) => 3,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Resolve {
            board,
            system,
            arch,
            json,
        } => {
            let target =
                Resolver::default().resolve_with_arch(&board, &system, arch.as_deref())
                    .map_err(Error::from)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&target)?);
            } else {
                println!(
                    "{}/{} -> codename={} arch={} subarch={} project={}",
                    target.board,
                    target.system,
                    target.codename,
                    target.arch,
                    target.subarch,
                    target.project
                );
            }
            Ok(())
        }

        Commands::Image { action } => {
            let client = client(&cli.config)?;
            match action {
                ImageCommands::Build {
                    board,
                    system,
                    snaps,
                    channel,
                    image_format,
                    author_name,
                    author_email,
                    gpg_passphrase,
                    arch,
                } => {
                    let author_info = match (author_name, author_email) {
                        (Some(name), Some(email)) => Some(AuthorInfo { name, email }),
                        _ => None,
                    };
                    let builder = ImageBuilder::new(
                        client,
                        Resolver::default(),
                        Arc::new(GpgCipher::new()),
                    );
                    let target = builder.request_build(
                        &board,
                        &system,
                        &ImageBuildOptions {
                            snaps,
                            channel,
                            image_format,
                            author_info,
                            gpg_passphrase,
                            arch,
                        },
                    )?;
                    println!(
                        "requested {}/{} image build ({}/{})",
                        target.board, target.system, target.codename, target.arch
                    );
                    Ok(())
                }
            }
        }

        Commands::Webhook { action } => {
            let client = client(&cli.config)?;
            match action {
                WebhookCommands::Ensure {
                    board,
                    system,
                    delivery_url,
                    secret,
                } => {
                    let target = Resolver::default()
                        .resolve(&board, &system)
                        .map_err(Error::from)?;
                    let outcome = WebhookManager::new(client).upsert_build_webhook(
                        &target,
                        &delivery_url,
                        &secret,
                    )?;
                    match outcome {
                        WebhookOutcome::Created => {
                            println!("webhook created for {delivery_url}")
                        }
                        WebhookOutcome::Updated => {
                            println!("webhook secret updated for {delivery_url}")
                        }
                    }
                    Ok(())
                }
            }
        }

        Commands::Snap { action } => {
            let client = client(&cli.config)?;
            let snaps = SnapBuilder::new(client.clone());
            match action {
                SnapCommands::Create {
                    store_name,
                    git_url,
                    macaroon,
                } => {
                    let entry = snaps.create(&store_name, &git_url, &macaroon)?;
                    println!("created recipe {} for {store_name}", entry.name);
                    Ok(())
                }
                SnapCommands::Build { store_name } => {
                    snaps.request_builds(&store_name)?;
                    println!("requested builds for {store_name}");
                    Ok(())
                }
                SnapCommands::Cancel { store_name } => {
                    let cancelled = snaps.cancel_pending_builds(&store_name)?;
                    println!("cancelled {cancelled} pending builds for {store_name}");
                    Ok(())
                }
                SnapCommands::Delete { store_name } => {
                    snaps.delete(&store_name)?;
                    println!("deleted recipe for {store_name}");
                    Ok(())
                }
                SnapCommands::Find { store_name, json } => {
                    match snaps.find_by_store_name(&store_name)? {
                        Some(entry) if json => {
                            println!("{}", serde_json::to_string_pretty(&entry)?)
                        }
                        Some(entry) => println!(
                            "{} -> {} ({})",
                            entry.store_name, entry.git_repository_url, entry.self_link
                        ),
                        None => println!("no recipe for {store_name}"),
                    }
                    Ok(())
                }
                SnapCommands::Building { store_name } => {
                    let building = snaps.is_building(&store_name)?;
                    println!("{building}");
                    Ok(())
                }
                SnapCommands::Status { store_name, json } => {
                    let status =
                        BuildStatusAggregator::new(client).snap_build_status(&store_name)?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&status)?);
                    } else {
                        for (arch, arch_status) in &status {
                            let upload = arch_status
                                .store_upload_status
                                .map(|s| s.as_str())
                                .unwrap_or("-");
                            println!("{arch:10} {:28} {upload}", arch_status.build_state);
                        }
                    }
                    Ok(())
                }
            }
        }

        Commands::Builders { json } => {
            let client = client(&cli.config)?;
            let queues = BuildStatusAggregator::new(client).builder_queue_status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&queues)?);
            } else {
                for (arch, queue) in &queues {
                    let clock = |duration: Option<std::time::Duration>| {
                        duration
                            .map(lp_api::format_duration)
                            .unwrap_or_else(|| "-".to_string())
                    };
                    println!(
                        "{arch:10} jobs={:<4} total={:9} eta={}",
                        queue.pending_jobs,
                        clock(queue.total_jobs_duration),
                        clock(queue.estimated_duration)
                    );
                }
            }
            Ok(())
        }
    }
}

fn client(config_path: &Option<PathBuf>) -> Result<ApiClient, CliError> {
    let config = match config_path {
        Some(path) => LaneConfig::load(path)?,
        None => LaneConfig::load_default()?,
    };
    let credentials = config.credentials();
    let session = match &config.base_url {
        Some(base_url) => HttpSession::with_base_url(&credentials, base_url),
        None => HttpSession::new(&credentials),
    }
    .map_err(Error::from)?;
    Ok(ApiClient::new(Arc::new(session), credentials))
}
