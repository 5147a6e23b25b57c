//! CLI entry and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use wordbank_core::AppContext;
use wordbank_core::config::{self, Config};
use wordbank_core::storage::{FileStore, MemoryStore, SharedStorage};

mod commands;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "WORDBANK_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "wordbank")]
#[command(version)]
#[command(about = "Wordbank vocabulary client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the API base URL (takes precedence over config and env)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Keep tokens and flags in memory only (nothing is written to disk)
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(flatten)]
    Api(ApiCommands),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Commands that talk to the backend or device storage.
#[derive(clap::Subcommand)]
enum ApiCommands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "WORDBANK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "WORDBANK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget stored tokens
    Logout,
    /// Show the signed-in user
    Me,
    /// Restore the session and print the start screen
    Bootstrap {
        /// Treat the identity provider as signed out
        #[arg(long)]
        signed_out: bool,
    },
    /// List word categories
    Categories {
        /// Show one category by ID
        #[arg(value_name = "CATEGORY_ID")]
        id: Option<String>,
    },
    /// List word lists, optionally within a category
    Lists {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size (default: per_page from config)
        #[arg(long)]
        per_page: Option<u32>,
        /// Only lists in this category
        #[arg(long, value_name = "CATEGORY_ID")]
        category: Option<String>,
    },
    /// Show one word list
    List {
        #[arg(value_name = "LIST_ID")]
        id: String,
    },
    /// Add a word list to your bank
    Bank {
        #[arg(value_name = "LIST_ID")]
        list_id: String,
    },
    /// Show today's quiz, or answer it
    Quiz {
        /// Comma-separated option indexes, one per question in order
        #[arg(long, value_delimiter = ',', value_name = "INDEXES")]
        answers: Vec<usize>,
    },
    /// Set the onboarding flag
    Onboarded {
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Show the diagnostic error log
    Errors {
        /// Empty the log
        #[arg(long)]
        clear: bool,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: file logging disabled: {e:#}");
            None
        }
    };

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Routes `tracing` output to a daily file under `<home>/logs`.
fn init_logging() -> Result<WorkerGuard> {
    let logs_dir = config::paths::logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("create log directory {}", logs_dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&logs_dir, "wordbank.log"));
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("install log subscriber")?;
    Ok(guard)
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
        Commands::Api(command) => {
            let storage: SharedStorage = if cli.ephemeral {
                MemoryStore::shared()
            } else {
                Arc::new(FileStore::new(config::paths::storage_path()))
            };
            let ctx = build_context(&config, storage, cli.base_url.as_deref())?;
            let cancel = cancel_on_ctrl_c();
            run_api(command, &ctx, &config, &cancel).await
        }
    }
}

async fn run_api(
    command: ApiCommands,
    ctx: &AppContext,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        ApiCommands::Login { email, password } => {
            commands::auth::login(ctx, &email, &password, cancel).await
        }
        ApiCommands::Register {
            email,
            username,
            password,
        } => commands::auth::register(ctx, &email, &username, &password, cancel).await,
        ApiCommands::Logout => commands::auth::logout(ctx).await,
        ApiCommands::Me => commands::auth::me(ctx, cancel).await,
        ApiCommands::Bootstrap { signed_out } => {
            commands::auth::bootstrap(ctx, !signed_out, cancel).await
        }
        ApiCommands::Onboarded { value } => commands::auth::onboarded(ctx, value).await,

        ApiCommands::Categories { id } => match id {
            Some(id) => commands::lists::category(ctx, &id, cancel).await,
            None => commands::lists::categories(ctx, cancel).await,
        },
        ApiCommands::Lists {
            page,
            per_page,
            category,
        } => {
            let per_page = per_page.unwrap_or(config.per_page);
            match category {
                Some(category) => {
                    commands::lists::by_category(ctx, &category, page, per_page, cancel).await
                }
                None => commands::lists::lists(ctx, page, per_page, cancel).await,
            }
        }
        ApiCommands::List { id } => commands::lists::list(ctx, &id, cancel).await,
        ApiCommands::Bank { list_id } => commands::lists::bank(ctx, &list_id, cancel).await,

        ApiCommands::Quiz { answers } => commands::quiz::run(ctx, &answers, cancel).await,

        ApiCommands::Errors { clear } => commands::errors::show(ctx, clear).await,
    }
}

fn build_context(
    config: &Config,
    storage: SharedStorage,
    base_url_override: Option<&str>,
) -> Result<AppContext> {
    let Some(url) = base_url_override else {
        return AppContext::from_config(config, storage);
    };
    url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
    AppContext::new(url, storage, config.request_timeout()).context("create API client")
}

/// Token that fires on Ctrl-C, aborting the in-flight request.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}
