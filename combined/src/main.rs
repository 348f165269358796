//! `diary` - runs the API server and talks to it from the command line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use api_lib::AppConfig;
use diary_client::{ClientConfig, ClientError, DiaryClient, FileTokenStore};
use domain::{CreateDiary, DiaryResponse, PaginationParams, Visibility};

#[derive(Parser)]
#[command(name = "diary")]
#[command(about = "Personal diary server and command-line client")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ClientArgs {
    /// API base URL
    #[arg(long, env = "DIARY_API_URL")]
    api_url: Option<String>,

    /// Where the session tokens are kept
    #[arg(long, env = "DIARY_SESSION_FILE")]
    session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long, env = "SERVER_HOST")]
        host: Option<String>,
        #[arg(long, env = "SERVER_PORT")]
        port: Option<u16>,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "DIARY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DIARY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Revoke and forget the stored session
    Logout {
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Show the signed-in user
    Whoami {
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Work with diary entries
    Entries {
        #[command(subcommand)]
        command: EntryCommand,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Show notifications
    Notifications {
        /// Only unread ones
        #[arg(long)]
        unread: bool,
        /// Mark everything as read afterwards
        #[arg(long)]
        mark_read: bool,
        #[command(flatten)]
        client: ClientArgs,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[derive(Subcommand)]
enum EntryCommand {
    /// List your entries, or the public feed
    List {
        #[arg(long, default_value = "1")]
        page: u64,
        #[arg(long, default_value = "20")]
        per_page: u64,
        #[arg(long)]
        public: bool,
    },
    /// Print one entry
    Show { id: Uuid },
    /// Write a new entry
    New {
        #[arg(long)]
        title: String,
        /// Entry text; read from stdin when omitted
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        weather: Option<String>,
        /// Publish to the public feed
        #[arg(long)]
        public: bool,
    },
    /// Delete an entry
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,tower_http=debug".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = AppConfig::from_env()?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            info!("Starting diary API on {}", config.server_addr());
            api_lib::run(config).await.map_err(|e| anyhow::anyhow!(e))?;
        }
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateAction::Up => diary_service_lib::MigrateAction::Up,
                MigrateAction::Down => diary_service_lib::MigrateAction::Down,
                MigrateAction::Status => diary_service_lib::MigrateAction::Status,
                MigrateAction::Fresh => diary_service_lib::MigrateAction::Fresh,
            };
            let database = common::DatabaseConfig::from_env()?;
            diary_service_lib::run_migrations(&database.url, migrate_action).await?;
        }
        Commands::Register {
            email,
            name,
            password,
            client,
        } => {
            let client = connect(&client).await?;
            let password = password_or_prompt(password)?;
            let user = client.register(&email, &password, &name).await?;
            println!("Registered {} ({})", user.email, user.role);
        }
        Commands::Login {
            email,
            password,
            client,
        } => {
            let client = connect(&client).await?;
            let password = password_or_prompt(password)?;
            client.login(&email, &password).await?;
            let user = client.me().await?;
            println!("Signed in as {} <{}>", user.name, user.email);
        }
        Commands::Logout { client } => {
            let client = connect(&client).await?;
            client.logout().await?;
            println!("Signed out");
        }
        Commands::Whoami { client } => {
            let client = signed_in(&client).await?;
            let user = client.me().await?;
            println!("{} <{}>", user.name, user.email);
            println!("role:    {}", user.role);
            println!("id:      {}", user.id);
            if let Some(info) = client.tokens().access_info().await {
                println!("expires: {}", info.expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        Commands::Entries { command, client } => {
            let client = signed_in(&client).await?;
            run_entry_command(&client, command).await?;
        }
        Commands::Notifications {
            unread,
            mark_read,
            client,
        } => {
            let client = signed_in(&client).await?;
            let page = client
                .notifications(unread, PaginationParams::default())
                .await?;
            if page.data.is_empty() {
                println!("No notifications");
            }
            for notification in &page.data {
                let marker = if notification.read { " " } else { "*" };
                println!(
                    "{} {}  {}: {}",
                    marker,
                    notification.created_at.format("%Y-%m-%d %H:%M"),
                    notification.title,
                    notification.body
                );
            }
            if mark_read {
                client.mark_all_notifications_read().await?;
            }
        }
    }

    Ok(())
}

async fn run_entry_command(client: &DiaryClient, command: EntryCommand) -> anyhow::Result<()> {
    match command {
        EntryCommand::List {
            page,
            per_page,
            public,
        } => {
            let params = PaginationParams::new(page, per_page);
            let entries = if public {
                client.public_diaries(params).await?
            } else {
                client.list_diaries(params).await?
            };
            for entry in &entries.data {
                println!(
                    "{}  {}  {}{}",
                    entry.id,
                    entry.created_at.format("%Y-%m-%d"),
                    entry.title,
                    if entry.visibility == Visibility::Public {
                        " (public)"
                    } else {
                        ""
                    }
                );
            }
            println!(
                "page {}/{} ({} entries)",
                entries.meta.page,
                entries.meta.total_pages.max(1),
                entries.meta.total
            );
        }
        EntryCommand::Show { id } => {
            let entry = client.get_diary(id).await?;
            print_entry(&entry);
        }
        EntryCommand::New {
            title,
            content,
            mood,
            weather,
            public,
        } => {
            let content = match content {
                Some(content) => content,
                None => io::read_to_string(io::stdin()).context("reading entry from stdin")?,
            };
            let entry = client
                .create_diary(&CreateDiary {
                    title,
                    content,
                    mood,
                    weather,
                    visibility: if public {
                        Visibility::Public
                    } else {
                        Visibility::Private
                    },
                })
                .await?;
            println!("Created {}", entry.id);
        }
        EntryCommand::Delete { id } => {
            client.delete_diary(id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

fn print_entry(entry: &DiaryResponse) {
    println!("{}", entry.title);
    println!("{}", entry.created_at.format("%A, %d %B %Y %H:%M"));
    let labels: Vec<&str> = [entry.mood.as_deref(), entry.weather.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !labels.is_empty() {
        println!("{}", labels.join(" · "));
    }
    println!();
    println!("{}", entry.content);
}

/// Build a client with the file-backed session store.
async fn connect(args: &ClientArgs) -> anyhow::Result<DiaryClient> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &args.api_url {
        config = ClientConfig {
            refresh_leeway: config.refresh_leeway,
            timeout: config.timeout,
            ..ClientConfig::new(url.as_str())
        };
    }

    let path = match &args.session_file {
        Some(path) => path.clone(),
        None => FileTokenStore::default_path()
            .context("cannot determine a config directory; pass --session-file")?,
    };
    let client = DiaryClient::new(config, Arc::new(FileTokenStore::new(path)))?;
    client.restore_session().await?;
    Ok(client)
}

async fn signed_in(args: &ClientArgs) -> anyhow::Result<DiaryClient> {
    let client = connect(args).await?;
    if client.tokens().refresh_token().await.is_none() {
        return Err(ClientError::NotAuthenticated).context("run `diary login` first");
    }
    Ok(client)
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("a password is required (use --password or DIARY_PASSWORD)");
    }
    Ok(password)
}
