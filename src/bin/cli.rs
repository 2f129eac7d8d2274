//! Autopost CLI
//!
//! Command-line console for the auto-posting server:
//! - Manage posting accounts
//! - Manage scheduled posts and their media
//! - Live dashboard over the realtime channel
//! - Generate a config file

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use autopost_console::controller::{AccountRow, DashboardView, PostRow};
use autopost_console::{
    load_media, AccountForm, AccountId, AccountManager, Config, Confirm, ConsoleClient, Dashboard,
    LoggingConfig, PostForm, PostId, PostManager, RealtimeChannel,
};

#[derive(Parser)]
#[command(name = "autopost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Admin console for the auto-posting server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server URL (overrides config and AUTOPOST_SERVER_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Config file (default: standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Skip delete confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage posting accounts
    Accounts {
        #[command(subcommand)]
        command: AccountCommand,
    },

    /// Manage scheduled posts
    Posts {
        #[command(subcommand)]
        command: PostCommand,
    },

    /// Live status with post/start/stop commands
    Dashboard,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// List all accounts
    List,

    /// Add an account
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        consumer_key: String,
        #[arg(long)]
        consumer_secret: String,
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        access_token_secret: String,
        /// Include this account in posting runs
        #[arg(long)]
        post_flag: bool,
    },

    /// Edit an account. Secrets not given are sent blank.
    Edit {
        id: AccountId,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        consumer_key: Option<String>,
        #[arg(long)]
        consumer_secret: Option<String>,
        #[arg(long)]
        access_token: Option<String>,
        #[arg(long)]
        access_token_secret: Option<String>,
        #[arg(long)]
        post_flag: Option<bool>,
    },

    /// Delete an account
    Delete { id: AccountId },
}

#[derive(Subcommand)]
pub enum PostCommand {
    /// List all posts
    List,

    /// Add a post with its media file (mp4, mov, avi)
    Add {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        caption: String,
        #[arg(long, default_value = "")]
        reply: String,
        /// Clip start as m:ss
        #[arg(long, default_value = "")]
        start: String,
        /// Clip end as m:ss
        #[arg(long, default_value = "")]
        end: String,
    },

    /// Edit a post; without --file the stored media is kept
    Edit {
        id: PostId,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        reply: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Delete a post
    Delete { id: PostId },
}

/// Delete confirmation on the terminal
struct TerminalConfirm {
    assume_yes: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{} [y/N] ", message);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.server {
        config.server.url = url.clone();
    }

    init_tracing(&config.logging)?;

    let confirm = TerminalConfirm {
        assume_yes: cli.yes,
    };

    match cli.command {
        Commands::Accounts { command } => {
            let client = ConsoleClient::new(&config.server.url, config.request_timeout())?;
            run_accounts(command, client, confirm, cli.format).await?;
        }

        Commands::Posts { command } => {
            let client = ConsoleClient::new(&config.server.url, config.request_timeout())?;
            run_posts(command, client, confirm, cli.format).await?;
        }

        Commands::Dashboard => run_dashboard(&config).await?,

        Commands::Config { output } => {
            let content = autopost_console::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Install the global subscriber. Logs go to stderr (or the configured
/// file) so stdout stays parseable.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "autopost_console={level},autopost_cli={level}",
            level = logging.level
        ))
    });

    let writer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path))?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }
    Ok(())
}

async fn run_accounts(
    command: AccountCommand,
    client: ConsoleClient,
    confirm: TerminalConfirm,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let manager = AccountManager::new(client, confirm);

    match command {
        AccountCommand::List => {
            manager.list().await?;
            print_accounts(&manager.rows(), format)?;
        }

        AccountCommand::Add {
            username,
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
            post_flag,
        } => {
            let form = AccountForm {
                username,
                consumer_key,
                consumer_secret,
                access_token,
                access_token_secret,
                post_flag,
            };
            manager.create(form).await?;
            println!("Account added");
            print_accounts(&manager.rows(), format)?;
        }

        AccountCommand::Edit {
            id,
            username,
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
            post_flag,
        } => {
            manager.edit(id).await?;
            let current = manager.modal().buffer().cloned().unwrap_or_default();

            let form = AccountForm {
                username: username.unwrap_or(current.username),
                consumer_key: consumer_key.unwrap_or(current.consumer_key),
                consumer_secret: consumer_secret.unwrap_or(current.consumer_secret),
                access_token: access_token.unwrap_or(current.access_token),
                access_token_secret: access_token_secret.unwrap_or(current.access_token_secret),
                post_flag: post_flag.unwrap_or(current.post_flag),
            };
            manager.save(id, form).await?;
            println!("Account {} updated", id);
        }

        AccountCommand::Delete { id } => {
            if manager.remove(id).await? {
                println!("Account {} deleted", id);
            } else {
                println!("Cancelled");
            }
        }
    }

    Ok(())
}

async fn run_posts(
    command: PostCommand,
    client: ConsoleClient,
    confirm: TerminalConfirm,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let manager = PostManager::new(client, confirm);

    match command {
        PostCommand::List => {
            manager.list().await?;
            print_posts(&manager.rows(), format)?;
        }

        PostCommand::Add {
            file,
            caption,
            reply,
            start,
            end,
        } => {
            let form = PostForm {
                caption,
                reply_content: reply,
                start_time: start,
                end_time: end,
                media: Some(read_media(&file).await?),
            };
            manager.create(form).await?;
            println!("Post added");
            print_posts(&manager.rows(), format)?;
        }

        PostCommand::Edit {
            id,
            file,
            caption,
            reply,
            start,
            end,
        } => {
            manager.edit(id).await?;
            let current = manager.modal().buffer().cloned().unwrap_or_default();

            let media = match file {
                Some(path) => Some(read_media(&path).await?),
                None => None,
            };
            let form = PostForm {
                caption: caption.unwrap_or(current.caption),
                reply_content: reply.unwrap_or(current.reply_content),
                start_time: start.unwrap_or(current.start_time),
                end_time: end.unwrap_or(current.end_time),
                media,
            };
            manager.save(id, form).await?;
            println!("Post {} updated", id);
        }

        PostCommand::Delete { id } => {
            if manager.remove(id).await? {
                println!("Post {} deleted", id);
            } else {
                println!("Cancelled");
            }
        }
    }

    Ok(())
}

async fn read_media(path: &Path) -> anyhow::Result<autopost_console::MediaFile> {
    if !path.exists() {
        bail!("File not found: {:?}", path);
    }
    load_media(path)
        .await
        .with_context(|| format!("Cannot read media file {:?}", path))
}

fn print_accounts(rows: &[AccountRow], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = rows
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.id,
                        "username": r.username,
                        "post_flag": r.posting_enabled,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["id", "username", "post_flag"])?;
            for row in rows {
                writer.write_record([
                    row.id.to_string(),
                    row.username.clone(),
                    u8::from(row.posting_enabled).to_string(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No accounts yet.");
                return Ok(());
            }
            println!("{:<6} {:<24} {}", "ID", "Username", "Posting");
            println!("{}", "-".repeat(42));
            for row in rows {
                println!("{:<6} {:<24} {}", row.id, row.username, row.flag_label());
            }
        }
    }
    Ok(())
}

fn print_posts(rows: &[PostRow], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = rows
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.id,
                        "filename": r.filename,
                        "caption": r.caption,
                        "reply_content": r.reply_content,
                        "start_time": r.start_time,
                        "end_time": r.end_time,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record([
                "id",
                "filename",
                "caption",
                "reply_content",
                "start_time",
                "end_time",
            ])?;
            for row in rows {
                writer.write_record([
                    row.id.to_string(),
                    row.filename.clone(),
                    row.caption.clone(),
                    row.reply_content.clone(),
                    row.start_time.clone(),
                    row.end_time.clone(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No posts yet.");
                return Ok(());
            }
            println!(
                "{:<6} {:<24} {:<30} {:<7} {}",
                "ID", "File", "Caption", "Start", "End"
            );
            println!("{}", "-".repeat(76));
            for row in rows {
                println!(
                    "{:<6} {:<24} {:<30} {:<7} {}",
                    row.id,
                    truncate(&row.filename, 24),
                    truncate(&row.caption, 30),
                    row.start_time,
                    row.end_time
                );
            }
        }
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// One line of dashboard input
#[derive(Debug, PartialEq, Eq)]
enum DashboardCommand<'a> {
    Post,
    Start(&'a str),
    Stop,
    Theme,
    Show,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_dashboard_command(line: &str) -> Option<DashboardCommand<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    Some(match word {
        "post" => DashboardCommand::Post,
        "start" => DashboardCommand::Start(rest.trim()),
        "stop" => DashboardCommand::Stop,
        "theme" => DashboardCommand::Theme,
        "show" | "status" => DashboardCommand::Show,
        "help" | "?" => DashboardCommand::Help,
        "quit" | "exit" | "q" => DashboardCommand::Quit,
        _ => DashboardCommand::Unknown(line),
    })
}

/// What the dashboard loop does after a command
#[derive(Debug, PartialEq, Eq)]
enum Next {
    Render,
    Help,
    Quit,
}

fn apply_command<C: RealtimeChannel>(
    dashboard: &mut Dashboard<C>,
    command: DashboardCommand<'_>,
    now: DateTime<Utc>,
) -> Next {
    match command {
        DashboardCommand::Post => dashboard.post_now(now),
        DashboardCommand::Start(minutes) => {
            if let Err(e) = dashboard.start_auto_posting(minutes, now) {
                tracing::warn!(input = minutes, error = %e, "Start command rejected");
            }
        }
        DashboardCommand::Stop => dashboard.stop_auto_posting(now),
        DashboardCommand::Theme => dashboard.toggle_theme(),
        DashboardCommand::Show => {}
        DashboardCommand::Help => return Next::Help,
        DashboardCommand::Quit => return Next::Quit,
        DashboardCommand::Unknown(text) => {
            println!("Unknown command: {}", text);
            return Next::Help;
        }
    }
    Next::Render
}

const DASHBOARD_HELP: &str =
    "Commands: post | start <minutes> | stop | theme | show | help | quit";

async fn run_dashboard(config: &Config) -> anyhow::Result<()> {
    let (handle, mut events, task) = autopost_console::connect(config.transport());
    let mut dashboard = Dashboard::new(handle, config.dashboard());
    dashboard.on_load();

    println!("{}", DASHBOARD_HELP);
    render(&dashboard.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    dashboard.handle(event);
                    render(&dashboard.view());
                }
                None => {
                    println!("Realtime connection closed");
                    break;
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = parse_dashboard_command(&line) else { continue };
                match apply_command(&mut dashboard, command, Utc::now()) {
                    Next::Render => render(&dashboard.view()),
                    Next::Help => println!("{}", DASHBOARD_HELP),
                    Next::Quit => break,
                }
            },
            _ = tick.tick() => {
                if dashboard.expire_pending(Utc::now()) {
                    render(&dashboard.view());
                }
            },
        }
    }

    drop(dashboard);
    if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
        tracing::debug!("Realtime transport did not stop in time");
    }
    Ok(())
}

fn render(view: &DashboardView) {
    let (on, off) = if view.dark_mode {
        ("\x1b[7m", "\x1b[0m")
    } else {
        ("", "")
    };

    println!();
    println!("{}{}{}", on, view.status_line, off);
    println!("{}", view.auto_post_line);
    println!(
        "[start: {}] [stop: {}]",
        if view.start_enabled { "available" } else { "disabled" },
        if view.stop_enabled { "available" } else { "disabled" }
    );
    if !view.activities.is_empty() {
        println!("Recent activity:");
        for line in &view.activities {
            println!("  {}", line);
        }
    }
}
