//! Command-line interface for the `memotic` binary.

use crate::api;
use crate::client::MemosClient;
use crate::config::{ClientConfig, ServerConfig, parse_timeout};
use crate::models::{Memo, User, Visibility};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures_util::FutureExt;
use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpListener;

/// Banner printed by `memotic version`.
pub const VERSION_BANNER: &str = concat!("Memotic CLI v", env!("CARGO_PKG_VERSION"));

/// Parsed command line.
#[derive(Debug, Parser)]
#[command(name = "memotic", version, about = "Memo server and client")]
pub struct Cli {
    /// Connection overrides applied on top of the environment.
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for `MEMOS_URL`, `MEMOS_TOKEN`, `MEMOS_TIMEOUT` and `MEMOS_RETRIES`.
#[derive(Debug, Default, Args)]
pub struct ConnectionArgs {
    /// Server root URL.
    #[arg(long, global = true)]
    pub url: Option<String>,
    /// Bearer token.
    #[arg(long, global = true)]
    pub token: Option<String>,
    /// Per-attempt timeout in seconds.
    #[arg(long, global = true, value_parser = parse_timeout_arg)]
    pub timeout: Option<Duration>,
    /// Attempts per request.
    #[arg(long, global = true)]
    pub retries: Option<u32>,
}

impl ConnectionArgs {
    /// Apply the overrides to `config`.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        config
    }
}

fn parse_timeout_arg(value: &str) -> Result<Duration, String> {
    parse_timeout(value).map_err(|_| format!("'{value}' is not a positive number of seconds"))
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the CLI version.
    Version,
    /// Run the memo server.
    Serve {
        /// Interface to bind (`MEMOS_HOST`).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (`MEMOS_PORT`).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check that the server answers the health probe.
    Status,
    /// Memo operations.
    #[command(subcommand)]
    Memo(MemoCommand),
    /// User operations.
    #[command(subcommand)]
    User(UserCommand),
}

/// `memotic memo ...`
#[derive(Debug, Subcommand)]
pub enum MemoCommand {
    /// Create a memo.
    Create {
        /// Markdown body.
        content: String,
        /// PRIVATE, PROTECTED or PUBLIC.
        #[arg(long, default_value = "private")]
        visibility: Visibility,
        /// Tag to attach; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List memos.
    List {
        /// Case-insensitive content filter.
        #[arg(long)]
        filter: Option<String>,
        /// Page size, 1 to 1000.
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Show one memo.
    Get {
        /// Memo identifier.
        id: String,
    },
    /// Replace a memo's content.
    Update {
        /// Memo identifier.
        id: String,
        /// New body.
        content: String,
    },
    /// Delete a memo.
    Delete {
        /// Memo identifier.
        id: String,
    },
}

/// `memotic user ...`
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user.
    Create {
        /// Login name.
        username: String,
        /// Email address.
        #[arg(long)]
        email: Option<String>,
    },
    /// List users.
    List,
    /// Show one user.
    Get {
        /// User identifier.
        id: String,
    },
    /// Delete a user.
    Delete {
        /// User identifier.
        id: String,
    },
}

impl Cli {
    /// Default log level: chatty for the server, quiet for client commands.
    pub fn default_log_level(&self) -> &'static str {
        match self.command {
            Command::Serve { .. } => "info",
            _ => "warn",
        }
    }
}

/// Execute the parsed command.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Version => {
            println!("{VERSION_BANNER}");
            Ok(())
        }
        Command::Serve { host, port } => serve(host, port).await,
        Command::Status => status(client_config(&cli.connection)?).await,
        Command::Memo(command) => run_memo(client_config(&cli.connection)?, command).await,
        Command::User(command) => run_user(client_config(&cli.connection)?, command).await,
    }
}

fn client_config(args: &ConnectionArgs) -> Result<ClientConfig> {
    let config = ClientConfig::from_env().context("Failed to load client configuration")?;
    let config = args.apply(config);
    config.validate().context("Invalid client configuration")?;
    Ok(config)
}

async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = ServerConfig::from_env().context("Failed to load server configuration")?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    api::serve(listener, api::new_storage())
        .await
        .context("Server terminated")
}

async fn status(config: ClientConfig) -> Result<()> {
    let mut client = MemosClient::new(config);
    let result = client.connect().await;
    let info = client.info().clone();
    client.disconnect();
    result.with_context(|| format!("Server at {} is unreachable", info.base_url))?;
    match info.server_version {
        Some(version) => println!("Connected to {} (version {version})", info.base_url),
        None => println!("Connected to {}", info.base_url),
    }
    Ok(())
}

async fn run_memo(config: ClientConfig, command: MemoCommand) -> Result<()> {
    match command {
        MemoCommand::Create {
            content,
            visibility,
            tags,
        } => {
            let memo = Memo::new(content)
                .with_visibility(visibility)
                .with_tags(tags);
            let created =
                MemosClient::scoped(config, move |client| client.create_memo(memo).boxed())
                    .await
                    .context("Failed to create memo")?;
            print_json(&created)
        }
        MemoCommand::List { filter, page_size } => {
            let memos = MemosClient::scoped(config, move |client| {
                async move { client.list_memos(filter.as_deref(), page_size).await }.boxed()
            })
            .await
            .context("Failed to list memos")?;
            print_json(&memos)
        }
        MemoCommand::Get { id } => {
            let memo = MemosClient::scoped(config, move |client| {
                async move { client.get_memo(&id).await }.boxed()
            })
            .await
            .context("Failed to fetch memo")?;
            print_json(&memo)
        }
        MemoCommand::Update { id, content } => {
            let memo = MemosClient::scoped(config, move |client| {
                async move {
                    let mut memo = client.get_memo(&id).await?;
                    memo.content = content;
                    client.update_memo(&id, memo).await
                }
                .boxed()
            })
            .await
            .context("Failed to update memo")?;
            print_json(&memo)
        }
        MemoCommand::Delete { id } => {
            let deleted = id.clone();
            MemosClient::scoped(config, move |client| {
                async move { client.delete_memo(&id).await }.boxed()
            })
            .await
            .context("Failed to delete memo")?;
            println!("Deleted memos/{deleted}");
            Ok(())
        }
    }
}

async fn run_user(config: ClientConfig, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::Create { username, email } => {
            let mut user = User::new(username);
            if let Some(email) = email {
                user = user.with_email(email);
            }
            let created =
                MemosClient::scoped(config, move |client| client.create_user(user).boxed())
                    .await
                    .context("Failed to create user")?;
            print_json(&created)
        }
        UserCommand::List => {
            let users = MemosClient::scoped(config, |client| client.list_users().boxed())
                .await
                .context("Failed to list users")?;
            print_json(&users)
        }
        UserCommand::Get { id } => {
            let user = MemosClient::scoped(config, move |client| {
                async move { client.get_user(&id).await }.boxed()
            })
            .await
            .context("Failed to fetch user")?;
            print_json(&user)
        }
        UserCommand::Delete { id } => {
            let deleted = id.clone();
            MemosClient::scoped(config, move |client| {
                async move { client.delete_user(&id).await }.boxed()
            })
            .await
            .context("Failed to delete user")?;
            println!("Deleted users/{deleted}");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_banner_matches_package() {
        assert_eq!(VERSION_BANNER, "Memotic CLI v0.1.0");
    }

    #[test]
    fn parses_memo_create_with_tags() {
        let cli = Cli::try_parse_from([
            "memotic",
            "memo",
            "create",
            "Meeting notes",
            "--visibility",
            "public",
            "--tag",
            "work",
            "--tag",
            "urgent",
        ])
        .unwrap();
        assert_eq!(cli.default_log_level(), "warn");
        match cli.command {
            Command::Memo(MemoCommand::Create {
                content,
                visibility,
                tags,
            }) => {
                assert_eq!(content, "Meeting notes");
                assert_eq!(visibility, Visibility::Public);
                assert_eq!(tags, vec!["work", "urgent"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_connection_flags_override_config() {
        let cli = Cli::try_parse_from([
            "memotic",
            "memo",
            "list",
            "--url",
            "http://memos.internal:8080",
            "--timeout",
            "2.5",
            "--retries",
            "5",
        ])
        .unwrap();
        let config = cli.connection.apply(ClientConfig::default());
        assert_eq!(config.base_url, "http://memos.internal:8080");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.retries, 5);
        assert!(config.token.is_none());
    }

    #[test]
    fn rejects_invalid_timeout_and_visibility() {
        assert!(Cli::try_parse_from(["memotic", "status", "--timeout", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["memotic", "memo", "create", "x", "--visibility", "secret"])
                .is_err()
        );
    }

    #[test]
    fn serve_defaults_to_info_logging() {
        let cli = Cli::try_parse_from(["memotic", "serve", "--port", "8000"]).unwrap();
        assert_eq!(cli.default_log_level(), "info");
        assert!(matches!(
            cli.command,
            Command::Serve {
                host: None,
                port: Some(8000)
            }
        ));
    }
}
