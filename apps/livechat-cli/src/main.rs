//! livechat terminal client entry point.

mod config;
mod render;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use livechat_connection::ConnectionManager;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use crate::config::{ClientConfig, Overrides};

/// Terminal client for livechat servers
#[derive(Parser, Debug)]
#[command(name = "livechat")]
#[command(version)]
struct Cli {
    /// WebSocket URL of the chat server
    #[arg(short, long)]
    url: Option<String>,

    /// Display name to announce
    #[arg(short, long)]
    name: Option<String>,

    /// Seconds to wait before reconnecting
    #[arg(long)]
    reconnect_secs: Option<u64>,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the configuration file
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the chat.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting livechat");

    let path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };
    let mut client_config = match ClientConfig::load_from(&path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            ClientConfig::default()
        }
    };
    client_config.apply_overrides(Overrides {
        endpoint: cli.url,
        username: cli.name,
        reconnect_secs: cli.reconnect_secs,
    });

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if client_config.username.trim().is_empty() {
        match prompt_username(&mut input).await? {
            Some(name) => client_config.username = name,
            None => return Ok(()),
        }
    }
    if cli.save {
        client_config
            .save_to(&path)
            .with_context(|| format!("saving {}", path.display()))?;
    }

    let manager = ConnectionManager::new().with_reconnect_config(client_config.reconnect_config());
    let renderer = tokio::spawn(render::render_loop(
        manager.subscribe(),
        std::io::stdout(),
    ));

    println!(
        "Joining {} as {}. Type /users to list participants, /quit to leave.",
        client_config.endpoint, client_config.username
    );
    manager.start(client_config.chat_config());

    while let Some(line) = input.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/users" => println!("{}", render::format_users(&manager.users())),
            text => {
                if let Some(notice) = render::send_notice(&manager.send_message(text)) {
                    println!("{notice}");
                }
            }
        }
    }

    manager.stop();
    drop(manager);
    let _ = renderer.await;
    Ok(())
}

/// Asks for a display name until a non-empty one is entered. `None` on EOF.
async fn prompt_username(input: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<String>> {
    loop {
        print!("Your name: ");
        std::io::stdout().flush()?;
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let name = line.trim();
        if !name.is_empty() {
            return Ok(Some(name.to_string()));
        }
    }
}
