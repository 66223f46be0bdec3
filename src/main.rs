mod config;
mod news;
mod server;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::env;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("story_relay=info")),
        )
        .init();

    // Parse a minimal CLI: optional --config <path>, --listen <addr>
    let mut args = env::args().skip(1);
    let mut config_override: Option<String> = None;
    let mut listen_override: Option<String> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                if let Some(p) = args.next() { config_override = Some(p); }
            }
            "--listen" => {
                if let Some(a) = args.next() { listen_override = Some(a); }
            }
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
    }

    let cfg = config::load(config_override, listen_override)?;
    let listener = TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen))?;
    info!(listen = %cfg.listen, upstream = %cfg.upstream.url, "server started");

    server::serve(listener, &cfg).await
}

fn print_help() {
    println!("story-relay");
    println!("Usage: story-relay [--config <path>] [--listen <addr>]");
    println!("  --config <path>   Path to a config.toml (upstream, extraction rules, listen address)");
    println!("  --listen <addr>   Address to listen on, overrides the config (default 0.0.0.0:8080)");
}
