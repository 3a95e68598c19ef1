use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use feedstamp::config::Config;
use feedstamp::feed::Relay;
use feedstamp::handler::{handle, InvocationRequest};
use feedstamp::server;

/// Get the default config file path (~/.config/feedstamp/config.toml)
fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("feedstamp")
            .join("config.toml"),
    )
}

#[derive(Parser, Debug)]
#[command(
    name = "feedstamp",
    about = "Relay an RSS feed with a fresh guid on every item"
)]
struct Args {
    /// Config file (defaults to ~/.config/feedstamp/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feed to relay (overrides config file and FEEDSTAMP_FEED_URL)
    #[arg(long, global = true, value_name = "URL")]
    feed_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay once and print the XML to stdout
    Fetch,
    /// Read a JSON invocation event from stdin, write the JSON response to stdout
    Invoke,
    /// Serve the relay over HTTP
    Serve {
        /// Listen address (overrides `listen_addr` from the config file)
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match args.config.clone().or_else(default_config_path) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let config = config
        .with_env_overrides()
        .with_feed_url_override(args.feed_url.clone());
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `fetch` and `invoke` output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let relay = Relay::new(&config);

    match args.command {
        Command::Fetch => {
            let xml = relay.run().await.context("Feed relay failed")?;
            println!("{xml}");
        }
        Command::Invoke => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read invocation event from stdin")?;

            let request: InvocationRequest = if input.trim().is_empty() {
                InvocationRequest::default()
            } else {
                serde_json::from_str(&input).context("Invocation event is not valid JSON")?
            };

            let response = handle(&relay, &request).await;
            let output =
                serde_json::to_string(&response).context("Failed to encode invocation response")?;
            println!("{output}");
        }
        Command::Serve { listen } => {
            let addr = listen.unwrap_or_else(|| config.listen_addr.clone());
            server::serve(Arc::new(relay), &addr)
                .await
                .with_context(|| format!("HTTP server on {addr} failed"))?;
        }
    }

    Ok(())
}
