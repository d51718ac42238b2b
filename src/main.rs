//! Visitbot - Entry Point
//!
//! Runs the webhook server. All settings come from the environment
//! (optionally seeded from a `.env` file).

use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use visitbot::{BotServer, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Visitbot v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: visitbot [--help]");
        println!();
        println!("Environment variables:");
        println!("  TELEGRAM_BOT_TOKEN          Telegram bot token (required)");
        println!("  API_BASE                    Upstream lookup base URL");
        println!("  RENDER_EXTERNAL_URL         Public base URL for the webhook");
        println!("  PUBLIC_URL                  Fallback public base URL");
        println!("  KEEPALIVE_URL               Keep-alive ping target (default: public URL)");
        println!("  KEEPALIVE_INTERVAL_SECS     Keep-alive period (default: 300)");
        println!("  UPSTREAM_TIMEOUT_SECS       Upstream request timeout (default: 20)");
        println!("  BOT_VARIANT                 classic | summary (default: classic)");
        println!("  BOT_USERNAME                Only answer /cmd@name addressed to this bot");
        println!("  HOST / PORT                 Listen address (default: 0.0.0.0:8000)");
        println!("  TELEGRAM_API_URL            Custom Bot API server");
        println!("  DELETE_WEBHOOK_ON_SHUTDOWN  Call deleteWebhook on exit (default: false)");
        println!("  LOG_FORMAT                  json for JSON logs");
        return Ok(());
    }

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_ansi(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    info!("Visitbot v{}", env!("CARGO_PKG_VERSION"));

    let server = BotServer::new(config)?;
    server.run().await?;

    Ok(())
}
