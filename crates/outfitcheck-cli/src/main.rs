//! OutfitCheck CLI - a terminal client for the OutfitCheck wardrobe service.
//!
//! Signs in against the backend, keeps the token in the OS keychain, and
//! lists the wardrobe, outfits, feed and wear statistics of the signed-in user.

mod commands;
mod notifier;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::App;
use outfitcheck_core::Config;

/// Directory for a daily rolling log file, when set
const LOG_DIR_ENV: &str = "OUTFITCHECK_LOG_DIR";

const USAGE: &str = "\
Usage: outfitcheck <command> [args]

Commands:
  status                      Show who is signed in
  login [email]               Sign in (defaults to the last email used)
  register <email> <username> Create an account
  logout                      Sign out and forget the stored token
  wardrobe                    List your clothing items
  laundry <item-id>           Move an item into or out of the laundry
  outfits                     List your outfits
  wear <outfit-id> [date]     Log an outfit as worn (default: today)
  today                       Show what you logged for today
  stats                       Most worn outfits, most used and neglected items
  feed                        Show the post feed

Environment:
  OUTFITCHECK_API_URL         Backend URL (default http://localhost:8080)
  OUTFITCHECK_LOG_DIR         Also write logs to a daily file in this directory
  RUST_LOG                    Log filter (default: warn)";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "outfitcheck.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    if matches!(command, "-h" | "--help" | "help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let app = App::new(config)?;
    info!(command = command, api = app.api_base_url(), "OutfitCheck CLI starting");

    // Settle the session before anything depends on who is signed in
    app.initialize().await;

    let result = match (command, &args[1..]) {
        ("status", []) => app.status().await,
        ("login", []) => app.login(None).await,
        ("login", [email]) => app.login(Some(email.as_str())).await,
        ("register", [email, username]) => app.register(email, username).await,
        ("logout", []) => app.logout().await,
        ("wardrobe", []) => app.wardrobe().await,
        ("laundry", [item]) => app.laundry(item).await,
        ("outfits", []) => app.outfits().await,
        ("wear", [outfit]) => app.wear(outfit, None).await,
        ("wear", [outfit, date]) => app.wear(outfit, Some(date.as_str())).await,
        ("today", []) => app.today().await,
        ("stats", []) => app.stats().await,
        ("feed", []) => app.feed().await,
        _ => Err(anyhow::anyhow!("Unknown command or wrong arguments\n\n{}", USAGE)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        // Flush file logs before exiting
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
