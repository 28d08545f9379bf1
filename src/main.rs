//! Elenya Bot - Entry Point
//!
//! Modes:
//! - Default: Telegram bot (long polling)
//! - --check / -c: pre-flight check of configuration and dictionary

use elenya_bot::{preflight, Config};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Parse args
    let args: Vec<String> = std::env::args().collect();
    let check_mode = args.iter().any(|a| a == "--check" || a == "-c");
    let help_mode = args.iter().any(|a| a == "--help" || a == "-h");

    if help_mode {
        println!("Elenya Bot v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: elenya-bot [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --check, -c    Verify configuration and dictionary, then exit");
        println!("  --help, -h     Show this help");
        println!();
        println!("Environment variables:");
        println!("  TELEGRAM_TOKEN              Telegram bot token (BOT_TOKEN also accepted)");
        println!("  OPENAI_API_KEY              OpenAI API key");
        println!("  OPENAI_MODEL                Chat model (default: gpt-4-turbo)");
        println!("  OPENAI_BASE_URL             API base URL (default: https://api.openai.com/v1)");
        println!("  EMBEDDING_MODEL             Embedding model (default: text-embedding-ada-002)");
        println!("  ELENYA_DICTIONARY_PATH      Dictionary file (default: rag/data/elenya_dict.pdf)");
        println!("  ELENYA_RELEVANCE_THRESHOLD  Max chunk distance (default: 1.5)");
        println!("  ELENYA_TOP_K                Chunks per lookup (default: 3)");
        println!("  ELENYA_CHUNK_SIZE           Dictionary chunk size (default: 500)");
        println!("  ELENYA_CHUNK_OVERLAP        Dictionary chunk overlap (default: 50)");
        println!("  ELENYA_STT_LANGUAGE         Speech recognition language (default: ru)");
        println!("  OPENAI_TIMEOUT_SECS         OpenAI request timeout (default: 60)");
        return Ok(());
    }

    if check_mode {
        let report = preflight::check(&Config::from_env());
        print!("{}", report.format_report());
        if !report.ready {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Setup logging
    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Missing secrets abort startup here
    let config = Config::from_env()?;

    info!("Elenya Bot v{}", env!("CARGO_PKG_VERSION"));
    elenya_bot::telegram::run_telegram_bot(config).await?;

    Ok(())
}
