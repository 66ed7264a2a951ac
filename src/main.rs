use std::fs::File;
use std::io::stdout;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use updown::core::config::{self, ResolvedConfig};
use updown::core::state::App;
use updown::inference::{CompletionProvider, GeminiProvider};
use updown::{oneshot, tui};

#[derive(Parser)]
#[command(name = "updown", about = "Ask Gemini whether Solana goes up or down")]
struct Args {
    /// Gemini model to use (overrides config and UPDOWN_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Ask a single question, print the streamed answer and exit
    #[arg(short, long)]
    prompt: Option<String>,
}

fn build_provider(config: &ResolvedConfig) -> Arc<dyn CompletionProvider> {
    Arc::new(GeminiProvider::new(
        config.gemini_api_key.clone(),
        Some(config.gemini_base_url.clone()),
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to updown.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("updown.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("updown: {e}");
            return ExitCode::FAILURE;
        }
    };
    let resolved = config::resolve(&file_config, args.model.as_deref());

    if resolved.gemini_api_key.is_none() {
        log::warn!("Gemini API key not loaded (set GEMINI_API_KEY); requests will fail");
    }

    log::info!("Starting up with model: {}", resolved.model_name);

    let provider = build_provider(&resolved);

    if let Some(prompt) = args.prompt {
        let mut app = App::from_config(provider, &resolved);
        return match oneshot::ask_once(&mut app, prompt, &mut stdout()).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("{error}");
                ExitCode::FAILURE
            }
        };
    }

    match tui::run(provider, resolved) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Terminal error: {}", e);
            eprintln!("updown: {e}");
            ExitCode::FAILURE
        }
    }
}
