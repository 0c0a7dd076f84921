use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vdf_translator::model::language::{self, LANGUAGES};
use vdf_translator::protocol;
use vdf_translator::services::events::LogLevel;
use vdf_translator::services::settings;
use vdf_translator::{ChatTranslator, EventSink, RunController, RunEvent, RunRequest};

#[derive(Parser)]
#[command(name = "vdf-translator")]
#[command(version)]
#[command(about = "Translate Steam achievement localization files with a chat-completion API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to the per-user data directory)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate one source file into the given languages
    Run {
        /// Source file, e.g. 1234567_loc_schinese.vdf
        #[arg(short, long, value_name = "FILE")]
        source: PathBuf,

        /// Target language identifiers (repeat or comma-separate)
        #[arg(short, long = "lang", value_delimiter = ',', required = true)]
        languages: Vec<String>,

        /// Directory the translated files are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// API key; falls back to the environment, then the settings file
        #[arg(long, env = settings::API_KEY_ENV, hide_env_values = true)]
        api_key: Option<String>,

        /// Provider: deepseek or openai
        #[arg(long)]
        provider: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// Explicit chat-completion endpoint URL
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Speak the JSON-lines protocol on stdin/stdout
    Serve,

    /// List supported target languages
    Languages,

    /// Store the API key in the settings file
    SetKey {
        #[arg(value_name = "KEY")]
        key: String,
    },
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = cli.settings.unwrap_or_else(settings::default_path);

    match cli.command {
        Commands::Run {
            source,
            languages,
            output_dir,
            api_key,
            provider,
            model,
            endpoint,
        } => {
            let stored = settings::load(&settings_path)?;
            let mut cfg = stored.ai_config();
            cfg.api_key =
                settings::resolve_api_key(api_key.as_deref(), &stored).unwrap_or_default();
            if let Some(p) = provider {
                cfg.provider = p;
            }
            if let Some(m) = model {
                cfg.model = m;
            }
            if endpoint.is_some() {
                cfg.endpoint = endpoint;
            }

            let req = RunRequest {
                source,
                languages: language::parse_list(&languages)?,
                output_dir,
                credential: cfg.api_key.clone(),
            };

            let translator = ChatTranslator::new(&cfg)?;
            tracing::debug!(endpoint = translator.endpoint(), model = %cfg.model, "translator ready");

            run(req, Arc::new(translator))
        }

        Commands::Serve => {
            let stdin = io::stdin();
            protocol::serve(
                stdin.lock(),
                io::stdout(),
                settings_path,
                protocol::chat_translator_factory(),
            )
            .context("protocol session failed")
        }

        Commands::Languages => {
            let mut out = io::stdout().lock();
            for lang in LANGUAGES.iter() {
                writeln!(out, "{:<12} {} ({})", lang.id, lang.name, lang.chinese_name)?;
            }
            Ok(())
        }

        Commands::SetKey { key } => {
            let key = key.trim();
            if key.is_empty() {
                bail!("API key must not be empty");
            }
            let mut s = settings::load(&settings_path)?;
            s.api_key = key.to_string();
            settings::save(&settings_path, &s)?;
            println!("API key saved to {}", settings_path.display());
            Ok(())
        }
    }
}

fn run(req: RunRequest, translator: Arc<ChatTranslator>) -> Result<()> {
    let controller = RunController::new();
    let (tx, rx) = mpsc::channel();

    controller.start_run(req, translator, EventSink::new(tx))?;

    for event in rx {
        match event {
            RunEvent::Log { level, message } => match level {
                LogLevel::Info => eprintln!("{message}"),
                LogLevel::Warn => eprintln!("warning: {message}"),
                LogLevel::Error => eprintln!("error: {message}"),
            },
            RunEvent::TokenProgress {
                current,
                total,
                key,
                ..
            } => eprintln!("  {current}/{total} {key}"),
            RunEvent::Progress { fraction, .. } => {
                eprintln!("Progress: {:.0}%", fraction * 100.0)
            }
            _ => {}
        }
    }

    match controller.wait() {
        Some(Ok(summary)) => {
            for entry in &summary.completed {
                if let Some(path) = &entry.output {
                    println!("{}", path.display());
                }
            }
            if !summary.failed.is_empty() {
                bail!("{} of {} languages failed", summary.failed.len(), summary.total);
            }
            if summary.cancelled_run {
                bail!("translation cancelled");
            }
            Ok(())
        }
        Some(Err(e)) => bail!(e),
        None => bail!("translation did not run"),
    }
}
