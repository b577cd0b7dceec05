use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ambient_companion::context::load_static_context;
use ambient_companion::voice::{InteractionStatus, SpeechSink, SpeechSource, speech_client};
use ambient_companion::{
    Config, ConversationHistory, HttpSpeechCapture, HttpSpeechDelivery, PollResult, Session,
    TranscriptFilter, context,
};

/// Companion - proactive voice companion for a monitored home
#[derive(Parser)]
#[command(name = "companion", version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "COMPANION_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the conversation session (default)
    Run {
        /// Number of turns, overriding the config
        #[arg(short, long)]
        turns: Option<u32>,
        /// Occupant identifier, overriding the config
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Probe the speech-capture service once
    Check,
    /// Send text to the speech-delivery service
    Say {
        /// Text to speak
        #[arg(default_value = "Hola, esto es una prueba del sistema de voz.")]
        text: String,
    },
    /// Print the proactive prompt for the configured occupant
    Prompt {
        /// Occupant identifier, overriding the config
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,ambient_companion=info",
        1 => "info,ambient_companion=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run {
        turns: None,
        user: None,
    }) {
        Command::Run { turns, user } => {
            if let Some(turns) = turns {
                config.session.max_turns = turns;
            }
            if let Some(user) = user {
                config.session.user = user;
            }
            run_session(config).await
        }
        Command::Check => check_capture(&config).await,
        Command::Say { text } => say(&config, &text).await,
        Command::Prompt { user } => {
            if let Some(user) = user {
                config.session.user = user;
            }
            print_prompt(&config)
        }
    }
}

/// Run the session until all turns complete or ctrl-c
async fn run_session(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        user = %config.session.user,
        capture_url = %config.speech.capture_url,
        model = %config.llm.model,
        "starting companion"
    );

    let mut session = Session::from_config(config)?;
    let report = session
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    for outcome in &report.outcomes {
        tracing::debug!(
            turn = outcome.index,
            mode = ?outcome.mode,
            result = ?outcome.result,
            "turn outcome"
        );
    }

    Ok(())
}

/// Probe the speech-capture service once
async fn check_capture(config: &Config) -> anyhow::Result<()> {
    println!("Checking speech capture at {}...\n", config.speech.capture_url);

    let client = speech_client(config.speech.request_timeout)?;
    let capture = HttpSpeechCapture::with_client(client, &config.speech.capture_url);
    let status = capture.check_interaction().await?;
    println!("Interaction status: {status:?}");

    if status == InteractionStatus::HasAudio {
        let transcript = capture.transcribe().await?;
        println!("Transcript: \"{transcript}\"");

        let filter = TranscriptFilter::from(&config.speech);
        match filter.accept(&transcript) {
            Some(text) => println!("Accepted as user input: \"{text}\""),
            None => println!("Rejected (too short or a non-answer)"),
        }
    }

    Ok(())
}

/// Send text to the speech-delivery service
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Sending \"{text}\" to {}...", config.speech.delivery_url);

    let client = speech_client(config.speech.request_timeout)?;
    let delivery = HttpSpeechDelivery::with_client(client, &config.speech.delivery_url);
    delivery.deliver(text).await?;

    println!("Delivered.");
    Ok(())
}

/// Print the proactive prompt for the configured occupant
fn print_prompt(config: &Config) -> anyhow::Result<()> {
    let static_context = load_static_context(&config.session)?;
    let history = ConversationHistory::new();
    let prompt = context::compose(&static_context, &history, &PollResult::NoInput);
    println!("{prompt}");
    Ok(())
}
