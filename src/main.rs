use std::sync::Arc;
use std::time::Duration;

use ambient_scribe::{
    CaptureConfig, Config, MicrophoneCapture, NoteClient, ProtocolVariant, SessionConfig,
    SessionController, SessionTiming, StreamOptions, WsConnector,
};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Structured encounter listening (transcript items)
    Listen,
    /// Free-form dictation
    Dictate,
}

#[derive(Parser)]
#[command(name = "ambient-scribe", about = "Live transcription streaming client")]
struct Cli {
    /// Config file (without extension)
    #[arg(long, default_value = "config/ambient-scribe")]
    config: String,

    /// Streaming mode
    #[arg(long, value_enum, default_value = "dictate")]
    mode: Mode,

    /// Override the configured locale
    #[arg(long)]
    locale: Option<String>,

    /// Stop after this many seconds (default: run until ctrl-c)
    #[arg(long)]
    duration_secs: Option<u64>,

    /// After a listen session, digest the transcript into a note
    #[arg(long)]
    digest: bool,

    /// Free-text patient context passed to the digest call
    #[arg(long, default_value = "")]
    patient_context: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} starting", cfg.service.name);

    let variant = match cli.mode {
        Mode::Listen => ProtocolVariant::Listen,
        Mode::Dictate => ProtocolVariant::Dictate,
    };
    let locale = cli.locale.unwrap_or_else(|| cfg.dictation.locale.clone());

    let session_config = SessionConfig {
        options: StreamOptions {
            sample_rate: cfg.audio.sample_rate,
            locale: locale.clone(),
            explicit_punctuation: cfg.dictation.explicit_punctuation,
        },
        timing: SessionTiming::default(),
        ..SessionConfig::default()
    };

    let capture = MicrophoneCapture::new(CaptureConfig {
        target_sample_rate: cfg.audio.sample_rate,
        frame_duration_ms: cfg.audio.frame_duration_ms,
        ..CaptureConfig::default()
    });
    let connector = Arc::new(WsConnector::new(&cfg.api.ws_url, &cfg.api.api_key));

    let mut controller =
        SessionController::new(variant, session_config, Box::new(capture), connector);

    controller.start().await?;
    info!("Recording... press ctrl-c to stop");

    match cli.duration_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            tokio::signal::ctrl_c().await?;
        }
    }

    let stats = controller.stop().await;
    info!(
        "Recording stopped: {:.1}s, {} frames, {} items ({} final)",
        stats.duration_secs, stats.frames_forwarded, stats.item_count, stats.finalized_count
    );

    let transcript = controller.transcript().await;
    for item in &transcript {
        let marker = if item.is_final { " " } else { "~" };
        println!(
            "{}[{} - {}] {}",
            marker,
            format_offset(item.start_offset_ms),
            format_offset(item.end_offset_ms),
            item.text
        );
    }

    if cli.digest {
        if transcript.is_empty() {
            warn!("Nothing to digest");
        } else {
            let notes = NoteClient::new(&cfg.api.http_url, &cfg.api.api_key);
            let note = notes
                .digest(&transcript, &cli.patient_context, &locale)
                .await?;
            for section in &note.sections {
                println!("\n## {}\n{}", section.title, section.text);
            }
        }
    }

    Ok(())
}

fn format_offset(ms: u64) -> String {
    let seconds = (ms / 1000) % 60;
    let minutes = ms / 60_000;
    format!("{minutes:02}:{seconds:02}")
}
