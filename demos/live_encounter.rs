// Live encounter demo
//
// Streams the microphone to the listen socket, shows the transcript
// as items finalize, then digests the result into a structured note
// and generates patient instructions from it.
//
// Usage: cargo run --example live_encounter

use std::sync::Arc;
use std::time::Duration;

use ambient_scribe::{
    CaptureConfig, Config, MicrophoneCapture, NoteClient, ProtocolVariant, SessionConfig,
    SessionController, StreamOptions, WsConnector,
};
use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/ambient-scribe")?;

    let session_config = SessionConfig {
        options: StreamOptions {
            sample_rate: cfg.audio.sample_rate,
            locale: cfg.dictation.locale.clone(),
            explicit_punctuation: false,
        },
        ..SessionConfig::default()
    };

    let capture = MicrophoneCapture::new(CaptureConfig {
        target_sample_rate: cfg.audio.sample_rate,
        frame_duration_ms: cfg.audio.frame_duration_ms,
        ..CaptureConfig::default()
    });
    let connector = Arc::new(WsConnector::new(&cfg.api.ws_url, &cfg.api.api_key));

    let mut controller = SessionController::new(
        ProtocolVariant::Listen,
        session_config,
        Box::new(capture),
        connector,
    );

    controller.start().await?;
    info!("🎙️  Recording the encounter for 30 seconds...");

    tokio::time::sleep(Duration::from_secs(30)).await;

    let stats = controller.stop().await;
    let transcript = controller.transcript().await;

    info!(
        "Encounter done: {} items ({} final)",
        stats.item_count, stats.finalized_count
    );
    for item in &transcript {
        println!("[{}ms - {}ms] {}", item.start_offset_ms, item.end_offset_ms, item.text);
    }

    if transcript.is_empty() {
        return Ok(());
    }

    let notes = NoteClient::new(&cfg.api.http_url, &cfg.api.api_key);

    info!("Digesting transcript into a note...");
    let note = notes
        .digest(&transcript, "", &cfg.dictation.locale)
        .await?;
    for section in &note.sections {
        println!("\n## {}\n{}", section.title, section.text);
    }

    info!("Generating patient instructions...");
    let instructions = notes
        .patient_instructions(&note, &cfg.dictation.locale, &cfg.dictation.locale)
        .await?;
    println!("\nInstructions:\n{instructions}");

    Ok(())
}
