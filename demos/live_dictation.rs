// Live dictation demo
//
// Streams the default microphone to the dictation socket for 15
// seconds and prints the reconciled text as it stabilizes.
//
// Prerequisites:
// - config/ambient-scribe.toml with your service endpoints
// - AMBIENT_SCRIBE_API__API_KEY exported
//
// Usage: cargo run --example live_dictation

use std::sync::Arc;
use std::time::Duration;

use ambient_scribe::{
    CaptureConfig, Config, LifecycleEvent, MicrophoneCapture, ProtocolVariant, SessionConfig,
    SessionController, StreamOptions, WsConnector,
};
use anyhow::Result;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/ambient-scribe")?;

    let session_config = SessionConfig {
        options: StreamOptions {
            sample_rate: cfg.audio.sample_rate,
            locale: cfg.dictation.locale.clone(),
            explicit_punctuation: cfg.dictation.explicit_punctuation,
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
        ProtocolVariant::Dictate,
        session_config,
        Box::new(capture),
        connector,
    );

    let mut lifecycle = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = lifecycle.recv().await {
            match event {
                LifecycleEvent::Opened => info!("🎤 Session open, start speaking"),
                LifecycleEvent::Closed => info!("⏹️  Session closed"),
                LifecycleEvent::Error(message) => warn!("Session error: {}", message),
            }
        }
    });

    controller.start().await?;

    // Print the view once a second while dictating.
    for _ in 0..15 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let words: Vec<String> = controller
            .transcript()
            .await
            .iter()
            .map(|item| item.text.clone())
            .collect();
        if !words.is_empty() {
            println!("\r{}", words.join(" "));
        }
    }

    let stats = controller.stop().await;
    info!(
        "Done: {} items ({} final) from {} frames",
        stats.item_count, stats.finalized_count, stats.frames_forwarded
    );

    Ok(())
}
