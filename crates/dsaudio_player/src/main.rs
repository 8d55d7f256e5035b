// SPDX-License-Identifier: MIT OR Apache-2.0
//! `dsaudio-player` - simulated captioned playback.
//!
//! Plays a media source on a simulated clock and logs every caption
//! notification produced from its companion caption document (the media
//! path with its extension swapped for `.json`).

use clap::Parser;
use dsaudio_captions::{CueNotification, CueSource, FileCueSource, LoadStatus};
use dsaudio_player::{
    CaptionedPlayer, GainNode, PlaybackClock, PlayerResult, PlayerSettings, SimulatedClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command-line arguments for dsaudio-player
#[derive(Parser, Debug)]
#[command(name = "dsaudio-player")]
#[command(about = "Simulated audio playback with synchronized captions")]
#[command(version)]
struct Args {
    /// Media source; captions are read from the same path with a .json extension
    src: String,

    /// Settings file (RON)
    #[arg(short, long, env = "DSAUDIO_CONFIG")]
    config: Option<PathBuf>,

    /// Playback speed multiplier
    #[arg(long)]
    speed: Option<f64>,

    /// Output volume (0 to the configured maximum)
    #[arg(long)]
    volume: Option<f32>,

    /// Media length in seconds; defaults to the end of the last caption
    #[arg(long)]
    duration: Option<f64>,

    /// Start muted
    #[arg(long)]
    mute: bool,
}

#[tokio::main]
async fn main() -> PlayerResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dsaudio_player=info,dsaudio_captions=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => PlayerSettings::load(path)?,
        None => PlayerSettings::default(),
    };
    if let Some(speed) = args.speed {
        settings.playback_speed = speed;
    }

    let mut clock = SimulatedClock::new(args.duration.unwrap_or(0.0)).with_speed(settings.playback_speed);
    clock.looping = settings.looping;
    let gain = GainNode::new(settings.max_volume);
    let mut player = CaptionedPlayer::new(clock, gain, caption_source(&args.src)?, settings.clone());

    if let Some(volume) = args.volume {
        player.set_volume(volume);
    }
    if args.mute {
        player.toggle_mute(Some(true));
    }
    player.on_any(log_notification);

    player.set_src(args.src.as_str());

    // Without an explicit length the captions are the only hint of one
    if args.duration.is_none() {
        if let Some(LoadStatus::Applied { .. }) = player.wait_for_captions().await {
            let end = player.scheduler().document().map_or(0.0, |d| d.end_time());
            player.clock_mut().set_duration(end);
        }
    }
    if player.duration() <= 0.0 {
        tracing::warn!("Nothing to play: media length unknown, pass --duration");
        return Ok(());
    }

    info!(
        "Playing {} ({:.2}s, volume {:.2}, speed {:.2}x)",
        args.src,
        player.duration(),
        player.volume(),
        settings.playback_speed
    );
    player.play();

    let mut ticker = tokio::time::interval(settings.time_update_interval());
    let mut last = Instant::now();
    loop {
        ticker.tick().await;
        let now = Instant::now();
        player.clock_mut().update((now - last).as_secs_f64());
        last = now;

        player.time_update();
        if player.clock().is_finished() {
            break;
        }
    }

    info!("Playback finished at {:.2}s", player.clock().current_position());
    Ok(())
}

fn caption_source(src: &str) -> PlayerResult<Arc<dyn CueSource>> {
    if src.starts_with("http://") || src.starts_with("https://") {
        #[cfg(feature = "http")]
        return Ok(Arc::new(dsaudio_captions::HttpCueSource::new()?));
        #[cfg(not(feature = "http"))]
        tracing::warn!("Built without the http feature; remote captions are unavailable");
    }
    Ok(Arc::new(FileCueSource::new()))
}

fn log_notification(notification: &CueNotification) {
    let text = match (notification.word(), notification.speak()) {
        (Some(word), _) => format!("#{} {}", word.bubble_word_index, word.text),
        (None, Some(speak)) => speak.text.clone(),
        (None, None) => notification.bubble().native.clone(),
    };
    info!(
        "{:>7.2}s  bubble {}  {:<16} {}",
        notification.position,
        notification.bubble().index,
        notification.event_name(),
        text
    );
}
