//! trackview player
//!
//! Streams an analysed video frame by frame from a tracking server over
//! WebSocket, buffers it, and plays it back at the stream's frame rate with
//! detection overlays.

mod config;
mod console;
mod event_loop;
mod protocol;
mod sink;
mod tagging;
mod transport;

use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tv_common::{FlowConfig, Speed};
use tv_engine::Player;
use tv_overlay::LabelOptions;

use crate::config::PlayerConfig;
use crate::event_loop::EventLoop;
use crate::sink::LogSink;

/// trackview - buffered playback of tracked video streams
#[derive(Parser, Debug)]
#[command(name = "trackview")]
#[command(about = "Buffered playback of object-tracking video streams")]
#[command(version)]
struct Args {
    /// WebSocket URL of the tracking server
    #[arg(long, env = "TRACKVIEW_WS_URL", default_value = "ws://127.0.0.1:8765")]
    url: String,

    /// Tracker mode used until another one is selected
    #[arg(long, default_value = "bytetrack")]
    tracker: String,

    /// Playback speed multiplier (e.g. 1, 2, 0.5)
    #[arg(long, default_value = "1")]
    speed: Speed,

    /// Frames requested per chunk
    #[arg(long, default_value_t = FlowConfig::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Seconds of frames kept ahead of playback
    #[arg(long, default_value_t = FlowConfig::DEFAULT_MARGIN_SECONDS)]
    margin_secs: u32,

    /// Extra seconds buffered beyond the margin
    #[arg(long, default_value_t = FlowConfig::DEFAULT_SLACK_SECONDS)]
    slack_secs: u32,

    /// Delay between reconnect attempts in milliseconds
    #[arg(long, default_value = "2000")]
    reconnect_ms: u64,

    /// Start playing as soon as the first video is selected
    #[arg(long)]
    autoplay: bool,

    /// Leave object ids out of labels
    #[arg(long)]
    hide_ids: bool,

    /// Leave class names out of labels
    #[arg(long)]
    hide_classes: bool,

    /// Run in background (no console, minimal output)
    #[arg(long)]
    background: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> PlayerConfig {
        PlayerConfig {
            url: self.url,
            reconnect_delay: Duration::from_millis(self.reconnect_ms),
            flow: FlowConfig {
                chunk_size: self.chunk_size,
                margin_seconds: self.margin_secs,
                slack_seconds: self.slack_secs,
            },
            speed: self.speed,
            tracker: self.tracker,
            labels: LabelOptions {
                show_id: !self.hide_ids,
                show_class: !self.hide_classes,
            },
            autoplay: self.autoplay,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let background = args.background;

    // Initialize logging
    if !background {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // RUST_LOG wins over --log-level when set
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(level).into())
            .from_env_lossy();

        FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    let config = args.into_config();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    // Print startup banner
    if !background {
        println!();
        println!("========================================================");
        println!("  trackview player v{}", env!("CARGO_PKG_VERSION"));
        println!("========================================================");
        println!("  Server:    {}", config.url);
        println!("  Tracker:   {}", config.tracker);
        println!("  Speed:     {}", config.speed);
        println!(
            "  Buffering: chunks of {}, {}s margin + {}s slack",
            config.flow.chunk_size, config.flow.margin_seconds, config.flow.slack_seconds
        );
        println!("  Autoplay:  {}", if config.autoplay { "on" } else { "off" });
        println!("========================================================");
        println!("  {}", console::HELP);
        println!();
    }

    let (events_tx, events_rx) = mpsc::channel(256);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (console_tx, console_rx) = mpsc::channel(16);

    let transport_config = config.transport();
    let transport = tokio::spawn(async move {
        if let Err(e) = transport::run(transport_config, events_tx, outbound_rx).await {
            error!("Transport error: {}", e);
        }
    });

    if !background {
        tokio::spawn(console::read_stdin(console_tx));
    }

    let player = Player::new(config.settings());
    EventLoop::new(player, LogSink::new(), outbound_tx, config.autoplay)
        .run(events_rx, console_rx)
        .await;

    transport.abort();
    info!("trackview stopped");
    Ok(())
}
