// Two camera-controlled arcade games.
// • breakout: hold a blue object in front of the camera; the paddle follows it left/right.
// • snake:    hold a red object; move it away from the frame centre to steer.
// ESC or Q quits. A second window shows what the tracker sees (disable with --no-preview).

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use cam_arcade::config::{
    BreakoutConfig, CaptureConfig, SnakeConfig, TrackerParams, BREAKOUT_MIN_AREA, SNAKE_MIN_AREA,
};
use cam_arcade::driver::{self, BreakoutSession, SessionEnd, SnakeSession};
use cam_arcade::error::Error;
use cam_arcade::games::breakout::Breakout;
use cam_arcade::games::snake::Snake;

#[derive(Parser, Debug)]
#[command(version, about = "Camera-controlled Brick Breaker and Snake")]
struct Args {
    /// Camera index
    #[arg(short, long, default_value_t = 0, global = true)]
    camera: u32,
    /// Seed for board layout and food placement
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Do not open the detection preview window
    #[arg(long, global = true)]
    no_preview: bool,
    /// Do not mirror camera frames
    #[arg(long, global = true)]
    no_mirror: bool,
    #[command(subcommand)]
    game: GameCommand,
}

#[derive(Subcommand, Debug)]
enum GameCommand {
    /// Brick breaker with a blue-object paddle
    Breakout {
        #[arg(long, default_value_t = 320)]
        capture_width: u32,
        #[arg(long, default_value_t = 240)]
        capture_height: u32,
        /// Smallest blob (pixels) that counts as the controller
        #[arg(long, default_value_t = BREAKOUT_MIN_AREA)]
        min_area: usize,
        /// Seconds of "get ready" / "you lost" countdown
        #[arg(long = "cooldown-secs", default_value = "3", value_parser = parse_cooldown)]
        cooldown: Duration,
    },
    /// Snake steered by a red object
    Snake {
        #[arg(long, default_value_t = 640)]
        capture_width: u32,
        #[arg(long, default_value_t = 480)]
        capture_height: u32,
        #[arg(long, default_value_t = SNAKE_MIN_AREA)]
        min_area: usize,
        #[arg(long, default_value_t = 10)]
        tick_hz: usize,
    },
}

/// Non-negative, finite seconds that fit in a `Duration`.
fn parse_cooldown(s: &str) -> Result<Duration, String> {
    let secs: f32 = s.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f32(secs).map_err(|e| format!("{secs}: {e}"))
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let capture = |width, height| CaptureConfig {
        index: args.camera,
        width,
        height,
        mirror: !args.no_mirror,
        preview: !args.no_preview,
    };

    match args.game {
        GameCommand::Breakout { capture_width, capture_height, min_area, cooldown } => {
            let cfg = BreakoutConfig { cooldown, ..BreakoutConfig::default() };
            info!(?cfg, "starting breakout");
            driver::run(
                capture(capture_width, capture_height),
                TrackerParams::breakout(min_area),
                |(cw, _)| BreakoutSession {
                    game: Breakout::new(cfg, rng, Instant::now()),
                    capture_width: cw,
                },
            )?;
        }
        GameCommand::Snake { capture_width, capture_height, min_area, tick_hz } => {
            let cfg = SnakeConfig { tick_hz: tick_hz.max(1), ..SnakeConfig::default() };
            info!(?cfg, "starting snake");
            let end = driver::run(
                capture(capture_width, capture_height),
                TrackerParams::snake(min_area),
                |size| SnakeSession { game: Snake::new(cfg, rng), capture_size: size },
            )?;
            if let SessionEnd::GameOver { score } = end {
                println!("You lost! Final score: {score}");
            }
        }
    }

    Ok(())
}
