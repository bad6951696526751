// Loop driver: capture thread + game window + optional preview window.
// One iteration = one tick: read the slot, step the game, redraw, present.

use std::sync::Arc;
use std::time::{Duration, Instant};

use minifb::Scale;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::capture::CaptureHandle;
use crate::config::{CaptureConfig, TrackerParams};
use crate::control::{paddle_x, propose_heading};
use crate::draw::{draw_text, Drawer};
use crate::error::Error;
use crate::games::breakout::Breakout;
use crate::games::snake::{Snake, StepOutcome};
use crate::slot::TrackerSlot;
use crate::types::{rgb, Blob, FrameBuffer};

/// A game the driver can run: one step per tick, then a full redraw.
pub trait TickGame {
    fn title(&self) -> &str;
    fn size(&self) -> (usize, usize);
    fn target_fps(&self) -> usize;
    /// Advance one tick with the latest detection. Some(score) ends the session.
    fn tick(&mut self, blob: Option<Blob>, now: Instant) -> Option<usize>;
    fn render(&self, fb: &mut FrameBuffer, now: Instant);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    GameOver { score: usize },
}

/* ------------------------------ Adapters ------------------------------ */

pub struct BreakoutSession<R: Rng> {
    pub game: Breakout<R>,
    pub capture_width: u32,
}

impl<R: Rng> TickGame for BreakoutSession<R> {
    fn title(&self) -> &str {
        "Breakout - blue object control"
    }

    fn size(&self) -> (usize, usize) {
        let cfg = self.game.config();
        (cfg.width as usize, cfg.height as usize)
    }

    fn target_fps(&self) -> usize {
        self.game.target_fps()
    }

    fn tick(&mut self, blob: Option<Blob>, now: Instant) -> Option<usize> {
        let cfg = self.game.config();
        let paddle = blob.map(|b| paddle_x(b.centroid.x, self.capture_width, cfg.width, cfg.paddle_width));
        self.game.tick(now, paddle);
        None
    }

    fn render(&self, fb: &mut FrameBuffer, now: Instant) {
        self.game.render(fb, now);
    }
}

pub struct SnakeSession<R: Rng> {
    pub game: Snake<R>,
    pub capture_size: (u32, u32),
}

impl<R: Rng> TickGame for SnakeSession<R> {
    fn title(&self) -> &str {
        "Snake - red object control"
    }

    fn size(&self) -> (usize, usize) {
        let cfg = self.game.config();
        (cfg.grid_width as usize * cfg.cell_size, cfg.grid_height as usize * cfg.cell_size)
    }

    fn target_fps(&self) -> usize {
        self.game.config().tick_hz
    }

    fn tick(&mut self, blob: Option<Blob>, _now: Instant) -> Option<usize> {
        let (w, h) = self.capture_size;
        self.game.steer(blob.map(|b| propose_heading(b.centroid, w, h)));
        match self.game.step() {
            StepOutcome::Crashed { score } => {
                info!(score, "snake crashed");
                Some(score)
            }
            StepOutcome::Ate => {
                debug!(length = self.game.score(), "food eaten");
                None
            }
            StepOutcome::Moved => None,
        }
    }

    fn render(&self, fb: &mut FrameBuffer, _now: Instant) {
        self.game.render(fb);
    }
}

/* -------------------------------- Loop -------------------------------- */

/// Open the camera, build the game for the resolution it delivers, and run
/// until the window closes, a quit key is pressed or the game ends itself.
pub fn run<G, F>(capture_cfg: CaptureConfig, params: TrackerParams, make_game: F) -> Result<SessionEnd, Error>
where
    G: TickGame,
    F: FnOnce((u32, u32)) -> G,
{
    let slot = Arc::new(TrackerSlot::new());
    let show_preview = capture_cfg.preview;
    // Dropped on every return path below, which stops the thread and frees the camera.
    let capture = CaptureHandle::spawn(capture_cfg, params, Arc::clone(&slot))?;
    let (cw, ch) = capture.resolution();

    let mut game = make_game((cw, ch));
    let (w, h) = game.size();
    let mut drawer = Drawer::new(game.title(), w, h, Scale::X1)?;
    let mut preview = if show_preview {
        let mut p = Drawer::new("Detection preview (Q to quit)", cw as usize, ch as usize, Scale::X2)?;
        p.set_target_fps(0); // the game window sets the pace
        Some(p)
    } else {
        None
    };

    let mut screen = FrameBuffer::new(w, h);
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    let end = loop {
        if !drawer.is_open() || drawer.quit_pressed() {
            break SessionEnd::Quit;
        }
        if preview.as_ref().is_some_and(|p| p.quit_pressed()) {
            break SessionEnd::Quit;
        }

        let now = Instant::now();
        let finished = game.tick(slot.latest(), now);

        game.render(&mut screen, now);
        if !slot.capture_alive() {
            draw_text(&mut screen, 8, h as i32 - 24, "NO CAMERA", 2, rgb(255, 64, 64));
        }
        drawer.set_target_fps(game.target_fps());
        drawer.present(&screen)?;

        if let Some(p) = preview.as_mut() {
            if !p.is_open() {
                warn!("preview window closed; game continues without it");
                preview = None;
            } else if let Some(frame) = slot.take_preview() {
                p.present(&frame)?;
            } else {
                p.poll();
            }
        }

        if let Some(score) = finished {
            break SessionEnd::GameOver { score };
        }

        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            debug!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    };

    info!(?end, "session over");
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakoutConfig, SnakeConfig};
    use crate::control::Heading;
    use crate::games::breakout::Phase;
    use crate::types::{BoundingBox, Point};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blob_at(x: f32, y: f32) -> Blob {
        Blob {
            centroid: Point { x, y },
            bbox: BoundingBox { x: 0, y: 0, width: 1, height: 1 },
            area: 1000,
        }
    }

    #[test]
    fn breakout_session_maps_blob_to_paddle() {
        let t0 = Instant::now();
        let game = Breakout::new(BreakoutConfig::default(), StdRng::seed_from_u64(5), t0);
        let mut s = BreakoutSession { game, capture_width: 320 };
        assert_eq!(s.size(), (500, 900));
        assert_eq!(s.tick(Some(blob_at(160.0, 0.0)), t0), None);
        assert_eq!(s.game.paddle_x(), 190.0);
        s.tick(None, t0);
        assert_eq!(s.game.paddle_x(), 190.0);
        assert!(matches!(s.game.phase(), Phase::StartingCooldown { .. }));
    }

    #[test]
    fn snake_session_steers_then_steps() {
        let game = Snake::new(SnakeConfig::default(), StdRng::seed_from_u64(5));
        let mut s = SnakeSession { game, capture_size: (640, 480) };
        assert_eq!(s.size(), (600, 600));
        assert_eq!(s.target_fps(), 10);
        // blob far below centre: turn down
        let before = s.game.head();
        let ate_or_moved = s.tick(Some(blob_at(320.0, 470.0)), Instant::now());
        assert_eq!(ate_or_moved, None);
        assert_eq!(s.game.heading(), Heading::Down);
        assert_eq!(s.game.head(), (before.0, before.1 + 1));
    }

    #[test]
    fn snake_session_ends_with_the_final_score() {
        let cfg = SnakeConfig { start: (29, 0), ..SnakeConfig::default() };
        let game = Snake::new(cfg, StdRng::seed_from_u64(5));
        let mut s = SnakeSession { game, capture_size: (640, 480) };
        assert_eq!(s.tick(None, Instant::now()), Some(1));
    }
}
