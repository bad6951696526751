// Brick Breaker: paddle driven by the tracked blue blob.
//
// Phases:
//   StartingCooldown --(countdown over)--> Playing
//   Playing --(ball past the bottom)--> LostCooldown --(countdown over)--> Playing
//
// Cooldown phases freeze physics and show a message with the remaining time.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::info;

use crate::config::BreakoutConfig;
use crate::draw::{clear, draw_text, draw_text_centered, fill_circle, fill_rect, stroke_rect};
use crate::types::{rgb, FrameBuffer};

const BACKGROUND: u32 = rgb(128, 128, 128);
const WHITE: u32 = rgb(255, 255, 255);
const BLACK: u32 = rgb(0, 0, 0);

// Indexed by durability - 1.
const BLOCK_COLORS: [u32; 5] = [
    rgb(255, 0, 0),
    rgb(255, 128, 0),
    rgb(0, 255, 0),
    rgb(0, 0, 255),
    rgb(255, 0, 255),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    StartingCooldown { since: Instant },
    Playing,
    LostCooldown { since: Instant },
}

/// What one tick did, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickEvent {
    Waiting,
    Resumed,
    Moved,
    HitBlock { row: usize, col: usize },
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
}

/// Rows of block durabilities; 0 means the cell is empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub rows: Vec<Vec<u8>>,
}

impl Board {
    pub fn generate<R: Rng>(rng: &mut R, cfg: &BreakoutConfig) -> Self {
        let n = rng.gen_range(cfg.min_rows..=cfg.max_rows);
        let rows = (0..n)
            .map(|_| (0..cfg.columns).map(|_| rng.gen_range(1..=cfg.max_durability)).collect())
            .collect();
        Self { rows }
    }

    pub fn remaining(&self) -> usize {
        self.rows.iter().flatten().filter(|&&d| d > 0).count()
    }
}

pub struct Breakout<R: Rng> {
    cfg: BreakoutConfig,
    rng: R,
    phase: Phase,
    paddle_x: f32,
    ball: Ball,
    board: Board,
    score: u32,
}

impl<R: Rng> Breakout<R> {
    /// New game in the "get ready" countdown, starting at `now`.
    pub fn new(cfg: BreakoutConfig, mut rng: R, now: Instant) -> Self {
        let board = Board::generate(&mut rng, &cfg);
        let ball = Self::serve(&cfg);
        let paddle_x = (cfg.width - cfg.paddle_width) / 2.0;
        Self {
            cfg,
            rng,
            phase: Phase::StartingCooldown { since: now },
            paddle_x,
            ball,
            board,
            score: 0,
        }
    }

    fn serve(cfg: &BreakoutConfig) -> Ball {
        Ball {
            x: (cfg.width / 2.0).floor(),
            y: cfg.height - cfg.ball_start_offset,
            dx: cfg.ball_start_velocity.0,
            dy: cfg.ball_start_velocity.1,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn ball(&self) -> Ball {
        self.ball
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn paddle_x(&self) -> f32 {
        self.paddle_x
    }

    pub fn config(&self) -> &BreakoutConfig {
        &self.cfg
    }

    /// Frames per second the loop should run at in the current phase.
    pub fn target_fps(&self) -> usize {
        match self.phase {
            Phase::Playing => self.cfg.play_fps,
            _ => self.cfg.cooldown_fps,
        }
    }

    /// Seconds left on the current countdown (zero while playing).
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.phase {
            Phase::StartingCooldown { since } | Phase::LostCooldown { since } => {
                self.cfg.cooldown.saturating_sub(now.saturating_duration_since(since))
            }
            Phase::Playing => Duration::ZERO,
        }
    }

    /// Advance one tick. `paddle` is the commanded left edge; None keeps the
    /// paddle where it was.
    pub fn tick(&mut self, now: Instant, paddle: Option<f32>) -> TickEvent {
        if let Some(x) = paddle {
            self.paddle_x = x.clamp(0.0, (self.cfg.width - self.cfg.paddle_width).max(0.0));
        }

        match self.phase {
            Phase::StartingCooldown { .. } | Phase::LostCooldown { .. } => {
                if self.remaining(now).is_zero() {
                    info!("countdown over, playing");
                    self.phase = Phase::Playing;
                    TickEvent::Resumed
                } else {
                    TickEvent::Waiting
                }
            }
            Phase::Playing => self.step(now),
        }
    }

    fn step(&mut self, now: Instant) -> TickEvent {
        let cfg = &self.cfg;
        let ball = &mut self.ball;

        ball.x += ball.dx;
        ball.y += ball.dy;

        let (left, right) = (cfg.side_margin, cfg.width - cfg.side_margin);
        if ball.x <= left {
            ball.x = left;
            ball.dx = ball.dx.abs();
        } else if ball.x >= right {
            ball.x = right;
            ball.dx = -ball.dx.abs();
        }
        if ball.y <= cfg.side_margin {
            ball.y = cfg.side_margin;
            ball.dy = ball.dy.abs();
        }

        if ball.y >= cfg.height {
            self.lose(now);
            return TickEvent::Lost;
        }

        // Paddle: the bottom of the ball against the paddle rectangle.
        let paddle_top = cfg.height - cfg.paddle_offset;
        if contains(
            self.paddle_x,
            paddle_top,
            cfg.paddle_width,
            cfg.paddle_height,
            ball.x,
            ball.y + cfg.ball_radius,
        ) {
            ball.dy = -ball.dy.abs();
        }

        // Blocks: row-major, first hit only.
        let hit = self.board.rows.iter().enumerate().find_map(|(row, cells)| {
            cells.iter().enumerate().find_map(|(col, &d)| {
                let (bx, by) = (col as f32 * cfg.cell_width, row as f32 * cfg.cell_height);
                (d > 0 && contains(bx, by, cfg.block_width, cfg.block_height, ball.x, ball.y))
                    .then_some((row, col))
            })
        });

        match hit {
            Some((row, col)) => {
                ball.dy = -ball.dy;
                ball.dx = accelerate(ball.dx, cfg.speed_factor, cfg.max_speed);
                ball.dy = accelerate(ball.dy, cfg.speed_factor, cfg.max_speed);
                self.board.rows[row][col] -= 1;
                self.score += 1;
                TickEvent::HitBlock { row, col }
            }
            None => TickEvent::Moved,
        }
    }

    fn lose(&mut self, now: Instant) {
        info!(score = self.score, "ball lost, restarting after cooldown");
        self.phase = Phase::LostCooldown { since: now };
        self.ball = Self::serve(&self.cfg);
        self.board = Board::generate(&mut self.rng, &self.cfg);
        self.score = 0;
    }

    /// Draw the whole scene for this tick.
    pub fn render(&self, fb: &mut FrameBuffer, now: Instant) {
        clear(fb, BACKGROUND);
        let cfg = &self.cfg;

        let message = match self.phase {
            Phase::StartingCooldown { .. } => Some("GET READY"),
            Phase::LostCooldown { .. } => Some("YOU LOST! RESTARTING IN"),
            Phase::Playing => None,
        };
        if let Some(msg) = message {
            let secs = self.remaining(now).as_secs_f32();
            let mid = fb.height as i32 / 2;
            draw_text_centered(fb, mid - 30, msg, 3, WHITE);
            draw_text_centered(fb, mid + 10, &format!("{secs:.1}S"), 4, WHITE);
            return;
        }

        for (row, cells) in self.board.rows.iter().enumerate() {
            for (col, &d) in cells.iter().enumerate() {
                if d == 0 {
                    continue;
                }
                let x = (col as f32 * cfg.cell_width) as i32;
                let y = (row as f32 * cfg.cell_height) as i32;
                let (w, h) = (cfg.block_width as i32, cfg.block_height as i32);
                let color = BLOCK_COLORS[(d as usize - 1).min(BLOCK_COLORS.len() - 1)];
                fill_rect(fb, x, y, w, h, color);
                stroke_rect(fb, x, y, w, h, 3, BLACK);
            }
        }

        fill_rect(
            fb,
            self.paddle_x as i32,
            (cfg.height - cfg.paddle_offset) as i32,
            cfg.paddle_width as i32,
            cfg.paddle_height as i32,
            BLACK,
        );
        fill_circle(fb, self.ball.x as i32, self.ball.y as i32, cfg.ball_radius as i32, WHITE);

        draw_text(fb, 10, 10, &format!("SCORE: {}", self.score), 3, WHITE);
    }
}

/// Half-open point-in-rectangle test: left/top edges inside, right/bottom outside.
fn contains(x: f32, y: f32, w: f32, h: f32, px: f32, py: f32) -> bool {
    px >= x && px < x + w && py >= y && py < y + h
}

/// Grow a velocity component by `factor`, capped at `max` in magnitude.
fn accelerate(v: f32, factor: f32, max: f32) -> f32 {
    let grown = (v.abs() * factor).min(max.max(v.abs()));
    grown.copysign(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn game(now: Instant) -> Breakout<StdRng> {
        Breakout::new(BreakoutConfig::default(), StdRng::seed_from_u64(7), now)
    }

    fn playing(now: Instant) -> Breakout<StdRng> {
        let mut g = game(now);
        g.phase = Phase::Playing;
        g
    }

    #[test]
    fn starts_in_get_ready_and_resumes_after_cooldown() {
        let t0 = Instant::now();
        let mut g = game(t0);
        let ball = g.ball();
        assert!(matches!(g.phase(), Phase::StartingCooldown { .. }));
        assert_eq!(g.tick(t0 + Duration::from_millis(1500), None), TickEvent::Waiting);
        assert_eq!(g.ball(), ball, "physics frozen during cooldown");
        assert_eq!(g.remaining(t0 + Duration::from_millis(1500)), Duration::from_millis(1500));
        assert_eq!(g.tick(t0 + Duration::from_secs(3), None), TickEvent::Resumed);
        assert_eq!(g.phase(), Phase::Playing);
        assert_eq!(g.target_fps(), 60);
    }

    #[test]
    fn generated_boards_stay_in_range() {
        let cfg = BreakoutConfig::default();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let b = Board::generate(&mut rng, &cfg);
            assert!((4..=8).contains(&b.rows.len()));
            assert!(b.rows.iter().all(|r| r.len() == 5));
            assert!(b.rows.iter().flatten().all(|d| (1..=5).contains(d)));
        }
    }

    #[test]
    fn ball_reaching_the_bottom_loses_and_resets() {
        let t0 = Instant::now();
        let mut g = playing(t0);
        g.board = Board { rows: vec![vec![0; 5]] };
        g.score = 12;
        g.paddle_x = 0.0;
        g.ball = Ball { x: 400.0, y: 896.0, dx: 0.0, dy: 4.0 };

        let t1 = t0 + Duration::from_secs(10);
        assert_eq!(g.tick(t1, None), TickEvent::Lost);
        assert_eq!(g.phase(), Phase::LostCooldown { since: t1 });
        assert_eq!(g.score(), 0);
        assert_eq!(g.ball(), Ball { x: 250.0, y: 870.0, dx: 4.0, dy: -4.0 });
        assert!(g.board().rows.len() >= 4);
        assert!(g.board().rows.iter().flatten().all(|d| (1..=5).contains(d)));
        assert_eq!(g.target_fps(), 30);
    }

    #[test]
    fn only_one_block_per_tick_even_when_rectangles_overlap() {
        let t0 = Instant::now();
        let cfg = BreakoutConfig { block_width: 150.0, block_height: 60.0, ..BreakoutConfig::default() };
        let mut g = Breakout::new(cfg, StdRng::seed_from_u64(1), t0);
        g.phase = Phase::Playing;
        g.board = Board { rows: vec![vec![2; 5], vec![2; 5]] };
        // lands at (120, 45): inside blocks (0,0), (0,1), (1,0) and (1,1)
        g.ball = Ball { x: 124.0, y: 49.0, dx: -4.0, dy: -4.0 };

        assert_eq!(g.tick(t0, None), TickEvent::HitBlock { row: 0, col: 0 });
        assert_eq!(g.score(), 1);
        assert_eq!(g.board().rows[0], vec![1, 2, 2, 2, 2]);
        assert_eq!(g.board().rows[1], vec![2; 5]);
        assert!(g.ball().dy > 0.0);
    }

    #[test]
    fn block_hit_speeds_the_ball_up_to_the_cap() {
        let t0 = Instant::now();
        let mut g = playing(t0);
        g.board = Board { rows: vec![vec![1, 0, 0, 0, 0]] };
        g.ball = Ball { x: 54.0, y: 24.0, dx: -4.0, dy: -4.0 };

        assert_eq!(g.tick(t0, None), TickEvent::HitBlock { row: 0, col: 0 });
        let b = g.ball();
        assert!((b.dx + 4.2).abs() < 1e-4);
        assert!((b.dy - 4.2).abs() < 1e-4);
        assert_eq!(g.board().remaining(), 0);

        assert_eq!(accelerate(13.9, 1.05, 14.0), 14.0);
        assert_eq!(accelerate(-13.9, 1.05, 14.0), -14.0);
        assert_eq!(accelerate(14.0, 1.05, 14.0), 14.0);
    }

    #[test]
    fn paddle_bounces_the_ball() {
        let t0 = Instant::now();
        let mut g = playing(t0);
        g.board = Board { rows: vec![] };
        // after moving: (250, 866); bottom of ball at 876, paddle spans 880..895
        g.ball = Ball { x: 246.0, y: 862.0, dx: 4.0, dy: 4.0 };
        g.tick(t0, Some(190.0));
        assert_eq!(g.ball().dy, 4.0);
        g.ball = Ball { x: 246.0, y: 866.0, dx: 4.0, dy: 4.0 };
        g.tick(t0, None);
        assert_eq!(g.paddle_x(), 190.0);
        assert_eq!(g.ball().dy, -4.0);
    }

    #[test]
    fn ball_sinking_into_the_paddle_keeps_heading_up() {
        let t0 = Instant::now();
        let mut g = playing(t0);
        g.board = Board { rows: vec![] };
        g.paddle_x = 240.0;
        // bottom of the ball lands at 885, inside the paddle (880..895)
        g.ball = Ball { x: 300.0, y: 871.0, dx: 0.0, dy: 4.0 };
        g.tick(t0, None);
        assert_eq!(g.ball().dy, -4.0);
        // still overlapping the paddle on the way out: must not flip back down
        g.tick(t0, None);
        assert_eq!(g.ball().y, 871.0);
        assert_eq!(g.ball().dy, -4.0);
        g.tick(t0, None);
        assert_eq!(g.ball().y, 867.0);
    }

    #[test]
    fn walls_reflect_and_keep_the_ball_inside() {
        let t0 = Instant::now();
        let mut g = playing(t0);
        g.board = Board { rows: vec![] };
        g.ball = Ball { x: 12.0, y: 400.0, dx: -5.0, dy: -4.0 };
        g.tick(t0, None);
        assert_eq!(g.ball().x, 10.0);
        assert_eq!(g.ball().dx, 5.0);

        g.ball = Ball { x: 488.0, y: 12.0, dx: 5.0, dy: -4.0 };
        g.tick(t0, None);
        assert_eq!(g.ball().x, 490.0);
        assert_eq!(g.ball().dx, -5.0);
        assert_eq!(g.ball().y, 10.0);
        assert_eq!(g.ball().dy, 4.0);
    }

    #[test]
    fn missing_blob_holds_the_paddle() {
        let t0 = Instant::now();
        let mut g = game(t0);
        g.tick(t0, Some(42.0));
        g.tick(t0, None);
        assert_eq!(g.paddle_x(), 42.0);
        g.tick(t0, Some(10_000.0));
        assert_eq!(g.paddle_x(), 380.0);
    }

    #[test]
    fn render_draws_hud_and_cooldown() {
        let t0 = Instant::now();
        let g = game(t0);
        let mut fb = FrameBuffer::new(500, 900);
        g.render(&mut fb, t0);
        assert!(fb.pixels.iter().any(|&p| p == WHITE));

        let mut g = playing(t0);
        g.board = Board { rows: vec![vec![1, 0, 0, 0, 0]] };
        g.render(&mut fb, t0);
        // below the HUD text, inside the block's border
        assert_eq!(fb.pixels[34 * 500 + 90], BLOCK_COLORS[0]);
        assert_eq!(fb.pixels[1 * 500 + 1], BLACK);
        assert_eq!(fb.pixels[400 * 500 + 200], BACKGROUND);
    }
}
