// Defaults for both games plus the runtime knobs main.rs fills from the command line.

use std::time::Duration;

/// Inclusive HSV window in the 8-bit convention (H 0..=179, S and V 0..=255).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

pub const BLUE: [HsvRange; 1] = [HsvRange::new([100, 120, 70], [130, 255, 255])];

// Red wraps around hue 0, so it needs two windows.
pub const RED: [HsvRange; 2] = [
    HsvRange::new([0, 100, 100], [10, 255, 255]),
    HsvRange::new([160, 100, 100], [179, 255, 255]),
];

/// Which point of the winning component the tracker reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CentroidMode {
    BoundingBoxCenter, // paddle control only needs a stable x
    Moments,           // m10/m00, m01/m00 of the component
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackerParams {
    pub ranges: Vec<HsvRange>,
    pub min_area: usize,
    pub blur_radius: usize,     // box blur half-window; 3 => 7x7
    pub blur_threshold: u8,     // re-binarize after blur
    pub open_iterations: usize, // erosions, then the same number of dilations
    pub mode: CentroidMode,
}

impl TrackerParams {
    pub fn breakout(min_area: usize) -> Self {
        Self {
            ranges: BLUE.to_vec(),
            min_area,
            blur_radius: 3,
            blur_threshold: 128,
            open_iterations: 2,
            mode: CentroidMode::BoundingBoxCenter,
        }
    }

    pub fn snake(min_area: usize) -> Self {
        Self {
            ranges: RED.to_vec(),
            min_area,
            blur_radius: 3,
            blur_threshold: 128,
            open_iterations: 2,
            mode: CentroidMode::Moments,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub mirror: bool,
    pub preview: bool,
}

/* ----------------------------- Brick Breaker ----------------------------- */

pub const BREAKOUT_WIDTH: usize = 500;
pub const BREAKOUT_HEIGHT: usize = 900;
pub const BREAKOUT_MIN_AREA: usize = 800;

#[derive(Clone, Debug, PartialEq)]
pub struct BreakoutConfig {
    pub width: f32,
    pub height: f32,
    pub columns: usize,
    pub cell_width: f32,   // horizontal stride between block origins
    pub cell_height: f32,  // vertical stride between block origins
    pub block_width: f32,
    pub block_height: f32,
    pub min_rows: usize,
    pub max_rows: usize,
    pub max_durability: u8,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_offset: f32, // distance from the bottom edge to the paddle top
    pub ball_radius: f32,
    pub side_margin: f32,
    pub ball_start_offset: f32,
    pub ball_start_velocity: (f32, f32),
    pub speed_factor: f32,
    pub max_speed: f32,
    pub cooldown: Duration,
    pub play_fps: usize,
    pub cooldown_fps: usize,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            width: BREAKOUT_WIDTH as f32,
            height: BREAKOUT_HEIGHT as f32,
            columns: 5,
            cell_width: 100.0,
            cell_height: 40.0,
            block_width: 98.0,
            block_height: 38.0,
            min_rows: 4,
            max_rows: 8,
            max_durability: 5,
            paddle_width: 120.0,
            paddle_height: 15.0,
            paddle_offset: 20.0,
            ball_radius: 10.0,
            side_margin: 10.0,
            ball_start_offset: 30.0,
            ball_start_velocity: (4.0, -4.0),
            speed_factor: 1.05,
            max_speed: 14.0,
            cooldown: Duration::from_secs(3),
            play_fps: 60,
            cooldown_fps: 30,
        }
    }
}

/* --------------------------------- Snake --------------------------------- */

pub const SNAKE_WIDTH: usize = 600;
pub const SNAKE_HEIGHT: usize = 600;
pub const SNAKE_MIN_AREA: usize = 400;

#[derive(Clone, Debug, PartialEq)]
pub struct SnakeConfig {
    pub cell_size: usize,
    pub grid_width: i32,
    pub grid_height: i32,
    pub start: (i32, i32),
    pub tick_hz: usize,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        let cell_size = 20;
        Self {
            cell_size,
            grid_width: (SNAKE_WIDTH / cell_size) as i32,
            grid_height: (SNAKE_HEIGHT / cell_size) as i32,
            start: (5, 5),
            tick_hz: 10,
        }
    }
}
