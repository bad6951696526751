// Snake: heading driven by where the red blob sits relative to the frame centre.
// One run only; hitting a wall or the body ends the session.

use std::collections::VecDeque;

use rand::Rng;

use crate::config::SnakeConfig;
use crate::control::{steer, Heading};
use crate::draw::{clear, draw_text, fill_rect};
use crate::types::{rgb, FrameBuffer};

const BACKGROUND: u32 = rgb(0, 0, 0);
const BODY: u32 = rgb(0, 255, 0);
const FOOD: u32 = rgb(255, 0, 0);
const TEXT: u32 = rgb(255, 255, 255);

pub type Cell = (i32, i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Ate,
    Crashed { score: usize },
}

pub struct Snake<R: Rng> {
    cfg: SnakeConfig,
    rng: R,
    body: VecDeque<Cell>, // head first
    heading: Heading,
    food: Cell,
    crashed: bool,
}

impl<R: Rng> Snake<R> {
    pub fn new(cfg: SnakeConfig, mut rng: R) -> Self {
        let food = random_cell(&mut rng, &cfg);
        let body = VecDeque::from([cfg.start]);
        Self { cfg, rng, body, heading: Heading::Right, food, crashed: false }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    /// Score is simply how long the snake got.
    pub fn score(&self) -> usize {
        self.body.len()
    }

    pub fn is_over(&self) -> bool {
        self.crashed
    }

    pub fn config(&self) -> &SnakeConfig {
        &self.cfg
    }

    /// Take the proposed heading unless it is a straight reversal.
    pub fn steer(&mut self, proposed: Option<Heading>) {
        self.heading = steer(self.heading, proposed);
    }

    /// Move one cell along the current heading.
    pub fn step(&mut self) -> StepOutcome {
        if self.crashed {
            return StepOutcome::Crashed { score: self.score() };
        }

        let (dx, dy) = self.heading.delta();
        let (hx, hy) = self.head();
        let next = (hx + dx, hy + dy);

        let outside = next.0 < 0
            || next.1 < 0
            || next.0 >= self.cfg.grid_width
            || next.1 >= self.cfg.grid_height;
        // The tail has not moved yet, so stepping onto it counts as a collision.
        if outside || self.body.contains(&next) {
            self.crashed = true;
            return StepOutcome::Crashed { score: self.score() };
        }

        self.body.push_front(next);
        if next == self.food {
            // May land on the body; the food is then drawn over it.
            self.food = random_cell(&mut self.rng, &self.cfg);
            StepOutcome::Ate
        } else {
            self.body.pop_back();
            StepOutcome::Moved
        }
    }

    pub fn render(&self, fb: &mut FrameBuffer) {
        clear(fb, BACKGROUND);
        let size = self.cfg.cell_size as i32;
        for &(x, y) in &self.body {
            fill_rect(fb, x * size, y * size, size, size, BODY);
        }
        let (fx, fy) = self.food;
        fill_rect(fb, fx * size, fy * size, size, size, FOOD);
        draw_text(fb, 8, 8, &format!("LENGTH: {}", self.score()), 2, TEXT);
    }
}

fn random_cell<R: Rng>(rng: &mut R, cfg: &SnakeConfig) -> Cell {
    (rng.gen_range(0..cfg.grid_width), rng.gen_range(0..cfg.grid_height))
}
