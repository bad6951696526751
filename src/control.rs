// Control mapper: turns a tracked blob into a paddle position or a snake heading.

use crate::types::Point;

/// Map a blob's x (camera pixels) to the paddle's left edge (screen pixels),
/// centred under the blob and kept fully on screen.
pub fn paddle_x(blob_x: f32, capture_width: u32, screen_width: f32, paddle_width: f32) -> f32 {
    if capture_width == 0 {
        return 0.0;
    }
    let centre = (blob_x / capture_width as f32 * screen_width).round();
    let max_left = (screen_width - paddle_width).max(0.0);
    (centre - paddle_width / 2.0).clamp(0.0, max_left)
}

/// One grid step. `Down` is +y because screen rows grow downward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }

    pub fn reverse(self) -> Heading {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }
}

/// Heading suggested by where the blob sits relative to the frame centre.
/// The axis with the larger offset wins; ties go vertical.
pub fn propose_heading(centroid: Point, frame_width: u32, frame_height: u32) -> Heading {
    let dx = centroid.x - frame_width as f32 / 2.0;
    let dy = centroid.y - frame_height as f32 / 2.0;

    if dx.abs() > dy.abs() {
        if dx > 0.0 { Heading::Right } else { Heading::Left }
    } else if dy > 0.0 {
        Heading::Down
    } else {
        Heading::Up
    }
}

/// Adopt `proposed` unless it would turn the snake straight back into itself.
pub fn steer(current: Heading, proposed: Option<Heading>) -> Heading {
    match proposed {
        Some(h) if h != current.reverse() => h,
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paddle_follows_blob_and_stays_on_screen() {
        // blob dead centre of a 320-wide capture -> paddle centred on 500 px
        assert_eq!(paddle_x(160.0, 320, 500.0, 120.0), 190.0);
        assert_eq!(paddle_x(0.0, 320, 500.0, 120.0), 0.0);
        assert_eq!(paddle_x(319.0, 320, 500.0, 120.0), 380.0);
        assert_eq!(paddle_x(10.0, 0, 500.0, 120.0), 0.0);
    }

    #[test]
    fn dominant_axis_picks_the_heading() {
        let (w, h) = (640, 480);
        assert_eq!(propose_heading(Point { x: 600.0, y: 250.0 }, w, h), Heading::Right);
        assert_eq!(propose_heading(Point { x: 10.0, y: 250.0 }, w, h), Heading::Left);
        assert_eq!(propose_heading(Point { x: 330.0, y: 470.0 }, w, h), Heading::Down);
        assert_eq!(propose_heading(Point { x: 330.0, y: 5.0 }, w, h), Heading::Up);
    }

    #[test]
    fn reversal_is_always_rejected() {
        for h in [Heading::Up, Heading::Down, Heading::Left, Heading::Right] {
            assert_eq!(steer(h, Some(h.reverse())), h);
        }
    }

    #[test]
    fn turns_and_missing_blobs() {
        assert_eq!(steer(Heading::Right, Some(Heading::Up)), Heading::Up);
        assert_eq!(steer(Heading::Right, Some(Heading::Right)), Heading::Right);
        assert_eq!(steer(Heading::Left, None), Heading::Left);
    }

    #[test]
    fn deltas_are_unit_steps() {
        for h in [Heading::Up, Heading::Down, Heading::Left, Heading::Right] {
            let (dx, dy) = h.delta();
            assert_eq!(dx.abs() + dy.abs(), 1);
            let (rx, ry) = h.reverse().delta();
            assert_eq!((dx + rx, dy + ry), (0, 0));
        }
    }
}
