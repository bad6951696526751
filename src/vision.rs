// Color tracker: finds the largest blob of a target color in one frame.
// Pipeline: RGB -> HSV -> range mask -> blur + re-threshold -> opening -> components.
// Everything here is a pure function of (frame, params); no state survives a call.

use crate::config::{CentroidMode, HsvRange, TrackerParams};
use crate::types::{unpack, Blob, BoundingBox, FrameBuffer, Mask, Point};

/// Everything one detection pass produced: the cleaned mask (for the preview
/// window) and the winning blob, if any component was large enough.
#[derive(Clone, Debug)]
pub struct Detection {
    pub mask: Mask,
    pub blob: Option<Blob>,
}

/// Locate the largest qualifying blob, or None when nothing passes `min_area`.
pub fn locate(frame: &FrameBuffer, params: &TrackerParams) -> Option<Blob> {
    analyze(frame, params).blob
}

/// Full detection pass; `locate` is this without the mask.
pub fn analyze(frame: &FrameBuffer, params: &TrackerParams) -> Detection {
    let raw = threshold_hsv(frame, &params.ranges);

    let mut mask = if params.blur_radius > 0 {
        let blurred = box_blur_mask(&raw, params.blur_radius);
        binarize(&blurred, params.blur_threshold)
    } else {
        raw
    };

    for _ in 0..params.open_iterations {
        mask = erode(&mask);
    }
    for _ in 0..params.open_iterations {
        mask = dilate(&mask);
    }

    let blob = connected_components(&mask)
        .into_iter()
        .filter(|c| c.area >= params.min_area)
        // max_by_key keeps the *last* maximum; fold keeps the first one found.
        .fold(None::<Component>, |best, c| match best {
            Some(b) if b.area >= c.area => Some(b),
            _ => Some(c),
        })
        .map(|c| c.to_blob(params.mode));

    Detection { mask, blob }
}

/* ---------------------------- Color space ---------------------------- */

/// 8-bit RGB -> HSV with H halved into 0..=179 (so it fits a byte).
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 { 0 } else { (255 * diff + v / 2) / v };

    let h = if diff == 0 {
        0.0
    } else {
        let d = diff as f32;
        let h = if v == r {
            60.0 * (g - b) as f32 / d
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / d
        } else {
            240.0 + 60.0 * (r - g) as f32 / d
        };
        if h < 0.0 { h + 360.0 } else { h }
    };

    let h = ((h / 2.0).round() as i32).min(179);
    [h as u8, s as u8, v as u8]
}

/// 255 where the pixel falls in any of the ranges, 0 elsewhere.
pub fn threshold_hsv(frame: &FrameBuffer, ranges: &[HsvRange]) -> Mask {
    let mut mask = Mask::new(frame.width, frame.height);
    for (dst, &px) in mask.data.iter_mut().zip(frame.pixels.iter()) {
        let (r, g, b) = unpack(px);
        let hsv = rgb_to_hsv(r, g, b);
        if ranges.iter().any(|range| range.contains(hsv)) {
            *dst = 255;
        }
    }
    mask
}

fn binarize(mask: &Mask, threshold: u8) -> Mask {
    Mask {
        width: mask.width,
        height: mask.height,
        data: mask.data.iter().map(|&v| if v >= threshold { 255 } else { 0 }).collect(),
    }
}

/* ------------------------------ Blur ------------------------------ */

/// Separable box blur of a single-channel mask. Edges are extended, so a
/// blob touching the border does not fade there.
pub fn box_blur_mask(src: &Mask, radius: usize) -> Mask {
    let w = src.width as i32;
    let h = src.height as i32;
    let mut out = Mask::new(src.width, src.height);
    if w == 0 || h == 0 {
        return out;
    }
    let r = radius as i32;
    let win = (2 * r + 1) as u32;
    let mut tmp = vec![0u8; src.data.len()];

    // Pass 1: horizontal, src -> tmp
    for y in 0..h {
        let row = (y * w) as usize;
        let mut sum = src.data[row] as u32 * (r as u32 + 1);
        for x in 1..=r {
            sum += src.data[row + x.min(w - 1) as usize] as u32;
        }
        for x in 0..w {
            tmp[row + x as usize] = (sum / win) as u8;
            let left = (x - r).max(0) as usize;
            let right = (x + r + 1).min(w - 1) as usize;
            sum = sum + src.data[row + right] as u32 - src.data[row + left] as u32;
        }
    }

    // Pass 2: vertical, tmp -> out
    for x in 0..w {
        let col = x as usize;
        let mut sum = tmp[col] as u32 * (r as u32 + 1);
        for y in 1..=r {
            sum += tmp[(y.min(h - 1) * w) as usize + col] as u32;
        }
        for y in 0..h {
            out.data[(y * w) as usize + col] = (sum / win) as u8;
            let top = (y - r).max(0);
            let bottom = (y + r + 1).min(h - 1);
            sum = sum + tmp[(bottom * w) as usize + col] as u32 - tmp[(top * w) as usize + col] as u32;
        }
    }

    out
}

/* --------------------------- Morphology --------------------------- */

/// 3x3 erosion. Pixels outside the frame count as set, so borders do not eat in.
pub fn erode(src: &Mask) -> Mask {
    morph_3x3(src, true)
}

/// 3x3 dilation. Pixels outside the frame count as clear.
pub fn dilate(src: &Mask) -> Mask {
    morph_3x3(src, false)
}

fn morph_3x3(src: &Mask, erode: bool) -> Mask {
    let (w, h) = (src.width as i32, src.height as i32);
    let mut out = Mask::new(src.width, src.height);

    for y in 0..h {
        for x in 0..w {
            let mut hit = erode; // erosion: stays set until a clear neighbour shows up
            'scan: for dy in -1..=1 {
                for dx in -1..=1 {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let set = src.data[(ny * w + nx) as usize] != 0;
                    if erode && !set {
                        hit = false;
                        break 'scan;
                    }
                    if !erode && set {
                        hit = true;
                        break 'scan;
                    }
                }
            }
            if hit {
                out.data[(y * w + x) as usize] = 255;
            }
        }
    }
    out
}

/* ----------------------- Connected components ----------------------- */

/// Summary of one 8-connected region of set pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Component {
    pub area: usize,
    pub bbox: BoundingBox,
    sum_x: u64,
    sum_y: u64,
}

impl Component {
    /// First-order moments over zeroth: the mean pixel position.
    pub fn moment_centroid(&self) -> Point {
        Point {
            x: self.sum_x as f32 / self.area as f32,
            y: self.sum_y as f32 / self.area as f32,
        }
    }

    fn to_blob(self, mode: CentroidMode) -> Blob {
        let centroid = match mode {
            CentroidMode::BoundingBoxCenter => self.bbox.center(),
            CentroidMode::Moments => self.moment_centroid(),
        };
        Blob { centroid, bbox: self.bbox, area: self.area }
    }
}

/// Every 8-connected region, in row-major order of its first pixel.
pub fn connected_components(mask: &Mask) -> Vec<Component> {
    let (w, h) = (mask.width, mask.height);
    let mut visited = vec![false; w * h];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut out = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            let start = sy * w + sx;
            if visited[start] || mask.data[start] == 0 {
                continue;
            }

            visited[start] = true;
            stack.push((sx, sy));

            let (mut min_x, mut min_y, mut max_x, mut max_y) = (sx, sy, sx, sy);
            let (mut area, mut sum_x, mut sum_y) = (0usize, 0u64, 0u64);

            while let Some((x, y)) = stack.pop() {
                area += 1;
                sum_x += x as u64;
                sum_y += y as u64;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);

                for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                        let idx = ny * w + nx;
                        if !visited[idx] && mask.data[idx] != 0 {
                            visited[idx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            out.push(Component {
                area,
                bbox: BoundingBox {
                    x: min_x,
                    y: min_y,
                    width: max_x - min_x + 1,
                    height: max_y - min_y + 1,
                },
                sum_x,
                sum_y,
            });
        }
    }

    out
}
