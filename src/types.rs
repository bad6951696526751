// Core pixel and detection types shared by the camera, the tracker and both games.

use image::RgbImage;

/// Pack three 8-bit channels into the 0x00RRGGBB layout minifb expects.
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Split a 0x00RRGGBB pixel back into (r, g, b).
#[inline]
pub const fn unpack(px: u32) -> (u8, u8, u8) {
    (((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // frame width in pixels
    pub height: usize,     // frame height in pixels
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB, row-major
}

impl FrameBuffer {
    /// A black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Convert a decoded RGB image into packed pixels.
    pub fn from_rgb_image(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let mut pixels = Vec::with_capacity((w as usize) * (h as usize));
        for px in img.pixels() {
            pixels.push(rgb(px[0], px[1], px[2]));
        }
        Self { width: w as usize, height: h as usize, pixels }
    }

    /// Flip left/right in place (camera feels like a mirror).
    pub fn mirror_horizontal(&mut self) {
        if self.width == 0 {
            return;
        }
        for row in self.pixels.chunks_exact_mut(self.width) {
            row.reverse();
        }
    }
}

/// Single-channel 8-bit image; 0 = background, anything else = foreground.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,     // length = width * height
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0u8; width * height] }
    }

    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned box in frame pixels; `x + width` is one past the right edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BoundingBox {
    /// Integer center, the way a paddle tracker reads it (`x + w / 2`).
    pub fn center(&self) -> Point {
        Point {
            x: (self.x + self.width / 2) as f32,
            y: (self.y + self.height / 2) as f32,
        }
    }
}

/// Result of one successful detection. Recomputed every frame; carries no identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blob {
    pub centroid: Point,
    pub bbox: BoundingBox,
    pub area: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn pack_and_unpack_agree() {
        let px = rgb(12, 200, 7);
        assert_eq!(px, 0x000C_C807);
        assert_eq!(unpack(px), (12, 200, 7));
    }

    #[test]
    fn from_rgb_image_is_row_major() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));
        let fb = FrameBuffer::from_rgb_image(&img);
        assert_eq!((fb.width, fb.height), (3, 2));
        assert_eq!(fb.pixels[2], rgb(255, 0, 0));
        assert_eq!(fb.pixels[3], rgb(0, 0, 255));
    }

    #[test]
    fn mirror_flips_each_row() {
        let mut fb = FrameBuffer { width: 3, height: 2, pixels: vec![1, 2, 3, 4, 5, 6] };
        fb.mirror_horizontal();
        assert_eq!(fb.pixels, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn mirroring_an_empty_frame_is_a_no_op() {
        let mut fb = FrameBuffer::new(0, 0);
        fb.mirror_horizontal();
        assert!(fb.pixels.is_empty());
        let mut fb = FrameBuffer::new(0, 3);
        fb.mirror_horizontal();
        assert_eq!(fb.height, 3);
    }

    #[test]
    fn bbox_center_uses_integer_half_width() {
        let b = BoundingBox { x: 10, y: 20, width: 41, height: 30 };
        assert_eq!(b.center(), Point { x: 30.0, y: 35.0 });
    }
}
