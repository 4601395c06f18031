//! Expansion directions and the geometry each one implies.
//!
//! Every direction-dependent decision in the pipeline (where to crop,
//! where to anchor the padded image, which band the backend must not
//! repaint, where the stitched buffers land) is derived from a single
//! [`EdgeLayout`] record instead of being re-branched at each call site.

use std::fmt;
use std::str::FromStr;

use crate::error::OutpaintError;

/// One of the four directions a canvas can grow in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Signed x component of the growth axis.
    pub fn x_vector(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Up | Direction::Down => 0,
        }
    }

    /// Signed y component of the growth axis.
    pub fn y_vector(self) -> i32 {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
            Direction::Left | Direction::Right => 0,
        }
    }

    /// Geometry record for this direction.
    ///
    /// Existing content sits against the far canvas edge exactly when the
    /// growth vector is negative: growing Left/Up means the new strip
    /// appears at the near edge, so everything already painted is anchored
    /// to the opposite side.
    pub fn layout(self) -> EdgeLayout {
        match self {
            Direction::Left => EdgeLayout {
                horizontal: true,
                content_at_far: true,
            },
            Direction::Right => EdgeLayout {
                horizontal: true,
                content_at_far: false,
            },
            Direction::Up => EdgeLayout {
                horizontal: false,
                content_at_far: true,
            },
            Direction::Down => EdgeLayout {
                horizontal: false,
                content_at_far: false,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = OutpaintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(OutpaintError::InvalidArgument(format!(
                "unknown direction '{}'",
                other
            ))),
        }
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

/// Direction-specific placement rules, reduced to two booleans.
///
/// `horizontal` selects the growth axis; `content_at_far` tells whether
/// the already-painted pixels live against the far (max-coordinate) edge
/// of that axis. Every other quantity is computed from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeLayout {
    pub horizontal: bool,
    pub content_at_far: bool,
}

impl EdgeLayout {
    /// Canvas band the backend must leave untouched during inpainting.
    ///
    /// The band hugs the edge where existing content was anchored; the
    /// rest of the canvas stays open for generation.
    pub fn protected_band(&self, mask_width: u32, canvas: u32) -> Rect {
        let offset = if self.content_at_far {
            canvas - mask_width
        } else {
            0
        };
        if self.horizontal {
            Rect::new(offset, 0, mask_width, canvas)
        } else {
            Rect::new(0, offset, canvas, mask_width)
        }
    }

    /// Top-left corner at which a `width` x `height` buffer is embedded
    /// into the square canvas.
    pub fn pad_origin(&self, width: u32, height: u32, canvas: u32) -> (u32, u32) {
        if !self.content_at_far {
            return (0, 0);
        }
        if self.horizontal {
            (canvas - width, 0)
        } else {
            (0, canvas - height)
        }
    }

    /// Region of the current image that seeds the next generation request:
    /// a band of extent `canvas - generate_width` flush against the growth
    /// edge, spanning the full orthogonal extent.
    pub fn crop_box(&self, width: u32, height: u32, canvas: u32, generate_width: u32) -> Rect {
        let extent = canvas - generate_width;
        if self.horizontal {
            let x = if self.content_at_far { 0 } else { width - extent };
            Rect::new(x, 0, extent, height)
        } else {
            let y = if self.content_at_far { 0 } else { height - extent };
            Rect::new(0, y, width, extent)
        }
    }

    /// Paste positions of (original, generated) in the stitched output.
    ///
    /// Growing Left/Up shifts the original over by the strip width and
    /// puts the generated canvas at the origin. Growing Right/Down keeps
    /// the original at the origin and trailing-aligns the generated canvas
    /// so its far edge lands exactly `generate_width` past the original
    /// boundary; whatever the backend returned beyond that is discarded by
    /// the clipped paste.
    pub fn stitch_offsets(
        &self,
        original: (u32, u32),
        generated: (u32, u32),
        generate_width: u32,
    ) -> ((i64, i64), (i64, i64)) {
        let shift = generate_width as i64;
        if self.content_at_far {
            let origin = if self.horizontal { (shift, 0) } else { (0, shift) };
            (origin, (0, 0))
        } else if self.horizontal {
            ((0, 0), (original.0 as i64 + shift - generated.0 as i64, 0))
        } else {
            ((0, 0), (0, original.1 as i64 + shift - generated.1 as i64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_vectors() {
        assert_eq!(Direction::Left.x_vector(), -1);
        assert_eq!(Direction::Right.x_vector(), 1);
        assert_eq!(Direction::Up.y_vector(), -1);
        assert_eq!(Direction::Down.y_vector(), 1);
        for dir in Direction::ALL {
            assert_eq!(dir.x_vector() == 0, !dir.is_horizontal());
            assert_eq!(dir.x_vector().abs() + dir.y_vector().abs(), 1);
        }
    }

    #[test]
    fn layout_table() {
        assert!(Direction::Left.layout().content_at_far);
        assert!(!Direction::Right.layout().content_at_far);
        assert!(Direction::Up.layout().content_at_far);
        assert!(!Direction::Down.layout().content_at_far);
        assert!(Direction::Left.layout().horizontal);
        assert!(!Direction::Down.layout().horizontal);
    }

    #[test]
    fn protected_band_per_direction() {
        // Left protects the last columns, Right the first, Up the last
        // rows, Down the first.
        assert_eq!(
            Direction::Left.layout().protected_band(3, 8),
            Rect::new(5, 0, 3, 8)
        );
        assert_eq!(
            Direction::Right.layout().protected_band(3, 8),
            Rect::new(0, 0, 3, 8)
        );
        assert_eq!(
            Direction::Up.layout().protected_band(3, 8),
            Rect::new(0, 5, 8, 3)
        );
        assert_eq!(
            Direction::Down.layout().protected_band(3, 8),
            Rect::new(0, 0, 8, 3)
        );
    }

    #[test]
    fn pad_anchors() {
        assert_eq!(Direction::Left.layout().pad_origin(5, 8, 8), (3, 0));
        assert_eq!(Direction::Right.layout().pad_origin(5, 8, 8), (0, 0));
        assert_eq!(Direction::Up.layout().pad_origin(8, 5, 8), (0, 3));
        assert_eq!(Direction::Down.layout().pad_origin(8, 5, 8), (0, 0));
    }

    #[test]
    fn crop_boxes_hug_the_growth_edge() {
        // 512-canvas, 192px strip: the crop is the 320px band bordering
        // the edge being grown.
        let (w, h) = (700, 512);
        assert_eq!(
            Direction::Left.layout().crop_box(w, h, 512, 192),
            Rect::new(0, 0, 320, 512)
        );
        assert_eq!(
            Direction::Right.layout().crop_box(w, h, 512, 192),
            Rect::new(380, 0, 320, 512)
        );
        let (w, h) = (512, 700);
        assert_eq!(
            Direction::Up.layout().crop_box(w, h, 512, 192),
            Rect::new(0, 0, 512, 320)
        );
        assert_eq!(
            Direction::Down.layout().crop_box(w, h, 512, 192),
            Rect::new(0, 380, 512, 320)
        );
    }

    #[test]
    fn stitch_offsets_abut_without_gap() {
        let original = (512, 512);
        let generated = (512, 512);
        assert_eq!(
            Direction::Left
                .layout()
                .stitch_offsets(original, generated, 192),
            ((192, 0), (0, 0))
        );
        // Right/Down trailing-align the generated canvas: 512 + 192 - 512.
        assert_eq!(
            Direction::Right
                .layout()
                .stitch_offsets(original, generated, 192),
            ((0, 0), (192, 0))
        );
        assert_eq!(
            Direction::Up
                .layout()
                .stitch_offsets(original, generated, 192),
            ((0, 192), (0, 0))
        );
        assert_eq!(
            Direction::Down
                .layout()
                .stitch_offsets(original, generated, 192),
            ((0, 0), (0, 192))
        );
    }

    #[test]
    fn parse_round_trip() {
        for dir in Direction::ALL {
            assert_eq!(dir.as_str().parse::<Direction>().unwrap(), dir);
        }
        assert_eq!("RIGHT".parse::<Direction>().unwrap(), Direction::Right);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
