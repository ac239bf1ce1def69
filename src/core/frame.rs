//! Trail frame builder
//!
//! Turns the current trail and activity flag into a complete, self-contained
//! description of one canvas frame. No state survives between calls: every
//! frame is rebuilt from scratch, and painting it is left to the UI layer.

use super::types::Position;

/// Default canvas edge length in pixels
pub const DEFAULT_SURFACE_SIZE: f32 = 200.0;

/// Grid cells per axis
pub const GRID_DIVISIONS: usize = 4;

pub const WAITING_TEXT: &str = "Waiting for detection...";

/// Drawing surface dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Nothing can be drawn on a surface with no area
    pub fn is_drawable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Linear map from normalized coordinates, no clamping
    pub fn to_pixel(&self, pos: Position) -> [f32; 2] {
        [pos.x as f32 * self.width, pos.y as f32 * self.height]
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(DEFAULT_SURFACE_SIZE, DEFAULT_SURFACE_SIZE)
    }
}

/// Opacity of the point with 1-based `rank` in a trail of `len` points.
///
/// Linear in rank: the newest point (rank == len) is fully opaque.
pub fn fade_alpha(rank: usize, len: usize) -> f32 {
    if len == 0 {
        return 0.0;
    }
    rank as f32 / len as f32
}

/// Segment `from → to` plus the marker drawn at `to`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailSegment {
    pub from: [f32; 2],
    pub to: [f32; 2],
    pub alpha: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FrameContent {
    /// Inactive or no samples yet
    Waiting,
    Trail {
        /// Oldest first
        segments: Vec<TrailSegment>,
        /// Newest point, drawn emphasized
        head: [f32; 2],
        /// Normalized coordinates of the head, 2 decimals
        readout: String,
    },
}

/// One fully described canvas frame
#[derive(Clone, Debug, PartialEq)]
pub struct TrailFrame {
    pub surface: Surface,
    /// Reference grid lines as (start, end) pixel pairs
    pub grid: Vec<([f32; 2], [f32; 2])>,
    pub content: FrameContent,
}

/// Build the frame for `history` (oldest first)
pub fn render<'a, I>(history: I, is_active: bool, surface: Surface) -> TrailFrame
where
    I: IntoIterator<Item = &'a Position>,
    I::IntoIter: ExactSizeIterator,
{
    let grid = grid_lines(surface);
    let history = history.into_iter();
    let len = history.len();

    if !is_active || len == 0 {
        return TrailFrame {
            surface,
            grid,
            content: FrameContent::Waiting,
        };
    }

    let mut segments = Vec::with_capacity(len.saturating_sub(1));
    let mut prev: Option<[f32; 2]> = None;
    let mut last = Position::new(0.0, 0.0);

    for (idx, pos) in history.enumerate() {
        let curr = surface.to_pixel(*pos);
        if let Some(from) = prev {
            segments.push(TrailSegment {
                from,
                to: curr,
                alpha: fade_alpha(idx + 1, len),
            });
        }
        prev = Some(curr);
        last = *pos;
    }

    TrailFrame {
        surface,
        grid,
        content: FrameContent::Trail {
            segments,
            head: surface.to_pixel(last),
            readout: format!("({:.2}, {:.2})", last.x, last.y),
        },
    }
}

fn grid_lines(surface: Surface) -> Vec<([f32; 2], [f32; 2])> {
    let mut lines = Vec::with_capacity((GRID_DIVISIONS + 1) * 2);
    for i in 0..=GRID_DIVISIONS {
        let x = surface.width / GRID_DIVISIONS as f32 * i as f32;
        let y = surface.height / GRID_DIVISIONS as f32 * i as f32;
        lines.push(([x, 0.0], [x, surface.height]));
        lines.push(([0.0, y], [surface.width, y]));
    }
    lines
}
