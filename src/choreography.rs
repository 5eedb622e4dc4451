//! The path Mr. Point follows while recording.
//!
//! The target sweeps the four edges of the screen clockwise in ten seconds:
//! along the top, down the right edge, back along the bottom and up the left
//! edge. Coordinates are relative to the screen, `(0, 0)` being top/left and
//! `(1, 1)` bottom/right.

/// A point in relative screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where the target sits when it is not moving.
pub const RESTING_POSITION: Position = Position::new(0.01, 0.01);

/// Length of the whole choreography in seconds.
pub const DURATION_SECS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// One straight stretch of the path: `axis` goes from `from` to `to` while
/// the elapsed time runs through `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub axis: Axis,
    pub from: f64,
    pub to: f64,
}

impl Segment {
    const fn new(start: f64, end: f64, axis: Axis, from: f64, to: f64) -> Self {
        Self {
            start,
            end,
            axis,
            from,
            to,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    fn set(&self, pos: &mut Position, value: f64) {
        match self.axis {
            Axis::X => pos.x = value,
            Axis::Y => pos.y = value,
        }
    }
}

/// That's the choreography! Ordered by start time, without gaps.
pub const SEGMENTS: [Segment; 4] = [
    Segment::new(0.0, 3.0, Axis::X, 0.01, 0.99),
    Segment::new(3.0, 5.0, Axis::Y, 0.01, 0.99),
    Segment::new(5.0, 8.0, Axis::X, 0.99, 0.01),
    Segment::new(8.0, 10.0, Axis::Y, 0.99, 0.01),
];

/// Linear interpolation of `x0..x1` over the time span `t0..t1`.
pub fn lerp(t: f64, x0: f64, x1: f64, t0: f64, t1: f64) -> f64 {
    x0 + (t - t0) / (t1 - t0) * (x1 - x0)
}

/// Position of the target `t` seconds into the recording.
///
/// Returns `None` once the choreography is over. Negative (or NaN) times are
/// treated as the very start.
pub fn position_at(t: f64) -> Option<Position> {
    let t = t.max(0.0);
    let mut pos = RESTING_POSITION;

    for segment in &SEGMENTS {
        if segment.contains(t) {
            let value = lerp(t, segment.from, segment.to, segment.start, segment.end);
            segment.set(&mut pos, value);
            return Some(pos);
        }
        // Finished segments leave their axis where they ended.
        segment.set(&mut pos, segment.to);
    }

    None
}
