use std::fmt;

use log::debug;

use crate::attractor::State;
use crate::error::{LorenzError, Result};

/// A point on the image plane, before or after fitting to the canvas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Look at the attractor from the front: x runs left to right and z runs bottom to top. Image rows
/// grow downward, hence the negated z.
pub fn front_view(s: &State) -> Point {
    Point { x: s.x, y: -s.z }
}

/// Flatten a trajectory onto the plane with `f`. `points[i]` is always the projection of
/// `trajectory[i]`.
pub fn project<F>(trajectory: Vec<State>, f: F) -> Vec<Point>
where
    F: Fn(&State) -> Point,
{
    trajectory.iter().map(f).collect()
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Single pass of running minimums and maximums. `f64::min`/`max` skip NaN operands, so a NaN
    /// coordinate only shows up here if every point on that axis is NaN.
    pub fn of(points: &[Point]) -> Option<BoundingBox> {
        let first = points.first()?;
        let init = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points[1..].iter().fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Largest accepted target size, in pixels, for the longer side of the canvas.
pub const MAX_SIZE: f64 = 65_535.0;

/// Points moved and scaled onto a `width` x `height` canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct Fitted {
    pub points: Vec<Point>,
    pub width: u32,
    pub height: u32,
}

/// Translate the point cloud so its bounding box starts at the origin, then scale it uniformly so
/// the longer side of the box is exactly `max_dimension` long.
///
/// When both sides are equally long the height is the one pinned to `max_dimension`. The integer
/// canvas size is the ceiling of the scaled extents, so the far corner of the box lands exactly on
/// the canvas boundary rather than inside it.
pub fn scale_and_crop(mut points: Vec<Point>, max_dimension: f64) -> Result<Fitted> {
    if !(max_dimension.is_finite() && max_dimension > 0.0 && max_dimension <= MAX_SIZE) {
        return Err(LorenzError::InvalidSize(max_dimension));
    }
    let bounds = BoundingBox::of(&points).ok_or(LorenzError::EmptyPointCloud)?;
    if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(LorenzError::NonFiniteBounds);
    }
    // Bounds near f64::MAX can still overflow when subtracted.
    if !(bounds.width().is_finite() && bounds.height().is_finite()) {
        return Err(LorenzError::NonFiniteBounds);
    }
    debug!(
        "Bounding box x: [{}, {}], y: [{}, {}]",
        bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
    );

    let (width, height, scale) = if bounds.width() > bounds.height() {
        let scale = max_dimension / bounds.width();
        (max_dimension, bounds.height() * scale, scale)
    } else {
        if bounds.height() == 0.0 {
            return Err(LorenzError::DegenerateBounds {
                x_span: bounds.width(),
                y_span: bounds.height(),
            });
        }
        let scale = max_dimension / bounds.height();
        (bounds.width() * scale, max_dimension, scale)
    };

    for p in points.iter_mut() {
        p.x = (p.x - bounds.min_x) * scale;
        p.y = (p.y - bounds.min_y) * scale;
    }

    Ok(Fitted {
        points,
        width: to_px(width, max_dimension)?,
        height: to_px(height, max_dimension)?,
    })
}

fn to_px(len: f64, max_dimension: f64) -> Result<u32> {
    let len = len.ceil();
    if !(len >= 0.0 && len <= u32::MAX as f64) {
        return Err(LorenzError::InvalidSize(max_dimension));
    }
    Ok(len as u32)
}
