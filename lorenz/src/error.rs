use std::io;

use image::ImageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LorenzError>;

/// Everything that can stop a render. None of these are retried; the caller gets the first one.
#[derive(Debug, Error)]
pub enum LorenzError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] ImageError),

    #[error("bad configuration file: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConf(String),

    #[error("cannot fit an empty point cloud")]
    EmptyPointCloud,

    /// All points share one location, so there is no extent to scale against.
    #[error("point cloud has zero extent (x span {x_span}, y span {y_span})")]
    DegenerateBounds { x_span: f64, y_span: f64 },

    /// Usually the trajectory blew up because `precision` was too small.
    #[error("point cloud bounds are not finite; did the trajectory diverge?")]
    NonFiniteBounds,

    #[error("target size must be finite and positive, got {0}")]
    InvalidSize(f64),

    #[error("canvas {width}x{height} has no pixels")]
    EmptyCanvas { width: u32, height: u32 },
}
