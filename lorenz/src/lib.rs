//! Render the Lorenz attractor as a grayscale density image.
//!
//! The pipeline only ever runs forward: integrate the Lorenz equations into a long trajectory,
//! flatten it onto a plane, fit the flattened points to the requested image size, then count how
//! often each pixel gets hit.

use std::time::Instant;

use log::info;

pub mod attractor;
pub mod canvas;
pub mod error;
pub mod plane;

pub use attractor::{Conf, Params, State};
pub use canvas::Canvas;
pub use error::{LorenzError, Result};
pub use plane::Point;

/// Run every stage of the pipeline for `c` and hand back the finished canvas. Nothing is written
/// to disk here.
pub fn render(c: &Conf) -> Result<Canvas> {
    c.validate()?;

    let started = Instant::now();
    let trajectory =
        attractor::integrate(&c.params(), c.initial_state(), c.precision, c.iterations);
    info!(
        "Integrated {} states in {:?}",
        trajectory.len(),
        started.elapsed()
    );

    let points = plane::project(trajectory, plane::front_view);
    let fitted = plane::scale_and_crop(points, c.size)?;
    info!("Canvas is {}x{}", fitted.width, fitted.height);

    let started = Instant::now();
    let canvas = canvas::rasterize_parallel(
        &fitted.points,
        fitted.width,
        fitted.height,
        c.step,
        c.thread_count,
    )?;
    info!(
        "Accumulated {} points on {} thread(s) in {:?}",
        fitted.points.len(),
        c.thread_count,
        started.elapsed()
    );
    Ok(canvas)
}
