use std::cmp::min;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread;

use crossbeam_channel::unbounded;
use image::codecs::png::PngEncoder;
use image::{ColorType, GrayImage, ImageEncoder, Luma};
use log::debug;

use crate::error::{LorenzError, Result};
use crate::plane::Point;

/// A single channel image: a two dimensional array of brightness values stored row by row. Pixels
/// only ever get brighter, and they stop at 255 instead of wrapping around to black.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Truncate toward zero, then pull anything past the far edge back onto the last row or column.
/// Fitted points on the far boundary of the bounding box land exactly on `len`, one past the end.
fn clamp_px(v: f64, len: u32) -> u32 {
    // Fitted points are finite and non-negative; `as` maps -0.0 to 0.
    min(v as u32, len - 1)
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Canvas> {
        if width == 0 || height == 0 {
            return Err(LorenzError::EmptyCanvas { width, height });
        }
        Ok(Canvas {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get_px(&self, x: u32, y: u32) -> u8 {
        self.pixels[self.index(x, y)]
    }

    /// Brighten one pixel by `step`. Coordinates outside the canvas are ignored.
    pub fn incr_px(&mut self, x: u32, y: u32, step: u8) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = self.pixels[idx].saturating_add(step);
        }
    }

    /// Record one hit for a fitted point.
    pub fn plot(&mut self, p: Point, step: u8) {
        let x = clamp_px(p.x, self.width);
        let y = clamp_px(p.y, self.height);
        self.incr_px(x, y, step);
    }

    /// Add another canvas of the same size onto this one, saturating per pixel.
    pub fn merge(&mut self, other: &Canvas) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for (px, o) in self.pixels.iter_mut().zip(other.pixels.iter()) {
            *px = px.saturating_add(*o);
        }
    }

    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.get_px(x, y)]))
    }

    /// Encode as an 8-bit grayscale PNG. The file is flushed and closed before this returns.
    pub fn write_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        PngEncoder::new(&mut out).write_image(
            &self.pixels,
            self.width,
            self.height,
            ColorType::L8,
        )?;
        out.flush()?;
        Ok(())
    }

    /// Decode a PNG back into a canvas. Color images are converted to luma.
    pub fn read_png<P: AsRef<Path>>(path: P) -> Result<Canvas> {
        let img = image::open(path)?.into_luma8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(LorenzError::EmptyCanvas { width, height });
        }
        Ok(Canvas {
            width,
            height,
            pixels: img.into_raw(),
        })
    }
}

/// Accumulate fitted points onto a fresh `width` x `height` canvas, in order, adding `step` per
/// hit.
pub fn rasterize(points: &[Point], width: u32, height: u32, step: u8) -> Result<Canvas> {
    let mut canvas = Canvas::new(width, height)?;
    for p in points {
        canvas.plot(*p, step);
    }
    Ok(canvas)
}

/// Same result as `rasterize`, but the points are split into `thread_count` contiguous chunks which
/// are accumulated on their own canvases and merged at the end. Saturating addition makes the merge
/// order irrelevant: every pixel ends up at `min(hits * step, 255)` either way.
pub fn rasterize_parallel(
    points: &[Point],
    width: u32,
    height: u32,
    step: u8,
    thread_count: usize,
) -> Result<Canvas> {
    if thread_count <= 1 || points.len() < thread_count {
        return rasterize(points, width, height, step);
    }
    let mut canvas = Canvas::new(width, height)?;
    let chunk_len = (points.len() + thread_count - 1) / thread_count;

    let (tx, rx) = unbounded();
    thread::scope(|s| {
        for (idx, chunk) in points.chunks(chunk_len).enumerate() {
            let child_tx = tx.clone();
            let mut part = canvas.clone();
            s.spawn(move || {
                debug!("Thread {} started on {} points", idx, chunk.len());
                for p in chunk {
                    part.plot(*p, step);
                }
                // rx outlives the scope, so the send cannot fail.
                let _ = child_tx.send(part);
                debug!("Thread {} finished", idx);
            });
        }
    });
    drop(tx);

    for part in rx.iter() {
        canvas.merge(&part);
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tempfile::tempdir;

    #[test]
    fn new_canvas_is_black() {
        let c = Canvas::new(3, 2).unwrap();
        assert_eq!((c.width(), c.height()), (3, 2));
        assert_eq!(c.pixels(), &[0; 6]);
    }

    #[test]
    fn zero_sized_canvas_is_refused() {
        assert!(matches!(
            Canvas::new(0, 10),
            Err(LorenzError::EmptyCanvas { width: 0, height: 10 })
        ));
        assert!(matches!(
            rasterize(&[Point::new(0.0, 0.0)], 10, 0, 8),
            Err(LorenzError::EmptyCanvas { .. })
        ));
    }

    #[test]
    fn hits_saturate_at_white() {
        let mut c = Canvas::new(1, 1).unwrap();
        for _ in 0..31 {
            c.incr_px(0, 0, 8);
        }
        assert_eq!(c.get_px(0, 0), 248);
        c.incr_px(0, 0, 8);
        assert_eq!(c.get_px(0, 0), 255);
        for _ in 0..10 {
            c.incr_px(0, 0, 8);
        }
        assert_eq!(c.get_px(0, 0), 255);
    }

    #[test]
    fn plot_truncates_toward_zero() {
        let mut c = Canvas::new(4, 4).unwrap();
        c.plot(Point::new(2.9, 1.999), 8);
        assert_eq!(c.get_px(2, 1), 8);
        assert_eq!(c.pixels().iter().filter(|&&p| p != 0).count(), 1);
    }

    #[test]
    fn far_boundary_is_clamped_onto_the_canvas() {
        let mut c = Canvas::new(10, 5).unwrap();
        c.plot(Point::new(10.0, 5.0), 8);
        c.plot(Point::new(10.0, 0.0), 8);
        c.plot(Point::new(0.0, 5.0), 8);
        assert_eq!(c.get_px(9, 4), 8);
        assert_eq!(c.get_px(9, 0), 8);
        assert_eq!(c.get_px(0, 4), 8);
    }

    #[test]
    fn negative_zero_lands_in_the_origin() {
        let mut c = Canvas::new(4, 4).unwrap();
        c.plot(Point::new(-0.0, -0.0), 8);
        assert_eq!(c.get_px(0, 0), 8);
    }

    #[test]
    fn out_of_range_increment_is_ignored() {
        let mut c = Canvas::new(2, 2).unwrap();
        c.incr_px(2, 0, 8);
        c.incr_px(0, 2, 8);
        assert_eq!(c.pixels(), &[0; 4]);
    }

    #[test]
    fn rasterize_fitted_corners() {
        let points = vec![Point::new(0.0, 0.0), Point::new(5.0, 10.0)];
        let c = rasterize(&points, 5, 10, 8).unwrap();
        assert_eq!(c.get_px(0, 0), 8);
        assert_eq!(c.get_px(4, 9), 8);
        assert_eq!(c.pixels().iter().map(|&p| p as u32).sum::<u32>(), 16);
    }

    #[test]
    fn merge_saturates() {
        let mut a = Canvas::new(2, 1).unwrap();
        let mut b = Canvas::new(2, 1).unwrap();
        a.incr_px(0, 0, 200);
        b.incr_px(0, 0, 200);
        b.incr_px(1, 0, 16);
        a.merge(&b);
        assert_eq!(a.pixels(), &[255, 16]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(7);
        // Few pixels and many points so plenty of them saturate.
        let points: Vec<Point> = (0..5000)
            .map(|_| Point::new(rng.gen_range(0.0..=8.0), rng.gen_range(0.0..=6.0)))
            .collect();
        let sequential = rasterize(&points, 8, 6, 8).unwrap();
        assert!(sequential.pixels().iter().any(|&p| p == 255));
        for threads in &[1, 2, 3, 7, 16] {
            let parallel = rasterize_parallel(&points, 8, 6, 8, *threads).unwrap();
            assert_eq!(parallel, sequential, "thread count {}", threads);
        }
    }

    #[test]
    fn parallel_with_more_threads_than_points() {
        let points = vec![Point::new(1.0, 1.0)];
        let c = rasterize_parallel(&points, 2, 2, 8, 4).unwrap();
        assert_eq!(c.get_px(1, 1), 8);
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.png");

        let mut c = Canvas::new(7, 3).unwrap();
        for x in 0..7 {
            for _ in 0..(x * 6) {
                c.incr_px(x, x % 3, 8);
            }
        }
        c.write_png(&path).unwrap();

        let back = Canvas::read_png(&path).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.to_image(), c.to_image());
    }

    #[test]
    fn to_image_is_row_major() {
        let mut c = Canvas::new(3, 2).unwrap();
        c.incr_px(2, 1, 40);
        let img = c.to_image();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1), &Luma([40]));
        assert_eq!(img.into_raw(), vec![0, 0, 0, 0, 0, 40]);
    }

    #[test]
    fn writing_into_a_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("canvas.png");
        let c = Canvas::new(1, 1).unwrap();
        assert!(matches!(c.write_png(&path), Err(LorenzError::Io(_))));
    }
}
