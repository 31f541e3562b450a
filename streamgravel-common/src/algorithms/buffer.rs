use crate::structures::Point2D;
use std::f64::consts::PI;

/// Approximates a circular buffer around `center` with a closed,
/// counter-clockwise ring of `segments` edges.
pub fn point_buffer(center: &Point2D, radius: f64, segments: usize) -> Vec<Point2D> {
    let segments = segments.max(3);
    let mut ring = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let theta = 2.0 * PI * i as f64 / segments as f64;
        ring.push(Point2D::new(
            center.x + radius * theta.cos(),
            center.y + radius * theta.sin(),
        ));
    }
    ring.push(ring[0]);
    ring
}
