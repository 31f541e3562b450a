use super::point_in_rings;
use crate::structures::Point2D;

const EPSILON: f64 = 1.0e-12;

/// Returns the parameter `t` along segment `p1`-`p2` at which it crosses
/// segment `q1`-`q2`, or `None` for non-intersecting and parallel segments.
pub fn segment_intersection(
    p1: &Point2D,
    p2: &Point2D,
    q1: &Point2D,
    q2: &Point2D,
) -> Option<f64> {
    let r = (p2.x - p1.x, p2.y - p1.y);
    let s = (q2.x - q1.x, q2.y - q1.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < EPSILON {
        return None;
    }
    let qp = (q1.x - p1.x, q1.y - p1.y);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if (-EPSILON..=1.0 + EPSILON).contains(&t) && (-EPSILON..=1.0 + EPSILON).contains(&u) {
        Some(t.clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Clips a single polyline part against the union of one or more polygons
/// (each an exterior ring followed by holes). The line is split wherever it
/// crosses a ring edge and the pieces lying inside any polygon are returned
/// in their original order and direction. Spans meeting on a shared border
/// join into one piece.
pub fn clip_polyline_to_polygons<R: AsRef<[Vec<Point2D>]>>(
    line: &[Point2D],
    polygons: &[R],
) -> Vec<Vec<Point2D>> {
    let mut pieces: Vec<Vec<Point2D>> = vec![];
    let mut current: Vec<Point2D> = vec![];

    for w in line.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        let mut ts = vec![0f64, 1f64];
        for rings in polygons {
            for ring in rings.as_ref() {
                let n = ring.len();
                for i in 0..n {
                    let (c, d) = (&ring[i], &ring[(i + 1) % n]);
                    if let Some(t) = segment_intersection(a, b, c, d) {
                        ts.push(t);
                    }
                }
            }
        }
        ts.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
        ts.dedup_by(|x, y| (*x - *y).abs() < EPSILON);

        for span in ts.windows(2) {
            let (t0, t1) = (span[0], span[1]);
            let mid = a.lerp(b, (t0 + t1) / 2.0);
            if polygons.iter().any(|rings| point_in_rings(&mid, rings.as_ref())) {
                let p0 = a.lerp(b, t0);
                let p1 = a.lerp(b, t1);
                match current.last() {
                    Some(last) if last.distance(&p0) < EPSILON => {}
                    Some(_) => {
                        pieces.push(std::mem::take(&mut current));
                        current.push(p0);
                    }
                    None => current.push(p0),
                }
                current.push(p1);
            } else if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
        }
    }
    if current.len() > 1 {
        pieces.push(current);
    }
    pieces.retain(|p| p.len() > 1);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(min, min),
            Point2D::new(max, min),
            Point2D::new(max, max),
            Point2D::new(min, max),
            Point2D::new(min, min),
        ]
    }

    #[test]
    fn test_segment_intersection() {
        let t = segment_intersection(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(10.0, 0.0),
            &Point2D::new(4.0, -1.0),
            &Point2D::new(4.0, 1.0),
        );
        assert!((t.unwrap() - 0.4).abs() < 1e-12);
        let parallel = segment_intersection(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(10.0, 0.0),
            &Point2D::new(0.0, 1.0),
            &Point2D::new(10.0, 1.0),
        );
        assert!(parallel.is_none());
    }

    #[test]
    fn test_line_crossing_polygon() {
        let rings = vec![square(0.0, 10.0)];
        let line = vec![Point2D::new(-5.0, 5.0), Point2D::new(15.0, 5.0)];
        let pieces = clip_polyline_to_polygons(&line, &[&rings]);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0], vec![Point2D::new(0.0, 5.0), Point2D::new(10.0, 5.0)]);
    }

    #[test]
    fn test_line_inside_kept_whole() {
        let rings = vec![square(0.0, 10.0)];
        let line = vec![
            Point2D::new(1.0, 1.0),
            Point2D::new(5.0, 2.0),
            Point2D::new(9.0, 9.0),
        ];
        let pieces = clip_polyline_to_polygons(&line, &[&rings]);
        assert_eq!(pieces, vec![line]);
    }

    #[test]
    fn test_line_outside_dropped() {
        let rings = vec![square(0.0, 10.0)];
        let line = vec![Point2D::new(20.0, 1.0), Point2D::new(30.0, 1.0)];
        assert!(clip_polyline_to_polygons(&line, &[&rings]).is_empty());
    }

    #[test]
    fn test_line_through_hole_splits() {
        let rings = vec![square(0.0, 10.0), square(4.0, 6.0)];
        let line = vec![Point2D::new(1.0, 5.0), Point2D::new(9.0, 5.0)];
        let pieces = clip_polyline_to_polygons(&line, &[&rings]);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0][1], Point2D::new(4.0, 5.0));
        assert_eq!(pieces[1][0], Point2D::new(6.0, 5.0));
    }

    #[test]
    fn test_adjacent_polygons_join_in_line_order() {
        let lower = vec![square(0.0, 10.0)];
        let upper = vec![vec![
            Point2D::new(0.0, 10.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(10.0, 20.0),
            Point2D::new(0.0, 20.0),
            Point2D::new(0.0, 10.0),
        ]];
        let line = vec![Point2D::new(5.0, 19.0), Point2D::new(5.0, 1.0)];
        let pieces = clip_polyline_to_polygons(&line, &[&lower, &upper]);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].first(), Some(&Point2D::new(5.0, 19.0)));
        assert_eq!(pieces[0].last(), Some(&Point2D::new(5.0, 1.0)));
    }

    #[test]
    fn test_overlapping_polygons_do_not_duplicate() {
        let a = vec![square(0.0, 10.0)];
        let b = vec![square(5.0, 15.0)];
        let line = vec![Point2D::new(-1.0, 7.0), Point2D::new(20.0, 7.0)];
        let pieces = clip_polyline_to_polygons(&line, &[&a, &b]);
        assert_eq!(pieces.len(), 1);
        let (first, last) = (pieces[0][0], pieces[0][pieces[0].len() - 1]);
        assert!(first.distance(&Point2D::new(0.0, 7.0)) < 1e-9);
        assert!(last.distance(&Point2D::new(15.0, 7.0)) < 1e-9);
    }
}
