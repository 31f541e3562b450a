use crate::structures::Point2D;

/// Winding-number point-in-polygon test. The ring may be open or closed
/// (first vertex repeated at the end). Points exactly on an edge are
/// considered inside.
pub fn point_in_poly(pt: &Point2D, poly: &[Point2D]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut wn = 0i32;
    for i in 0..n {
        let a = &poly[i];
        let b = &poly[(i + 1) % n];
        let side = is_left(a, b, pt);
        if side == 0f64
            && pt.x >= a.x.min(b.x)
            && pt.x <= a.x.max(b.x)
            && pt.y >= a.y.min(b.y)
            && pt.y <= a.y.max(b.y)
        {
            return true;
        }
        if a.y <= pt.y {
            if b.y > pt.y && side > 0f64 {
                wn += 1;
            }
        } else if b.y <= pt.y && side < 0f64 {
            wn -= 1;
        }
    }
    wn != 0
}

/// Tests a point against a polygon given as an exterior ring followed by
/// zero or more hole rings.
pub fn point_in_rings(pt: &Point2D, rings: &[Vec<Point2D>]) -> bool {
    match rings.split_first() {
        Some((exterior, holes)) => {
            point_in_poly(pt, exterior) && !holes.iter().any(|hole| point_in_poly(pt, hole))
        }
        None => false,
    }
}

// > 0 when pt is left of the line through a and b, < 0 right of it, 0 on it.
fn is_left(a: &Point2D, b: &Point2D, pt: &Point2D) -> f64 {
    (b.x - a.x) * (pt.y - a.y) - (pt.x - a.x) * (b.y - a.y)
}
