use super::{BoundingBox, Point2D};
use serde_derive::{Deserialize, Serialize};

/// A (possibly multipart) polyline. Vertices of all parts are stored
/// contiguously and `parts` holds the index of the first vertex of each part,
/// mirroring the shapefile record layout.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Point2D>,
    pub parts: Vec<usize>,
}

impl Polyline {
    pub fn new(vertices: Vec<Point2D>) -> Polyline {
        let parts = if vertices.is_empty() { vec![] } else { vec![0] };
        Polyline { vertices, parts }
    }

    /// Builds a multipart polyline. Empty parts are discarded.
    pub fn from_parts(parts: Vec<Vec<Point2D>>) -> Polyline {
        let mut line = Polyline::default();
        for part in parts {
            line.add_part(part);
        }
        line
    }

    pub fn add_part(&mut self, part: Vec<Point2D>) {
        if part.is_empty() {
            return;
        }
        self.parts.push(self.vertices.len());
        self.vertices.extend(part);
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn part(&self, index: usize) -> &[Point2D] {
        let start = self.parts[index];
        let end = if index + 1 < self.parts.len() {
            self.parts[index + 1]
        } else {
            self.vertices.len()
        };
        &self.vertices[start..end]
    }

    pub fn part_iter(&self) -> impl Iterator<Item = &[Point2D]> + '_ {
        (0..self.parts.len()).map(move |i| self.part(i))
    }

    pub fn first_point(&self) -> Option<Point2D> {
        self.vertices.first().copied()
    }

    pub fn last_point(&self) -> Option<Point2D> {
        self.vertices.last().copied()
    }

    /// Arc length, summed over parts. Gaps between parts are not counted.
    pub fn length(&self) -> f64 {
        self.part_iter()
            .map(|part| part.windows(2).map(|w| w[0].distance(&w[1])).sum::<f64>())
            .sum()
    }

    /// The length-weighted centre of gravity of the line's segments. For a
    /// degenerate (zero-length) line this is the mean of its vertices.
    pub fn centroid(&self) -> Option<Point2D> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut sum_x = 0f64;
        let mut sum_y = 0f64;
        let mut total = 0f64;
        for part in self.part_iter() {
            for w in part.windows(2) {
                let len = w[0].distance(&w[1]);
                let mid = Point2D::midpoint(&w[0], &w[1]);
                sum_x += mid.x * len;
                sum_y += mid.y * len;
                total += len;
            }
        }
        if total > 0f64 {
            return Some(Point2D::new(sum_x / total, sum_y / total));
        }
        let n = self.vertices.len() as f64;
        let x = self.vertices.iter().map(|p| p.x).sum::<f64>() / n;
        let y = self.vertices.iter().map(|p| p.y).sum::<f64>() / n;
        Some(Point2D::new(x, y))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }
}
