mod array2d;
mod bounding_box;
mod point2d;
mod polyline;

pub use self::array2d::Array2D;
pub use self::bounding_box::BoundingBox;
pub use self::point2d::Point2D;
pub use self::polyline::Polyline;
