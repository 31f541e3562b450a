mod buffer;
mod clip_polyline;
mod point_in_poly;

pub use self::buffer::point_buffer;
pub use self::clip_polyline::{
    clip_polyline_to_polygons, segment_intersection,
};
pub use self::point_in_poly::{point_in_poly, point_in_rings};
