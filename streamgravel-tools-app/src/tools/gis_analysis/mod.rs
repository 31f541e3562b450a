mod geometry_service;

pub use self::geometry_service::{
    GeometryService, IndexedPolygonLayer, PlanarGeometryService, PolylineRecord,
};
