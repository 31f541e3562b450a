mod reach_extractor;

pub use self::reach_extractor::{ReachGeometry, ReachGeometryExtractor};
