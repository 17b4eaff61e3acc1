use geo::Point;

use crate::geometry::{Crs, reproject};

/// A location a walkshed is computed from
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    /// 1-based position in the source dataset
    pub id: usize,
    /// Name, used as join key and for network selection
    pub name: String,
    pub geometry: Point<f64>,
    pub crs: Crs,
}

impl PointOfInterest {
    pub fn new(id: usize, name: impl Into<String>, geometry: Point<f64>, crs: Crs) -> Self {
        Self {
            id,
            name: name.into(),
            geometry,
            crs,
        }
    }

    /// Location expressed in `crs`; the point itself keeps its own frame
    pub fn location_in(&self, crs: Crs) -> Point<f64> {
        reproject(&self.geometry, self.crs, crs)
    }
}
