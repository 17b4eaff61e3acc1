//! Road network components - segments, vertices and edges

use std::path::{Path, PathBuf};

use geo::{Coord, LineString, MultiLineString, Point};

use crate::{
    Distance, SegmentId,
    geometry::{Crs, line_length, reproject},
};

/// Grid used to decide whether two coordinates are the same vertex
pub const VERTEX_KEY_RESOLUTION: f64 = 1e-6;

/// A single record of a road network file
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    /// Positional index within the source network
    pub id: SegmentId,
    /// Simple polylines making up the segment; empty for a null geometry
    pub geometry: MultiLineString<f64>,
}

impl RoadSegment {
    pub fn new(id: SegmentId, geometry: MultiLineString<f64>) -> Self {
        Self { id, geometry }
    }

    pub fn from_line(id: SegmentId, line: LineString<f64>) -> Self {
        Self::new(id, MultiLineString::new(vec![line]))
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.0.iter().all(|part| part.0.is_empty())
    }

    pub fn parts(&self) -> impl Iterator<Item = &LineString<f64>> {
        self.geometry.0.iter()
    }

    pub fn part(&self, index: usize) -> Option<&LineString<f64>> {
        self.geometry.0.get(index)
    }

    /// Total length of all parts
    pub fn length(&self) -> Distance {
        self.parts().map(line_length).sum()
    }
}

/// Set of road segments sharing one reference frame
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    /// File the network was read from, used as reference in results
    pub source: PathBuf,
    pub crs: Crs,
    pub segments: Vec<RoadSegment>,
}

impl RoadNetwork {
    pub fn new(source: impl Into<PathBuf>, crs: Crs, segments: Vec<RoadSegment>) -> Self {
        Self {
            source: source.into(),
            crs,
            segments,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Copy of the network expressed in another frame
    pub fn reprojected(&self, crs: Crs) -> RoadNetwork {
        if crs == self.crs {
            return self.clone();
        }
        let segments = self
            .segments
            .iter()
            .map(|segment| RoadSegment::new(segment.id, reproject(&segment.geometry, self.crs, crs)))
            .collect();

        RoadNetwork {
            source: self.source.clone(),
            crs,
            segments,
        }
    }
}

/// Network graph vertex
#[derive(Debug, Clone)]
pub struct Vertex {
    pub geometry: Point<f64>,
}

/// Straight piece of a road segment between two consecutive vertices
#[derive(Debug, Clone)]
pub struct NetworkEdge {
    /// Euclidean length of the piece
    pub weight: Distance,
    /// Segment the piece was cut from
    pub segment: SegmentId,
    /// Index of the segment part holding the piece
    pub part: usize,
    /// Offset along the part of the edge's source vertex
    pub source_offset: Distance,
    /// Offset along the part of the edge's target vertex
    pub target_offset: Distance,
}

/// Quantised coordinate used as vertex identity.
///
/// Float coordinates that differ only below [`VERTEX_KEY_RESOLUTION`] map to
/// the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey(i64, i64);

impl VertexKey {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(coord: Coord<f64>) -> Self {
        VertexKey(
            (coord.x / VERTEX_KEY_RESOLUTION).round() as i64,
            (coord.y / VERTEX_KEY_RESOLUTION).round() as i64,
        )
    }
}

impl From<Coord<f64>> for VertexKey {
    fn from(value: Coord<f64>) -> Self {
        VertexKey::new(value)
    }
}
