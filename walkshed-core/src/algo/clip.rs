//! Classification of graph edges against a reachability set and truncation
//! of segments that are only partly within reach.

use std::collections::BTreeSet;

use geo::{LineString, MultiLineString};
use log::warn;
use petgraph::visit::EdgeRef;

use crate::{
    Distance, SegmentId, TruncationError,
    geometry::{line_length, substring},
    model::{NetworkEdge, NetworkGraph, RoadSegment},
    routing::ReachabilitySet,
};

/// How much of a segment ended up in a walkshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipKind {
    Full,
    Partial,
}

impl ClipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ClipKind::Full => "full",
            ClipKind::Partial => "partial",
        }
    }
}

/// Road segment geometry contributing to a walkshed
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedSegment {
    pub segment: SegmentId,
    pub kind: ClipKind,
    pub geometry: MultiLineString<f64>,
}

impl ClippedSegment {
    pub fn length(&self) -> Distance {
        self.geometry.0.iter().map(line_length).sum()
    }
}

/// Partial segment that could not be truncated
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedSegment {
    pub segment: SegmentId,
    pub reason: TruncationError,
}

/// Result of classifying every edge of a graph
#[derive(Debug, Clone, Default)]
pub struct EdgeClassification {
    /// Segments with at least one edge entirely within reach
    pub full: BTreeSet<SegmentId>,
    /// Truncations of edges with exactly one reachable endpoint, in edge order
    pub partial: Vec<Result<ClippedSegment, DroppedSegment>>,
}

/// Classify each edge as fully reachable, partially reachable or unreachable.
///
/// For a partially reachable edge the walkable part starts at the reachable
/// endpoint and runs toward the unreachable one for whatever distance is
/// left of the cutoff. Nothing is emitted when no distance is left, or when
/// the remaining distance covers the rest of the segment in that direction.
pub fn clip_edges(
    graph: &NetworkGraph,
    segments: &[RoadSegment],
    reach: &ReachabilitySet,
) -> EdgeClassification {
    let cutoff = reach.cutoff();
    let mut classification = EdgeClassification::default();

    for edge in graph.graph.edge_references() {
        let data = edge.weight();
        let source = reach.distance(edge.source());
        let target = reach.distance(edge.target());

        match (source, target) {
            (Some(_), Some(_)) => {
                classification.full.insert(data.segment);
            }
            (Some(inside), None) => {
                if let Some(clip) = clip_partial(segments, data, true, cutoff - inside) {
                    classification.partial.push(clip);
                }
            }
            (None, Some(inside)) => {
                if let Some(clip) = clip_partial(segments, data, false, cutoff - inside) {
                    classification.partial.push(clip);
                }
            }
            (None, None) => {}
        }
    }

    classification
}

/// Segment with positional id `id`, falling back to a scan when the list is
/// not positional
pub(crate) fn segment_by_id(segments: &[RoadSegment], id: SegmentId) -> Option<&RoadSegment> {
    segments
        .get(id)
        .filter(|segment| segment.id == id)
        .or_else(|| segments.iter().find(|segment| segment.id == id))
}

/// Truncate the segment part holding `edge`, starting at the reachable end
/// of the edge. `from_source` tells which end that is.
fn clip_partial(
    segments: &[RoadSegment],
    edge: &NetworkEdge,
    from_source: bool,
    remaining: Distance,
) -> Option<Result<ClippedSegment, DroppedSegment>> {
    if remaining <= 0.0 {
        return None;
    }

    let dropped = |reason: TruncationError| {
        warn!("Dropping partial segment {}: {reason}", edge.segment);
        DroppedSegment {
            segment: edge.segment,
            reason,
        }
    };

    let Some(part) =
        segment_by_id(segments, edge.segment).and_then(|segment| segment.part(edge.part))
    else {
        return Some(Err(dropped(TruncationError::MissingGeometry(edge.part))));
    };

    let (inside, outside) = if from_source {
        (edge.source_offset, edge.target_offset)
    } else {
        (edge.target_offset, edge.source_offset)
    };
    let part_length = line_length(part);
    let forward = outside >= inside;
    let available = if forward {
        part_length - inside
    } else {
        inside
    };

    if remaining >= available {
        return None;
    }

    let truncated: Result<LineString<f64>, TruncationError> = if forward {
        substring(part, inside, inside + remaining)
    } else {
        substring(part, inside - remaining, inside)
    };

    Some(
        truncated
            .map(|line| ClippedSegment {
                segment: edge.segment,
                kind: ClipKind::Partial,
                geometry: MultiLineString::new(vec![line]),
            })
            .map_err(dropped),
    )
}
