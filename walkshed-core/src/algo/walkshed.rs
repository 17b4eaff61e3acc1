//! Per-point walkshed pipeline and the parallel driver running it for every
//! point and distance.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use geo::Point;
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use super::clip::{
    ClipKind, ClippedSegment, DroppedSegment, EdgeClassification, clip_edges, segment_by_id,
};
use crate::{
    DEFAULT_SNAP_TOLERANCE, Distance,
    geometry::{Crs, repair_network},
    loading::{NetworkAssignment, WalkshedInputs, format_distance},
    model::{NetworkGraph, PointOfInterest, RoadNetwork, RoadSegment},
    routing::{ReachabilitySet, bounded_distances},
};

/// Parameters shared by every walkshed of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkshedOptions {
    /// Projected frame the graph is built in
    pub working_crs: Crs,
    pub snap_tolerance: Distance,
}

impl Default for WalkshedOptions {
    fn default() -> Self {
        Self {
            working_crs: Crs::WebMercator,
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
        }
    }
}

/// Why a point contributed nothing for a distance
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("road network file missing: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("road network graph is empty")]
    EmptyGraph,
    #[error("no graph vertex near the point")]
    LocateFailure,
    #[error("no reachable road segments")]
    NoReachableSegments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkipEvent {
    pub point_id: usize,
    pub point_name: String,
    pub max_distance: Distance,
    pub reason: SkipReason,
}

/// Reachable road geometry of one point for one distance
#[derive(Debug, Clone)]
pub struct WalkshedResult {
    pub point_id: usize,
    pub point_name: String,
    /// Network file the walkshed was computed on
    pub network: PathBuf,
    /// Graph vertex the search started from, in the working frame
    pub start: Point<f64>,
    pub reachable_vertices: usize,
    pub max_distance: Distance,
    /// Fully reachable segments by id, followed by truncated ones
    pub segments: Vec<ClippedSegment>,
    /// Partial segments whose truncation failed
    pub dropped: Vec<DroppedSegment>,
}

impl WalkshedResult {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_length(&self) -> Distance {
        self.segments.iter().map(ClippedSegment::length).sum()
    }

    pub fn full_segments(&self) -> impl Iterator<Item = &ClippedSegment> {
        self.segments
            .iter()
            .filter(|segment| segment.kind == ClipKind::Full)
    }

    pub fn partial_segments(&self) -> impl Iterator<Item = &ClippedSegment> {
        self.segments
            .iter()
            .filter(|segment| segment.kind == ClipKind::Partial)
    }
}

/// All walksheds computed for one distance
#[derive(Debug, Clone)]
pub struct WalkshedCollection {
    pub max_distance: Distance,
    /// Frame of every geometry in the collection
    pub crs: Crs,
    /// Results ordered by point id
    pub results: Vec<WalkshedResult>,
}

impl WalkshedCollection {
    pub fn is_empty(&self) -> bool {
        self.results.iter().all(WalkshedResult::is_empty)
    }

    pub fn result_for(&self, point_id: usize) -> Option<&WalkshedResult> {
        self.results.iter().find(|result| result.point_id == point_id)
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One collection per requested distance, in request order
    pub collections: Vec<WalkshedCollection>,
    pub skipped: Vec<SkipEvent>,
}

impl RunReport {
    pub fn collection(&self, distance: Distance) -> Option<&WalkshedCollection> {
        self.collections
            .iter()
            .find(|collection| collection.max_distance == distance)
    }

    /// Partial segments dropped anywhere in the run
    pub fn dropped(&self) -> impl Iterator<Item = (&WalkshedResult, &DroppedSegment)> {
        self.collections
            .iter()
            .flat_map(|collection| &collection.results)
            .flat_map(|result| result.dropped.iter().map(move |dropped| (result, dropped)))
    }
}

/// Run the full pipeline for one point and one distance:
/// repair, build, locate, search, clip and assemble.
///
/// # Errors
///
/// Returns the [`SkipReason`] when the point cannot produce a walkshed
pub fn compute_walkshed(
    point: &PointOfInterest,
    network: &RoadNetwork,
    cutoff: Distance,
    options: &WalkshedOptions,
) -> Result<WalkshedResult, SkipReason> {
    let network = if network.crs == options.working_crs {
        Cow::Borrowed(network)
    } else {
        Cow::Owned(network.reprojected(options.working_crs))
    };

    let repaired = repair_network(&network.segments, options.snap_tolerance);
    let graph = NetworkGraph::from_segments(&repaired);
    debug!(
        "{}: graph built with {} nodes and {} edges",
        point.name,
        graph.vertex_count(),
        graph.edge_count()
    );
    if graph.is_empty() {
        return Err(SkipReason::EmptyGraph);
    }

    let location = point.location_in(network.crs);
    let (start, start_location, offset) = graph
        .nearest_node(&location)
        .ok_or(SkipReason::LocateFailure)?;
    debug!(
        "{}: start node ({:.2}, {:.2}) is {offset:.2} from the point",
        point.name,
        start_location.x(),
        start_location.y()
    );

    let reach = bounded_distances(&graph, start, cutoff);
    info!(
        "{}: {} reachable nodes within {}",
        point.name,
        reach.len(),
        format_distance(cutoff)
    );

    let classification = clip_edges(&graph, &repaired, &reach);
    Ok(assemble(
        point,
        network.source(),
        start_location,
        &repaired,
        &reach,
        classification,
    ))
}

/// Merge fully reachable segments and accepted truncations into one result
pub fn assemble(
    point: &PointOfInterest,
    network: &Path,
    start: Point<f64>,
    segments: &[RoadSegment],
    reach: &ReachabilitySet,
    classification: EdgeClassification,
) -> WalkshedResult {
    let mut clipped: Vec<ClippedSegment> = classification
        .full
        .iter()
        .filter_map(|&id| {
            segment_by_id(segments, id).map(|segment| ClippedSegment {
                segment: id,
                kind: ClipKind::Full,
                geometry: segment.geometry.clone(),
            })
        })
        .collect();

    let mut dropped = Vec::new();
    for clip in classification.partial {
        match clip {
            Ok(segment) => clipped.push(segment),
            Err(failure) => dropped.push(failure),
        }
    }

    WalkshedResult {
        point_id: point.id,
        point_name: point.name.clone(),
        network: network.to_path_buf(),
        start,
        reachable_vertices: reach.len(),
        max_distance: reach.cutoff(),
        segments: clipped,
        dropped,
    }
}

/// Compute walksheds for every (point, distance) pair in parallel.
///
/// Pairs are independent; results are merged afterwards into one collection
/// per distance ordered by point id, so scheduling does not affect output.
pub fn run_walksheds(
    inputs: &WalkshedInputs,
    distances: &[Distance],
    options: &WalkshedOptions,
) -> RunReport {
    let point_count = inputs.points.len();
    info!(
        "Computing walksheds for {point_count} points at {} distances",
        distances.len()
    );

    let outcomes: Vec<(usize, Result<WalkshedResult, SkipEvent>)> = (0..distances.len()
        * point_count)
        .into_par_iter()
        .map(|task| {
            let (distance_idx, point_idx) = (task / point_count, task % point_count);
            let cutoff = distances[distance_idx];
            let point = &inputs.points[point_idx];

            let outcome = match &inputs.assignments[point_idx] {
                NetworkAssignment::Missing(path) => Err(SkipReason::MissingInput(path.clone())),
                NetworkAssignment::Loaded(network) => {
                    compute_walkshed(point, network, cutoff, options)
                }
            }
            .and_then(|result| {
                if result.is_empty() {
                    Err(SkipReason::NoReachableSegments)
                } else {
                    Ok(result)
                }
            })
            .map_err(|reason| {
                warn!(
                    "Skipping {} (id {}) at {}: {reason}",
                    point.name,
                    point.id,
                    format_distance(cutoff)
                );
                SkipEvent {
                    point_id: point.id,
                    point_name: point.name.clone(),
                    max_distance: cutoff,
                    reason,
                }
            });

            (distance_idx, outcome)
        })
        .collect();

    let mut collections: Vec<WalkshedCollection> = distances
        .iter()
        .map(|&max_distance| WalkshedCollection {
            max_distance,
            crs: options.working_crs,
            results: Vec::new(),
        })
        .collect();
    let mut skipped = Vec::new();

    for (distance_idx, outcome) in outcomes {
        match outcome {
            Ok(result) => collections[distance_idx].results.push(result),
            Err(event) => skipped.push(event),
        }
    }

    for collection in &mut collections {
        collection.results.sort_by_key(|result| result.point_id);
        if collection.is_empty() {
            warn!(
                "No reachable lines computed for {}",
                format_distance(collection.max_distance)
            );
        }
    }

    RunReport {
        collections,
        skipped,
    }
}
