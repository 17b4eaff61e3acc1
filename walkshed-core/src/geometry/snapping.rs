//! Repair of imprecisely digitised networks.
//!
//! Segments are repaired in input order, each against the segments already
//! repaired before it. A vertex lying off that reference shape but within
//! tolerance of one of its vertices is moved onto the nearest one; vertices
//! of the same segment are never merged with each other. Afterwards every
//! vertex of another segment, and every point where two segments cross,
//! lying within tolerance of a segment's interior is inserted into it, so
//! that T-junctions and crossings end up sharing a vertex.

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Coord, Distance as _, Euclidean, Line, LineString, MultiLineString, Point};
use log::debug;
use rstar::{AABB, PointDistance, RTree, primitives::GeomWithData, primitives::Rectangle};

use crate::{Distance, model::RoadSegment, model::VertexKey};

/// Straight piece of a segment with the input position of its segment
type IndexedLine = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Reference point with the input position of the segment owning it;
/// crossing points belong to no segment
type Anchor = GeomWithData<[f64; 2], Option<usize>>;

/// Snap every segment onto the reference shape of the network.
///
/// Returns repaired copies in input order; the input is left untouched.
/// A non-positive tolerance disables snapping.
pub fn repair_network(segments: &[RoadSegment], tolerance: Distance) -> Vec<RoadSegment> {
    if tolerance <= 0.0 || !tolerance.is_finite() {
        return segments.to_vec();
    }

    let snapped = snap_segments(segments, tolerance);

    let mut anchors: Vec<Anchor> = snapped
        .iter()
        .enumerate()
        .flat_map(|(owner, parts)| {
            parts
                .iter()
                .flat_map(|part| part.coords())
                .map(move |coord| Anchor::new([coord.x, coord.y], Some(owner)))
        })
        .collect();
    anchors.extend(
        crossing_points(&snapped)
            .into_iter()
            .map(|coord| Anchor::new([coord.x, coord.y], None)),
    );
    let anchors = RTree::bulk_load(anchors);
    debug!(
        "Reference shape has {} anchors for {} segments",
        anchors.size(),
        segments.len()
    );

    segments
        .iter()
        .zip(snapped)
        .enumerate()
        .map(|(owner, (segment, parts))| {
            let parts = parts
                .iter()
                .map(|part| crack_line(part, owner, &anchors, tolerance))
                .collect();
            RoadSegment::new(segment.id, MultiLineString::new(parts))
        })
        .collect()
}

/// Move vertices onto the nearest vertex of an earlier segment within
/// tolerance. Earlier segments are taken as already repaired.
fn snap_segments(segments: &[RoadSegment], tolerance: Distance) -> Vec<Vec<LineString<f64>>> {
    let mut reference: RTree<[f64; 2]> = RTree::new();
    let mut snapped = Vec::with_capacity(segments.len());

    for segment in segments {
        let parts: Vec<LineString<f64>> = segment
            .parts()
            .map(|part| {
                let mut coords: Vec<Coord<f64>> = part
                    .coords()
                    .map(|coord| snap_vertex(*coord, &reference, tolerance))
                    .collect();
                coords.dedup_by(|a, b| VertexKey::from(*a) == VertexKey::from(*b));
                LineString::new(coords)
            })
            .collect();

        for coord in parts.iter().flat_map(|part| part.coords()) {
            reference.insert([coord.x, coord.y]);
        }
        snapped.push(parts);
    }

    snapped
}

fn snap_vertex(coord: Coord<f64>, reference: &RTree<[f64; 2]>, tolerance: Distance) -> Coord<f64> {
    let query = [coord.x, coord.y];
    reference
        .nearest_neighbor(&query)
        .filter(|nearest| nearest.distance_2(&query) <= tolerance * tolerance)
        .map_or(coord, |nearest| Coord {
            x: nearest[0],
            y: nearest[1],
        })
}

/// Points where pieces of two different segments intersect
fn crossing_points(segments: &[Vec<LineString<f64>>]) -> Vec<Coord<f64>> {
    let pieces: Vec<(usize, Line<f64>)> = segments
        .iter()
        .enumerate()
        .flat_map(|(owner, parts)| {
            parts
                .iter()
                .flat_map(|part| part.lines())
                .map(move |piece| (owner, piece))
        })
        .collect();

    let index = RTree::bulk_load(
        pieces
            .iter()
            .enumerate()
            .map(|(idx, (_, piece))| {
                let envelope = envelope(piece, 0.0);
                IndexedLine::new(
                    Rectangle::from_corners(envelope.lower(), envelope.upper()),
                    idx,
                )
            })
            .collect(),
    );

    let mut crossings = Vec::new();
    for (idx, (owner, piece)) in pieces.iter().enumerate() {
        for other in index.locate_in_envelope_intersecting(&envelope(piece, 0.0)) {
            let (other_owner, other_piece) = pieces[other.data];
            if other.data <= idx || other_owner == *owner {
                continue;
            }
            match line_intersection(*piece, other_piece) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    crossings.push(intersection);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    crossings.push(intersection.start);
                    crossings.push(intersection.end);
                }
                None => {}
            }
        }
    }
    crossings
}

/// Insert anchors of other segments lying close to the interior of `line`
fn crack_line(
    line: &LineString<f64>,
    owner: usize,
    anchors: &RTree<Anchor>,
    tolerance: Distance,
) -> LineString<f64> {
    if line.0.len() < 2 {
        return line.clone();
    }

    let mut coords = Vec::with_capacity(line.0.len());
    coords.push(line.0[0]);

    for piece in line.lines() {
        let mut cracks: Vec<(f64, Coord<f64>)> = anchors
            .locate_in_envelope_intersecting(&envelope(&piece, tolerance))
            .filter(|anchor| anchor.data != Some(owner))
            .filter_map(|anchor| {
                let [x, y] = *anchor.geom();
                let anchor = Coord { x, y };
                crack_position(&piece, anchor, tolerance).map(|t| (t, anchor))
            })
            .collect();
        cracks.sort_by(|a, b| a.0.total_cmp(&b.0));

        coords.extend(cracks.into_iter().map(|(_, anchor)| anchor));
        coords.push(piece.end);
    }

    coords.dedup_by(|a, b| VertexKey::from(*a) == VertexKey::from(*b));
    LineString::new(coords)
}

/// Position along `piece` (0..1, exclusive) where `anchor` should be
/// inserted, if it lies within tolerance of the piece's interior
fn crack_position(piece: &Line<f64>, anchor: Coord<f64>, tolerance: Distance) -> Option<f64> {
    let key = VertexKey::from(anchor);
    if key == VertexKey::from(piece.start) || key == VertexKey::from(piece.end) {
        return None;
    }

    let delta = piece.delta();
    let length_2 = delta.x * delta.x + delta.y * delta.y;
    if length_2 == 0.0 {
        return None;
    }

    let offset = anchor - piece.start;
    let t = (offset.x * delta.x + offset.y * delta.y) / length_2;
    if t <= 0.0 || t >= 1.0 {
        return None;
    }

    let foot = piece.start + delta * t;
    (Euclidean.distance(Point::from(foot), Point::from(anchor)) <= tolerance).then_some(t)
}

fn envelope(line: &Line<f64>, margin: f64) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [
            line.start.x.min(line.end.x) - margin,
            line.start.y.min(line.end.y) - margin,
        ],
        [
            line.start.x.max(line.end.x) + margin,
            line.start.y.max(line.end.y) + margin,
        ],
    )
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;
    use crate::model::NetworkGraph;

    fn segment(id: usize, coords: &[(f64, f64)]) -> RoadSegment {
        RoadSegment::from_line(id, coords.iter().copied().collect())
    }

    fn first_part(segment: &RoadSegment) -> &LineString<f64> {
        segment.part(0).unwrap()
    }

    #[test]
    fn closes_endpoint_gap() {
        let segments = vec![
            segment(0, &[(0.0, 0.0), (100.0, 0.0)]),
            segment(1, &[(100.5, 0.0), (200.0, 0.0)]),
        ];
        let repaired = repair_network(&segments, 1.0);

        assert_eq!(
            first_part(&repaired[1]),
            &line_string![(x: 100.0, y: 0.0), (x: 200.0, y: 0.0)]
        );
        assert_eq!(NetworkGraph::from_segments(&repaired).vertex_count(), 3);
    }

    #[test]
    fn cracks_line_at_near_miss_junction() {
        let segments = vec![
            segment(0, &[(0.0, 0.0), (200.0, 0.0)]),
            segment(1, &[(100.0, 0.6), (100.0, 100.0)]),
        ];
        let repaired = repair_network(&segments, 1.0);

        assert_eq!(
            first_part(&repaired[0]),
            &line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.6), (x: 200.0, y: 0.0)]
        );
        let graph = NetworkGraph::from_segments(&repaired);
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn crossing_lines_share_a_vertex() {
        let segments = vec![
            segment(0, &[(-10.0, 0.0), (10.0, 0.0)]),
            segment(1, &[(0.0, -10.0), (0.0, 10.0)]),
        ];
        let repaired = repair_network(&segments, 1.0);

        for segment in &repaired {
            assert!(
                first_part(segment)
                    .coords()
                    .any(|c| c.x.abs() < 1e-9 && c.y.abs() < 1e-9)
            );
        }
        assert_eq!(NetworkGraph::from_segments(&repaired).vertex_count(), 5);
    }

    #[test]
    fn far_apart_segments_are_untouched() {
        let segments = vec![
            segment(0, &[(0.0, 0.0), (100.0, 0.0)]),
            segment(1, &[(0.0, 50.0), (100.0, 50.0)]),
        ];
        let repaired = repair_network(&segments, 1.0);
        assert_eq!(repaired, segments);
    }

    #[test]
    fn input_is_not_modified_and_ids_are_kept() {
        let segments = vec![
            segment(3, &[(0.0, 0.0), (100.0, 0.0)]),
            segment(7, &[(100.2, 0.3), (150.0, 0.0)]),
        ];
        let original = segments.clone();
        let repaired = repair_network(&segments, 1.0);

        assert_eq!(segments, original);
        assert_eq!(repaired.iter().map(|s| s.id).collect::<Vec<_>>(), vec![3, 7]);
    }

    #[test]
    fn dense_curve_keeps_its_vertices() {
        let curve: LineString<f64> = (0..=40)
            .map(|step| {
                let angle = f64::from(step) / 40.0 * std::f64::consts::FRAC_PI_2;
                (5.0 * angle.cos(), 5.0 * angle.sin())
            })
            .collect();
        let segments = vec![RoadSegment::from_line(0, curve)];

        assert_eq!(repair_network(&segments, 1.0), segments);
    }

    #[test]
    fn hairpin_keeps_both_legs() {
        let segments = vec![segment(0, &[(0.0, 0.0), (10.0, 0.0), (10.0, 0.8), (0.0, 0.8)])];
        let repaired = repair_network(&segments, 1.0);

        assert_eq!(repaired, segments);
        assert!((repaired[0].length() - 20.8).abs() < 1e-9);
    }

    #[test]
    fn dense_curve_still_joins_a_nearby_road() {
        let segments = vec![
            segment(0, &[(0.0, 0.0), (0.3, 0.1), (0.6, 0.3), (0.9, 0.6)]),
            segment(1, &[(0.9, 1.2), (0.9, 10.0)]),
        ];
        let repaired = repair_network(&segments, 1.0);

        assert_eq!(repaired[0], segments[0]);
        assert_eq!(first_part(&repaired[1]).0[0], Coord { x: 0.9, y: 0.6 });
    }

    #[test]
    fn zero_tolerance_disables_snapping() {
        let segments = vec![
            segment(0, &[(0.0, 0.0), (100.0, 0.0)]),
            segment(1, &[(100.5, 0.0), (200.0, 0.0)]),
        ];
        assert_eq!(repair_network(&segments, 0.0), segments);
    }
}
