use geo::{Coord, Euclidean, Length, Line, LineString};

use crate::{Distance, TruncationError};

/// Offsets this close to the line ends are treated as the ends themselves
const OFFSET_EPSILON: f64 = 1e-9;

pub fn line_length(line: &LineString<f64>) -> Distance {
    Euclidean.length(line)
}

/// Extract the part of `line` lying between `start` and `end`, both measured
/// along the line from its first vertex.
///
/// The result keeps the orientation of the input and contains every input
/// vertex strictly between the two offsets.
pub fn substring(
    line: &LineString<f64>,
    start: Distance,
    end: Distance,
) -> Result<LineString<f64>, TruncationError> {
    if line.0.len() < 2 {
        return Err(TruncationError::TooFewVertices);
    }
    if !start.is_finite() || !end.is_finite() {
        return Err(TruncationError::NonFinite);
    }

    let length = line_length(line);
    if length <= 0.0 {
        return Err(TruncationError::ZeroLength);
    }
    if start < -OFFSET_EPSILON || end > length + OFFSET_EPSILON || start >= end {
        return Err(TruncationError::OutOfRange { start, end, length });
    }
    let start = start.max(0.0);
    let end = end.min(length);

    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(line.0.len());
    let mut travelled = 0.0;

    for segment in line.lines() {
        let segment_length = Euclidean.length(&segment);
        let segment_end = travelled + segment_length;

        if coords.is_empty() && start <= segment_end && segment_length > 0.0 {
            coords.push(interpolate(&segment, (start - travelled) / segment_length));
        }

        if !coords.is_empty() {
            if end <= segment_end {
                if segment_length > 0.0 {
                    coords.push(interpolate(&segment, (end - travelled) / segment_length));
                } else {
                    coords.push(segment.end);
                }
                break;
            }
            if segment_end > start {
                coords.push(segment.end);
            }
        }

        travelled = segment_end;
    }

    coords.dedup();
    if coords.len() < 2 {
        return Err(TruncationError::OutOfRange { start, end, length });
    }

    Ok(LineString::new(coords))
}

fn interpolate(segment: &Line<f64>, ratio: f64) -> Coord<f64> {
    let ratio = ratio.clamp(0.0, 1.0);
    segment.start + (segment.end - segment.start) * ratio
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;

    #[test]
    fn prefix_of_straight_line() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 300.0, y: 0.0)];
        let prefix = substring(&line, 0.0, 100.0).unwrap();

        assert_eq!(prefix.0.len(), 2);
        assert_eq!(prefix.0[0], Coord { x: 0.0, y: 0.0 });
        assert!((prefix.0[1].x - 100.0).abs() < 1e-9);
        assert!((line_length(&prefix) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn keeps_interior_vertices() {
        let line = line_string![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 20.0, y: 10.0),
        ];
        let part = substring(&line, 5.0, 25.0).unwrap();

        assert_eq!(
            part,
            line_string![
                (x: 5.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 15.0, y: 10.0),
            ]
        );
        assert!((line_length(&part) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn suffix_ends_at_last_vertex() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)];
        let part = substring(&line, 15.0, 20.0).unwrap();

        assert_eq!(part, line_string![(x: 10.0, y: 5.0), (x: 10.0, y: 10.0)]);
    }

    #[test]
    fn offset_on_vertex_does_not_duplicate_it() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 20.0, y: 0.0)];
        let part = substring(&line, 10.0, 15.0).unwrap();

        assert_eq!(part, line_string![(x: 10.0, y: 0.0), (x: 15.0, y: 0.0)]);
    }

    #[test]
    fn rejects_degenerate_input() {
        let single = LineString::new(vec![Coord { x: 1.0, y: 1.0 }]);
        assert_eq!(
            substring(&single, 0.0, 1.0),
            Err(TruncationError::TooFewVertices)
        );

        let collapsed = line_string![(x: 1.0, y: 1.0), (x: 1.0, y: 1.0)];
        assert_eq!(
            substring(&collapsed, 0.0, 1.0),
            Err(TruncationError::ZeroLength)
        );
    }

    #[test]
    fn rejects_bad_offsets() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)];

        assert!(matches!(
            substring(&line, 0.0, 11.0),
            Err(TruncationError::OutOfRange { .. })
        ));
        assert!(matches!(
            substring(&line, 5.0, 5.0),
            Err(TruncationError::OutOfRange { .. })
        ));
        assert_eq!(
            substring(&line, 0.0, f64::NAN),
            Err(TruncationError::NonFinite)
        );
    }
}
