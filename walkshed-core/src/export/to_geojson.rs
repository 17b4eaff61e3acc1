use std::{
    fs,
    path::{Path, PathBuf},
};

use geo::MultiLineString;
use geojson::{Feature, FeatureCollection, Geometry, GeometryValue};
use log::info;
use serde_json::json;

use crate::{
    Error,
    algo::{ClippedSegment, WalkshedCollection, WalkshedResult},
    geometry::{Crs, reproject},
    loading::geojson::crs_member,
};

/// Converts a walkshed collection to a `GeoJSON` `FeatureCollection` in the
/// publication frame, one feature per clipped segment.
pub fn to_feature_collection(
    collection: &WalkshedCollection,
    publication_crs: Crs,
) -> Result<FeatureCollection, Error> {
    let features = collection
        .results
        .iter()
        .flat_map(|result| {
            result.segments.iter().map(move |segment| {
                create_segment_feature(result, segment, collection.crs, publication_crs)
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let foreign_members = (publication_crs != Crs::Wgs84).then(|| crs_member(publication_crs));

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members,
    })
}

fn create_segment_feature(
    result: &WalkshedResult,
    segment: &ClippedSegment,
    from: Crs,
    to: Crs,
) -> Result<Feature, Error> {
    let geometry = line_geometry(&reproject(&segment.geometry, from, to));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "fid": segment.segment,
            "clip": segment.kind.as_str(),
            "point_id": result.point_id,
            "point_name": result.point_name,
            "network_file": result.network.display().to_string(),
            "reachable_nodes": result.reachable_vertices,
            "max_distance": result.max_distance,
        }
    });

    Ok(serde_json::from_value::<Feature>(value)?)
}

/// Single-part geometries are written as plain line strings
fn line_geometry(lines: &MultiLineString<f64>) -> Geometry {
    match lines.0.as_slice() {
        [line] => Geometry::new(GeometryValue::from(line)),
        _ => Geometry::new(GeometryValue::from(lines)),
    }
}

/// `<stem>_backup.<ext>` next to `path`
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(extension) => format!("{stem}_backup.{}", extension.to_string_lossy()),
        None => format!("{stem}_backup"),
    };
    path.with_file_name(name)
}

/// Write a feature collection, moving any existing file at `path` to its
/// backup name first. Returns the backup path when one was made.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file operation fails
pub fn write_feature_collection(
    path: &Path,
    collection: &FeatureCollection,
) -> Result<Option<PathBuf>, Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let backup = if path.exists() {
        let backup = backup_path(path);
        fs::rename(path, &backup)?;
        info!("Backed up existing file to {}", backup.display());
        Some(backup)
    } else {
        None
    };

    fs::write(path, serde_json::to_string(collection)?)?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use geo::{Point, line_string};

    use super::*;
    use crate::algo::ClipKind;

    fn collection() -> WalkshedCollection {
        WalkshedCollection {
            max_distance: 400.0,
            crs: Crs::WebMercator,
            results: vec![WalkshedResult {
                point_id: 1,
                point_name: "Skatepark Crossing".to_string(),
                network: PathBuf::from("data/roads.geojson"),
                start: Point::new(0.0, 0.0),
                reachable_vertices: 2,
                max_distance: 400.0,
                segments: vec![
                    ClippedSegment {
                        segment: 0,
                        kind: ClipKind::Full,
                        geometry: MultiLineString::new(vec![
                            line_string![(x: 0.0, y: 0.0), (x: 300.0, y: 0.0)],
                        ]),
                    },
                    ClippedSegment {
                        segment: 4,
                        kind: ClipKind::Partial,
                        geometry: MultiLineString::new(vec![
                            line_string![(x: 300.0, y: 0.0), (x: 400.0, y: 0.0)],
                        ]),
                    },
                ],
                dropped: vec![],
            }],
        }
    }

    #[test]
    fn features_carry_walkshed_attributes() {
        let features = to_feature_collection(&collection(), Crs::Wgs84).unwrap();

        assert_eq!(features.features.len(), 2);
        assert!(features.foreign_members.is_none());

        let partial = &features.features[1];
        assert_eq!(partial.property("fid"), Some(&json!(4)));
        assert_eq!(partial.property("clip"), Some(&json!("partial")));
        assert_eq!(partial.property("point_name"), Some(&json!("Skatepark Crossing")));
        assert_eq!(partial.property("reachable_nodes"), Some(&json!(2)));
        assert_eq!(partial.property("max_distance"), Some(&json!(400.0)));
    }

    #[test]
    fn geometries_are_published_in_wgs84() {
        let features = to_feature_collection(&collection(), Crs::Wgs84).unwrap();
        let geometry = features.features[0].geometry.clone().unwrap();
        let geometry = geo::Geometry::<f64>::try_from(geometry).unwrap();
        let line = geo::LineString::try_from(geometry).unwrap();

        let end = line.0[1];
        assert!((end.x - 300.0 / 111_319.490_793_273_57).abs() < 1e-9);
        assert!(end.y.abs() < 1e-9);
    }

    #[test]
    fn projected_publication_keeps_crs_member() {
        let features = to_feature_collection(&collection(), Crs::WebMercator).unwrap();
        assert!(features.foreign_members.unwrap().contains_key("crs"));
    }

    #[test]
    fn part_count_selects_geometry_type() {
        let single = line_geometry(&MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
        ]));
        assert!(matches!(single.value, GeometryValue::LineString { .. }));

        let multi = line_geometry(&MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 0.0)],
        ]));
        assert!(matches!(multi.value, GeometryValue::MultiLineString { .. }));
    }

    #[test]
    fn backup_name_keeps_extension() {
        assert_eq!(
            backup_path(Path::new("data/reachable_lines_400m.geojson")),
            PathBuf::from("data/reachable_lines_400m_backup.geojson")
        );
    }
}
