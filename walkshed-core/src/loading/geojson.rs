//! GeoJSON readers for point and road network datasets

use std::{fs, path::Path};

use geo::{Geometry, MultiLineString};
use geojson::{FeatureCollection, GeoJson, JsonObject};
use log::{info, warn};

use crate::{
    Error,
    geometry::Crs,
    model::{PointOfInterest, RoadNetwork, RoadSegment},
};

/// Read a GeoJSON file as a feature collection
///
/// # Errors
///
/// [`Error::MissingInput`] if the file does not exist, otherwise any I/O or
/// parse error
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection, Error> {
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

/// Frame declared by a legacy `crs` member, WGS84 when absent
pub fn collection_crs(collection: &FeatureCollection) -> Result<Crs, Error> {
    let name = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|properties| properties.get("name"))
        .and_then(|name| name.as_str());

    name.map_or(Ok(Crs::Wgs84), str::parse)
}

/// Load the point dataset.
///
/// Point ids are 1-based feature positions; features without a `name`
/// property are called `Point_{id}`. Features that are not points are
/// skipped.
pub fn read_points(path: &Path) -> Result<Vec<PointOfInterest>, Error> {
    let collection = read_feature_collection(path)?;
    let crs = collection_crs(&collection)?;

    let mut points = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.into_iter().enumerate() {
        let id = idx + 1;
        let name = feature
            .property("name")
            .and_then(|name| name.as_str())
            .map_or_else(|| format!("Point_{id}"), ToString::to_string);

        let geometry = feature.geometry.map(Geometry::<f64>::try_from).transpose()?;
        match geometry {
            Some(Geometry::Point(point)) => points.push(PointOfInterest::new(id, name, point, crs)),
            _ => warn!("Feature {id} ({name}) in {} is not a point, ignoring", path.display()),
        }
    }

    info!("Loaded {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Load one road network.
///
/// Segment ids are feature positions. Features with a null or non-linear
/// geometry are kept as empty segments so ids stay positional.
pub fn read_network(path: &Path) -> Result<RoadNetwork, Error> {
    let collection = read_feature_collection(path)?;
    let crs = collection_crs(&collection)?;

    let segments = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(id, feature)| {
            let geometry = feature.geometry.map(Geometry::<f64>::try_from).transpose()?;
            let lines = geometry.map_or_else(
                || MultiLineString::new(vec![]),
                |geometry| linear_parts(geometry, id, path),
            );
            Ok(RoadSegment::new(id, lines))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    info!(
        "Loaded {} road segments from {}",
        segments.len(),
        path.display()
    );
    Ok(RoadNetwork::new(path, crs, segments))
}

fn linear_parts(geometry: Geometry<f64>, id: usize, path: &Path) -> MultiLineString<f64> {
    match geometry {
        Geometry::LineString(line) => MultiLineString::new(vec![line]),
        Geometry::MultiLineString(lines) => lines,
        Geometry::Line(line) => MultiLineString::new(vec![line.into()]),
        Geometry::GeometryCollection(collection) => MultiLineString::new(
            collection
                .into_iter()
                .flat_map(|geometry| linear_parts(geometry, id, path).0)
                .collect(),
        ),
        _ => {
            warn!(
                "Segment {id} in {} is not a line geometry, ignoring",
                path.display()
            );
            MultiLineString::new(vec![])
        }
    }
}

/// Legacy `crs` member naming `crs`
pub fn crs_member(crs: Crs) -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        serde_json::json!({
            "type": "name",
            "properties": { "name": crs.urn() }
        }),
    );
    members
}
