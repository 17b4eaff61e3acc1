//! Coordinate reference frames and conversion between them.
//!
//! Only the two frames the pipeline actually moves between are supported:
//! geographic WGS84 for input and publication, spherical Web Mercator for
//! metric work on the network.

use std::{f64::consts::FRAC_PI_4, fmt, str::FromStr};

use geo::{Coord, MapCoords};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Earth radius used by EPSG:3857
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude beyond which Web Mercator is undefined
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// EPSG:4326, longitude/latitude in degrees
    #[default]
    Wgs84,
    /// EPSG:3857, metres
    WebMercator,
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
        }
    }

    /// Whether distances in this frame are planar lengths
    pub fn is_projected(self) -> bool {
        matches!(self, Crs::WebMercator)
    }

    /// Name in the form used by legacy GeoJSON `crs` members
    pub fn urn(self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg())
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized.ends_with("CRS84") {
            return Ok(Crs::Wgs84);
        }
        let code = normalized
            .rsplit(':')
            .next()
            .and_then(|code| code.parse::<u32>().ok());

        match code {
            Some(4326) => Ok(Crs::Wgs84),
            Some(3857 | 900_913) => Ok(Crs::WebMercator),
            _ => Err(Error::InvalidData(format!(
                "Unsupported coordinate reference system: {s}"
            ))),
        }
    }
}

impl TryFrom<String> for Crs {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.to_string()
    }
}

/// Project a lon/lat coordinate into Web Mercator metres
pub fn to_web_mercator(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord
        .y
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    Coord {
        x: EARTH_RADIUS * coord.x.to_radians(),
        y: EARTH_RADIUS * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Inverse of [`to_web_mercator`]
pub fn from_web_mercator(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (coord.y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees(),
    }
}

pub fn transform_coord(coord: Coord<f64>, from: Crs, to: Crs) -> Coord<f64> {
    match (from, to) {
        (Crs::Wgs84, Crs::WebMercator) => to_web_mercator(coord),
        (Crs::WebMercator, Crs::Wgs84) => from_web_mercator(coord),
        _ => coord,
    }
}

/// Reproject any `geo` geometry between reference frames.
///
/// Returns an unchanged copy when both frames are the same.
pub fn reproject<G>(geometry: &G, from: Crs, to: Crs) -> G::Output
where
    G: MapCoords<f64, f64>,
{
    geometry.map_coords(|coord| transform_coord(coord, from, to))
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point, line_string};

    use super::*;

    #[test]
    fn parses_common_names() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert_eq!("epsg:3857".parse::<Crs>().unwrap(), Crs::WebMercator);
        assert_eq!(
            "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Crs>().unwrap(),
            Crs::Wgs84
        );
        assert_eq!(
            "urn:ogc:def:crs:EPSG::3857".parse::<Crs>().unwrap(),
            Crs::WebMercator
        );
        assert!("EPSG:32633".parse::<Crs>().is_err());
    }

    #[test]
    fn origin_maps_to_origin() {
        let projected = to_web_mercator(Coord { x: 0.0, y: 0.0 });
        assert!(projected.x.abs() < 1e-9);
        assert!(projected.y.abs() < 1e-9);
    }

    #[test]
    fn known_mercator_value() {
        // 180 degrees of longitude spans half the equator
        let projected = to_web_mercator(Coord { x: 180.0, y: 0.0 });
        assert!((projected.x - 20_037_508.342_789_244).abs() < 1e-6);
    }

    #[test]
    fn round_trip_restores_coordinates() {
        let line: LineString<f64> = line_string![
            (x: -73.5673, y: 45.5017),
            (x: -73.5601, y: 45.5089),
            (x: -73.5512, y: 45.5123),
        ];
        let projected = reproject(&line, Crs::Wgs84, Crs::WebMercator);
        let restored = reproject(&projected, Crs::WebMercator, Crs::Wgs84);

        for (a, b) in line.coords().zip(restored.coords()) {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
        }
    }

    #[test]
    fn same_frame_is_identity() {
        let point = Point::new(12.5, -3.25);
        assert_eq!(reproject(&point, Crs::WebMercator, Crs::WebMercator), point);
    }

    #[test]
    fn only_mercator_is_projected() {
        assert!(Crs::WebMercator.is_projected());
        assert!(!Crs::Wgs84.is_projected());
    }
}
