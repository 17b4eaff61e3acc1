use std::{collections::BTreeMap, path::Path};

use geojson::FeatureCollection;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{Distance, Error, algo::WalkshedCollection, loading::format_distance};

/// Total reachable network length of one point at one distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthSummary {
    pub point_name: String,
    pub total_length_m: f64,
    pub distance_m: Distance,
}

/// Sum clipped segment lengths per point name and distance, sorted by
/// distance and then name
pub fn summarize(collections: &[WalkshedCollection]) -> Vec<LengthSummary> {
    collections
        .iter()
        .flat_map(|collection| {
            collection
                .results
                .iter()
                .map(|result| (result.point_name.as_str(), result.total_length()))
                .into_grouping_map()
                .sum()
                .into_iter()
                .map(move |(point_name, total_length_m)| LengthSummary {
                    point_name: point_name.to_string(),
                    total_length_m,
                    distance_m: collection.max_distance,
                })
        })
        .sorted_by(|a, b| {
            a.distance_m
                .total_cmp(&b.distance_m)
                .then_with(|| a.point_name.cmp(&b.point_name))
        })
        .collect()
}

/// # Errors
///
/// Returns an error if the file cannot be created or written
pub fn write_summary_csv(path: &Path, summary: &[LengthSummary]) -> Result<(), Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in summary {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the file cannot be read or a row does not parse
pub fn read_summary_csv(path: &Path) -> Result<Vec<LengthSummary>, Error> {
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    csv::Reader::from_path(path)?
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Attach `walkshed_{distance}m` properties to each point feature, matched
/// by its `name` property. Lengths are rounded and thousands separated;
/// points without a value for a distance get `null`.
pub fn join_summary(
    mut points: FeatureCollection,
    summary: &[LengthSummary],
    distances: &[Distance],
) -> FeatureCollection {
    let lookup: BTreeMap<(&str, String), f64> = summary
        .iter()
        .map(|row| {
            (
                (row.point_name.as_str(), format_distance(row.distance_m)),
                row.total_length_m,
            )
        })
        .collect();

    for feature in &mut points.features {
        let name = feature
            .property("name")
            .and_then(JsonValue::as_str)
            .map(ToString::to_string);

        for &distance in distances {
            let distance = format_distance(distance);
            let value = name
                .as_deref()
                .and_then(|name| lookup.get(&(name, distance.clone())))
                .map_or(JsonValue::Null, |length| {
                    JsonValue::String(format_thousands(*length))
                });
            feature.set_property(format!("walkshed_{distance}m"), value);
        }
    }

    points
}

/// Round to a whole number and group digits with commas
#[allow(clippy::cast_possible_truncation)]
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
