//! Writing walkshed results: one GeoJSON file per distance, a length
//! summary table and the point dataset enriched with those lengths.

mod summary;
mod to_geojson;

use std::path::PathBuf;

use log::{info, warn};

pub use summary::{
    LengthSummary, format_thousands, join_summary, read_summary_csv, summarize, write_summary_csv,
};
pub use to_geojson::{backup_path, to_feature_collection, write_feature_collection};

use crate::{
    Error, WalkshedConfig, algo::RunReport, loading::format_distance,
    loading::geojson::read_feature_collection,
};

/// Files produced by [`write_outputs`]
#[derive(Debug, Clone, Default)]
pub struct OutputFiles {
    pub collections: Vec<PathBuf>,
    pub summary: Option<PathBuf>,
    pub joined_points: Option<PathBuf>,
}

/// Write every output configured in `config`.
///
/// Distances without any reachable segment produce no file.
///
/// # Errors
///
/// Returns an error if any output cannot be written
pub fn write_outputs(report: &RunReport, config: &WalkshedConfig) -> Result<OutputFiles, Error> {
    let mut files = OutputFiles::default();

    for collection in &report.collections {
        if collection.is_empty() {
            warn!(
                "No reachable lines computed for {}, nothing written",
                format_distance(collection.max_distance)
            );
            continue;
        }
        let path = config.output_path(collection.max_distance);
        let features = to_feature_collection(collection, config.publication_crs)?;
        write_feature_collection(&path, &features)?;
        info!(
            "Saved walkshed to {} ({})",
            path.display(),
            format_distance(collection.max_distance)
        );
        files.collections.push(path);
    }

    if config.summary_csv.is_none() && config.joined_points.is_none() {
        return Ok(files);
    }

    let summary = summarize(&report.collections);

    if let Some(path) = &config.summary_csv {
        write_summary_csv(path, &summary)?;
        info!("Saved summary to {}", path.display());
        files.summary = Some(path.clone());
    }

    if let Some(path) = &config.joined_points {
        let points = read_feature_collection(&config.points)?;
        let distances: Vec<_> = report
            .collections
            .iter()
            .map(|collection| collection.max_distance)
            .collect();
        let joined = join_summary(points, &summary, &distances);
        write_feature_collection(path, &joined)?;
        info!("Join complete: {}", path.display());
        files.joined_points = Some(path.clone());
    }

    Ok(files)
}
