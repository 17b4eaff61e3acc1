use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use hashbrown::HashMap;
use itertools::Itertools;
use log::{info, warn};
use rayon::prelude::*;

use super::{
    config::WalkshedConfig,
    geojson::{read_network, read_points},
};
use crate::{Error, PointOfInterest, RoadNetwork};

/// Network prepared for one point
#[derive(Debug, Clone)]
pub enum NetworkAssignment {
    /// Network reprojected into the working frame, shared between points
    Loaded(Arc<RoadNetwork>),
    /// Network file that does not exist
    Missing(PathBuf),
}

/// Everything a run needs, read once before computation starts
#[derive(Debug, Clone)]
pub struct WalkshedInputs {
    pub points: Vec<PointOfInterest>,
    /// Network for each point, same order as `points`
    pub assignments: Vec<NetworkAssignment>,
}

impl WalkshedInputs {
    pub fn new(points: Vec<PointOfInterest>, assignments: Vec<NetworkAssignment>) -> Self {
        debug_assert_eq!(points.len(), assignments.len());
        Self {
            points,
            assignments,
        }
    }
}

/// Loads the points and every network they reference.
///
/// Each distinct network file is read once, in parallel, and reprojected to
/// the working frame. Missing network files do not fail the load; points
/// referencing them are skipped later.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the point dataset
/// cannot be read, or an existing network file cannot be parsed
pub fn load_inputs(config: &WalkshedConfig) -> Result<WalkshedInputs, Error> {
    config.validate()?;

    info!("Loading points: {}", config.points.display());
    let points = read_points(&config.points)?;

    let paths: Vec<&Path> = points
        .iter()
        .map(|point| config.networks.resolve(&point.name))
        .unique()
        .collect();

    info!("Loading {} road networks", paths.len());
    let networks: HashMap<&Path, NetworkAssignment> = paths
        .par_iter()
        .map(|&path| {
            let assignment = match read_network(path) {
                Ok(network) => Ok(NetworkAssignment::Loaded(Arc::new(
                    network.reprojected(config.working_crs),
                ))),
                Err(Error::MissingInput(missing)) => {
                    warn!("Road network file missing: {}", missing.display());
                    Ok(NetworkAssignment::Missing(missing))
                }
                Err(e) => Err(e),
            };
            assignment.map(|assignment| (path, assignment))
        })
        .collect::<Result<Vec<_>, Error>>()?
        .into_iter()
        .collect();

    let assignments = points
        .iter()
        .map(|point| {
            let path = config.networks.resolve(&point.name);
            networks
                .get(path)
                .cloned()
                .unwrap_or_else(|| NetworkAssignment::Missing(path.to_path_buf()))
        })
        .collect();

    Ok(WalkshedInputs::new(points, assignments))
}
