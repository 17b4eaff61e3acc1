use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_SNAP_TOLERANCE, Distance, Error, algo::WalkshedOptions, geometry::Crs};

/// Road network file per point name, with a fallback for unlisted names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkCatalog {
    /// Network used for points without their own entry
    pub default: PathBuf,
    #[serde(default)]
    pub by_name: BTreeMap<String, PathBuf>,
}

impl NetworkCatalog {
    pub fn new(default: impl Into<PathBuf>) -> Self {
        Self {
            default: default.into(),
            by_name: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_network(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.by_name.insert(name.into(), path.into());
        self
    }

    /// Network file for the point called `name`
    pub fn resolve(&self, name: &str) -> &Path {
        self.by_name.get(name).unwrap_or(&self.default)
    }
}

/// Settings of one walkshed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalkshedConfig {
    /// Point dataset (GeoJSON)
    pub points: PathBuf,
    /// Walking distances to compute, in working frame units
    pub distances: Vec<Distance>,
    pub networks: NetworkCatalog,
    /// Projected frame distances are measured in
    #[serde(default = "default_working_crs")]
    pub working_crs: Crs,
    /// Frame of the exported geometries
    #[serde(default)]
    pub publication_crs: Crs,
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance: Distance,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
    /// Network length per point and distance
    #[serde(default)]
    pub summary_csv: Option<PathBuf>,
    /// Copy of the point dataset with walkshed lengths attached
    #[serde(default)]
    pub joined_points: Option<PathBuf>,
}

fn default_working_crs() -> Crs {
    Crs::WebMercator
}

fn default_snap_tolerance() -> Distance {
    DEFAULT_SNAP_TOLERANCE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_prefix() -> String {
    "reachable_lines".to_string()
}

impl WalkshedConfig {
    pub fn new(
        points: impl Into<PathBuf>,
        distances: Vec<Distance>,
        networks: NetworkCatalog,
    ) -> Self {
        Self {
            points: points.into(),
            distances,
            networks,
            working_crs: default_working_crs(),
            publication_crs: Crs::default(),
            snap_tolerance: default_snap_tolerance(),
            output_dir: default_output_dir(),
            output_prefix: default_output_prefix(),
            summary_csv: None,
            joined_points: None,
        }
    }

    /// Check the settings before any file is touched
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found
    pub fn validate(&self) -> Result<(), Error> {
        if self.distances.is_empty() {
            return Err(Error::InvalidConfig(
                "No walking distances provided in the configuration".to_string(),
            ));
        }
        if let Some(bad) = self
            .distances
            .iter()
            .find(|distance| !distance.is_finite() || **distance < 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "Walking distance must be a non-negative number, got {bad}"
            )));
        }
        if !self.snap_tolerance.is_finite() || self.snap_tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "Snap tolerance must be a non-negative number, got {}",
                self.snap_tolerance
            )));
        }
        if !self.working_crs.is_projected() {
            return Err(Error::InvalidConfig(format!(
                "Working frame {} is geographic; distances need a projected frame",
                self.working_crs
            )));
        }
        if self.output_prefix.is_empty() {
            return Err(Error::InvalidConfig("Output prefix is empty".to_string()));
        }
        Ok(())
    }

    /// Interpret relative paths as relative to `base`
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        rebase(&mut self.points);
        rebase(&mut self.output_dir);
        rebase(&mut self.networks.default);
        self.networks.by_name.values_mut().for_each(rebase);
        if let Some(path) = self.summary_csv.as_mut() {
            rebase(path);
        }
        if let Some(path) = self.joined_points.as_mut() {
            rebase(path);
        }
        self
    }

    pub fn options(&self) -> WalkshedOptions {
        WalkshedOptions {
            working_crs: self.working_crs,
            snap_tolerance: self.snap_tolerance,
        }
    }

    /// Output file of the collection for `distance`
    pub fn output_path(&self, distance: Distance) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}m.geojson",
            self.output_prefix,
            format_distance(distance)
        ))
    }
}

/// Distance without a trailing `.0` for whole numbers
pub fn format_distance(distance: Distance) -> String {
    if distance.fract() == 0.0 {
        format!("{distance:.0}")
    } else {
        format!("{distance}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WalkshedConfig {
        WalkshedConfig::new(
            "places.geojson",
            vec![400.0, 800.0],
            NetworkCatalog::new("default.geojson").with_network("Skatepark", "skate.geojson"),
        )
    }

    #[test]
    fn catalog_falls_back_to_default() {
        let catalog = config().networks;
        assert_eq!(catalog.resolve("Skatepark"), Path::new("skate.geojson"));
        assert_eq!(catalog.resolve("Elsewhere"), Path::new("default.geojson"));
    }

    #[test]
    fn output_path_uses_whole_metres() {
        let config = config();
        assert_eq!(
            config.output_path(400.0),
            Path::new("data").join("reachable_lines_400m.geojson")
        );
        assert_eq!(format_distance(402.5), "402.5");
    }

    #[test]
    fn validation_rejects_bad_settings() {
        assert!(config().validate().is_ok());

        let mut empty = config();
        empty.distances.clear();
        assert!(matches!(empty.validate(), Err(Error::InvalidConfig(_))));

        let mut negative = config();
        negative.distances.push(-5.0);
        assert!(negative.validate().is_err());

        let mut geographic = config();
        geographic.working_crs = Crs::Wgs84;
        assert!(geographic.validate().is_err());
    }

    #[test]
    fn relative_paths_follow_base() {
        let config = config().relative_to(Path::new("/srv/run"));
        assert_eq!(config.points, Path::new("/srv/run/places.geojson"));
        assert_eq!(config.networks.resolve("Skatepark"), Path::new("/srv/run/skate.geojson"));
        assert_eq!(config.output_dir, Path::new("/srv/run/data"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = serde_json::json!({
            "points": "places.geojson",
            "distances": [400.0],
            "networks": { "default": "roads.geojson" }
        });
        let config: WalkshedConfig = serde_json::from_value(json).unwrap();

        assert_eq!(config.working_crs, Crs::WebMercator);
        assert_eq!(config.publication_crs, Crs::Wgs84);
        assert_eq!(config.snap_tolerance, 1.0);
        assert_eq!(config.output_prefix, "reachable_lines");
        assert!(config.networks.by_name.is_empty());
    }
}
