//! This module is responsible for reading points of interest and road
//! networks and preparing them for walkshed computation.

mod builder;
mod config;
pub mod geojson;

pub use builder::{NetworkAssignment, WalkshedInputs, load_inputs};
pub use config::{NetworkCatalog, WalkshedConfig, format_distance};
