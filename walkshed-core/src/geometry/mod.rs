//! Planar geometry utilities used by the walkshed engine

pub mod projection;
pub mod snapping;
pub mod substring;

pub use projection::{Crs, reproject};
pub use snapping::repair_network;
pub use substring::{line_length, substring};
