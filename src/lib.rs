//! Giiker smart cube decoder
//!
//! Turns the cube's BLE notifications into a [`CubeState`], move events and
//! per-facelet colors.
//!
//! [`CubeState`]: domain::models::CubeState

pub mod app;
pub mod domain;
pub mod infrastructure;

pub use domain::coloring::{coloring, corner_colors, edge_colors, ProjectionError};
pub use domain::models::{Color, CubeColoring, CubeEvent, CubeState, Face, Move, TransportEvent};
pub use infrastructure::bluetooth::protocol::{decode, decode_move, DecodeError};
