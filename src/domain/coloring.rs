//! Facelet Color Projection
//!
//! Maps a raw [`CubeState`] onto the colors visible on each corner and edge
//! slot.

use crate::domain::models::{Color, CornerFacelets, CubeColoring, CubeState, EdgeFacelets, Face};
use thiserror::Error;

use Color::{Blue as B, Green as G, Orange as O, Red as R, White as W, Yellow as Y};

/// Intrinsic colors of each corner, indexed by `id - 1`
const CORNER_COLORS: [[Color; 3]; 8] = [
    [Y, R, G],
    [R, W, G],
    [W, O, G],
    [O, Y, G],
    [R, Y, B],
    [W, R, B],
    [O, W, B],
    [Y, O, B],
];

/// Faces touched by each corner slot
const CORNER_LOCATIONS: [[Face; 3]; 8] = [
    [Face::D, Face::R, Face::F],
    [Face::R, Face::U, Face::F],
    [Face::U, Face::L, Face::F],
    [Face::L, Face::D, Face::F],
    [Face::R, Face::D, Face::B],
    [Face::U, Face::R, Face::B],
    [Face::L, Face::U, Face::B],
    [Face::D, Face::L, Face::B],
];

/// Intrinsic colors of each edge, indexed by `id - 1`
const EDGE_COLORS: [[Color; 2]; 12] = [
    [G, Y],
    [G, R],
    [G, W],
    [G, O],
    [Y, R],
    [W, R],
    [W, O],
    [Y, O],
    [B, Y],
    [B, R],
    [B, W],
    [B, O],
];

/// Faces touched by each edge slot
const EDGE_LOCATIONS: [[Face; 2]; 12] = [
    [Face::F, Face::D],
    [Face::F, Face::R],
    [Face::F, Face::U],
    [Face::F, Face::L],
    [Face::D, Face::R],
    [Face::U, Face::R],
    [Face::U, Face::L],
    [Face::D, Face::L],
    [Face::B, Face::D],
    [Face::B, Face::R],
    [Face::B, Face::U],
    [Face::B, Face::L],
];

/// Corner slots whose chirality is mirrored relative to the others
const MIRRORED_CORNER_SLOTS: [usize; 4] = [0, 2, 5, 7];

/// Orientation value meaning "home" (no rotation)
const HOME_ORIENTATION: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("Unknown corner orientation {orientation} in slot {slot}")]
    UnknownOrientation { slot: usize, orientation: u8 },
    #[error("Slot {slot} out of range (expected below {len})")]
    SlotOutOfRange { slot: usize, len: usize },
    #[error("Unknown cubie id: {id}")]
    UnknownCubie { id: u8 },
}

fn slot_entry<T: Copy>(values: &[T], slot: usize) -> Result<T, ProjectionError> {
    let len = values.len();
    values.get(slot).copied().ok_or(ProjectionError::SlotOutOfRange { slot, len })
}

fn intrinsic<const N: usize>(table: &[[Color; N]], id: u8) -> Result<[Color; N], ProjectionError> {
    id.checked_sub(1)
        .and_then(|i| table.get(i as usize))
        .copied()
        .ok_or(ProjectionError::UnknownCubie { id })
}

/// Colors on the faces of corner `slot`, in the order of the slot's faces
pub fn corner_colors(state: &CubeState, slot: usize) -> Result<[Color; 3], ProjectionError> {
    let id = slot_entry(&state.corner_positions, slot)?;
    let mut orientation = slot_entry(&state.corner_orientations, slot)?;
    let [c0, c1, c2] = intrinsic(&CORNER_COLORS, id)?;

    if orientation != HOME_ORIENTATION && MIRRORED_CORNER_SLOTS.contains(&slot) {
        // Only 1 and 2 are mirrored; anything else is rejected below
        orientation = match orientation {
            1 => 2,
            2 => 1,
            other => other,
        };
    }

    match orientation {
        1 => Ok([c1, c2, c0]),
        2 => Ok([c2, c0, c1]),
        HOME_ORIENTATION => Ok([c0, c1, c2]),
        _ => Err(ProjectionError::UnknownOrientation { slot, orientation }),
    }
}

/// Colors on the faces of edge `slot`, in the order of the slot's faces
pub fn edge_colors(state: &CubeState, slot: usize) -> Result<[Color; 2], ProjectionError> {
    let id = slot_entry(&state.edge_positions, slot)?;
    let flipped = slot_entry(&state.edge_orientations, slot)?;
    let [c0, c1] = intrinsic(&EDGE_COLORS, id)?;

    Ok(if flipped { [c1, c0] } else { [c0, c1] })
}

/// Every slot of the cube with its faces and visible colors
pub fn coloring(state: &CubeState) -> Result<CubeColoring, ProjectionError> {
    let corners = CORNER_LOCATIONS
        .iter()
        .enumerate()
        .map(|(slot, position)| {
            Ok(CornerFacelets {
                position: *position,
                colors: corner_colors(state, slot)?,
            })
        })
        .collect::<Result<Vec<_>, ProjectionError>>()?;

    let edges = EDGE_LOCATIONS
        .iter()
        .enumerate()
        .map(|(slot, position)| {
            Ok(EdgeFacelets {
                position: *position,
                colors: edge_colors(state, slot)?,
            })
        })
        .collect::<Result<Vec<_>, ProjectionError>>()?;

    Ok(CubeColoring { corners, edges })
}
